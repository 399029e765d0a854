use std::num::NonZeroU32;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use glow::{HasContext, PixelUnpackData};

use lumen_engine::gpu::{
    AttributeLocation, BlendFactor, BufferId, BufferTarget, BufferUsage, Capability, ClearMask, Compiled,
    DepthState, FramebufferId, GpuContext, ProgramId, RendererInfo, ShaderId, ShaderStage, TexImage, TextureId,
    TextureParams, UniformCall, UniformLocation,
};
use lumen_engine::paint::Color;
use lumen_engine::scene::PrimitiveType;

use crate::convert::{self, gl_int};

/// [`GpuContext`] over a `glow` OpenGL context.
///
/// Every texture is a `TEXTURE_2D`; one vertex array object stays bound for
/// the lifetime of the context.
pub struct GlContext {
    gl: Arc<glow::Context>,
    vao: glow::VertexArray,
    info: RendererInfo,
    framebuffer: Option<FramebufferId>,
}

impl std::fmt::Debug for GlContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlContext").field("info", &self.info).field("framebuffer", &self.framebuffer).finish()
    }
}

impl GlContext {
    /// Wraps `gl`, binds a vertex array object and sets byte unpack alignment.
    ///
    /// # Safety
    ///
    /// `gl` must be current on the calling thread, and stay current whenever
    /// the returned value is used.
    pub unsafe fn new(gl: Arc<glow::Context>) -> Result<Self> {
        let info = unsafe {
            RendererInfo {
                renderer: gl.get_parameter_string(glow::RENDERER),
                version: gl.get_parameter_string(glow::VERSION),
                glsl_version: gl.get_parameter_string(glow::SHADING_LANGUAGE_VERSION),
            }
        };

        let vao = unsafe { gl.create_vertex_array() }
            .map_err(anyhow::Error::msg)
            .context("failed to create vertex array object")?;

        unsafe {
            gl.bind_vertex_array(Some(vao));
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        }

        log::debug!("GL context ready: {} / {}", info.renderer, info.version);
        Ok(Self { gl, vao, info, framebuffer: None })
    }

    #[inline]
    pub fn gl(&self) -> &Arc<glow::Context> {
        &self.gl
    }

    /// Frees the vertex array object.
    pub fn destroy(self) {
        unsafe {
            self.gl.bind_vertex_array(None);
            self.gl.delete_vertex_array(self.vao);
        }
    }

    fn upload_floats(&self, location: &glow::UniformLocation, components: u8, data: &[f32]) -> bool {
        let loc = Some(location);
        unsafe {
            match components {
                1 => self.gl.uniform_1_f32_slice(loc, data),
                2 => self.gl.uniform_2_f32_slice(loc, data),
                3 => self.gl.uniform_3_f32_slice(loc, data),
                4 => self.gl.uniform_4_f32_slice(loc, data),
                _ => return false,
            }
        }
        true
    }

    fn upload_ints(&self, location: &glow::UniformLocation, components: u8, data: &[i32]) -> bool {
        let loc = Some(location);
        unsafe {
            match components {
                1 => self.gl.uniform_1_i32_slice(loc, data),
                2 => self.gl.uniform_2_i32_slice(loc, data),
                3 => self.gl.uniform_3_i32_slice(loc, data),
                4 => self.gl.uniform_4_i32_slice(loc, data),
                _ => return false,
            }
        }
        true
    }
}

// ── handles ──────────────────────────────────────────────────────────────────

fn created<T>(what: &str, result: Result<T, String>) -> Option<T> {
    result.map_err(|e| log::warn!("failed to create {what}: {e}")).ok()
}

fn native_buffer(id: BufferId) -> Option<glow::Buffer> {
    NonZeroU32::new(id.0).map(glow::NativeBuffer)
}

fn native_texture(id: TextureId) -> Option<glow::Texture> {
    NonZeroU32::new(id.0).map(glow::NativeTexture)
}

fn native_shader(id: ShaderId) -> Option<glow::Shader> {
    NonZeroU32::new(id.0).map(glow::NativeShader)
}

fn native_program(id: ProgramId) -> Option<glow::Program> {
    NonZeroU32::new(id.0).map(glow::NativeProgram)
}

fn native_framebuffer(id: FramebufferId) -> Option<glow::Framebuffer> {
    NonZeroU32::new(id.0).map(glow::NativeFramebuffer)
}

impl GpuContext for GlContext {
    fn renderer_info(&self) -> RendererInfo {
        self.info.clone()
    }

    // ── buffers ──

    fn create_buffer(&mut self) -> Option<BufferId> {
        created("buffer", unsafe { self.gl.create_buffer() }).map(|b| BufferId(b.0.get()))
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        unsafe { self.gl.bind_buffer(convert::buffer_target(target), buffer.and_then(native_buffer)) }
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        unsafe { self.gl.buffer_data_u8_slice(convert::buffer_target(target), data, convert::usage(usage)) }
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, byte_offset: usize, data: &[u8]) {
        unsafe { self.gl.buffer_sub_data_u8_slice(convert::buffer_target(target), gl_int(byte_offset), data) }
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(b) = native_buffer(buffer) {
            unsafe { self.gl.delete_buffer(b) }
        }
    }

    fn enable_vertex_attrib(&mut self, location: AttributeLocation) {
        unsafe { self.gl.enable_vertex_attrib_array(location.0) }
    }

    fn vertex_attrib_pointer(&mut self, location: AttributeLocation, components: u8) {
        unsafe { self.gl.vertex_attrib_pointer_f32(location.0, i32::from(components), glow::FLOAT, false, 0, 0) }
    }

    // ── programs ──

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<Compiled<ShaderId>, String> {
        unsafe {
            let shader = self.gl.create_shader(convert::shader_stage(stage))?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);

            let log = self.gl.get_shader_info_log(shader);
            if !self.gl.get_shader_compile_status(shader) {
                self.gl.delete_shader(shader);
                return Err(log);
            }
            Ok(Compiled { handle: ShaderId(shader.0.get()), log })
        }
    }

    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<Compiled<ProgramId>, String> {
        let (Some(vs), Some(fs)) = (native_shader(vertex), native_shader(fragment)) else {
            return Err("invalid shader handle".to_owned());
        };

        unsafe {
            let program = self.gl.create_program()?;
            self.gl.attach_shader(program, vs);
            self.gl.attach_shader(program, fs);
            self.gl.link_program(program);
            self.gl.detach_shader(program, vs);
            self.gl.detach_shader(program, fs);

            let log = self.gl.get_program_info_log(program);
            if !self.gl.get_program_link_status(program) {
                self.gl.delete_program(program);
                return Err(log);
            }
            Ok(Compiled { handle: ProgramId(program.0.get()), log })
        }
    }

    fn attribute_location(&mut self, program: ProgramId, name: &str) -> Option<AttributeLocation> {
        let p = native_program(program)?;
        unsafe { self.gl.get_attrib_location(p, name) }.map(AttributeLocation)
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let p = native_program(program)?;
        unsafe { self.gl.get_uniform_location(p, name) }.map(|l| UniformLocation(l.0))
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        unsafe { self.gl.use_program(program.and_then(native_program)) }
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        if let Some(s) = native_shader(shader) {
            unsafe { self.gl.delete_shader(s) }
        }
    }

    fn delete_program(&mut self, program: ProgramId) {
        if let Some(p) = native_program(program) {
            unsafe { self.gl.delete_program(p) }
        }
    }

    fn upload_uniform(&mut self, location: UniformLocation, call: &UniformCall) {
        let loc = glow::NativeUniformLocation(location.0);

        let uploaded = match call {
            UniformCall::Float(v) => self.upload_floats(&loc, 1, std::slice::from_ref(v)),
            UniformCall::Int(v) => self.upload_ints(&loc, 1, std::slice::from_ref(v)),
            UniformCall::FloatVec(data) => self.upload_floats(&loc, data.len() as u8, data),
            UniformCall::IntVec(data) => self.upload_ints(&loc, data.len() as u8, data),
            UniformCall::FloatArray { components, data } => self.upload_floats(&loc, *components, data),
            UniformCall::IntArray { components, data } => self.upload_ints(&loc, *components, data),
            UniformCall::Matrix { rows, cols, data } if rows == cols => unsafe {
                match *rows {
                    2 => self.gl.uniform_matrix_2_f32_slice(Some(&loc), false, data),
                    3 => self.gl.uniform_matrix_3_f32_slice(Some(&loc), false, data),
                    4 => self.gl.uniform_matrix_4_f32_slice(Some(&loc), false, data),
                    _ => {}
                }
                (2..=4).contains(rows)
            },
            UniformCall::Matrix { .. } => false,
        };

        if !uploaded {
            log::warn!("uniform upload {call:?} has no GL entry point, skipped");
        }
    }

    // ── textures ──

    fn create_texture(&mut self) -> Option<TextureId> {
        created("texture", unsafe { self.gl.create_texture() }).map(|t| TextureId(t.0.get()))
    }

    fn active_texture(&mut self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) {
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, texture.and_then(native_texture)) }
    }

    fn set_texture_params(&mut self, params: &TextureParams) {
        let wrap = convert::wrap(params.wrap);
        unsafe {
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, wrap);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, convert::min_filter(params.min_filter));
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, convert::mag_filter(params.mag_filter));
        }
    }

    fn tex_image(&mut self, image: TexImage<'_>) {
        let format = convert::pixel_format(image.format);
        unsafe {
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                format as i32,
                gl_int(image.width),
                gl_int(image.height),
                0,
                format,
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(Some(image.pixels)),
            );
        }
    }

    fn tex_sub_image(&mut self, image: TexImage<'_>) {
        unsafe {
            self.gl.tex_sub_image_2d(
                glow::TEXTURE_2D,
                0,
                0,
                0,
                gl_int(image.width),
                gl_int(image.height),
                convert::pixel_format(image.format),
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(Some(image.pixels)),
            );
        }
    }

    fn generate_mipmap(&mut self) {
        unsafe { self.gl.generate_mipmap(glow::TEXTURE_2D) }
    }

    fn copy_tex_sub_image(&mut self, width: u32, height: u32) {
        unsafe { self.gl.copy_tex_sub_image_2d(glow::TEXTURE_2D, 0, 0, 0, 0, 0, gl_int(width), gl_int(height)) }
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if let Some(t) = native_texture(texture) {
            unsafe { self.gl.delete_texture(t) }
        }
    }

    // ── framebuffers ──

    fn create_framebuffer(&mut self) -> Option<FramebufferId> {
        created("framebuffer", unsafe { self.gl.create_framebuffer() }).map(|f| FramebufferId(f.0.get()))
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer.and_then(native_framebuffer)) }
        self.framebuffer = framebuffer;
    }

    fn bound_framebuffer(&self) -> Option<FramebufferId> {
        self.framebuffer
    }

    fn framebuffer_texture(&mut self, attachment: u32, texture: Option<TextureId>) {
        unsafe {
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0 + attachment,
                glow::TEXTURE_2D,
                texture.and_then(native_texture),
                0,
            );
        }
    }

    fn draw_buffers(&mut self, count: u32) {
        let buffers: Vec<u32> = (0..count).map(|i| glow::COLOR_ATTACHMENT0 + i).collect();
        unsafe { self.gl.draw_buffers(&buffers) }
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        if let Some(f) = native_framebuffer(framebuffer) {
            unsafe { self.gl.delete_framebuffer(f) }
        }
        if self.framebuffer == Some(framebuffer) {
            self.framebuffer = None;
        }
    }

    // ── global state ──

    fn enable(&mut self, capability: Capability) {
        unsafe { self.gl.enable(convert::capability(capability)) }
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        unsafe { self.gl.blend_func(convert::blend_factor(src), convert::blend_factor(dst)) }
    }

    fn configure_depth(&mut self, depth: &DepthState) {
        unsafe {
            self.gl.depth_mask(depth.write);
            self.gl.depth_func(convert::depth_func(depth.func));
            self.gl.depth_range_f32(depth.range.0, depth.range.1);
            self.gl.clear_depth_f32(depth.clear_depth);
        }
    }

    fn clear_color(&mut self, color: Color) {
        unsafe { self.gl.clear_color(color.r, color.g, color.b, color.a) }
    }

    fn clear(&mut self, mask: ClearMask) {
        unsafe { self.gl.clear(convert::clear_bits(mask)) }
    }

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        unsafe { self.gl.viewport(x, y, gl_int(width), gl_int(height)) }
    }

    fn current_viewport(&self) -> (i32, i32, u32, u32) {
        let mut v = [0; 4];
        unsafe { self.gl.get_parameter_i32_slice(glow::VIEWPORT, &mut v) };
        (v[0], v[1], v[2].max(0) as u32, v[3].max(0) as u32)
    }

    // ── draws ──

    fn draw_arrays(&mut self, primitive: PrimitiveType, first: u32, count: u32) {
        unsafe { self.gl.draw_arrays(convert::primitive(primitive), gl_int(first), gl_int(count)) }
    }

    /// glow exposes no `glMultiDrawArrays`; each range becomes its own draw here.
    fn multi_draw_arrays(&mut self, primitive: PrimitiveType, first: &[u32], count: &[u32]) {
        let mode = convert::primitive(primitive);
        for (&f, &c) in first.iter().zip(count) {
            unsafe { self.gl.draw_arrays(mode, gl_int(f), gl_int(c)) }
        }
    }

    fn draw_elements(&mut self, primitive: PrimitiveType, count: u32) {
        unsafe { self.gl.draw_elements(convert::primitive(primitive), gl_int(count), glow::UNSIGNED_INT, 0) }
    }
}

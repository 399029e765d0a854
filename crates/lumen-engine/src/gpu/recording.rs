//! In-memory [`GpuContext`] that records every call.
//!
//! Handles are issued sequentially per kind, starting at 1. Attribute and
//! uniform locations are found by looking for the name as a whole word in
//! the linked sources, so a variable the shader never mentions has no
//! location, as it would after driver-side dead-code elimination.

use std::collections::{BTreeSet, HashMap};

use crate::paint::Color;
use crate::scene::PrimitiveType;

use super::context::{
    BlendFactor, BufferTarget, BufferUsage, Capability, ClearMask, Compiled, DepthState, GpuContext,
    PixelFormat, RendererInfo, ShaderStage, TexImage, UniformCall,
};
use super::handle::{
    AttributeLocation, BufferId, FramebufferId, ProgramId, ShaderId, TextureId, UniformLocation,
};
use super::texture::TextureParams;

/// One recorded native call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateBuffer(BufferId),
    BindBuffer(BufferTarget, Option<BufferId>),
    BufferData { target: BufferTarget, buffer: Option<BufferId>, len: usize, usage: BufferUsage },
    BufferSubData { target: BufferTarget, buffer: Option<BufferId>, byte_offset: usize, len: usize },
    DeleteBuffer(BufferId),
    EnableVertexAttrib(AttributeLocation),
    VertexAttribPointer(AttributeLocation, u8),

    CompileShader(ShaderStage, ShaderId),
    LinkProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    DeleteShader(ShaderId),
    DeleteProgram(ProgramId),
    Uniform(UniformLocation, UniformCall),

    CreateTexture(TextureId),
    ActiveTexture(u32),
    BindTexture(Option<TextureId>),
    TextureParams(TextureParams),
    TexImage { texture: Option<TextureId>, width: u32, height: u32, format: PixelFormat },
    TexSubImage { texture: Option<TextureId>, width: u32, height: u32, format: PixelFormat },
    GenerateMipmap,
    CopyTexSubImage { width: u32, height: u32 },
    DeleteTexture(TextureId),

    CreateFramebuffer(FramebufferId),
    BindFramebuffer(Option<FramebufferId>),
    FramebufferTexture { attachment: u32, texture: Option<TextureId> },
    DrawBuffers(u32),
    DeleteFramebuffer(FramebufferId),

    Enable(Capability),
    BlendFunc(BlendFactor, BlendFactor),
    Depth(DepthState),
    ClearColor(Color),
    Clear(ClearMask),
    Viewport { x: i32, y: i32, width: u32, height: u32 },

    DrawArrays { primitive: PrimitiveType, first: u32, count: u32 },
    MultiDrawArrays { primitive: PrimitiveType, first: Vec<u32>, count: Vec<u32> },
    DrawElements { primitive: PrimitiveType, count: u32 },
}

impl Call {
    pub fn is_draw(&self) -> bool {
        matches!(self, Call::DrawArrays { .. } | Call::MultiDrawArrays { .. } | Call::DrawElements { .. })
    }
}

#[derive(Debug, Default)]
struct Failures {
    compile_marker: Option<String>,
    link: bool,
    buffers: bool,
    textures: bool,
    framebuffers: bool,
}

#[derive(Debug, Default)]
struct LinkedProgram {
    vertex: String,
    fragment: String,
    attributes: HashMap<String, AttributeLocation>,
    uniforms: HashMap<String, UniformLocation>,
}

/// Recording backend for tests and headless runs.
#[derive(Debug, Default)]
pub struct RecordingContext {
    info: RendererInfo,
    calls: Vec<Call>,
    fail: Failures,

    next_id: u32,
    next_uniform: u32,

    shaders: HashMap<ShaderId, String>,
    programs: HashMap<ProgramId, LinkedProgram>,

    bound_array: Option<BufferId>,
    bound_index: Option<BufferId>,
    bound_texture: Option<TextureId>,
    bound_framebuffer: Option<FramebufferId>,
    viewport: (i32, i32, u32, u32),

    live_buffers: BTreeSet<BufferId>,
    live_textures: BTreeSet<TextureId>,
    live_programs: BTreeSet<ProgramId>,
    live_framebuffers: BTreeSet<FramebufferId>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self {
            info: RendererInfo {
                renderer: "recording".to_owned(),
                version: "2.1 recording".to_owned(),
                glsl_version: "1.20".to_owned(),
            },
            ..Self::default()
        }
    }

    pub fn with_info(mut self, info: RendererInfo) -> Self {
        self.info = info;
        self
    }

    // ── failure injection ──

    /// Compilation fails for every source containing `marker`.
    pub fn fail_compile_containing(mut self, marker: impl Into<String>) -> Self {
        self.fail.compile_marker = Some(marker.into());
        self
    }

    pub fn fail_link(mut self) -> Self {
        self.fail.link = true;
        self
    }

    pub fn set_fail_buffers(&mut self, fail: bool) {
        self.fail.buffers = fail;
    }

    pub fn set_fail_textures(&mut self, fail: bool) {
        self.fail.textures = fail;
    }

    pub fn set_fail_framebuffers(&mut self, fail: bool) {
        self.fail.framebuffers = fail;
    }

    // ── inspection ──

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn draw_calls(&self) -> Vec<&Call> {
        self.calls.iter().filter(|c| c.is_draw()).collect()
    }

    pub fn live_buffers(&self) -> &BTreeSet<BufferId> {
        &self.live_buffers
    }

    pub fn live_textures(&self) -> &BTreeSet<TextureId> {
        &self.live_textures
    }

    pub fn live_programs(&self) -> &BTreeSet<ProgramId> {
        &self.live_programs
    }

    pub fn live_framebuffers(&self) -> &BTreeSet<FramebufferId> {
        &self.live_framebuffers
    }

    /// Sources a program was linked from.
    pub fn program_sources(&self, program: ProgramId) -> Option<(&str, &str)> {
        self.programs.get(&program).map(|p| (p.vertex.as_str(), p.fragment.as_str()))
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn bound(&self, target: BufferTarget) -> Option<BufferId> {
        match target {
            BufferTarget::Array => self.bound_array,
            BufferTarget::Index => self.bound_index,
        }
    }
}

/// True when `name` occurs in `source` delimited by non-identifier characters.
fn contains_word(source: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';

    source.match_indices(name).any(|(at, _)| {
        let before = source[..at].chars().next_back();
        let after = source[at + name.len()..].chars().next();
        !before.is_some_and(is_ident) && !after.is_some_and(is_ident)
    })
}

impl GpuContext for RecordingContext {
    fn renderer_info(&self) -> RendererInfo {
        self.info.clone()
    }

    // ── buffers ──

    fn create_buffer(&mut self) -> Option<BufferId> {
        if self.fail.buffers {
            return None;
        }
        let id = BufferId(self.next());
        self.live_buffers.insert(id);
        self.calls.push(Call::CreateBuffer(id));
        Some(id)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        match target {
            BufferTarget::Array => self.bound_array = buffer,
            BufferTarget::Index => self.bound_index = buffer,
        }
        self.calls.push(Call::BindBuffer(target, buffer));
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        let buffer = self.bound(target);
        self.calls.push(Call::BufferData { target, buffer, len: data.len(), usage });
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, byte_offset: usize, data: &[u8]) {
        let buffer = self.bound(target);
        self.calls.push(Call::BufferSubData { target, buffer, byte_offset, len: data.len() });
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.live_buffers.remove(&buffer);
        self.calls.push(Call::DeleteBuffer(buffer));
    }

    fn enable_vertex_attrib(&mut self, location: AttributeLocation) {
        self.calls.push(Call::EnableVertexAttrib(location));
    }

    fn vertex_attrib_pointer(&mut self, location: AttributeLocation, components: u8) {
        self.calls.push(Call::VertexAttribPointer(location, components));
    }

    // ── programs ──

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<Compiled<ShaderId>, String> {
        if let Some(marker) = &self.fail.compile_marker {
            if source.contains(marker.as_str()) {
                return Err(format!("0:1(1): error: syntax error near '{marker}'"));
            }
        }
        let id = ShaderId(self.next());
        self.shaders.insert(id, source.to_owned());
        self.calls.push(Call::CompileShader(stage, id));
        Ok(Compiled { handle: id, log: String::new() })
    }

    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<Compiled<ProgramId>, String> {
        if self.fail.link {
            return Err("error: vertex and fragment varyings do not match".to_owned());
        }
        let (Some(vs), Some(fs)) = (self.shaders.get(&vertex), self.shaders.get(&fragment)) else {
            return Err("error: unknown shader object".to_owned());
        };
        let linked = LinkedProgram { vertex: vs.clone(), fragment: fs.clone(), ..LinkedProgram::default() };

        let id = ProgramId(self.next());
        self.programs.insert(id, linked);
        self.live_programs.insert(id);
        self.calls.push(Call::LinkProgram(id));
        Ok(Compiled { handle: id, log: String::new() })
    }

    fn attribute_location(&mut self, program: ProgramId, name: &str) -> Option<AttributeLocation> {
        let linked = self.programs.get_mut(&program)?;
        if let Some(&loc) = linked.attributes.get(name) {
            return Some(loc);
        }
        if !contains_word(&linked.vertex, name) {
            return None;
        }
        let loc = AttributeLocation(linked.attributes.len() as u32);
        linked.attributes.insert(name.to_owned(), loc);
        Some(loc)
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let next = self.next_uniform;
        let linked = self.programs.get_mut(&program)?;
        if let Some(&loc) = linked.uniforms.get(name) {
            return Some(loc);
        }
        if !contains_word(&linked.vertex, name) && !contains_word(&linked.fragment, name) {
            return None;
        }
        let loc = UniformLocation(next);
        linked.uniforms.insert(name.to_owned(), loc);
        self.next_uniform += 1;
        Some(loc)
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.calls.push(Call::UseProgram(program));
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.shaders.remove(&shader);
        self.calls.push(Call::DeleteShader(shader));
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.live_programs.remove(&program);
        self.calls.push(Call::DeleteProgram(program));
    }

    fn upload_uniform(&mut self, location: UniformLocation, call: &UniformCall) {
        self.calls.push(Call::Uniform(location, call.clone()));
    }

    // ── textures ──

    fn create_texture(&mut self) -> Option<TextureId> {
        if self.fail.textures {
            return None;
        }
        let id = TextureId(self.next());
        self.live_textures.insert(id);
        self.calls.push(Call::CreateTexture(id));
        Some(id)
    }

    fn active_texture(&mut self, unit: u32) {
        self.calls.push(Call::ActiveTexture(unit));
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) {
        self.bound_texture = texture;
        self.calls.push(Call::BindTexture(texture));
    }

    fn set_texture_params(&mut self, params: &TextureParams) {
        self.calls.push(Call::TextureParams(*params));
    }

    fn tex_image(&mut self, image: TexImage<'_>) {
        let TexImage { width, height, format, .. } = image;
        self.calls.push(Call::TexImage { texture: self.bound_texture, width, height, format });
    }

    fn tex_sub_image(&mut self, image: TexImage<'_>) {
        let TexImage { width, height, format, .. } = image;
        self.calls.push(Call::TexSubImage { texture: self.bound_texture, width, height, format });
    }

    fn generate_mipmap(&mut self) {
        self.calls.push(Call::GenerateMipmap);
    }

    fn copy_tex_sub_image(&mut self, width: u32, height: u32) {
        self.calls.push(Call::CopyTexSubImage { width, height });
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.live_textures.remove(&texture);
        self.calls.push(Call::DeleteTexture(texture));
    }

    // ── framebuffers ──

    fn create_framebuffer(&mut self) -> Option<FramebufferId> {
        if self.fail.framebuffers {
            return None;
        }
        let id = FramebufferId(self.next());
        self.live_framebuffers.insert(id);
        self.calls.push(Call::CreateFramebuffer(id));
        Some(id)
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.bound_framebuffer = framebuffer;
        self.calls.push(Call::BindFramebuffer(framebuffer));
    }

    fn bound_framebuffer(&self) -> Option<FramebufferId> {
        self.bound_framebuffer
    }

    fn framebuffer_texture(&mut self, attachment: u32, texture: Option<TextureId>) {
        self.calls.push(Call::FramebufferTexture { attachment, texture });
    }

    fn draw_buffers(&mut self, count: u32) {
        self.calls.push(Call::DrawBuffers(count));
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        self.live_framebuffers.remove(&framebuffer);
        if self.bound_framebuffer == Some(framebuffer) {
            self.bound_framebuffer = None;
        }
        self.calls.push(Call::DeleteFramebuffer(framebuffer));
    }

    // ── global state ──

    fn enable(&mut self, capability: Capability) {
        self.calls.push(Call::Enable(capability));
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.calls.push(Call::BlendFunc(src, dst));
    }

    fn configure_depth(&mut self, depth: &DepthState) {
        self.calls.push(Call::Depth(*depth));
    }

    fn clear_color(&mut self, color: Color) {
        self.calls.push(Call::ClearColor(color));
    }

    fn clear(&mut self, mask: ClearMask) {
        self.calls.push(Call::Clear(mask));
    }

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.viewport = (x, y, width, height);
        self.calls.push(Call::Viewport { x, y, width, height });
    }

    fn current_viewport(&self) -> (i32, i32, u32, u32) {
        self.viewport
    }

    // ── draws ──

    fn draw_arrays(&mut self, primitive: PrimitiveType, first: u32, count: u32) {
        self.calls.push(Call::DrawArrays { primitive, first, count });
    }

    fn multi_draw_arrays(&mut self, primitive: PrimitiveType, first: &[u32], count: &[u32]) {
        self.calls.push(Call::MultiDrawArrays { primitive, first: first.to_vec(), count: count.to_vec() });
    }

    fn draw_elements(&mut self, primitive: PrimitiveType, count: u32) {
        self.calls.push(Call::DrawElements { primitive, count });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_matching_ignores_prefixes() {
        assert!(contains_word("attribute vec2 position;", "position"));
        assert!(!contains_word("attribute vec2 position2;", "position"));
        assert!(!contains_word("uniform float my_scale;", "scale"));
        assert!(contains_word("gl_Position = vec4(scale);", "scale"));
    }

    #[test]
    fn locations_only_for_mentioned_names() {
        let mut gl = RecordingContext::new();
        let vs = gl.compile_shader(ShaderStage::Vertex, "attribute vec2 position; uniform vec2 scale;").unwrap();
        let fs = gl.compile_shader(ShaderStage::Fragment, "uniform sampler2D tex;").unwrap();
        let program = gl.link_program(vs.handle, fs.handle).unwrap().handle;

        assert_eq!(gl.attribute_location(program, "position"), Some(AttributeLocation(0)));
        assert_eq!(gl.attribute_location(program, "color"), None);
        assert!(gl.uniform_location(program, "scale").is_some());
        assert!(gl.uniform_location(program, "tex").is_some());
        assert_eq!(gl.uniform_location(program, "scale"), gl.uniform_location(program, "scale"));
    }

    #[test]
    fn compile_failure_is_injected() {
        let mut gl = RecordingContext::new().fail_compile_containing("BROKEN");
        let err = gl.compile_shader(ShaderStage::Fragment, "void main() { BROKEN }").unwrap_err();
        assert!(err.contains("BROKEN"));
        assert!(gl.compile_shader(ShaderStage::Vertex, "void main() {}").is_ok());
    }

    #[test]
    fn live_sets_track_deletion() {
        let mut gl = RecordingContext::new();
        let b = gl.create_buffer().unwrap();
        let t = gl.create_texture().unwrap();
        assert_ne!(b.0, t.0);

        gl.delete_buffer(b);
        assert!(gl.live_buffers().is_empty());
        assert_eq!(gl.live_textures().len(), 1);
    }
}

use crate::paint::Color;
use crate::scene::PrimitiveType;

use super::handle::{
    AttributeLocation, BufferId, FramebufferId, ProgramId, ShaderId, TextureId, UniformLocation,
};
use super::texture::TextureParams;

// ── enums ────────────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data.
    Array,
    /// Element indices.
    Index,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Static,
    #[default]
    Dynamic,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    Multisample,
    PointSprite,
    ProgramPointSize,
    Blend,
    DepthTest,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusDstColor,
    DstAlpha,
    OneMinusDstAlpha,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    Less,
    #[default]
    LessEqual,
    Always,
}

/// Depth-buffer state applied when 3-D rendering is active.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DepthState {
    pub write: bool,
    pub func: DepthFunc,
    pub range: (f32, f32),
    pub clear_depth: f32,
}

impl Default for DepthState {
    fn default() -> Self {
        Self { write: true, func: DepthFunc::LessEqual, range: (0.0, 1.0), clear_depth: 1.0 }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ClearMask {
    pub color: bool,
    pub depth: bool,
}

impl ClearMask {
    pub const COLOR: Self = Self { color: true, depth: false };
    pub const COLOR_DEPTH: Self = Self { color: true, depth: true };
}

/// Unsigned-byte pixel layout of texture uploads.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Single channel (intensity).
    R8,
    Rg8,
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    pub fn from_components(components: u8) -> Option<Self> {
        match components {
            1 => Some(PixelFormat::R8),
            2 => Some(PixelFormat::Rg8),
            3 => Some(PixelFormat::Rgb8),
            4 => Some(PixelFormat::Rgba8),
            _ => None,
        }
    }

    pub fn components(self) -> u8 {
        match self {
            PixelFormat::R8 => 1,
            PixelFormat::Rg8 => 2,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

// ── payloads ─────────────────────────────────────────────────────────────────

/// Driver identification strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RendererInfo {
    pub renderer: String,
    pub version: String,
    pub glsl_version: String,
}

impl RendererInfo {
    /// True for OpenGL ES / WebGL drivers.
    pub fn is_es(&self) -> bool {
        self.version.contains("OpenGL ES") || self.version.contains("WebGL")
    }
}

/// A successfully compiled or linked object with its (possibly empty) info log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiled<T> {
    pub handle: T,
    pub log: String,
}

/// One uniform upload, already shaped for the matching native entry point.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformCall {
    Float(f32),
    Int(i32),
    /// `vecN` with `N = len`.
    FloatVec(Vec<f32>),
    /// `ivecN` with `N = len`.
    IntVec(Vec<i32>),
    /// Array of `len / components` elements.
    FloatArray { components: u8, data: Vec<f32> },
    IntArray { components: u8, data: Vec<i32> },
    /// Row-major `rows × cols` matrices, uploaded without transposition.
    Matrix { rows: u8, cols: u8, data: Vec<f32> },
}

/// Pixel upload into the bound 2-D texture. One-dimensional textures use `height == 1`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TexImage<'a> {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: &'a [u8],
}

// ── call surface ─────────────────────────────────────────────────────────────

/// Native graphics calls used by the engine.
///
/// Backends are expected to map each method to exactly one driver call (or a
/// short fixed sequence). State such as the bound buffer or texture is the
/// driver's; callers bind before they upload.
///
/// Creation methods return `None` when the driver refuses; callers log and
/// degrade instead of failing.
pub trait GpuContext {
    fn renderer_info(&self) -> RendererInfo;

    // ── buffers ──

    fn create_buffer(&mut self) -> Option<BufferId>;
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>);
    /// (Re)allocates the bound buffer with `data`.
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage);
    /// Overwrites part of the bound buffer starting at `byte_offset`.
    fn buffer_sub_data(&mut self, target: BufferTarget, byte_offset: usize, data: &[u8]);
    fn delete_buffer(&mut self, buffer: BufferId);
    fn enable_vertex_attrib(&mut self, location: AttributeLocation);
    /// Points `location` at the bound array buffer: tightly packed `f32`s.
    fn vertex_attrib_pointer(&mut self, location: AttributeLocation, components: u8);

    // ── programs ──

    /// Compiles one stage. `Err` carries the driver log; the failed object is already freed.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<Compiled<ShaderId>, String>;
    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<Compiled<ProgramId>, String>;
    fn attribute_location(&mut self, program: ProgramId, name: &str) -> Option<AttributeLocation>;
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;
    fn use_program(&mut self, program: Option<ProgramId>);
    fn delete_shader(&mut self, shader: ShaderId);
    fn delete_program(&mut self, program: ProgramId);
    /// Uploads to the active program.
    fn upload_uniform(&mut self, location: UniformLocation, call: &UniformCall);

    // ── textures ──

    fn create_texture(&mut self) -> Option<TextureId>;
    fn active_texture(&mut self, unit: u32);
    fn bind_texture(&mut self, texture: Option<TextureId>);
    fn set_texture_params(&mut self, params: &TextureParams);
    /// Allocates the bound texture with `image`. Rows are byte-aligned.
    fn tex_image(&mut self, image: TexImage<'_>);
    fn tex_sub_image(&mut self, image: TexImage<'_>);
    fn generate_mipmap(&mut self);
    /// Copies the read framebuffer's lower-left `width × height` into the bound texture.
    fn copy_tex_sub_image(&mut self, width: u32, height: u32);
    fn delete_texture(&mut self, texture: TextureId);

    // ── framebuffers ──

    fn create_framebuffer(&mut self) -> Option<FramebufferId>;
    /// `None` binds the default (window) framebuffer.
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);
    fn bound_framebuffer(&self) -> Option<FramebufferId>;
    /// Attaches `texture` as color output `attachment` of the bound framebuffer.
    fn framebuffer_texture(&mut self, attachment: u32, texture: Option<TextureId>);
    /// Routes fragment outputs to the first `count` color attachments.
    fn draw_buffers(&mut self, count: u32);
    fn delete_framebuffer(&mut self, framebuffer: FramebufferId);

    // ── global state ──

    fn enable(&mut self, capability: Capability);
    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor);
    fn configure_depth(&mut self, depth: &DepthState);
    fn clear_color(&mut self, color: Color);
    fn clear(&mut self, mask: ClearMask);
    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32);
    /// Viewport in effect, as `(x, y, width, height)`.
    fn current_viewport(&self) -> (i32, i32, u32, u32);

    // ── draws ──

    fn draw_arrays(&mut self, primitive: PrimitiveType, first: u32, count: u32);
    /// One draw per `(first[i], count[i])` pair.
    fn multi_draw_arrays(&mut self, primitive: PrimitiveType, first: &[u32], count: &[u32]);
    /// Draws `count` `u32` indices from the bound index buffer.
    fn draw_elements(&mut self, primitive: PrimitiveType, count: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_format_follows_components() {
        for n in 1..=4 {
            assert_eq!(PixelFormat::from_components(n).map(PixelFormat::components), Some(n));
        }
        assert_eq!(PixelFormat::from_components(5), None);
    }

    #[test]
    fn es_detection() {
        let es = RendererInfo { version: "OpenGL ES 3.0 Mesa".into(), ..Default::default() };
        let desktop = RendererInfo { version: "4.6 (Core Profile)".into(), ..Default::default() };
        assert!(es.is_es());
        assert!(!desktop.is_es());
    }

    #[test]
    fn default_depth_state() {
        let d = DepthState::default();
        assert!(d.write);
        assert_eq!(d.func, DepthFunc::LessEqual);
        assert_eq!(d.range, (0.0, 1.0));
        assert_eq!(d.clear_depth, 1.0);
    }
}

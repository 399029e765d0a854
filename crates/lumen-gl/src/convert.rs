//! Engine enums to GL enums.

use lumen_engine::gpu::{
    BlendFactor, BufferTarget, BufferUsage, Capability, ClearMask, DepthFunc, Filter, PixelFormat, ShaderStage, Wrap,
};
use lumen_engine::scene::PrimitiveType;

/// `GL_POINT_SPRITE`, absent from core profiles.
const POINT_SPRITE: u32 = 0x8861;
const MULTISAMPLE: u32 = 0x809D;
/// Legacy single and dual channel formats; GL 2.1 and ES 2.0 have no `RED`/`RG`.
const LUMINANCE: u32 = 0x1909;
const LUMINANCE_ALPHA: u32 = 0x190A;

pub fn primitive(p: PrimitiveType) -> u32 {
    match p {
        PrimitiveType::Points => glow::POINTS,
        PrimitiveType::Lines => glow::LINES,
        PrimitiveType::LineStrip => glow::LINE_STRIP,
        PrimitiveType::LineLoop => glow::LINE_LOOP,
        PrimitiveType::Triangles => glow::TRIANGLES,
        PrimitiveType::TriangleStrip => glow::TRIANGLE_STRIP,
        PrimitiveType::TriangleFan => glow::TRIANGLE_FAN,
    }
}

pub fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::Index => glow::ELEMENT_ARRAY_BUFFER,
    }
}

pub fn usage(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::Static => glow::STATIC_DRAW,
        BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
    }
}

pub fn shader_stage(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

pub fn capability(cap: Capability) -> u32 {
    match cap {
        Capability::Multisample => MULTISAMPLE,
        Capability::PointSprite => POINT_SPRITE,
        Capability::ProgramPointSize => glow::PROGRAM_POINT_SIZE,
        Capability::Blend => glow::BLEND,
        Capability::DepthTest => glow::DEPTH_TEST,
    }
}

pub fn blend_factor(f: BlendFactor) -> u32 {
    match f {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcColor => glow::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstColor => glow::DST_COLOR,
        BlendFactor::OneMinusDstColor => glow::ONE_MINUS_DST_COLOR,
        BlendFactor::DstAlpha => glow::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
    }
}

pub fn depth_func(f: DepthFunc) -> u32 {
    match f {
        DepthFunc::Less => glow::LESS,
        DepthFunc::LessEqual => glow::LEQUAL,
        DepthFunc::Always => glow::ALWAYS,
    }
}

pub fn clear_bits(mask: ClearMask) -> u32 {
    let mut bits = 0;
    if mask.color {
        bits |= glow::COLOR_BUFFER_BIT;
    }
    if mask.depth {
        bits |= glow::DEPTH_BUFFER_BIT;
    }
    bits
}

/// Client format of byte texels; also used as the unsized internal format.
pub fn pixel_format(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::R8 => LUMINANCE,
        PixelFormat::Rg8 => LUMINANCE_ALPHA,
        PixelFormat::Rgb8 => glow::RGB,
        PixelFormat::Rgba8 => glow::RGBA,
    }
}

pub fn wrap(w: Wrap) -> i32 {
    (match w {
        Wrap::ClampToEdge => glow::CLAMP_TO_EDGE,
        Wrap::Repeat => glow::REPEAT,
        Wrap::MirroredRepeat => glow::MIRRORED_REPEAT,
    }) as i32
}

pub fn min_filter(f: Filter) -> i32 {
    (match f {
        Filter::Nearest => glow::NEAREST,
        Filter::Linear => glow::LINEAR,
        Filter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
    }) as i32
}

/// Magnification never samples mipmaps.
pub fn mag_filter(f: Filter) -> i32 {
    (match f {
        Filter::Nearest => glow::NEAREST,
        Filter::Linear | Filter::LinearMipmapLinear => glow::LINEAR,
    }) as i32
}

/// Saturating `usize`/`u32` to `GLint`/`GLsizei`.
pub fn gl_int<T: TryInto<i32>>(value: T) -> i32 {
    value.try_into().unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_map_to_gl_modes() {
        assert_eq!(primitive(PrimitiveType::Points), glow::POINTS);
        assert_eq!(primitive(PrimitiveType::LineStrip), glow::LINE_STRIP);
        assert_eq!(primitive(PrimitiveType::TriangleFan), glow::TRIANGLE_FAN);
    }

    #[test]
    fn clear_mask_combines_bits() {
        assert_eq!(clear_bits(ClearMask::COLOR), glow::COLOR_BUFFER_BIT);
        assert_eq!(clear_bits(ClearMask::COLOR_DEPTH), glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        assert_eq!(clear_bits(ClearMask { color: false, depth: false }), 0);
    }

    #[test]
    fn legacy_capabilities_use_raw_enums() {
        assert_eq!(capability(Capability::PointSprite), 0x8861);
        assert_eq!(capability(Capability::Multisample), 0x809D);
        assert_eq!(capability(Capability::Blend), glow::BLEND);
    }

    #[test]
    fn mag_filter_drops_mipmaps() {
        assert_eq!(min_filter(Filter::LinearMipmapLinear), glow::LINEAR_MIPMAP_LINEAR as i32);
        assert_eq!(mag_filter(Filter::LinearMipmapLinear), glow::LINEAR as i32);
    }

    #[test]
    fn byte_formats_stay_unsized() {
        assert_eq!(pixel_format(PixelFormat::R8), 0x1909);
        assert_eq!(pixel_format(PixelFormat::Rgba8), glow::RGBA);
    }

    #[test]
    fn gl_int_saturates() {
        assert_eq!(gl_int(12usize), 12);
        assert_eq!(gl_int(u32::MAX), i32::MAX);
        assert_eq!(gl_int(usize::MAX), i32::MAX);
    }
}

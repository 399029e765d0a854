//! Texture procedures.
//!
//! All textures are stored as 2-D unsigned-byte textures. One-dimensional
//! data is uploaded with a height of one. Float texels are mapped to bytes
//! with `round(255 * clamp(v, 0, 1))`.

use crate::scene::{Texels, TextureData};

use super::context::{GpuContext, PixelFormat, TexImage};
use super::handle::{FramebufferId, TextureId};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Wrap {
    #[default]
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Filter {
    #[default]
    Nearest,
    Linear,
    LinearMipmapLinear,
}

/// Sampling parameters of a texture variable.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureParams {
    pub wrap: Wrap,
    pub min_filter: Filter,
    pub mag_filter: Filter,
    /// Regenerate mipmaps after each full upload.
    pub mipmap: bool,
}

impl Default for TextureParams {
    fn default() -> Self {
        Self { wrap: Wrap::ClampToEdge, min_filter: Filter::Nearest, mag_filter: Filter::Nearest, mipmap: false }
    }
}

impl TextureParams {
    pub fn linear() -> Self {
        Self { min_filter: Filter::Linear, mag_filter: Filter::Linear, ..Self::default() }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureDim {
    D1,
    D2,
}

/// Dimensions and layout of uploaded texture data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub dim: TextureDim,
}

/// Validates texture data and derives its layout.
pub fn info(data: &TextureData) -> Option<TextureInfo> {
    let Some(format) = PixelFormat::from_components(data.components) else {
        log::debug!("texture has {} components; expected 1 to 4", data.components);
        return None;
    };

    if data.width == 0 || data.height == 0 || data.texels.len() != data.expected_len() {
        log::debug!(
            "texture data has {} values, {}x{}x{} expected",
            data.texels.len(),
            data.width,
            data.height,
            data.components
        );
        return None;
    }

    let dim = if data.is_1d() { TextureDim::D1 } else { TextureDim::D2 };
    Some(TextureInfo { width: data.width, height: data.height, format, dim })
}

/// Converts texels into the byte layout the GPU receives.
pub fn convert(data: &TextureData) -> Vec<u8> {
    match &data.texels {
        Texels::Bytes(bytes) => bytes.clone(),
        Texels::Float(values) => values.iter().map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8).collect(),
    }
}

/// Creates a texture, binds it and applies `params`.
pub fn create(gl: &mut dyn GpuContext, params: &TextureParams) -> Option<TextureId> {
    let Some(texture) = gl.create_texture() else {
        log::warn!("driver refused to create a texture");
        return None;
    };
    gl.bind_texture(Some(texture));
    gl.set_texture_params(params);
    Some(texture)
}

/// Makes `texture` current on texture unit `unit`.
pub fn bind(gl: &mut dyn GpuContext, unit: u32, texture: TextureId) {
    gl.active_texture(unit);
    gl.bind_texture(Some(texture));
}

/// Allocates the bound texture from `data`.
pub fn load(gl: &mut dyn GpuContext, info: &TextureInfo, data: &TextureData, params: &TextureParams) {
    let pixels = convert(data);
    gl.tex_image(TexImage { width: info.width, height: info.height, format: info.format, pixels: &pixels });
    if params.mipmap {
        gl.generate_mipmap();
    }
}

/// Overwrites the bound texture in place. Dimensions must be unchanged.
pub fn update(gl: &mut dyn GpuContext, info: &TextureInfo, data: &TextureData, params: &TextureParams) {
    let pixels = convert(data);
    gl.tex_sub_image(TexImage { width: info.width, height: info.height, format: info.format, pixels: &pixels });
    if params.mipmap {
        gl.generate_mipmap();
    }
}

/// Copies `source` into `destination` through the `blit` framebuffer.
///
/// The previously bound framebuffer is bound again afterwards.
pub fn copy(
    gl: &mut dyn GpuContext,
    blit: FramebufferId,
    source: TextureId,
    destination: TextureId,
    (width, height): (u32, u32),
) {
    let previous = gl.bound_framebuffer();

    gl.bind_framebuffer(Some(blit));
    gl.framebuffer_texture(0, Some(source));
    gl.bind_texture(Some(destination));
    gl.copy_tex_sub_image(width, height);
    gl.framebuffer_texture(0, None);

    gl.bind_framebuffer(previous);
}

pub fn delete(gl: &mut dyn GpuContext, textures: &[TextureId]) {
    for &texture in textures {
        gl.delete_texture(texture);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{Call, RecordingContext};

    #[test]
    fn float_texels_become_bytes() {
        let data = TextureData::from_floats(3, 1, 1, vec![0.0, 0.5, 2.0]);
        assert_eq!(convert(&data), vec![0, 128, 255]);
    }

    #[test]
    fn single_row_is_one_dimensional() {
        let data = TextureData::from_bytes(4, 1, 3, vec![0; 12]);
        let info = info(&data).unwrap();
        assert_eq!(info.dim, TextureDim::D1);
        assert_eq!(info.format, PixelFormat::Rgb8);
    }

    #[test]
    fn mismatched_length_is_rejected() {
        assert!(info(&TextureData::from_bytes(2, 2, 4, vec![0; 15])).is_none());
        assert!(info(&TextureData::from_bytes(2, 2, 5, vec![0; 20])).is_none());
        assert!(info(&TextureData::from_bytes(0, 2, 1, vec![])).is_none());
    }

    #[test]
    fn copy_restores_previous_framebuffer() {
        let mut gl = RecordingContext::new();
        let target = gl.create_framebuffer().unwrap();
        let blit = gl.create_framebuffer().unwrap();
        let src = gl.create_texture().unwrap();
        let dst = gl.create_texture().unwrap();
        gl.bind_framebuffer(Some(target));
        gl.clear_calls();

        copy(&mut gl, blit, src, dst, (8, 4));

        assert_eq!(gl.calls().first(), Some(&Call::BindFramebuffer(Some(blit))));
        assert!(gl.calls().contains(&Call::CopyTexSubImage { width: 8, height: 4 }));
        assert_eq!(gl.calls().last(), Some(&Call::BindFramebuffer(Some(target))));
        assert_eq!(gl.bound_framebuffer(), Some(target));
    }

    #[test]
    fn mipmaps_follow_params() {
        let mut gl = RecordingContext::new();
        let data = TextureData::from_bytes(2, 2, 1, vec![0; 4]);
        let info = info(&data).unwrap();

        load(&mut gl, &info, &data, &TextureParams::default());
        assert_eq!(gl.count(|c| matches!(c, Call::GenerateMipmap)), 0);

        let params = TextureParams { mipmap: true, ..TextureParams::linear() };
        load(&mut gl, &info, &data, &params);
        assert_eq!(gl.count(|c| matches!(c, Call::GenerateMipmap)), 1);
    }
}

use crate::gpu::RendererInfo;
use crate::shader::GlslHeader;
use crate::slicing::MAX_CHUNK_SIZE;

/// Build-time settings shared by every visual of a scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Maximum vertices per slice. Zero disables slicing.
    pub max_chunk_size: usize,
    /// Header prepended to shader sources. `None` picks one from the driver.
    pub glsl_header: Option<GlslHeader>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { max_chunk_size: MAX_CHUNK_SIZE, glsl_header: None }
    }
}

impl RenderConfig {
    pub fn with_max_chunk_size(mut self, max_chunk_size: usize) -> Self {
        self.max_chunk_size = max_chunk_size;
        self
    }

    pub fn with_glsl_header(mut self, header: GlslHeader) -> Self {
        self.glsl_header = Some(header);
        self
    }

    /// Effective header for a driver.
    pub fn header_for(&self, info: &RendererInfo) -> GlslHeader {
        self.glsl_header.clone().unwrap_or_else(|| GlslHeader::for_renderer(info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_slices_at_65000() {
        assert_eq!(RenderConfig::default().max_chunk_size, 65_000);
    }

    #[test]
    fn explicit_header_wins() {
        let info = RendererInfo { version: "OpenGL ES 3.2".into(), ..Default::default() };
        assert_eq!(RenderConfig::default().header_for(&info), GlslHeader::es());

        let config = RenderConfig::default().with_glsl_header(GlslHeader::desktop());
        assert_eq!(config.header_for(&info), GlslHeader::desktop());
    }
}

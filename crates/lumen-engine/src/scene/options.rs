use crate::coords::AspectConstraint;
use crate::gpu::BlendFactor;
use crate::paint::Color;

/// Renderer-wide GPU state applied once when a scene renderer is built.
///
/// Every field is optional; an absent field leaves the matching capability
/// at its driver default (off).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RendererOptions {
    /// Enables multisampling.
    pub antialiasing: Option<bool>,
    /// Enables point sprites and shader-controlled point size.
    pub sprites: Option<bool>,
    /// Enables blending.
    pub transparency: Option<bool>,
    /// Blend factors used when `transparency` is on.
    /// Defaults to `(SrcAlpha, OneMinusSrcAlpha)`.
    pub blend_func: Option<(BlendFactor, BlendFactor)>,
    /// Enables depth testing with `LEQUAL`, depth range `[0, 1]` and clear depth 1.
    pub activate_3d: Option<bool>,
    pub background: Option<Color>,
    /// Aspect-ratio policy used by `resize`.
    pub constrain_ratio: Option<AspectConstraint>,
}

impl RendererOptions {
    pub fn transparency_enabled(&self) -> bool {
        self.transparency == Some(true)
    }

    pub fn depth_enabled(&self) -> bool {
        self.activate_3d == Some(true)
    }

    /// Effective blend factors when transparency is enabled.
    pub fn blend_factors(&self) -> (BlendFactor, BlendFactor) {
        self.blend_func.unwrap_or((BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha))
    }
}

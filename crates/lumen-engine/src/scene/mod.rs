//! Scene description types.
//!
//! Responsibilities:
//! - describe visuals (shaders, variables, primitive, slicing bounds)
//! - carry the values that flow into `set_data`
//! - hold renderer-wide options
//!
//! Nothing here touches the GPU. A [`Scene`] is consumed by
//! [`crate::render::SceneRenderer`], which owns all native resources.

mod options;
mod value;
mod variable;
mod visual;

pub mod compound;

pub use options::RendererOptions;
pub use value::{Array, Texels, TextureData, Value};
pub use variable::{
    CompoundFn, Ndim, Source, VarType, Variable, VariableKind, VariableRef, VariableSpec,
};
pub use visual::{FramebufferTarget, PrimitiveType, Visual};

/// An ordered list of visuals plus renderer-wide options.
///
/// Visuals are painted in declaration order. A visual may only reference
/// variables of visuals declared before it.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub visuals: Vec<Visual>,
    pub options: RendererOptions,
}

impl Scene {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_visual(mut self, visual: Visual) -> Self {
        self.visuals.push(visual);
        self
    }

    pub fn with_options(mut self, options: RendererOptions) -> Self {
        self.options = options;
        self
    }

    pub fn visual(&self, name: &str) -> Option<&Visual> {
        self.visuals.iter().find(|v| v.name == name)
    }
}

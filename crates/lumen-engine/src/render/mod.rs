//! Draw orchestration.
//!
//! Responsibilities:
//! - turn a declarative [`crate::scene::Visual`] into GPU state ([`VisualRenderer`])
//! - buffer `set_data` updates and apply them at the start of the next paint
//! - own the visuals of a scene, apply global GL state and group passes by
//!   framebuffer target ([`SceneRenderer`])
//!
//! Convention:
//! - every native call goes through [`crate::gpu::GpuContext`] on the thread
//!   owning the graphics context
//! - construction errors are fatal, per-frame problems are logged and skipped

mod config;
mod scene;
mod visual;

pub use config::RenderConfig;
pub use scene::SceneRenderer;
pub use visual::{OffscreenTarget, RendererState, Resolver, SharedResource, VisualRenderer};

//! OpenGL backend for the lumen engine.
//!
//! [`GlContext`] implements [`lumen_engine::gpu::GpuContext`] over a `glow`
//! context created by the windowing layer. The engine never touches GL
//! directly; everything goes through this one type.

mod context;
mod convert;

pub use context::GlContext;

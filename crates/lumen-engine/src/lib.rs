//! Lumen engine crate.
//!
//! This crate owns the GPU-side core of the plotting stack: buffer slicing,
//! dirty-range uploads, shader programs and per-frame draw orchestration.
//! Native calls are issued through [`gpu::GpuContext`]; the windowing layer
//! and the concrete graphics binding live outside this crate.

pub mod logging;
pub mod coords;
pub mod paint;
pub mod scene;
pub mod gpu;
pub mod slicing;
pub mod attribute;
pub mod shader;
pub mod render;

mod error;

pub use error::RenderError;

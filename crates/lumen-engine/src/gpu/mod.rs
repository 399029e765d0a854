//! GPU resource layer.
//!
//! Responsibilities:
//! - define the native call surface ([`GpuContext`])
//! - thin stateless procedures per resource kind (buffers, uniforms,
//!   textures, framebuffers, draws)
//! - typed handles and ownership tracking for shared resources
//!
//! [`RecordingContext`] implements the call surface in memory for tests and
//! headless runs.

mod context;
mod handle;
mod recording;

pub mod buffer;
pub mod draw;
pub mod framebuffer;
pub mod texture;
pub mod uniform;

pub use context::{
    BlendFactor, BufferTarget, BufferUsage, Capability, ClearMask, Compiled, DepthFunc, DepthState,
    GpuContext, PixelFormat, RendererInfo, ShaderStage, TexImage, UniformCall,
};
pub use handle::{
    AttributeLocation, BufferId, FramebufferId, Ownership, ProgramId, ShaderId, TextureId,
    UniformLocation,
};
pub use recording::{Call, RecordingContext};
pub use texture::{Filter, TextureParams, Wrap};

//! Shader programs and source generation.
//!
//! [`ShaderProgram`] compiles and links a vertex/fragment pair behind a
//! version header. [`ShaderTemplate`] assembles sources from a visual's
//! variable declarations plus code snippets.

mod program;
mod template;

pub use program::{GlslHeader, ShaderProgram};
pub use template::{glsl_type, Placement, ShaderSources, ShaderTemplate};

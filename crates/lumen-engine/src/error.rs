use std::fmt;

use crate::gpu::ShaderStage;
use crate::scene::VariableRef;

/// Errors raised while building renderers.
///
/// Only construction fails loudly. Per-frame operations log and skip instead.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A shader stage failed to compile.
    ShaderCompile { stage: ShaderStage, log: String, source: String },
    /// Both stages compiled but the program failed to link.
    ProgramLink { log: String, vertex_source: String, fragment_source: String },
    /// Declared primitive bounds do not fit the vertex count.
    InvalidBounds { visual: String, reason: String },
    /// A variable references a visual or variable that does not exist (yet).
    UnresolvedReference { visual: String, variable: String, target: VariableRef },
    /// Two visuals share a name.
    DuplicateVisual(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::ShaderCompile { stage, log, source } => {
                write!(f, "failed to compile {stage} shader:\n{log}\n--- source ---\n{source}")
            }
            RenderError::ProgramLink { log, vertex_source, fragment_source } => write!(
                f,
                "failed to link shader program:\n{log}\n--- vertex source ---\n{vertex_source}\n--- fragment source ---\n{fragment_source}"
            ),
            RenderError::InvalidBounds { visual, reason } => {
                write!(f, "visual '{visual}' has invalid bounds: {reason}")
            }
            RenderError::UnresolvedReference { visual, variable, target } => write!(
                f,
                "variable '{variable}' of visual '{visual}' references '{target}', which is not declared by an earlier visual"
            ),
            RenderError::DuplicateVisual(name) => write!(f, "more than one visual is named '{name}'"),
        }
    }
}

impl std::error::Error for RenderError {}

use std::fmt;
use std::sync::Arc;

use crate::gpu::TextureParams;

use super::value::{Array, TextureData, Value};

/// Scalar element type of a shader variable.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum VarType {
    #[default]
    Float,
    Int,
    Bool,
}

/// Shape of a uniform: scalar, vector or matrix (rows × cols).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Ndim {
    Scalar,
    Vector(u8),
    Matrix(u8, u8),
}

impl Ndim {
    /// Number of scalar components in one element.
    #[inline]
    pub fn components(self) -> usize {
        match self {
            Ndim::Scalar => 1,
            Ndim::Vector(n) => n as usize,
            Ndim::Matrix(r, c) => r as usize * c as usize,
        }
    }

    /// `Scalar` for 1, `Vector(n)` otherwise.
    #[inline]
    pub fn from_components(n: u8) -> Self {
        if n <= 1 { Ndim::Scalar } else { Ndim::Vector(n) }
    }
}

/// Points at a variable of an earlier visual.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariableRef {
    pub visual: String,
    pub variable: String,
}

impl VariableRef {
    pub fn new(visual: impl Into<String>, variable: impl Into<String>) -> Self {
        Self { visual: visual.into(), variable: variable.into() }
    }
}

impl fmt::Display for VariableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.visual, self.variable)
    }
}

/// Where a variable's initial data comes from.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Source<T> {
    /// No data yet; the variable is filled by a later `set_data`.
    #[default]
    Empty,
    Data(T),
    /// Share the GPU resource of another visual's variable.
    Reference(VariableRef),
}

impl<T> Source<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            Source::Data(d) => Some(d),
            _ => None,
        }
    }

    pub fn reference(&self) -> Option<&VariableRef> {
        match self {
            Source::Reference(r) => Some(r),
            _ => None,
        }
    }
}

/// Expands one user-facing value into updates of concrete variables.
#[derive(Clone)]
pub struct CompoundFn(Arc<dyn Fn(&Value) -> Vec<(String, Value)> + Send + Sync>);

impl CompoundFn {
    pub fn new<F>(fun: F) -> Self
    where
        F: Fn(&Value) -> Vec<(String, Value)> + Send + Sync + 'static,
    {
        Self(Arc::new(fun))
    }

    #[inline]
    pub fn expand(&self, value: &Value) -> Vec<(String, Value)> {
        (self.0)(value)
    }
}

impl fmt::Debug for CompoundFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CompoundFn(..)")
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Attribute,
    Uniform,
    Texture,
    Index,
    Varying,
    Compound,
    Framebuffer,
}

/// Kind-specific part of a variable declaration.
#[derive(Debug, Clone)]
pub enum VariableSpec {
    /// Per-vertex data with `ndim` float components.
    Attribute { vartype: VarType, ndim: u8, data: Source<Array> },
    /// `size` makes the uniform an array of that many elements.
    Uniform { vartype: VarType, ndim: Ndim, size: Option<usize>, data: Option<Value> },
    Texture { data: Source<TextureData>, params: TextureParams },
    /// Element indices. Declaring one switches the visual to indexed drawing.
    Index { data: Vec<u32> },
    /// Shader-only variable passed from the vertex to the fragment stage.
    Varying { vartype: VarType, ndim: u8 },
    Compound { fun: CompoundFn, data: Option<Value> },
    /// Off-screen target whose color outputs are the named texture variables.
    Framebuffer { textures: Vec<String> },
}

/// A named variable of a visual.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub spec: VariableSpec,
}

impl Variable {
    pub fn new(name: impl Into<String>, spec: VariableSpec) -> Self {
        Self { name: name.into(), spec }
    }

    pub fn attribute(name: impl Into<String>, ndim: u8, data: Option<Array>) -> Self {
        let data = data.map_or(Source::Empty, Source::Data);
        Self::new(name, VariableSpec::Attribute { vartype: VarType::Float, ndim, data })
    }

    pub fn attribute_ref(name: impl Into<String>, ndim: u8, target: VariableRef) -> Self {
        let data = Source::Reference(target);
        Self::new(name, VariableSpec::Attribute { vartype: VarType::Float, ndim, data })
    }

    pub fn uniform(name: impl Into<String>, vartype: VarType, ndim: Ndim, data: Option<Value>) -> Self {
        Self::new(name, VariableSpec::Uniform { vartype, ndim, size: None, data })
    }

    pub fn uniform_array(
        name: impl Into<String>,
        vartype: VarType,
        ndim: Ndim,
        size: usize,
        data: Option<Value>,
    ) -> Self {
        Self::new(name, VariableSpec::Uniform { vartype, ndim, size: Some(size), data })
    }

    pub fn texture(name: impl Into<String>, data: Option<TextureData>) -> Self {
        let data = data.map_or(Source::Empty, Source::Data);
        Self::new(name, VariableSpec::Texture { data, params: TextureParams::default() })
    }

    pub fn texture_ref(name: impl Into<String>, target: VariableRef) -> Self {
        let data = Source::Reference(target);
        Self::new(name, VariableSpec::Texture { data, params: TextureParams::default() })
    }

    pub fn index(name: impl Into<String>, data: Vec<u32>) -> Self {
        Self::new(name, VariableSpec::Index { data })
    }

    pub fn varying(name: impl Into<String>, ndim: u8) -> Self {
        Self::new(name, VariableSpec::Varying { vartype: VarType::Float, ndim })
    }

    pub fn compound(name: impl Into<String>, fun: CompoundFn, data: Option<Value>) -> Self {
        Self::new(name, VariableSpec::Compound { fun, data })
    }

    pub fn framebuffer<S: Into<String>>(name: impl Into<String>, textures: impl IntoIterator<Item = S>) -> Self {
        let textures = textures.into_iter().map(Into::into).collect();
        Self::new(name, VariableSpec::Framebuffer { textures })
    }

    pub fn kind(&self) -> VariableKind {
        match self.spec {
            VariableSpec::Attribute { .. } => VariableKind::Attribute,
            VariableSpec::Uniform { .. } => VariableKind::Uniform,
            VariableSpec::Texture { .. } => VariableKind::Texture,
            VariableSpec::Index { .. } => VariableKind::Index,
            VariableSpec::Varying { .. } => VariableKind::Varying,
            VariableSpec::Compound { .. } => VariableKind::Compound,
            VariableSpec::Framebuffer { .. } => VariableKind::Framebuffer,
        }
    }

    /// Cross-visual reference, for attributes and textures.
    pub fn reference(&self) -> Option<&VariableRef> {
        match &self.spec {
            VariableSpec::Attribute { data, .. } => data.reference(),
            VariableSpec::Texture { data, .. } => data.reference(),
            _ => None,
        }
    }
}

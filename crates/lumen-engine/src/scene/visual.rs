use super::value::Value;
use super::variable::{Variable, VariableKind, VariableSpec};

/// GL primitive used to assemble vertices.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Points,
    Lines,
    #[default]
    LineStrip,
    LineLoop,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// Where a visual is painted.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum FramebufferTarget {
    #[default]
    Screen,
    /// The k-th framebuffer variable declared across the scene.
    Offscreen(usize),
}

/// Declarative description of one drawable: shaders, variables and draw setup.
#[derive(Debug, Clone)]
pub struct Visual {
    pub name: String,
    /// Number of vertices.
    pub size: usize,
    /// Boundaries of the independent primitives, `[0, .., size]`.
    /// `None` draws all vertices as one primitive.
    pub bounds: Option<Vec<u32>>,
    pub primitive_type: PrimitiveType,
    pub visible: bool,
    /// Static visuals ignore navigation transforms.
    pub is_static: bool,
    pub constrain_ratio: bool,
    pub constrain_navigation: bool,
    pub framebuffer: FramebufferTarget,
    pub variables: Vec<Variable>,
    pub vertex_shader: String,
    pub fragment_shader: String,
}

impl Visual {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
            bounds: None,
            primitive_type: PrimitiveType::default(),
            visible: true,
            is_static: false,
            constrain_ratio: false,
            constrain_navigation: false,
            framebuffer: FramebufferTarget::Screen,
            variables: Vec::new(),
            vertex_shader: String::new(),
            fragment_shader: String::new(),
        }
    }

    // ── builder ──────────────────────────────────────────────────────────────

    pub fn primitive(mut self, primitive_type: PrimitiveType) -> Self {
        self.primitive_type = primitive_type;
        self
    }

    pub fn bounds(mut self, bounds: Vec<u32>) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn is_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn framebuffer(mut self, target: FramebufferTarget) -> Self {
        self.framebuffer = target;
        self
    }

    pub fn shaders(mut self, vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        self.vertex_shader = vertex.into();
        self.fragment_shader = fragment.into();
        self
    }

    pub fn variable(mut self, variable: Variable) -> Self {
        self.add_variable(variable);
        self
    }

    /// Adds or replaces a variable by name.
    pub fn add_variable(&mut self, variable: Variable) {
        match self.variables.iter_mut().find(|v| v.name == variable.name) {
            Some(slot) => *slot = variable,
            None => self.variables.push(variable),
        }
    }

    // ── queries ──────────────────────────────────────────────────────────────

    pub fn get_variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn variables_of(&self, kind: VariableKind) -> impl Iterator<Item = &Variable> {
        self.variables.iter().filter(move |v| v.kind() == kind)
    }

    pub fn is_indexed(&self) -> bool {
        self.variables_of(VariableKind::Index).next().is_some()
    }

    /// Compound functions paired with their initial data.
    pub(crate) fn compound_initial_updates(&self) -> Vec<(String, Value)> {
        self.variables
            .iter()
            .filter_map(|v| match &v.spec {
                VariableSpec::Compound { fun, data: Some(data) } => Some(fun.expand(data)),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

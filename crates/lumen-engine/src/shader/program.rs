use crate::gpu::{
    AttributeLocation, GpuContext, ProgramId, RendererInfo, ShaderId, ShaderStage, UniformLocation,
};
use crate::RenderError;

/// Version line (plus optional precision statement) prepended to every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlslHeader {
    pub version: String,
    /// Emitted in the fragment stage only.
    pub precision: Option<String>,
}

impl Default for GlslHeader {
    fn default() -> Self {
        Self::desktop()
    }
}

impl GlslHeader {
    /// GLSL 1.20.
    pub fn desktop() -> Self {
        Self { version: "#version 120".to_owned(), precision: None }
    }

    /// GLSL ES 1.00 with medium float precision.
    pub fn es() -> Self {
        Self { version: "#version 100".to_owned(), precision: Some("precision mediump float;".to_owned()) }
    }

    pub fn for_renderer(info: &RendererInfo) -> Self {
        if info.is_es() { Self::es() } else { Self::desktop() }
    }

    pub fn apply(&self, stage: ShaderStage, source: &str) -> String {
        match (&self.precision, stage) {
            (Some(precision), ShaderStage::Fragment) => format!("{}\n{}\n{}", self.version, precision, source),
            _ => format!("{}\n{}", self.version, source),
        }
    }
}

/// A linked vertex/fragment program.
#[derive(Debug)]
pub struct ShaderProgram {
    program: ProgramId,
    vertex_source: String,
    fragment_source: String,
    deleted: bool,
}

impl ShaderProgram {
    /// Compiles both stages behind `header` and links them.
    ///
    /// Intermediate shader objects are freed whether or not linking succeeds.
    pub fn new(
        gl: &mut dyn GpuContext,
        vertex: &str,
        fragment: &str,
        header: &GlslHeader,
    ) -> Result<Self, RenderError> {
        let vertex_source = header.apply(ShaderStage::Vertex, vertex);
        let fragment_source = header.apply(ShaderStage::Fragment, fragment);

        let vs = compile(gl, ShaderStage::Vertex, &vertex_source)?;
        let fs = match compile(gl, ShaderStage::Fragment, &fragment_source) {
            Ok(fs) => fs,
            Err(e) => {
                gl.delete_shader(vs);
                return Err(e);
            }
        };

        let linked = gl.link_program(vs, fs);
        gl.delete_shader(vs);
        gl.delete_shader(fs);

        let program = match linked {
            Ok(compiled) => {
                if !compiled.log.trim().is_empty() {
                    log::debug!("program link log:\n{}", compiled.log);
                }
                compiled.handle
            }
            Err(log) => {
                return Err(RenderError::ProgramLink { log, vertex_source, fragment_source });
            }
        };

        Ok(Self { program, vertex_source, fragment_source, deleted: false })
    }

    #[inline]
    pub fn id(&self) -> ProgramId {
        self.program
    }

    /// Vertex source as compiled, header included.
    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// `None` when the linked program does not use `name`.
    pub fn attribute_location(&self, gl: &mut dyn GpuContext, name: &str) -> Option<AttributeLocation> {
        let location = gl.attribute_location(self.program, name);
        if location.is_none() {
            log::debug!("attribute '{name}' is not used by the shader program");
        }
        location
    }

    /// `None` when the linked program does not use `name`.
    pub fn uniform_location(&self, gl: &mut dyn GpuContext, name: &str) -> Option<UniformLocation> {
        let location = gl.uniform_location(self.program, name);
        if location.is_none() {
            log::debug!("uniform '{name}' is not used by the shader program");
        }
        location
    }

    pub fn activate(&self, gl: &mut dyn GpuContext) {
        gl.use_program(Some(self.program));
    }

    pub fn deactivate(&self, gl: &mut dyn GpuContext) {
        gl.use_program(None);
    }

    /// Frees the program. Idempotent.
    pub fn delete(&mut self, gl: &mut dyn GpuContext) {
        if !self.deleted {
            gl.delete_program(self.program);
            self.deleted = true;
        }
    }
}

fn compile(gl: &mut dyn GpuContext, stage: ShaderStage, source: &str) -> Result<ShaderId, RenderError> {
    match gl.compile_shader(stage, source) {
        Ok(compiled) => {
            if !compiled.log.trim().is_empty() {
                log::debug!("{stage} shader compile log:\n{}", compiled.log);
            }
            Ok(compiled.handle)
        }
        Err(log) => Err(RenderError::ShaderCompile { stage, log, source: source.to_owned() }),
    }
}

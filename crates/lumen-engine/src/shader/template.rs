use crate::scene::{Ndim, VarType, Variable, VariableSpec};

/// Where a main-body snippet goes.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Placement {
    /// Before every other snippet.
    Start,
    /// After the snippets added so far, but before those pinned to the end.
    #[default]
    Append,
    /// After everything, including earlier `End` snippets.
    End,
}

/// Generated vertex and fragment sources, without version header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

#[derive(Debug, Clone, Default)]
struct MainBody {
    snippets: Vec<String>,
    pinned_to_end: usize,
}

impl MainBody {
    fn insert(&mut self, code: String, placement: Placement) {
        match placement {
            Placement::Start => self.snippets.insert(0, code),
            Placement::Append => {
                let at = self.snippets.len() - self.pinned_to_end;
                self.snippets.insert(at, code);
            }
            Placement::End => {
                self.snippets.push(code);
                self.pinned_to_end += 1;
            }
        }
    }

    fn render(&self) -> String {
        self.snippets.iter().map(|s| format!("    {}\n", s.trim())).collect()
    }
}

/// Assembles shader sources from variable declarations and code snippets.
///
/// The fragment stage starts from `out_color` set to the default color and
/// writes it to `gl_FragColor` at the end, so fragment snippets only need to
/// modify `out_color`.
#[derive(Debug, Clone)]
pub struct ShaderTemplate {
    vertex_headers: Vec<String>,
    vertex_main: MainBody,
    fragment_headers: Vec<String>,
    fragment_main: MainBody,
    default_color: [f32; 4],
}

impl Default for ShaderTemplate {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderTemplate {
    pub fn new() -> Self {
        Self {
            vertex_headers: Vec::new(),
            vertex_main: MainBody::default(),
            fragment_headers: Vec::new(),
            fragment_main: MainBody::default(),
            default_color: [1.0, 1.0, 0.0, 1.0],
        }
    }

    pub fn default_color(&mut self, color: [f32; 4]) -> &mut Self {
        self.default_color = color;
        self
    }

    /// Code placed before `main` in the vertex stage (helper functions).
    pub fn add_vertex_header(&mut self, code: impl Into<String>) -> &mut Self {
        self.vertex_headers.push(code.into());
        self
    }

    pub fn add_vertex_main(&mut self, code: impl Into<String>, placement: Placement) -> &mut Self {
        self.vertex_main.insert(code.into(), placement);
        self
    }

    pub fn add_fragment_header(&mut self, code: impl Into<String>) -> &mut Self {
        self.fragment_headers.push(code.into());
        self
    }

    pub fn add_fragment_main(&mut self, code: impl Into<String>, placement: Placement) -> &mut Self {
        self.fragment_main.insert(code.into(), placement);
        self
    }

    /// Builds both sources, declaring every shader-visible variable.
    pub fn build(&self, variables: &[Variable]) -> ShaderSources {
        let mut vs_header = String::new();
        let mut fs_header = String::new();

        for v in variables {
            if let VariableSpec::Uniform { vartype, ndim, size, .. } = &v.spec {
                let line = uniform_declaration(&v.name, *vartype, *ndim, *size);
                vs_header.push_str(&line);
                fs_header.push_str(&line);
            }
        }
        for v in variables {
            if let VariableSpec::Attribute { ndim, .. } = &v.spec {
                vs_header.push_str(&format!("attribute {} {};\n", float_type(*ndim), v.name));
            }
        }
        for v in variables {
            if let VariableSpec::Texture { .. } = &v.spec {
                fs_header.push_str(&format!("uniform sampler2D {};\n", v.name));
            }
        }
        for v in variables {
            if let VariableSpec::Varying { ndim, .. } = &v.spec {
                let line = format!("varying {} {};\n", float_type(*ndim), v.name);
                vs_header.push_str(&line);
                fs_header.push_str(&line);
            }
        }

        for h in &self.vertex_headers {
            vs_header.push_str(h);
            vs_header.push('\n');
        }
        for h in &self.fragment_headers {
            fs_header.push_str(h);
            fs_header.push('\n');
        }

        let vertex = format!("{vs_header}\nvoid main()\n{{\n{}}}\n", self.vertex_main.render());

        let [r, g, b, a] = self.default_color;
        let fragment = format!(
            "{fs_header}\nvoid main()\n{{\n    vec4 out_color = vec4({r:?}, {g:?}, {b:?}, {a:?});\n{}    gl_FragColor = out_color;\n}}\n",
            self.fragment_main.render()
        );

        ShaderSources { vertex: normalize(&vertex), fragment: rewrite_texture_calls(&normalize(&fragment)) }
    }
}

/// GLSL type name of a uniform element.
pub fn glsl_type(vartype: VarType, ndim: Ndim) -> String {
    match (ndim, vartype) {
        (Ndim::Scalar, VarType::Float) => "float".to_owned(),
        (Ndim::Scalar, VarType::Int) => "int".to_owned(),
        (Ndim::Scalar, VarType::Bool) => "bool".to_owned(),
        (Ndim::Vector(n), VarType::Float) => format!("vec{n}"),
        (Ndim::Vector(n), _) => format!("ivec{n}"),
        (Ndim::Matrix(r, c), _) if r == c => format!("mat{r}"),
        (Ndim::Matrix(r, c), _) => format!("mat{c}x{r}"),
    }
}

/// Attributes and varyings are always float in GLSL 1.20.
fn float_type(ndim: u8) -> String {
    glsl_type(VarType::Float, Ndim::from_components(ndim))
}

fn uniform_declaration(name: &str, vartype: VarType, ndim: Ndim, size: Option<usize>) -> String {
    let ty = glsl_type(vartype, ndim);
    match size {
        Some(n) => format!("uniform {ty} {name}[{}];\n", n.max(1)),
        None => format!("uniform {ty} {name};\n"),
    }
}

fn normalize(source: &str) -> String {
    source.replace("\r\n", "\n")
}

/// GLSL 1.20 only has `texture2D`; rewrite calls to the generic `texture`.
fn rewrite_texture_calls(source: &str) -> String {
    const CALL: &str = "texture(";
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(at) = rest.find(CALL) {
        let preceded_by_ident = rest[..at].chars().next_back().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
        out.push_str(&rest[..at]);
        out.push_str(if preceded_by_ident { CALL } else { "texture2D(" });
        rest = &rest[at + CALL.len()..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{TextureData, Value};

    fn variables() -> Vec<Variable> {
        vec![
            Variable::attribute("position", 2, None),
            Variable::uniform("scale", VarType::Float, Ndim::Vector(2), Some(Value::from((1.0, 1.0)))),
            Variable::uniform_array("levels", VarType::Int, Ndim::Scalar, 4, None),
            Variable::texture("tex", Some(TextureData::from_bytes(1, 1, 1, vec![0]))),
            Variable::varying("v_texcoord", 2),
        ]
    }

    // ── declarations ──────────────────────────────────────────────────────────

    #[test]
    fn declarations_follow_variable_kinds() {
        let src = ShaderTemplate::new().build(&variables());

        assert!(src.vertex.contains("attribute vec2 position;"));
        assert!(src.vertex.contains("uniform vec2 scale;"));
        assert!(src.fragment.contains("uniform vec2 scale;"));
        assert!(src.vertex.contains("uniform int levels[4];"));
        assert!(src.fragment.contains("uniform sampler2D tex;"));
        assert!(!src.vertex.contains("sampler2D"));
        assert!(src.vertex.contains("varying vec2 v_texcoord;"));
        assert!(src.fragment.contains("varying vec2 v_texcoord;"));
    }

    #[test]
    fn type_names() {
        assert_eq!(glsl_type(VarType::Float, Ndim::Scalar), "float");
        assert_eq!(glsl_type(VarType::Int, Ndim::Vector(3)), "ivec3");
        assert_eq!(glsl_type(VarType::Float, Ndim::Matrix(4, 4)), "mat4");
        assert_eq!(glsl_type(VarType::Float, Ndim::Matrix(2, 3)), "mat3x2");
        assert_eq!(float_type(1), "float");
        assert_eq!(float_type(4), "vec4");
    }

    // ── main body ─────────────────────────────────────────────────────────────

    #[test]
    fn snippets_respect_placement() {
        let mut t = ShaderTemplate::new();
        t.add_vertex_main("b();", Placement::Append)
            .add_vertex_main("z();", Placement::End)
            .add_vertex_main("c();", Placement::Append)
            .add_vertex_main("a();", Placement::Start);
        let vs = t.build(&[]).vertex;

        let order: Vec<usize> = ["a();", "b();", "c();", "z();"].iter().filter_map(|s| vs.find(s)).collect();
        assert_eq!(order.len(), 4);
        assert!(order.windows(2).all(|w| w[0] < w[1]), "{vs}");
    }

    #[test]
    fn fragment_starts_from_default_color() {
        let mut t = ShaderTemplate::new();
        t.default_color([0.0, 0.5, 1.0, 1.0]).add_fragment_main("out_color.a *= 0.5;", Placement::Append);
        let fs = t.build(&[]).fragment;

        let start = fs.find("vec4 out_color = vec4(0.0, 0.5, 1.0, 1.0);").unwrap();
        let snippet = fs.find("out_color.a *= 0.5;").unwrap();
        let end = fs.find("gl_FragColor = out_color;").unwrap();
        assert!(start < snippet && snippet < end);
    }

    // ── rewrites ──────────────────────────────────────────────────────────────

    #[test]
    fn texture_calls_are_rewritten() {
        assert_eq!(rewrite_texture_calls("texture(tex, uv)"), "texture2D(tex, uv)");
        assert_eq!(rewrite_texture_calls("c = texture(t, x) + texture2D(t, y);"), "c = texture2D(t, x) + texture2D(t, y);");
        assert_eq!(rewrite_texture_calls("my_texture(x)"), "my_texture(x)");
    }

    #[test]
    fn carriage_returns_are_removed() {
        let mut t = ShaderTemplate::new();
        t.add_vertex_header("float f()\r\n{ return 1.0; }");
        assert!(!t.build(&[]).vertex.contains('\r'));
    }
}

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::coords::{Viewport, WindowSize};
use crate::gpu::{framebuffer, Capability, ClearMask, DepthState, GpuContext};
use crate::scene::{Array, FramebufferTarget, RendererOptions, Scene, Value, VariableRef};
use crate::RenderError;

use super::config::RenderConfig;
use super::visual::{OffscreenTarget, VisualRenderer};

/// Owns every [`VisualRenderer`] of a scene and drives the frame.
#[derive(Debug)]
pub struct SceneRenderer {
    options: RendererOptions,
    visuals: Vec<VisualRenderer>,
    lookup: HashMap<String, usize>,

    window: WindowSize,
    viewport: Viewport,

    warned_targets: HashSet<usize>,
    cleaned: bool,
}

impl SceneRenderer {
    /// Applies the scene options and builds its visuals in declaration order.
    ///
    /// On error, visuals built so far are cleaned up before returning.
    pub fn new(gl: &mut dyn GpuContext, scene: &Scene, config: &RenderConfig) -> Result<Self, RenderError> {
        let info = gl.renderer_info();
        log::info!(
            "renderer: {} | OpenGL {} | GLSL {}",
            info.renderer,
            info.version,
            info.glsl_version
        );

        apply_options(gl, &scene.options);

        let mut visuals: Vec<VisualRenderer> = Vec::with_capacity(scene.visuals.len());
        let mut lookup = HashMap::new();

        for visual in &scene.visuals {
            let built = if lookup.contains_key(&visual.name) {
                Err(RenderError::DuplicateVisual(visual.name.clone()))
            } else {
                let resolve = |r: &VariableRef| {
                    visuals.iter().find(|v| v.name() == r.visual)?.shared_resource(&r.variable)
                };
                VisualRenderer::new(gl, visual, config, &resolve)
            };

            match built {
                Ok(renderer) => {
                    lookup.insert(visual.name.clone(), visuals.len());
                    visuals.push(renderer);
                }
                Err(e) => {
                    for v in visuals.iter_mut().rev() {
                        v.cleanup(gl);
                    }
                    return Err(e);
                }
            }
        }

        log::debug!("scene built: {} visual(s)", visuals.len());
        Ok(Self {
            options: scene.options.clone(),
            visuals,
            lookup,
            window: WindowSize::default(),
            viewport: Viewport::unit(),
            warned_targets: HashSet::new(),
            cleaned: false,
        })
    }

    // ── accessors ────────────────────────────────────────────────────────────

    #[inline]
    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    #[inline]
    pub fn visuals(&self) -> &[VisualRenderer] {
        &self.visuals
    }

    pub fn visual(&self, name: &str) -> Option<&VisualRenderer> {
        self.lookup.get(name).map(|&i| &self.visuals[i])
    }

    pub fn visual_mut(&mut self, name: &str) -> Option<&mut VisualRenderer> {
        self.lookup.get(name).map(|&i| &mut self.visuals[i])
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[inline]
    pub fn window_size(&self) -> WindowSize {
        self.window
    }

    // ── updates ──────────────────────────────────────────────────────────────

    /// Forwards updates to the visual called `visual`.
    pub fn set_data<K: Into<String>>(&mut self, visual: &str, updates: impl IntoIterator<Item = (K, Value)>) {
        match self.visual_mut(visual) {
            Some(v) => v.set_data(updates),
            None => log::debug!("no visual named '{visual}', update ignored"),
        }
    }

    pub fn set_data_masked(&mut self, visual: &str, name: &str, data: Array, mask: Vec<bool>) {
        match self.visual_mut(visual) {
            Some(v) => v.set_data_masked(name, data, mask),
            None => log::debug!("no visual named '{visual}', update ignored"),
        }
    }

    /// Sets the GL viewport and pushes `viewport` and `window_size` to every visual.
    pub fn resize(&mut self, gl: &mut dyn GpuContext, width: u32, height: u32) {
        let window = WindowSize::new(width, height);
        if !window.is_valid() {
            log::debug!("ignoring resize to {width}x{height}");
            return;
        }

        self.window = window;
        self.viewport = Viewport::for_window(window, self.options.constrain_ratio);
        gl.viewport(0, 0, width, height);

        let Viewport { x, y } = self.viewport;
        for v in &mut self.visuals {
            v.set_data([
                ("viewport", Value::Floats(vec![x, y])),
                ("window_size", Value::Floats(vec![width as f32, height as f32])),
            ]);
        }
    }

    // ── painting ─────────────────────────────────────────────────────────────

    /// Clears and paints every visual.
    ///
    /// Visuals drawing off-screen are painted first, one group per target in
    /// ascending index, each into its own cleared framebuffer. Screen
    /// visuals follow on the cleared window, under the viewport that was in
    /// effect before the first off-screen pass.
    pub fn paint(&mut self, gl: &mut dyn GpuContext) {
        if self.cleaned {
            return;
        }
        let mask = if self.options.depth_enabled() { ClearMask::COLOR_DEPTH } else { ClearMask::COLOR };

        let targets: BTreeSet<usize> = self
            .visuals
            .iter()
            .filter_map(|v| match v.framebuffer_target() {
                FramebufferTarget::Offscreen(k) => Some(k),
                FramebufferTarget::Screen => None,
            })
            .collect();

        if targets.is_empty() {
            gl.clear(mask);
            for v in &mut self.visuals {
                v.paint(gl);
            }
            return;
        }

        let screen = gl.current_viewport();
        for k in targets {
            let Some(target) = self.offscreen_target(k) else {
                if self.warned_targets.insert(k) {
                    log::warn!("no framebuffer declared for off-screen target {k}; its visuals are skipped");
                }
                continue;
            };

            framebuffer::bind(gl, target.framebuffer);
            if let Some((width, height)) = target.size {
                gl.viewport(0, 0, width, height);
            }
            gl.clear(mask);
            self.paint_group(gl, FramebufferTarget::Offscreen(k));
        }

        framebuffer::unbind(gl);
        let (x, y, width, height) = screen;
        gl.viewport(x, y, width, height);
        gl.clear(mask);
        self.paint_group(gl, FramebufferTarget::Screen);
    }

    fn paint_group(&mut self, gl: &mut dyn GpuContext, target: FramebufferTarget) {
        for v in self.visuals.iter_mut().filter(|v| v.framebuffer_target() == target) {
            v.paint(gl);
        }
    }

    /// The `index`-th framebuffer variable across the scene.
    fn offscreen_target(&self, index: usize) -> Option<OffscreenTarget> {
        self.visuals.iter().flat_map(|v| v.offscreen_targets()).nth(index).flatten()
    }

    // ── teardown ─────────────────────────────────────────────────────────────

    /// Cleans every visual, last declared first. Idempotent.
    pub fn cleanup(&mut self, gl: &mut dyn GpuContext) {
        if self.cleaned {
            return;
        }
        for v in self.visuals.iter_mut().rev() {
            v.cleanup(gl);
        }
        self.cleaned = true;
    }
}

fn apply_options(gl: &mut dyn GpuContext, options: &RendererOptions) {
    if options.antialiasing == Some(true) {
        gl.enable(Capability::Multisample);
    }
    if options.sprites == Some(true) {
        gl.enable(Capability::ProgramPointSize);
        gl.enable(Capability::PointSprite);
    }
    if options.transparency_enabled() {
        gl.enable(Capability::Blend);
        let (src, dst) = options.blend_factors();
        gl.blend_func(src, dst);
    }
    if options.depth_enabled() {
        gl.enable(Capability::DepthTest);
        gl.configure_depth(&DepthState::default());
    }
    if let Some(color) = options.background {
        gl.clear_color(color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::AspectConstraint;
    use crate::gpu::{BlendFactor, Call, RecordingContext, UniformCall};
    use crate::paint::Color;
    use crate::scene::{Ndim, PrimitiveType, TextureData, VarType, Variable, Visual};

    const VS: &str = "attribute vec2 position;\nuniform vec2 viewport;\nvoid main() { gl_Position = vec4(position / viewport, 0.0, 1.0); }";
    const FS: &str = "void main() { gl_FragColor = vec4(1.0); }";

    fn points(name: &str, size: usize) -> Visual {
        Visual::new(name, size)
            .shaders(VS, FS)
            .primitive(PrimitiveType::Points)
            .variable(Variable::attribute("position", 2, Some(Array::zeros(size, 2))))
            .variable(Variable::uniform("viewport", VarType::Float, Ndim::Vector(2), Some(Value::from((1.0, 1.0)))))
    }

    /// Screen visual sampling the texture its own framebuffer renders into.
    fn compositor() -> Visual {
        Visual::new("composite", 4)
            .shaders(VS, "uniform sampler2D image;\nvoid main() { gl_FragColor = texture2D(image, vec2(0.5)); }")
            .primitive(PrimitiveType::TriangleStrip)
            .variable(Variable::attribute("position", 2, Some(Array::zeros(4, 2))))
            .variable(Variable::texture("image", Some(TextureData::from_bytes(8, 4, 4, vec![0; 128]))))
            .variable(Variable::framebuffer("fbo", ["image"]))
    }

    fn build(gl: &mut RecordingContext, scene: &Scene) -> SceneRenderer {
        SceneRenderer::new(gl, scene, &RenderConfig::default()).unwrap()
    }

    // ── construction ──────────────────────────────────────────────────────────

    #[test]
    fn absent_options_touch_no_state() {
        let mut gl = RecordingContext::new();
        build(&mut gl, &Scene::new().with_visual(points("a", 10)));
        assert_eq!(
            gl.count(|c| matches!(c, Call::Enable(_) | Call::BlendFunc(..) | Call::Depth(_) | Call::ClearColor(_))),
            0
        );
    }

    #[test]
    fn options_are_applied_once() {
        let mut gl = RecordingContext::new();
        let options = RendererOptions {
            antialiasing: Some(true),
            sprites: Some(true),
            transparency: Some(true),
            activate_3d: Some(true),
            background: Some(Color::white()),
            ..RendererOptions::default()
        };
        build(&mut gl, &Scene::new().with_options(options));

        let state: Vec<&Call> = gl
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Enable(_) | Call::BlendFunc(..) | Call::Depth(_) | Call::ClearColor(_)))
            .collect();
        assert_eq!(
            state,
            vec![
                &Call::Enable(Capability::Multisample),
                &Call::Enable(Capability::ProgramPointSize),
                &Call::Enable(Capability::PointSprite),
                &Call::Enable(Capability::Blend),
                &Call::BlendFunc(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha),
                &Call::Enable(Capability::DepthTest),
                &Call::Depth(DepthState::default()),
                &Call::ClearColor(Color::white()),
            ]
        );
    }

    #[test]
    fn custom_blend_func_is_used() {
        let mut gl = RecordingContext::new();
        let options = RendererOptions {
            transparency: Some(true),
            blend_func: Some((BlendFactor::One, BlendFactor::One)),
            ..RendererOptions::default()
        };
        build(&mut gl, &Scene::new().with_options(options));
        assert!(gl.calls().contains(&Call::BlendFunc(BlendFactor::One, BlendFactor::One)));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut gl = RecordingContext::new();
        let scene = Scene::new().with_visual(points("a", 10)).with_visual(points("a", 5));

        let err = SceneRenderer::new(&mut gl, &scene, &RenderConfig::default()).unwrap_err();
        assert!(matches!(err, RenderError::DuplicateVisual(ref name) if name == "a"));
        assert!(gl.live_programs().is_empty());
        assert!(gl.live_buffers().is_empty());
    }

    #[test]
    fn references_resolve_against_earlier_visuals_only() {
        let mut gl = RecordingContext::new();
        let nodes = Visual::new("nodes", 10)
            .shaders(VS, FS)
            .variable(Variable::attribute_ref("position", 2, VariableRef::new("curve", "position")));

        let forward = Scene::new().with_visual(nodes.clone()).with_visual(points("curve", 10));
        let err = SceneRenderer::new(&mut gl, &forward, &RenderConfig::default()).unwrap_err();
        assert!(matches!(err, RenderError::UnresolvedReference { .. }));

        let mut gl = RecordingContext::new();
        let scene = Scene::new().with_visual(points("curve", 10)).with_visual(nodes);
        let r = build(&mut gl, &scene);
        assert_eq!(
            r.visual("nodes").unwrap().attribute_buffers("position"),
            r.visual("curve").unwrap().attribute_buffers("position")
        );
    }

    // ── paint ─────────────────────────────────────────────────────────────────

    #[test]
    fn without_targets_one_clear_paints_everything() {
        let mut gl = RecordingContext::new();
        let mut r = build(&mut gl, &Scene::new().with_visual(points("a", 10)).with_visual(points("b", 10)));
        gl.clear_calls();

        r.paint(&mut gl);
        assert_eq!(gl.count(|c| matches!(c, Call::Clear(_))), 1);
        assert_eq!(gl.draw_calls().len(), 2);
        assert_eq!(gl.count(|c| matches!(c, Call::BindFramebuffer(_))), 0);
    }

    #[test]
    fn point_cloud_scene_draws_two_slices() {
        let mut gl = RecordingContext::new();
        let mut r = build(&mut gl, &Scene::new().with_visual(points("cloud", 100_000)));
        gl.clear_calls();

        r.paint(&mut gl);
        assert_eq!(
            gl.draw_calls(),
            vec![
                &Call::DrawArrays { primitive: PrimitiveType::Points, first: 0, count: 65_001 },
                &Call::DrawArrays { primitive: PrimitiveType::Points, first: 0, count: 35_000 },
            ]
        );
    }

    #[test]
    fn offscreen_visuals_are_grouped_per_target() {
        let mut gl = RecordingContext::new();
        let scene = Scene::new()
            .with_visual(points("a", 10).framebuffer(FramebufferTarget::Offscreen(0)))
            .with_visual(points("b", 10).framebuffer(FramebufferTarget::Offscreen(0)))
            .with_visual(compositor());
        let mut r = build(&mut gl, &scene);
        r.resize(&mut gl, 640, 480);
        gl.clear_calls();

        r.paint(&mut gl);
        let calls = gl.calls();

        let clears: Vec<usize> =
            calls.iter().enumerate().filter(|(_, c)| matches!(c, Call::Clear(_))).map(|(i, _)| i).collect();
        assert_eq!(clears.len(), 2);

        let draws: Vec<usize> = calls.iter().enumerate().filter(|(_, c)| c.is_draw()).map(|(i, _)| i).collect();
        assert_eq!(draws.len(), 3);
        assert!(draws[..2].iter().all(|&d| clears[0] < d && d < clears[1]));
        assert!(clears[1] < draws[2]);

        let fbo = r.visual("composite").unwrap().offscreen_targets().next().flatten().unwrap();
        assert_eq!(calls[clears[0] - 2], Call::BindFramebuffer(Some(fbo.framebuffer)));
        assert_eq!(calls[clears[0] - 1], Call::Viewport { x: 0, y: 0, width: 8, height: 4 });
        assert_eq!(calls[clears[1] - 2], Call::BindFramebuffer(None));
        assert_eq!(calls[clears[1] - 1], Call::Viewport { x: 0, y: 0, width: 640, height: 480 });
    }

    #[test]
    fn screen_viewport_survives_offscreen_pass_before_resize() {
        let mut gl = RecordingContext::new();
        gl.viewport(0, 0, 320, 240);
        let scene = Scene::new()
            .with_visual(points("a", 10).framebuffer(FramebufferTarget::Offscreen(0)))
            .with_visual(compositor());
        let mut r = build(&mut gl, &scene);
        gl.clear_calls();

        r.paint(&mut gl);
        let viewports: Vec<&Call> = gl.calls().iter().filter(|c| matches!(c, Call::Viewport { .. })).collect();
        assert_eq!(
            viewports,
            vec![
                &Call::Viewport { x: 0, y: 0, width: 8, height: 4 },
                &Call::Viewport { x: 0, y: 0, width: 320, height: 240 },
            ]
        );
        assert_eq!(gl.current_viewport(), (0, 0, 320, 240));
    }

    #[test]
    fn refused_framebuffer_skips_its_group() {
        let mut gl = RecordingContext::new();
        gl.set_fail_framebuffers(true);
        let scene = Scene::new()
            .with_visual(points("hidden", 10).framebuffer(FramebufferTarget::Offscreen(0)))
            .with_visual(compositor());
        let mut r = build(&mut gl, &scene);
        assert_eq!(r.visual("composite").unwrap().offscreen_targets().collect::<Vec<_>>(), vec![None]);
        gl.clear_calls();

        r.paint(&mut gl);
        assert_eq!(gl.draw_calls().len(), 1);
        assert_eq!(gl.count(|c| matches!(c, Call::Clear(_))), 1);
        assert_eq!(gl.count(|c| matches!(c, Call::BindFramebuffer(Some(_)))), 0);
    }

    #[test]
    fn missing_target_is_skipped() {
        let mut gl = RecordingContext::new();
        let scene = Scene::new()
            .with_visual(points("lost", 10).framebuffer(FramebufferTarget::Offscreen(3)))
            .with_visual(points("shown", 10));
        let mut r = build(&mut gl, &scene);
        gl.clear_calls();

        r.paint(&mut gl);
        r.paint(&mut gl);
        assert_eq!(gl.draw_calls().len(), 2);
        assert_eq!(gl.count(|c| matches!(c, Call::Clear(_))), 2);
    }

    #[test]
    fn depth_is_cleared_in_3d() {
        let mut gl = RecordingContext::new();
        let options = RendererOptions { activate_3d: Some(true), ..RendererOptions::default() };
        let mut r = build(&mut gl, &Scene::new().with_options(options).with_visual(points("a", 3)));
        r.paint(&mut gl);
        assert!(gl.calls().contains(&Call::Clear(ClearMask::COLOR_DEPTH)));
    }

    #[test]
    fn set_data_reaches_named_visual() {
        let mut gl = RecordingContext::new();
        let mut r = build(&mut gl, &Scene::new().with_visual(points("a", 3)).with_visual(points("b", 3)));

        r.set_data("b", [("visible", Value::Bool(false))]);
        r.set_data("nobody", [("visible", Value::Bool(false))]);
        assert!(r.visual("a").unwrap().is_visible());
        assert!(!r.visual("b").unwrap().is_visible());
    }

    // ── resize ────────────────────────────────────────────────────────────────

    #[test]
    fn resize_pushes_viewport_to_visuals() {
        let mut gl = RecordingContext::new();
        let options = RendererOptions { constrain_ratio: Some(AspectConstraint::Square), ..RendererOptions::default() };
        let mut r = build(&mut gl, &Scene::new().with_options(options).with_visual(points("a", 3)));
        r.paint(&mut gl);
        gl.clear_calls();

        r.resize(&mut gl, 200, 100);
        assert_eq!(r.viewport(), Viewport::new(2.0, 1.0));
        assert_eq!(gl.calls(), &[Call::Viewport { x: 0, y: 0, width: 200, height: 100 }]);

        r.paint(&mut gl);
        assert!(gl.calls().iter().any(|c| matches!(c, Call::Uniform(_, UniformCall::FloatVec(v)) if v == &vec![2.0, 1.0])));
        assert_eq!(r.visual("a").unwrap().uniform_value("viewport"), Some(&Value::Floats(vec![2.0, 1.0])));
    }

    #[test]
    fn degenerate_resize_is_ignored() {
        let mut gl = RecordingContext::new();
        let mut r = build(&mut gl, &Scene::new().with_visual(points("a", 3)));
        gl.clear_calls();

        r.resize(&mut gl, 0, 100);
        assert!(gl.calls().is_empty());
        assert_eq!(r.window_size(), WindowSize::default());
    }

    // ── cleanup ───────────────────────────────────────────────────────────────

    #[test]
    fn cleanup_runs_in_reverse_and_once() {
        let mut gl = RecordingContext::new();
        let mut r = build(&mut gl, &Scene::new().with_visual(points("first", 3)).with_visual(points("second", 3)));
        let first = r.visual("first").unwrap().program().id();
        let second = r.visual("second").unwrap().program().id();
        gl.clear_calls();

        r.cleanup(&mut gl);
        let deleted: Vec<&Call> = gl.calls().iter().filter(|c| matches!(c, Call::DeleteProgram(_))).collect();
        assert_eq!(deleted, vec![&Call::DeleteProgram(second), &Call::DeleteProgram(first)]);
        assert!(gl.live_buffers().is_empty());

        gl.clear_calls();
        r.cleanup(&mut gl);
        r.paint(&mut gl);
        assert!(gl.calls().is_empty());
    }
}

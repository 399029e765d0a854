use std::collections::HashMap;

use crate::attribute::SlicedAttribute;
use crate::gpu::texture::{self, TextureInfo};
use crate::gpu::uniform::{self, UniformShape};
use crate::gpu::{
    buffer, draw, framebuffer, BufferId, FramebufferId, GpuContext, Ownership, TextureId, TextureParams,
    UniformCall, UniformLocation,
};
use crate::scene::{
    Array, CompoundFn, FramebufferTarget, PrimitiveType, Source, TextureData, Value, Variable, VariableKind,
    VariableRef, VariableSpec, Visual,
};
use crate::shader::ShaderProgram;
use crate::slicing::{Bounds, Slicer};
use crate::RenderError;

use super::config::RenderConfig;

/// Lifecycle of a [`VisualRenderer`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RendererState {
    Uninitialized,
    /// Every variable has its GPU binding; initial data not uploaded yet.
    VariablesBound,
    Ready,
    CleanedUp,
}

/// A GPU resource that a later visual may alias.
#[derive(Debug, Clone, PartialEq)]
pub enum SharedResource {
    /// One buffer per slice of the owning attribute.
    Buffers(Vec<BufferId>),
    Texture { texture: TextureId, info: Option<TextureInfo> },
}

/// Looks up resources of already-built visuals.
pub type Resolver<'a> = dyn Fn(&VariableRef) -> Option<SharedResource> + 'a;

/// An off-screen target declared by a visual.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OffscreenTarget {
    pub framebuffer: FramebufferId,
    /// Size of the first attached texture.
    pub size: Option<(u32, u32)>,
}

// ── bindings ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct UniformBinding {
    shape: UniformShape,
    location: Option<UniformLocation>,
    value: Option<Value>,
}

#[derive(Debug)]
struct TextureBinding {
    handle: Option<Ownership<TextureId>>,
    info: Option<TextureInfo>,
    params: TextureParams,
    unit: u32,
    sampler: Option<UniformLocation>,
}

#[derive(Debug)]
struct IndexBinding {
    buffer: Option<BufferId>,
    len: usize,
}

#[derive(Debug)]
struct FramebufferBinding {
    handle: Option<FramebufferId>,
    textures: Vec<String>,
    size: Option<(u32, u32)>,
}

#[derive(Debug)]
enum Binding {
    Attribute(SlicedAttribute),
    Uniform(UniformBinding),
    Texture(TextureBinding),
    Index(IndexBinding),
    Varying,
    Compound(CompoundFn),
    Framebuffer(FramebufferBinding),
}

impl Binding {
    fn kind(&self) -> VariableKind {
        match self {
            Binding::Attribute(_) => VariableKind::Attribute,
            Binding::Uniform(_) => VariableKind::Uniform,
            Binding::Texture(_) => VariableKind::Texture,
            Binding::Index(_) => VariableKind::Index,
            Binding::Varying => VariableKind::Varying,
            Binding::Compound(_) => VariableKind::Compound,
            Binding::Framebuffer(_) => VariableKind::Framebuffer,
        }
    }
}

#[derive(Debug)]
struct PendingUpdate {
    value: Value,
    mask: Option<Vec<bool>>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum TextureOutcome {
    Skipped,
    Updated,
    Recreated,
}

// ── renderer ─────────────────────────────────────────────────────────────────

/// GPU-side state and draw logic of one visual.
///
/// Updates are buffered by [`set_data`](Self::set_data) and applied at the
/// start of the next [`paint`](Self::paint), with the program active.
#[derive(Debug)]
pub struct VisualRenderer {
    name: String,
    state: RendererState,

    primitive_type: PrimitiveType,
    visible: bool,
    is_static: bool,
    constrain_ratio: bool,
    constrain_navigation: bool,
    target: FramebufferTarget,

    indexed: bool,
    slicer: Slicer,
    program: ShaderProgram,
    variables: Vec<(String, Binding)>,

    pending: HashMap<String, PendingUpdate>,
    /// Queued `(source, destination)` texture copies.
    copies: Vec<(String, String)>,
    update_samplers: bool,
    blit: Option<FramebufferId>,

    warned_cleaned: bool,
}

impl VisualRenderer {
    /// Compiles the visual's program, binds its variables and uploads initial data.
    ///
    /// `resolve` provides the resources of earlier visuals for reference variables.
    pub fn new(
        gl: &mut dyn GpuContext,
        visual: &Visual,
        config: &RenderConfig,
        resolve: &Resolver<'_>,
    ) -> Result<Self, RenderError> {
        if let Some(bounds) = &visual.bounds {
            Bounds::new(bounds.clone())
                .validate(visual.size)
                .map_err(|reason| RenderError::InvalidBounds { visual: visual.name.clone(), reason })?;
        }

        // Indices address absolute vertices, which slicing would break.
        let indexed = visual.is_indexed();
        let slicer = if indexed {
            Slicer::unsliced(visual.size, visual.bounds.clone())
        } else {
            Slicer::new(visual.size, visual.bounds.clone(), config.max_chunk_size)
        };

        let header = config.header_for(&gl.renderer_info());
        let mut program = ShaderProgram::new(gl, &visual.vertex_shader, &visual.fragment_shader, &header)?;

        let shared = match resolve_references(visual, resolve) {
            Ok(shared) => shared,
            Err(e) => {
                program.delete(gl);
                return Err(e);
            }
        };

        let mut renderer = Self {
            name: visual.name.clone(),
            state: RendererState::Uninitialized,
            primitive_type: visual.primitive_type,
            visible: visual.visible,
            is_static: visual.is_static,
            constrain_ratio: visual.constrain_ratio,
            constrain_navigation: visual.constrain_navigation,
            target: visual.framebuffer,
            indexed,
            slicer,
            program,
            variables: Vec::with_capacity(visual.variables.len()),
            pending: HashMap::new(),
            copies: Vec::new(),
            update_samplers: false,
            blit: None,
            warned_cleaned: false,
        };

        renderer.bind_variables(gl, &visual.variables, shared);
        renderer.load_variables(gl, visual);

        log::debug!(
            "visual '{}' ready: {} vertices, {} slice(s){}",
            renderer.name,
            renderer.slicer.size(),
            renderer.slicer.slice_count(),
            if indexed { ", indexed" } else { "" }
        );
        Ok(renderer)
    }

    /// Builds a visual that references no other visual.
    pub fn standalone(gl: &mut dyn GpuContext, visual: &Visual, config: &RenderConfig) -> Result<Self, RenderError> {
        Self::new(gl, visual, config, &|_| None)
    }

    // ── construction ─────────────────────────────────────────────────────────

    fn bind_variables(
        &mut self,
        gl: &mut dyn GpuContext,
        variables: &[Variable],
        mut shared: HashMap<String, SharedResource>,
    ) {
        let mut unit = 0;

        for v in variables {
            let binding = match &v.spec {
                VariableSpec::Attribute { ndim, .. } => {
                    let location = self.program.attribute_location(gl, &v.name);
                    let ndim = *ndim as usize;
                    match shared.remove(&v.name) {
                        Some(SharedResource::Buffers(buffers)) => {
                            Binding::Attribute(SlicedAttribute::shared(&self.slicer, location, ndim, buffers))
                        }
                        _ => Binding::Attribute(SlicedAttribute::new(gl, &self.slicer, location, ndim)),
                    }
                }
                VariableSpec::Uniform { vartype, ndim, size, .. } => Binding::Uniform(UniformBinding {
                    shape: UniformShape::new(*vartype, *ndim, *size),
                    location: self.program.uniform_location(gl, &v.name),
                    value: None,
                }),
                VariableSpec::Texture { params, .. } => {
                    let (handle, info) = match shared.remove(&v.name) {
                        Some(SharedResource::Texture { texture, info }) => (Some(Ownership::Borrowed(texture)), info),
                        _ => (None, None),
                    };
                    let sampler = self.program.uniform_location(gl, &v.name);
                    let binding = TextureBinding { handle, info, params: *params, unit, sampler };
                    unit += 1;
                    Binding::Texture(binding)
                }
                VariableSpec::Index { .. } => Binding::Index(IndexBinding { buffer: buffer::create(gl), len: 0 }),
                VariableSpec::Varying { .. } => Binding::Varying,
                VariableSpec::Compound { fun, .. } => Binding::Compound(fun.clone()),
                VariableSpec::Framebuffer { textures } => Binding::Framebuffer(FramebufferBinding {
                    handle: None,
                    textures: textures.clone(),
                    size: None,
                }),
            };
            self.variables.push((v.name.clone(), binding));
        }

        self.update_samplers = unit > 0;
        self.state = RendererState::VariablesBound;
    }

    fn load_variables(&mut self, gl: &mut dyn GpuContext, visual: &Visual) {
        let mut initial: Vec<(String, Value)> =
            visual.variables.iter().filter_map(|v| Some((v.name.clone(), initial_value(v)?))).collect();

        for (name, value) in visual.compound_initial_updates() {
            match initial.iter_mut().find(|(n, _)| *n == name) {
                Some(slot) => slot.1 = value,
                None => initial.push((name, value)),
            }
        }

        // Uniforms need an active program, so they wait for the first paint.
        for (name, value) in initial {
            match self.position(&name) {
                Some(index) if self.variables[index].1.kind() != VariableKind::Uniform => {
                    self.apply_update(gl, index, value, None);
                }
                _ => self.queue(name, value, None),
            }
        }

        self.attach_framebuffers(gl, None);
        self.state = RendererState::Ready;
    }

    // ── accessors ────────────────────────────────────────────────────────────

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn state(&self) -> RendererState {
        self.state
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[inline]
    pub fn primitive_type(&self) -> PrimitiveType {
        self.primitive_type
    }

    #[inline]
    pub fn framebuffer_target(&self) -> FramebufferTarget {
        self.target
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    #[inline]
    pub fn constrain_ratio(&self) -> bool {
        self.constrain_ratio
    }

    #[inline]
    pub fn constrain_navigation(&self) -> bool {
        self.constrain_navigation
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    #[inline]
    pub fn slicer(&self) -> &Slicer {
        &self.slicer
    }

    #[inline]
    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    pub fn variable_kind(&self, name: &str) -> Option<VariableKind> {
        self.binding(name).map(Binding::kind)
    }

    /// Number of variables waiting for the next paint.
    pub fn pending_updates(&self) -> usize {
        self.pending.len()
    }

    pub fn has_pending(&self, name: &str) -> bool {
        self.pending.contains_key(name)
    }

    /// Last value applied to a uniform.
    pub fn uniform_value(&self, name: &str) -> Option<&Value> {
        match self.binding(name)? {
            Binding::Uniform(u) => u.value.as_ref(),
            _ => None,
        }
    }

    pub fn attribute_buffers(&self, name: &str) -> Option<&[BufferId]> {
        match self.binding(name)? {
            Binding::Attribute(a) => Some(a.buffers()),
            _ => None,
        }
    }

    pub fn texture(&self, name: &str) -> Option<TextureId> {
        self.texture_handle(name).map(|(id, _)| id)
    }

    /// Number of indices drawn per paint, when indexed.
    pub fn index_count(&self) -> Option<usize> {
        self.variables.iter().find_map(|(_, b)| match b {
            Binding::Index(ix) => Some(ix.len),
            _ => None,
        })
    }

    /// Resource of `name` for aliasing by a later visual.
    pub fn shared_resource(&self, name: &str) -> Option<SharedResource> {
        match self.binding(name)? {
            Binding::Attribute(a) => Some(SharedResource::Buffers(a.buffers().to_vec())),
            Binding::Texture(t) => {
                Some(SharedResource::Texture { texture: *t.handle.as_ref()?.get(), info: t.info })
            }
            _ => None,
        }
    }

    /// Framebuffer variables in declaration order; `None` where creation failed.
    pub fn offscreen_targets(&self) -> impl Iterator<Item = Option<OffscreenTarget>> + '_ {
        self.variables.iter().filter_map(|(_, b)| match b {
            Binding::Framebuffer(fb) => {
                Some(fb.handle.map(|framebuffer| OffscreenTarget { framebuffer, size: fb.size }))
            }
            _ => None,
        })
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|(n, _)| n == name)
    }

    fn binding(&self, name: &str) -> Option<&Binding> {
        self.variables.iter().find(|(n, _)| n == name).map(|(_, b)| b)
    }

    fn texture_handle(&self, name: &str) -> Option<(TextureId, TextureInfo)> {
        match self.binding(name)? {
            Binding::Texture(t) => Some((*t.handle.as_ref()?.get(), t.info?)),
            _ => None,
        }
    }

    // ── updates ──────────────────────────────────────────────────────────────

    /// Queues updates for the next paint.
    ///
    /// Compound variables are expanded first. The reserved keys `visible`,
    /// `size`, `bounds`, `primitive_type`, `constrain_ratio` and
    /// `constrain_navigation` apply immediately. Anything else replaces the
    /// pending value of the named variable; unknown names are ignored.
    pub fn set_data<K: Into<String>>(&mut self, updates: impl IntoIterator<Item = (K, Value)>) {
        for (name, value) in updates {
            let name = name.into();
            let expanded = match self.binding(&name) {
                Some(Binding::Compound(fun)) => fun.expand(&value),
                _ => vec![(name, value)],
            };
            for (name, value) in expanded {
                self.queue(name, value, None);
            }
        }
    }

    /// Queues an attribute update that only uploads rows flagged in `mask`.
    pub fn set_data_masked(&mut self, name: &str, data: Array, mask: Vec<bool>) {
        match self.binding(name) {
            Some(Binding::Attribute(_)) => self.queue(name.to_owned(), Value::Array(data), Some(mask)),
            _ => log::debug!("visual '{}': '{name}' is not an attribute, masked update ignored", self.name),
        }
    }

    fn queue(&mut self, name: String, value: Value, mask: Option<Vec<bool>>) {
        match name.as_str() {
            "visible" => match value.as_bool() {
                Some(visible) => self.visible = visible,
                None => self.ignore(&name, &value),
            },
            "size" => match value.as_usize() {
                Some(size) => self.slicer.set_size(size),
                None => self.ignore(&name, &value),
            },
            "bounds" => match value.to_indices() {
                Some(bounds) => {
                    let end = bounds.last().copied().unwrap_or(0) as usize;
                    match Bounds::new(bounds.clone()).validate(end) {
                        Ok(()) => self.slicer.set_bounds(Some(bounds)),
                        Err(reason) => log::warn!("visual '{}': {reason}; bounds unchanged", self.name),
                    }
                }
                None => self.ignore(&name, &value),
            },
            "primitive_type" => match value {
                Value::Primitive(p) => self.primitive_type = p,
                _ => self.ignore(&name, &value),
            },
            "constrain_ratio" => match value.as_bool() {
                Some(v) => self.constrain_ratio = v,
                None => self.ignore(&name, &value),
            },
            "constrain_navigation" => match value.as_bool() {
                Some(v) => self.constrain_navigation = v,
                None => self.ignore(&name, &value),
            },
            _ if self.position(&name).is_some() => {
                self.pending.insert(name, PendingUpdate { value, mask });
            }
            _ => log::debug!("visual '{}': no variable named '{name}', update ignored", self.name),
        }
    }

    fn ignore(&self, name: &str, value: &Value) {
        log::debug!("visual '{}': cannot apply a {} value to '{name}'", self.name, value.kind_name());
    }

    fn flush_updates(&mut self, gl: &mut dyn GpuContext) {
        if self.pending.is_empty() {
            return;
        }
        let mut pending = std::mem::take(&mut self.pending);

        for index in 0..self.variables.len() {
            let Some(update) = pending.remove(&self.variables[index].0) else {
                continue;
            };
            self.apply_update(gl, index, update.value, update.mask.as_deref());
        }
    }

    fn apply_update(&mut self, gl: &mut dyn GpuContext, index: usize, value: Value, mask: Option<&[bool]>) {
        let mut reattach = None;
        let (name, binding) = &mut self.variables[index];

        match binding {
            Binding::Attribute(attr) => update_attribute(gl, &mut self.slicer, name, attr, &value, mask),
            Binding::Uniform(u) => {
                if let Some(location) = u.location {
                    uniform::load(gl, location, &u.shape, &value);
                }
                u.value = Some(value);
            }
            Binding::Texture(t) => match value {
                Value::CopyTexture(source) => self.copies.push((source, name.clone())),
                Value::Texture(data) => match update_texture(gl, name, t, &data) {
                    TextureOutcome::Skipped => {}
                    TextureOutcome::Updated => self.update_samplers = true,
                    TextureOutcome::Recreated => {
                        self.update_samplers = true;
                        reattach = Some(name.clone());
                    }
                },
                other => log::debug!("texture '{name}': cannot apply a {} value", other.kind_name()),
            },
            Binding::Index(ix) => update_index(gl, name, ix, &value),
            Binding::Varying | Binding::Compound(_) | Binding::Framebuffer(_) => {
                log::debug!("variable '{name}' holds no data, update ignored");
            }
        }

        if let Some(texture) = reattach {
            self.attach_framebuffers(gl, Some(&texture));
        }
    }

    /// (Re)attaches textures of framebuffer variables, creating the
    /// framebuffers on first use. With `texture`, only framebuffers that
    /// output to it are touched.
    fn attach_framebuffers(&mut self, gl: &mut dyn GpuContext, texture: Option<&str>) {
        for index in 0..self.variables.len() {
            let names = match &self.variables[index].1 {
                Binding::Framebuffer(fb) if texture.is_none_or(|t| fb.textures.iter().any(|n| n == t)) => {
                    fb.textures.clone()
                }
                _ => continue,
            };

            let mut ids = Vec::with_capacity(names.len());
            let mut size = None;
            for n in &names {
                match self.texture_handle(n) {
                    Some((id, info)) => {
                        ids.push(id);
                        size.get_or_insert((info.width, info.height));
                    }
                    None => log::warn!("visual '{}': framebuffer texture '{n}' has no storage", self.name),
                }
            }

            let Binding::Framebuffer(fb) = &mut self.variables[index].1 else {
                continue;
            };
            if fb.handle.is_none() {
                fb.handle = framebuffer::create(gl);
            }
            if let Some(handle) = fb.handle {
                framebuffer::attach(gl, handle, &ids);
                fb.size = size;
            }
        }
    }

    // ── painting ─────────────────────────────────────────────────────────────

    /// Applies pending updates and draws the visual.
    pub fn paint(&mut self, gl: &mut dyn GpuContext) {
        match self.state {
            RendererState::Ready => {}
            RendererState::CleanedUp => {
                if !self.warned_cleaned {
                    log::warn!("visual '{}' was cleaned up and cannot be painted", self.name);
                    self.warned_cleaned = true;
                }
                return;
            }
            _ => return,
        }
        if !self.visible {
            return;
        }

        self.program.activate(gl);
        self.flush_updates(gl);
        self.realign_attributes(gl);
        self.bind_textures(gl);

        if !self.attributes_cover_slices() {
            log::debug!(
                "visual '{}': attribute buffers do not cover its {} slice(s), nothing drawn",
                self.name,
                self.slicer.slice_count()
            );
        } else if self.indexed {
            self.draw_indexed(gl);
        } else {
            self.draw_slices(gl);
        }

        self.copy_textures(gl);
        self.program.deactivate(gl);
    }

    /// Reallocates owned attributes left on an old slice layout by a `size`
    /// change that brought no data for them.
    fn realign_attributes(&mut self, gl: &mut dyn GpuContext) {
        for (name, binding) in &mut self.variables {
            let Binding::Attribute(attr) = binding else {
                continue;
            };
            if attr.is_shared() || attr.matches(&self.slicer) {
                continue;
            }
            log::debug!("visual '{}': '{name}' reallocated for {} vertices", self.name, self.slicer.size());
            attr.reallocate(gl, &self.slicer);
        }
    }

    /// Every attribute the shader reads has one buffer per current slice.
    fn attributes_cover_slices(&self) -> bool {
        let slices = self.slicer.slice_count();
        self.variables.iter().all(|(_, binding)| match binding {
            Binding::Attribute(attr) => {
                attr.location().is_none() || (attr.matches(&self.slicer) && attr.buffers().len() == slices)
            }
            _ => true,
        })
    }

    fn bind_textures(&mut self, gl: &mut dyn GpuContext) {
        for (name, binding) in &self.variables {
            let Binding::Texture(t) = binding else {
                continue;
            };
            let Some(handle) = &t.handle else {
                log::debug!("visual '{}': texture '{name}' has no storage, not bound", self.name);
                continue;
            };
            texture::bind(gl, t.unit, *handle.get());
            if self.update_samplers {
                if let Some(sampler) = t.sampler {
                    gl.upload_uniform(sampler, &UniformCall::Int(t.unit as i32));
                }
            }
        }
        self.update_samplers = false;
    }

    fn bind_attributes(&self, gl: &mut dyn GpuContext, slice: usize) {
        for (_, binding) in &self.variables {
            if let Binding::Attribute(attr) = binding {
                attr.bind(gl, slice);
            }
        }
    }

    fn draw_slices(&self, gl: &mut dyn GpuContext) {
        for index in 0..self.slicer.slice_count() {
            let Some(bounds) = self.slicer.local_bounds(index) else {
                continue;
            };
            self.bind_attributes(gl, index);
            draw::draw_bounds(gl, self.primitive_type, bounds);
        }
    }

    fn draw_indexed(&self, gl: &mut dyn GpuContext) {
        let index = self.variables.iter().find_map(|(_, b)| match b {
            Binding::Index(IndexBinding { buffer: Some(buffer), len }) => Some((*buffer, *len)),
            _ => None,
        });
        let Some((buffer, len)) = index else {
            log::debug!("visual '{}': index buffer unavailable, nothing drawn", self.name);
            return;
        };

        self.bind_attributes(gl, 0);
        buffer::bind_index(gl, buffer);
        draw::draw_indexed(gl, self.primitive_type, len as u32);
    }

    fn copy_textures(&mut self, gl: &mut dyn GpuContext) {
        if self.copies.is_empty() {
            return;
        }
        let copies = std::mem::take(&mut self.copies);

        if self.blit.is_none() {
            self.blit = framebuffer::create(gl);
        }
        let Some(blit) = self.blit else {
            return;
        };

        for (source, destination) in copies {
            let (Some((src, src_info)), Some((dst, dst_info))) =
                (self.texture_handle(&source), self.texture_handle(&destination))
            else {
                log::debug!("visual '{}': cannot copy '{source}' into '{destination}'", self.name);
                continue;
            };
            let size = (src_info.width.min(dst_info.width), src_info.height.min(dst_info.height));
            texture::copy(gl, blit, src, dst, size);
        }
    }

    // ── teardown ─────────────────────────────────────────────────────────────

    /// Frees every owned GPU resource. Idempotent.
    pub fn cleanup(&mut self, gl: &mut dyn GpuContext) {
        if self.state == RendererState::CleanedUp {
            return;
        }

        for (_, binding) in &mut self.variables {
            match binding {
                Binding::Attribute(attr) => attr.delete(gl),
                Binding::Texture(t) => {
                    if let Some(Ownership::Owned(texture)) = t.handle.take() {
                        texture::delete(gl, &[texture]);
                    }
                }
                Binding::Index(ix) => {
                    if let Some(b) = ix.buffer.take() {
                        buffer::delete(gl, &[b]);
                    }
                }
                Binding::Framebuffer(fb) => {
                    if let Some(f) = fb.handle.take() {
                        framebuffer::delete(gl, &[f]);
                    }
                }
                Binding::Uniform(_) | Binding::Varying | Binding::Compound(_) => {}
            }
        }
        if let Some(blit) = self.blit.take() {
            framebuffer::delete(gl, &[blit]);
        }
        self.program.delete(gl);

        self.pending.clear();
        self.copies.clear();
        self.state = RendererState::CleanedUp;
    }
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn resolve_references(
    visual: &Visual,
    resolve: &Resolver<'_>,
) -> Result<HashMap<String, SharedResource>, RenderError> {
    let mut shared = HashMap::new();

    for v in &visual.variables {
        let Some(target) = v.reference() else {
            continue;
        };
        let resource = resolve(target).filter(|r| {
            matches!(
                (v.kind(), r),
                (VariableKind::Attribute, SharedResource::Buffers(_))
                    | (VariableKind::Texture, SharedResource::Texture { .. })
            )
        });
        let Some(resource) = resource else {
            return Err(RenderError::UnresolvedReference {
                visual: visual.name.clone(),
                variable: v.name.clone(),
                target: target.clone(),
            });
        };
        shared.insert(v.name.clone(), resource);
    }

    Ok(shared)
}

fn initial_value(v: &Variable) -> Option<Value> {
    match &v.spec {
        VariableSpec::Attribute { data: Source::Data(a), .. } => Some(Value::Array(a.clone())),
        VariableSpec::Uniform { data, .. } => data.clone(),
        VariableSpec::Texture { data: Source::Data(t), .. } => Some(Value::Texture(t.clone())),
        VariableSpec::Index { data } => Some(Value::Indices(data.clone())),
        _ => None,
    }
}

fn update_attribute(
    gl: &mut dyn GpuContext,
    slicer: &mut Slicer,
    name: &str,
    attr: &mut SlicedAttribute,
    value: &Value,
    mask: Option<&[bool]>,
) {
    if attr.is_shared() {
        log::warn!("attribute '{name}' aliases another visual's buffers; update the owning visual instead");
        return;
    }
    let Some(data) = value.to_array(attr.ndim()) else {
        log::debug!("attribute '{name}': {} value does not fit {} components", value.kind_name(), attr.ndim());
        return;
    };

    if data.rows() != slicer.size() {
        slicer.set_size(data.rows());
    }
    if attr.matches(slicer) {
        attr.update(gl, &data, mask);
    } else {
        attr.rebuild(gl, slicer, &data);
    }
}

fn update_texture(
    gl: &mut dyn GpuContext,
    name: &str,
    binding: &mut TextureBinding,
    data: &TextureData,
) -> TextureOutcome {
    if matches!(binding.handle, Some(Ownership::Borrowed(_))) {
        log::warn!("texture '{name}' aliases another visual's texture; update the owning visual instead");
        return TextureOutcome::Skipped;
    }
    let Some(info) = texture::info(data) else {
        log::debug!("texture '{name}': invalid data, update ignored");
        return TextureOutcome::Skipped;
    };

    match (binding.handle.as_ref().map(|h| *h.get()), binding.info) {
        (Some(texture), Some(current)) if current == info => {
            gl.bind_texture(Some(texture));
            texture::update(gl, &info, data, &binding.params);
            TextureOutcome::Updated
        }
        (existing, _) => {
            if let Some(old) = existing {
                texture::delete(gl, &[old]);
            }
            binding.handle = None;
            binding.info = None;

            let Some(texture) = texture::create(gl, &binding.params) else {
                return TextureOutcome::Skipped;
            };
            texture::load(gl, &info, data, &binding.params);
            binding.handle = Some(Ownership::Owned(texture));
            binding.info = Some(info);
            TextureOutcome::Recreated
        }
    }
}

fn update_index(gl: &mut dyn GpuContext, name: &str, binding: &mut IndexBinding, value: &Value) {
    let Some(indices) = value.to_indices() else {
        log::debug!("index '{name}': cannot apply a {} value", value.kind_name());
        return;
    };
    if binding.buffer.is_none() {
        binding.buffer = buffer::create(gl);
    }
    let Some(b) = binding.buffer else {
        return;
    };

    buffer::bind_index(gl, b);
    buffer::load_indices(gl, &indices);
    binding.len = indices.len();
}

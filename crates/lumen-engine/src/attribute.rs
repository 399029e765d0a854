//! Sliced vertex attributes.
//!
//! One attribute of a visual is stored as one GPU buffer per slice. Updates
//! upload only the rows between the first and last dirty vertex of each
//! touched slice. When the slice layout changes the buffers are rebuilt.

use crate::gpu::{buffer, AttributeLocation, BufferId, GpuContext, Ownership};
use crate::scene::Array;
use crate::slicing::{Slice, Slicer};

/// First and last dirty row of `slice`, relative to the slice start.
///
/// No mask means every row is dirty. Mask entries past its end count as clean.
pub fn dirty_span(mask: Option<&[bool]>, slice: Slice) -> Option<(usize, usize)> {
    if slice.len == 0 {
        return None;
    }
    let Some(mask) = mask else {
        return Some((0, slice.len - 1));
    };

    let end = slice.end().min(mask.len());
    let start = slice.offset.min(end);
    let window = &mask[start..end];

    let first = window.iter().position(|&d| d)?;
    let last = window.iter().rposition(|&d| d)?;
    Some((first, last))
}

/// GPU storage of one attribute, split along the visual's slices.
#[derive(Debug)]
pub struct SlicedAttribute {
    location: Option<AttributeLocation>,
    ndim: usize,
    buffers: Ownership<Vec<BufferId>>,
    layout: Vec<Slice>,
    loaded: bool,
}

impl SlicedAttribute {
    /// Allocates one buffer per slice of `slicer`.
    ///
    /// When the driver refuses a buffer, none are kept and the attribute
    /// silently draws nothing.
    pub fn new(gl: &mut dyn GpuContext, slicer: &Slicer, location: Option<AttributeLocation>, ndim: usize) -> Self {
        let buffers = create_buffers(gl, slicer.slice_count());
        Self { location, ndim, buffers: Ownership::Owned(buffers), layout: slicer.slices().to_vec(), loaded: false }
    }

    /// Wraps buffers owned by another visual.
    pub fn shared(slicer: &Slicer, location: Option<AttributeLocation>, ndim: usize, buffers: Vec<BufferId>) -> Self {
        Self { location, ndim, buffers: Ownership::Borrowed(buffers), layout: slicer.slices().to_vec(), loaded: true }
    }

    #[inline]
    pub fn location(&self) -> Option<AttributeLocation> {
        self.location
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    #[inline]
    pub fn buffers(&self) -> &[BufferId] {
        self.buffers.get()
    }

    #[inline]
    pub fn is_shared(&self) -> bool {
        !self.buffers.is_owned()
    }

    /// False until the buffers received a full upload.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// True when the buffers were laid out for the slicer's current slices.
    pub fn matches(&self, slicer: &Slicer) -> bool {
        self.layout == slicer.slices()
    }

    /// Uploads `data` in full, one slice per buffer.
    pub fn load(&mut self, gl: &mut dyn GpuContext, data: &Array) {
        for (&buffer, slice) in self.buffers().iter().zip(&self.layout) {
            buffer::bind(gl, buffer, self.location);
            buffer::load(gl, data.rows_slice(slice.offset, slice.end()));
        }
        self.loaded = true;
    }

    /// Uploads the dirty rows of `data`, at most one sub-upload per slice.
    ///
    /// Buffers that never received a full upload are loaded whole instead.
    pub fn update(&mut self, gl: &mut dyn GpuContext, data: &Array, mask: Option<&[bool]>) {
        if !self.loaded {
            self.load(gl, data);
            return;
        }
        for (&buffer, &slice) in self.buffers().iter().zip(&self.layout) {
            let Some((first, last)) = dirty_span(mask, slice) else {
                continue;
            };
            let rows = data.rows_slice(slice.offset + first, slice.offset + last + 1);
            buffer::bind(gl, buffer, self.location);
            buffer::update(gl, rows, first, self.ndim);
        }
    }

    /// Frees the current buffers and reallocates them for `slicer`, then loads `data`.
    pub fn rebuild(&mut self, gl: &mut dyn GpuContext, slicer: &Slicer, data: &Array) {
        let Some(buffers) = self.buffers.owned_mut() else {
            log::warn!("cannot resize an attribute whose buffers belong to another visual");
            return;
        };

        buffer::delete(gl, buffers);
        *buffers = create_buffers(gl, slicer.slice_count());
        self.loaded = false;
        self.layout = slicer.slices().to_vec();
        self.load(gl, data);
    }

    /// Replaces the buffers with zero-filled ones laid out for `slicer`.
    pub fn reallocate(&mut self, gl: &mut dyn GpuContext, slicer: &Slicer) {
        self.rebuild(gl, slicer, &Array::zeros(slicer.size(), self.ndim));
    }

    /// Binds the buffer of `slice` and points the attribute at it.
    ///
    /// Skipped when the shader does not use the attribute or the slice has no buffer.
    pub fn bind(&self, gl: &mut dyn GpuContext, slice: usize) {
        let Some(location) = self.location else {
            return;
        };
        let Some(&buffer) = self.buffers().get(slice) else {
            return;
        };
        buffer::bind(gl, buffer, Some(location));
        buffer::set_attribute(gl, location, self.ndim);
    }

    /// Frees owned buffers. Shared buffers are left to their owner.
    pub fn delete(&mut self, gl: &mut dyn GpuContext) {
        if let Some(buffers) = self.buffers.owned_mut() {
            buffer::delete(gl, buffers);
            buffers.clear();
        }
    }
}

fn create_buffers(gl: &mut dyn GpuContext, count: usize) -> Vec<BufferId> {
    let mut buffers = Vec::with_capacity(count);
    for _ in 0..count {
        match buffer::create(gl) {
            Some(b) => buffers.push(b),
            None => {
                buffer::delete(gl, &buffers);
                return Vec::new();
            }
        }
    }
    buffers
}

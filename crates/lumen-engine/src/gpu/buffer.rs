//! Vertex and index buffer procedures.
//!
//! Attribute data is always tightly packed `f32`, indices are `u32`.

use super::context::{BufferTarget, BufferUsage, GpuContext};
use super::handle::{AttributeLocation, BufferId};

const F32_SIZE: usize = size_of::<f32>();

/// Creates one buffer, logging a refusal.
pub fn create(gl: &mut dyn GpuContext) -> Option<BufferId> {
    let buffer = gl.create_buffer();
    if buffer.is_none() {
        log::warn!("driver refused to create a buffer");
    }
    buffer
}

/// Binds an attribute buffer and enables `location`, if any.
pub fn bind(gl: &mut dyn GpuContext, buffer: BufferId, location: Option<AttributeLocation>) {
    gl.bind_buffer(BufferTarget::Array, Some(buffer));
    if let Some(location) = location {
        gl.enable_vertex_attrib(location);
    }
}

pub fn bind_index(gl: &mut dyn GpuContext, buffer: BufferId) {
    gl.bind_buffer(BufferTarget::Index, Some(buffer));
}

/// Points `location` at the bound buffer with `ndim` components per vertex.
pub fn set_attribute(gl: &mut dyn GpuContext, location: AttributeLocation, ndim: usize) {
    gl.vertex_attrib_pointer(location, ndim.clamp(1, 4) as u8);
}

/// Uploads the whole bound attribute buffer.
pub fn load(gl: &mut dyn GpuContext, data: &[f32]) {
    gl.buffer_data(BufferTarget::Array, bytemuck::cast_slice(data), BufferUsage::Dynamic);
}

/// Uploads the whole bound index buffer.
pub fn load_indices(gl: &mut dyn GpuContext, data: &[u32]) {
    gl.buffer_data(BufferTarget::Index, bytemuck::cast_slice(data), BufferUsage::Dynamic);
}

/// Overwrites rows of the bound attribute buffer, starting at `row_offset`.
pub fn update(gl: &mut dyn GpuContext, data: &[f32], row_offset: usize, row_stride: usize) {
    let byte_offset = row_offset * row_stride * F32_SIZE;
    gl.buffer_sub_data(BufferTarget::Array, byte_offset, bytemuck::cast_slice(data));
}

pub fn delete(gl: &mut dyn GpuContext, buffers: &[BufferId]) {
    for &buffer in buffers {
        gl.delete_buffer(buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{Call, RecordingContext};

    #[test]
    fn update_offset_is_in_bytes() {
        let mut gl = RecordingContext::new();
        let b = create(&mut gl).unwrap();
        bind(&mut gl, b, None);
        update(&mut gl, &[0.0; 6], 500, 3);

        let sub = gl.calls().iter().find_map(|c| match c {
            Call::BufferSubData { byte_offset, len, .. } => Some((*byte_offset, *len)),
            _ => None,
        });
        assert_eq!(sub, Some((500 * 3 * 4, 24)));
    }

    #[test]
    fn bind_enables_location_only_when_present() {
        let mut gl = RecordingContext::new();
        let b = create(&mut gl).unwrap();

        bind(&mut gl, b, None);
        assert_eq!(gl.count(|c| matches!(c, Call::EnableVertexAttrib(_))), 0);

        bind(&mut gl, b, Some(AttributeLocation(2)));
        assert!(gl.calls().contains(&Call::EnableVertexAttrib(AttributeLocation(2))));
    }

    #[test]
    fn refused_creation_is_none() {
        let mut gl = RecordingContext::new();
        gl.set_fail_buffers(true);
        assert!(create(&mut gl).is_none());
    }
}

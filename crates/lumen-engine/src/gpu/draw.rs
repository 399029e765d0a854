//! Draw-call procedures.

use crate::scene::PrimitiveType;

use super::context::GpuContext;

pub fn draw_arrays(gl: &mut dyn GpuContext, primitive: PrimitiveType, first: u32, count: u32) {
    gl.draw_arrays(primitive, first, count);
}

/// One draw per primitive delimited by consecutive `bounds`.
pub fn draw_multi_arrays(gl: &mut dyn GpuContext, primitive: PrimitiveType, bounds: &[u32]) {
    let (first, count): (Vec<u32>, Vec<u32>) = bounds.windows(2).map(|w| (w[0], w[1] - w[0])).unzip();
    if !first.is_empty() {
        gl.multi_draw_arrays(primitive, &first, &count);
    }
}

pub fn draw_indexed(gl: &mut dyn GpuContext, primitive: PrimitiveType, count: u32) {
    gl.draw_elements(primitive, count);
}

/// Draws the vertices delimited by local `bounds`.
///
/// Two bounds make a single primitive and a plain draw; more make a multi-draw.
pub fn draw_bounds(gl: &mut dyn GpuContext, primitive: PrimitiveType, bounds: &[u32]) {
    match bounds {
        [] | [_] => {}
        [first, last] => draw_arrays(gl, primitive, *first, last - first),
        _ => draw_multi_arrays(gl, primitive, bounds),
    }
}

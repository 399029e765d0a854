//! Ready-made compound functions.

use super::value::{Array, Value};
use super::variable::CompoundFn;

/// Expands `[x0, y0, x1, y1]` into the four corners of a rectangle, ordered
/// for a triangle strip, and writes them to `target`. Corners are sorted so
/// the strip always starts at the lower-left one.
///
/// Values with more than four components are read as one rectangle per four
/// values and produce four vertices each.
pub fn rectangle_coordinates(target: &str) -> CompoundFn {
    let target = target.to_owned();
    CompoundFn::new(move |value| {
        let Some(flat) = value.to_floats() else {
            log::debug!("rectangle coordinates: unsupported {} value", value.kind_name());
            return Vec::new();
        };

        let corners: Vec<[f32; 2]> = flat
            .chunks_exact(4)
            .flat_map(|r| {
                let (x0, x1) = (r[0].min(r[2]), r[0].max(r[2]));
                let (y0, y1) = (r[1].min(r[3]), r[1].max(r[3]));
                [[x0, y0], [x1, y0], [x0, y1], [x1, y1]]
            })
            .collect();

        vec![(target.clone(), Value::Array(Array::from_rows(&corners)))]
    })
}

//! Uniform upload dispatch.
//!
//! The declared `(vartype, ndim, size)` picks the native entry point:
//! matrices use the matrix call, sized uniforms use the array calls, and
//! everything else is a scalar or vector upload.

use crate::scene::{Ndim, VarType, Value};

use super::context::{GpuContext, UniformCall};
use super::handle::UniformLocation;

/// Declared shape of a uniform variable.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UniformShape {
    pub vartype: VarType,
    pub ndim: Ndim,
    pub size: Option<usize>,
}

impl UniformShape {
    pub fn new(vartype: VarType, ndim: Ndim, size: Option<usize>) -> Self {
        Self { vartype, ndim, size }
    }

    /// Number of scalars one upload carries.
    pub fn expected_len(&self) -> usize {
        self.ndim.components() * self.size.unwrap_or(1)
    }
}

/// Shapes `value` for upload. `None` when the value does not fit the declaration.
pub fn prepare(shape: &UniformShape, value: &Value) -> Option<UniformCall> {
    let is_float = shape.vartype == VarType::Float;
    let components = shape.ndim.components() as u8;

    let call = match (shape.ndim, shape.size.is_some(), is_float) {
        (Ndim::Matrix(rows, cols), _, _) => UniformCall::Matrix { rows, cols, data: value.to_floats()? },
        (_, true, true) => UniformCall::FloatArray { components, data: value.to_floats()? },
        (_, true, false) => UniformCall::IntArray { components, data: value.to_ints()? },
        (Ndim::Scalar, false, true) => UniformCall::Float(*value.to_floats()?.first()?),
        (Ndim::Scalar, false, false) => UniformCall::Int(*value.to_ints()?.first()?),
        (Ndim::Vector(_), false, true) => UniformCall::FloatVec(value.to_floats()?),
        (Ndim::Vector(_), false, false) => UniformCall::IntVec(value.to_ints()?),
    };

    let len = match &call {
        UniformCall::Float(_) | UniformCall::Int(_) => 1,
        UniformCall::FloatVec(d) | UniformCall::FloatArray { data: d, .. } | UniformCall::Matrix { data: d, .. } => d.len(),
        UniformCall::IntVec(d) | UniformCall::IntArray { data: d, .. } => d.len(),
    };

    let fits = match shape.size {
        // Partial arrays are fine as long as whole elements are given.
        Some(_) => len > 0 && len % components.max(1) as usize == 0 && len <= shape.expected_len(),
        None => len == shape.expected_len(),
    };

    fits.then_some(call)
}

/// Uploads `value` to the active program at `location`.
///
/// Returns false (and logs) when the value does not match the declared shape.
pub fn load(gl: &mut dyn GpuContext, location: UniformLocation, shape: &UniformShape, value: &Value) -> bool {
    match prepare(shape, value) {
        Some(call) => {
            gl.upload_uniform(location, &call);
            true
        }
        None => {
            log::debug!("uniform value ({}) does not match declaration {:?}", value.kind_name(), shape);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(vartype: VarType, ndim: Ndim, size: Option<usize>) -> UniformShape {
        UniformShape::new(vartype, ndim, size)
    }

    // ── dispatch ──────────────────────────────────────────────────────────────

    #[test]
    fn float_vector_uses_vector_call() {
        let call = prepare(&shape(VarType::Float, Ndim::Vector(2), None), &Value::from((1.0, 2.0)));
        assert_eq!(call, Some(UniformCall::FloatVec(vec![1.0, 2.0])));
    }

    #[test]
    fn int_scalar_uses_int_call() {
        let call = prepare(&shape(VarType::Int, Ndim::Scalar, None), &Value::Int(3));
        assert_eq!(call, Some(UniformCall::Int(3)));
    }

    #[test]
    fn bool_is_uploaded_as_int() {
        let call = prepare(&shape(VarType::Bool, Ndim::Scalar, None), &Value::Bool(true));
        assert_eq!(call, Some(UniformCall::Int(1)));
    }

    #[test]
    fn sized_uniform_uses_array_call() {
        let value = Value::Floats(vec![0.0; 6]);
        let call = prepare(&shape(VarType::Float, Ndim::Vector(3), Some(2)), &value);
        assert_eq!(call, Some(UniformCall::FloatArray { components: 3, data: vec![0.0; 6] }));

        let ints = Value::Ints(vec![1, 2, 3]);
        let call = prepare(&shape(VarType::Int, Ndim::Scalar, Some(4)), &ints);
        assert_eq!(call, Some(UniformCall::IntArray { components: 1, data: vec![1, 2, 3] }));
    }

    #[test]
    fn matrix_uses_matrix_call() {
        let value = Value::Floats((0..9).map(|i| i as f32).collect());
        let call = prepare(&shape(VarType::Float, Ndim::Matrix(3, 3), None), &value);
        assert!(matches!(call, Some(UniformCall::Matrix { rows: 3, cols: 3, .. })));
    }

    // ── mismatches ────────────────────────────────────────────────────────────

    #[test]
    fn wrong_length_is_rejected() {
        let s = shape(VarType::Float, Ndim::Vector(4), None);
        assert_eq!(prepare(&s, &Value::from((1.0, 2.0))), None);
    }

    #[test]
    fn float_for_int_uniform_is_rejected() {
        assert_eq!(prepare(&shape(VarType::Int, Ndim::Scalar, None), &Value::Float(1.5)), None);
    }

    #[test]
    fn oversized_array_is_rejected() {
        let s = shape(VarType::Float, Ndim::Scalar, Some(2));
        assert_eq!(prepare(&s, &Value::Floats(vec![0.0; 3])), None);
    }
}

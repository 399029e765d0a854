use super::visual::PrimitiveType;

/// Row-major 2-D `f32` array: `rows × cols` values, one row per vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Array {
    data: Vec<f32>,
    cols: usize,
}

impl Array {
    /// Wraps flat row-major data. Trailing values that do not fill a row are dropped.
    pub fn new(mut data: Vec<f32>, cols: usize) -> Self {
        let cols = cols.max(1);
        data.truncate(data.len() - data.len() % cols);
        Self { data, cols }
    }

    pub fn from_rows<const N: usize>(rows: &[[f32; N]]) -> Self {
        Self::new(rows.iter().flatten().copied().collect(), N)
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::new(vec![0.0; rows * cols.max(1)], cols)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.data.len() / self.cols
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Flat values of rows `start..end`, clamped to the array.
    pub fn rows_slice(&self, start: usize, end: usize) -> &[f32] {
        let rows = self.rows();
        let end = end.min(rows);
        let start = start.min(end);
        &self.data[start * self.cols..end * self.cols]
    }

    pub fn row(&self, index: usize) -> Option<&[f32]> {
        (index < self.rows()).then(|| self.rows_slice(index, index + 1))
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut [f32]> {
        if index >= self.rows() {
            return None;
        }
        let cols = self.cols;
        Some(&mut self.data[index * cols..(index + 1) * cols])
    }
}

/// Texel storage. Float texels are expected in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub enum Texels {
    Float(Vec<f32>),
    Bytes(Vec<u8>),
}

impl Texels {
    pub fn len(&self) -> usize {
        match self {
            Texels::Float(v) => v.len(),
            Texels::Bytes(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Image data for a texture variable.
///
/// A texture with `height == 1` is treated as one-dimensional.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    /// Channels per texel: 1, 2, 3 or 4.
    pub components: u8,
    pub texels: Texels,
}

impl TextureData {
    pub fn from_floats(width: u32, height: u32, components: u8, texels: Vec<f32>) -> Self {
        Self { width, height, components, texels: Texels::Float(texels) }
    }

    pub fn from_bytes(width: u32, height: u32, components: u8, texels: Vec<u8>) -> Self {
        Self { width, height, components, texels: Texels::Bytes(texels) }
    }

    #[inline]
    pub fn is_1d(&self) -> bool {
        self.height == 1
    }

    /// Number of texel values the dimensions call for.
    #[inline]
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.components as usize
    }
}

/// A value handed to `set_data` or used as a variable's initial data.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Float(f32),
    Ints(Vec<i32>),
    Floats(Vec<f32>),
    Array(Array),
    Indices(Vec<u32>),
    Texture(TextureData),
    Primitive(PrimitiveType),
    /// Copy the named texture of the same visual into the updated one.
    CopyTexture(String),
}

impl Value {
    /// Short variant name used in log messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Ints(_) => "ints",
            Value::Floats(_) => "floats",
            Value::Array(_) => "array",
            Value::Indices(_) => "indices",
            Value::Texture(_) => "texture",
            Value::Primitive(_) => "primitive",
            Value::CopyTexture(_) => "texture copy",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn as_usize(&self) -> Option<usize> {
        match self {
            Value::Int(i) => usize::try_from(*i).ok(),
            Value::Indices(v) if v.len() == 1 => Some(v[0] as usize),
            _ => None,
        }
    }

    /// Flattens any numeric value into `f32`s.
    pub fn to_floats(&self) -> Option<Vec<f32>> {
        match self {
            Value::Bool(b) => Some(vec![if *b { 1.0 } else { 0.0 }]),
            Value::Int(i) => Some(vec![*i as f32]),
            Value::Float(f) => Some(vec![*f]),
            Value::Ints(v) => Some(v.iter().map(|&i| i as f32).collect()),
            Value::Floats(v) => Some(v.clone()),
            Value::Array(a) => Some(a.as_slice().to_vec()),
            Value::Indices(v) => Some(v.iter().map(|&i| i as f32).collect()),
            _ => None,
        }
    }

    /// Flattens integral values into `i32`s. Floats are not truncated.
    pub fn to_ints(&self) -> Option<Vec<i32>> {
        match self {
            Value::Bool(b) => Some(vec![i32::from(*b)]),
            Value::Int(i) => Some(vec![*i]),
            Value::Ints(v) => Some(v.clone()),
            Value::Indices(v) => v.iter().map(|&i| i32::try_from(i).ok()).collect(),
            _ => None,
        }
    }

    pub fn to_indices(&self) -> Option<Vec<u32>> {
        match self {
            Value::Indices(v) => Some(v.clone()),
            Value::Ints(v) => v.iter().map(|&i| u32::try_from(i).ok()).collect(),
            _ => None,
        }
    }

    /// Reshapes the value into rows of `cols` components.
    ///
    /// A flat value whose length is not a multiple of `cols` is rejected.
    pub fn to_array(&self, cols: usize) -> Option<Array> {
        match self {
            Value::Array(a) if a.cols() == cols => Some(a.clone()),
            Value::Array(_) => None,
            other => {
                let cols = cols.max(1);
                let flat = other.to_floats()?;
                (flat.len() % cols == 0).then(|| Array::new(flat, cols))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<(f32, f32)> for Value {
    fn from((x, y): (f32, f32)) -> Self {
        Value::Floats(vec![x, y])
    }
}

impl From<[f32; 4]> for Value {
    fn from(v: [f32; 4]) -> Self {
        Value::Floats(v.to_vec())
    }
}

impl From<Vec<f32>> for Value {
    fn from(v: Vec<f32>) -> Self {
        Value::Floats(v)
    }
}

impl From<Vec<u32>> for Value {
    fn from(v: Vec<u32>) -> Self {
        Value::Indices(v)
    }
}

impl From<Array> for Value {
    fn from(v: Array) -> Self {
        Value::Array(v)
    }
}

impl From<TextureData> for Value {
    fn from(v: TextureData) -> Self {
        Value::Texture(v)
    }
}

impl From<PrimitiveType> for Value {
    fn from(v: PrimitiveType) -> Self {
        Value::Primitive(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_drops_partial_rows() {
        let a = Array::new(vec![1.0, 2.0, 3.0, 4.0, 5.0], 2);
        assert_eq!(a.rows(), 2);
        assert_eq!(a.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn rows_slice_is_clamped() {
        let a = Array::from_rows(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]);
        assert_eq!(a.rows_slice(1, 10), &[1.0, 1.0, 2.0, 2.0]);
        assert!(a.rows_slice(5, 10).is_empty());
        assert_eq!(a.row(2), Some(&[2.0, 2.0][..]));
        assert_eq!(a.row(3), None);
    }

    #[test]
    fn flat_values_reshape_into_arrays() {
        let v = Value::Floats(vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(v.to_array(2).map(|a| a.rows()), Some(2));
        assert!(v.to_array(3).is_none());
    }

    #[test]
    fn array_with_other_width_is_rejected() {
        let v = Value::Array(Array::zeros(4, 3));
        assert!(v.to_array(2).is_none());
        assert!(v.to_array(3).is_some());
    }

    #[test]
    fn numeric_conversions() {
        assert_eq!(Value::Int(3).as_usize(), Some(3));
        assert_eq!(Value::Int(-1).as_usize(), None);
        assert_eq!(Value::Int(0).as_bool(), Some(false));
        assert_eq!(Value::Float(1.5).to_ints(), None);
        assert_eq!(Value::Ints(vec![1, -2]).to_indices(), None);
        assert_eq!(Value::from((1.0, 2.0)).to_floats(), Some(vec![1.0, 2.0]));
    }
}

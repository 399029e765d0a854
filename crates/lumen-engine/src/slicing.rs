//! Buffer slicing.
//!
//! Drivers handle very large vertex buffers poorly, so attribute data is cut
//! into chunks of at most `max_chunk_size` vertices. Consecutive slices
//! overlap by one vertex so that line strips stay connected across a cut.
//!
//! Primitive bounds (`[0, b1, .., size]`) are global. Each slice gets its own
//! local copy: the bounds that fall inside the slice, shifted to the slice
//! origin, closed with `0` and the slice length when needed.

/// Default chunk size in vertices.
pub const MAX_CHUNK_SIZE: usize = 65_000;

/// A contiguous vertex range `[offset, offset + len)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Slice {
    pub offset: usize,
    pub len: usize,
}

impl Slice {
    #[inline]
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    #[inline]
    pub const fn end(self) -> usize {
        self.offset + self.len
    }
}

/// Cuts `size` vertices into chunks.
///
/// Slice `i` starts at `i * max_chunk_size` and holds `max_chunk_size + 1`
/// vertices (fewer for the last one). A `max_chunk_size` of zero disables
/// slicing. An empty buffer has no slices.
pub fn compute_slices(size: usize, max_chunk_size: usize) -> Vec<Slice> {
    if size == 0 {
        return Vec::new();
    }
    if max_chunk_size == 0 {
        return vec![Slice::new(0, size)];
    }

    (0..size.div_ceil(max_chunk_size))
        .map(|i| {
            let offset = i * max_chunk_size;
            Slice::new(offset, (max_chunk_size + 1).min(size - offset))
        })
        .collect()
}

/// Local bounds of the window `[offset, offset + len)`.
///
/// Returns `None` when the window does not intersect `[bounds[0], bounds[-1])`.
/// Otherwise returns the bounds inside the window, shifted by `-offset`, with
/// `0` prepended unless the first one is already `0` and `len` appended unless
/// the last one is already `len`.
pub fn reslice_bounds(bounds: &[u32], offset: usize, len: usize) -> Option<Vec<u32>> {
    if !intersects(bounds, offset, len) {
        return None;
    }
    let end = offset + len;
    let inside = bounds.iter().copied().filter(|&b| (b as usize) >= offset && (b as usize) < end);
    Some(close(inside, offset, len))
}

fn intersects(bounds: &[u32], offset: usize, len: usize) -> bool {
    let (Some(&first), Some(&last)) = (bounds.first(), bounds.last()) else {
        return false;
    };
    bounds.len() >= 2 && len > 0 && offset < last as usize && offset + len > first as usize
}

fn close(inside: impl Iterator<Item = u32>, offset: usize, len: usize) -> Vec<u32> {
    let mut local: Vec<u32> = inside.map(|b| b - offset as u32).collect();

    if local.first() != Some(&0) {
        local.insert(0, 0);
    }
    if local.last() != Some(&(len as u32)) {
        local.push(len as u32);
    }
    local
}

// ── bounds ───────────────────────────────────────────────────────────────────

/// Global primitive bounds, with the common stride when they are regular.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bounds {
    values: Vec<u32>,
    stride: Option<u32>,
}

impl Bounds {
    pub fn new(values: Vec<u32>) -> Self {
        let stride = regular_stride(&values);
        Self { values, stride }
    }

    /// `[0, size]`: all vertices form one primitive.
    pub fn full(size: usize) -> Self {
        Self::new(vec![0, size as u32])
    }

    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.values
    }

    #[inline]
    pub fn stride(&self) -> Option<u32> {
        self.stride
    }

    /// Checks `bounds[0] == 0`, `bounds[-1] == size` and strict ascent.
    pub fn validate(&self, size: usize) -> Result<(), String> {
        match (self.values.first(), self.values.last()) {
            (Some(&0), Some(&last)) if last as usize == size && self.values.len() >= 2 => {}
            _ => return Err(format!("bounds must start at 0 and end at {size}, got {:?}", self.values)),
        }
        if let Some(w) = self.values.windows(2).find(|w| w[0] >= w[1]) {
            return Err(format!("bounds must be strictly ascending, found {} then {}", w[0], w[1]));
        }
        Ok(())
    }

    /// Local bounds of the window `[offset, offset + len)`. Same result as
    /// [`reslice_bounds`], in constant time per bound kept.
    pub fn reslice(&self, offset: usize, len: usize) -> Option<Vec<u32>> {
        if !intersects(&self.values, offset, len) {
            return None;
        }
        let end = offset + len;

        let (start, stop) = match self.stride {
            Some(stride) => {
                let b0 = self.values[0] as usize;
                let d = stride as usize;
                let start = if offset <= b0 { 0 } else { (offset - b0).div_ceil(d) };
                let stop = (end - b0).div_ceil(d).min(self.values.len());
                (start, stop)
            }
            None => (
                self.values.partition_point(|&b| (b as usize) < offset),
                self.values.partition_point(|&b| (b as usize) < end),
            ),
        };

        let inside = self.values[start..stop.max(start)].iter().copied();
        Some(close(inside, offset, len))
    }
}

fn regular_stride(values: &[u32]) -> Option<u32> {
    let [first, second, ..] = values else {
        return None;
    };
    let stride = second.checked_sub(*first).filter(|&d| d > 0)?;
    values.windows(2).all(|w| w[1].checked_sub(w[0]) == Some(stride)).then_some(stride)
}

// ── slicer ───────────────────────────────────────────────────────────────────

/// Slice layout and per-slice local bounds of one visual.
#[derive(Debug, Clone)]
pub struct Slicer {
    size: usize,
    max_chunk_size: usize,
    slices: Vec<Slice>,
    bounds: Bounds,
    custom_bounds: bool,
    local_bounds: Vec<Option<Vec<u32>>>,
}

impl Slicer {
    /// `bounds` defaults to `[0, size]`. A `max_chunk_size` of zero disables slicing.
    pub fn new(size: usize, bounds: Option<Vec<u32>>, max_chunk_size: usize) -> Self {
        let mut slicer = Self {
            size,
            max_chunk_size,
            slices: Vec::new(),
            bounds: Bounds::full(size),
            custom_bounds: false,
            local_bounds: Vec::new(),
        };
        slicer.slices = compute_slices(size, max_chunk_size);
        slicer.set_bounds(bounds);
        slicer
    }

    /// A single slice covering the whole buffer. Used for indexed drawing.
    pub fn unsliced(size: usize, bounds: Option<Vec<u32>>) -> Self {
        Self::new(size, bounds, 0)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    #[inline]
    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    #[inline]
    pub fn slice_count(&self) -> usize {
        self.slices.len()
    }

    #[inline]
    pub fn bounds(&self) -> &[u32] {
        self.bounds.as_slice()
    }

    #[inline]
    pub fn has_custom_bounds(&self) -> bool {
        self.custom_bounds
    }

    /// Local bounds of slice `index`, `None` when no primitive touches it.
    pub fn local_bounds(&self, index: usize) -> Option<&[u32]> {
        self.local_bounds.get(index)?.as_deref()
    }

    /// Changes the vertex count and recomputes slices.
    ///
    /// Bounds that were never set explicitly follow the new size.
    pub fn set_size(&mut self, size: usize) {
        self.size = size;
        self.slices = compute_slices(size, self.max_chunk_size);
        if !self.custom_bounds {
            self.bounds = Bounds::full(size);
        }
        self.refresh_local_bounds();
    }

    /// Replaces the primitive bounds. `None` restores `[0, size]`.
    pub fn set_bounds(&mut self, bounds: Option<Vec<u32>>) {
        match bounds {
            Some(values) => {
                self.bounds = Bounds::new(values);
                self.custom_bounds = true;
            }
            None => {
                self.bounds = Bounds::full(self.size);
                self.custom_bounds = false;
            }
        }
        self.refresh_local_bounds();
    }

    fn refresh_local_bounds(&mut self) {
        self.local_bounds = self.slices.iter().map(|s| self.bounds.reslice(s.offset, s.len)).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── compute_slices ────────────────────────────────────────────────────────

    #[test]
    fn slices_overlap_by_one() {
        assert_eq!(
            compute_slices(25, 10),
            vec![Slice::new(0, 11), Slice::new(10, 11), Slice::new(20, 5)]
        );
    }

    #[test]
    fn slices_cover_every_vertex() {
        for (size, max) in [(1, 1), (10, 10), (11, 10), (65_001, 65_000), (130_000, 65_000), (7, 3)] {
            let slices = compute_slices(size, max);
            assert_eq!(slices.len(), size.div_ceil(max));
            assert_eq!(slices[0].offset, 0);
            assert_eq!(slices.last().map(|s| s.end()), Some(size));
            for w in slices.windows(2) {
                assert_eq!(w[1].offset, w[0].end() - 1, "consecutive slices share one vertex");
            }
            assert!(slices.iter().all(|s| s.len <= max + 1));
        }
    }

    #[test]
    fn exact_multiple_has_no_extra_slice() {
        assert_eq!(compute_slices(20, 10), vec![Slice::new(0, 11), Slice::new(10, 10)]);
    }

    #[test]
    fn zero_max_disables_slicing() {
        assert_eq!(compute_slices(1_000_000, 0), vec![Slice::new(0, 1_000_000)]);
        assert!(compute_slices(0, 10).is_empty());
    }

    // ── reslice_bounds ────────────────────────────────────────────────────────

    #[test]
    fn window_inside_one_primitive() {
        assert_eq!(reslice_bounds(&[0, 100], 10, 20), Some(vec![0, 20]));
    }

    #[test]
    fn inner_bounds_are_shifted_and_closed() {
        assert_eq!(reslice_bounds(&[0, 15, 30, 60], 10, 30), Some(vec![0, 5, 20, 30]));
    }

    #[test]
    fn existing_endpoints_are_not_duplicated() {
        assert_eq!(reslice_bounds(&[0, 10, 20], 10, 10), Some(vec![0, 10]));
        assert_eq!(reslice_bounds(&[0, 5, 10], 0, 10), Some(vec![0, 5, 10]));
    }

    #[test]
    fn window_outside_bounds_is_none() {
        assert_eq!(reslice_bounds(&[10, 20], 0, 10), None);
        assert_eq!(reslice_bounds(&[0, 20], 20, 5), None);
        assert_eq!(reslice_bounds(&[0, 20], 25, 5), None);
        assert_eq!(reslice_bounds(&[0], 0, 5), None);
    }

    #[test]
    fn local_bounds_stay_inside_window() {
        let bounds: Vec<u32> = (0..=40).map(|i| i * 7).collect();
        for offset in 0..280 {
            for len in [1, 5, 13, 50] {
                let Some(local) = reslice_bounds(&bounds, offset, len) else { continue };
                assert_eq!(local[0], 0);
                assert_eq!(*local.last().unwrap(), len as u32);
                assert!(local.windows(2).all(|w| w[0] < w[1]));
                assert!(local.iter().all(|&b| b as usize <= len));
            }
        }
    }

    // ── Bounds fast path ──────────────────────────────────────────────────────

    #[test]
    fn regular_stride_is_detected() {
        assert_eq!(Bounds::new(vec![0, 10, 20, 30]).stride(), Some(10));
        assert_eq!(Bounds::new(vec![0, 10, 25]).stride(), None);
        assert_eq!(Bounds::new(vec![0, 40]).stride(), Some(40));
        assert_eq!(Bounds::new(vec![5]).stride(), None);
    }

    #[test]
    fn fast_path_matches_scan() {
        let regular: Vec<u32> = (0..=100).map(|i| i * 10).collect();
        let shifted: Vec<u32> = (0..=50).map(|i| 3 + i * 4).collect();
        let irregular = vec![0, 1, 7, 8, 30, 31, 90, 200, 1000];

        for values in [regular, shifted, irregular] {
            let bounds = Bounds::new(values.clone());
            for offset in (0..1010).step_by(3) {
                for len in [1, 2, 9, 10, 11, 64, 301] {
                    assert_eq!(
                        bounds.reslice(offset, len),
                        reslice_bounds(&values, offset, len),
                        "offset {offset}, len {len}, bounds {values:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn validation() {
        assert!(Bounds::new(vec![0, 5, 10]).validate(10).is_ok());
        assert!(Bounds::new(vec![1, 10]).validate(10).is_err());
        assert!(Bounds::new(vec![0, 9]).validate(10).is_err());
        assert!(Bounds::new(vec![0, 5, 5, 10]).validate(10).is_err());
        assert!(Bounds::new(vec![0]).validate(0).is_err());
    }

    // ── Slicer ────────────────────────────────────────────────────────────────

    #[test]
    fn slicer_without_bounds_draws_each_slice_whole() {
        let slicer = Slicer::new(130_000, None, MAX_CHUNK_SIZE);
        assert_eq!(slicer.slice_count(), 2);
        assert_eq!(slicer.local_bounds(0), Some(&[0, 65_001][..]));
        assert_eq!(slicer.local_bounds(1), Some(&[0, 65_000][..]));
    }

    #[test]
    fn slicer_bounds_follow_size_unless_custom() {
        let mut slicer = Slicer::new(10, None, 4);
        slicer.set_size(20);
        assert_eq!(slicer.bounds(), &[0, 20]);

        slicer.set_bounds(Some(vec![0, 10, 20]));
        slicer.set_size(30);
        assert_eq!(slicer.bounds(), &[0, 10, 20]);
        assert!(slicer.has_custom_bounds());

        slicer.set_bounds(None);
        assert_eq!(slicer.bounds(), &[0, 30]);
    }

    #[test]
    fn unsliced_keeps_one_slice_when_resized() {
        let mut slicer = Slicer::unsliced(10, None);
        slicer.set_size(200_000);
        assert_eq!(slicer.slices(), &[Slice::new(0, 200_000)]);
    }

    #[test]
    fn slice_beyond_custom_bounds_has_no_local_bounds() {
        let slicer = Slicer::new(30, Some(vec![0, 5]), 10);
        assert_eq!(slicer.local_bounds(0), Some(&[0, 5, 11][..]));
        assert_eq!(slicer.local_bounds(1), None);
        assert_eq!(slicer.local_bounds(9), None);
    }
}

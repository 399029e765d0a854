/// Window size in physical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl WindowSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Width over height. `None` for a degenerate window.
    #[inline]
    pub fn aspect_ratio(self) -> Option<f32> {
        self.is_valid().then(|| self.width as f32 / self.height as f32)
    }
}

/// How the plot viewport follows the window aspect ratio.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum AspectConstraint {
    /// One data unit spans the same number of pixels on both axes.
    Square,
    /// Data space is laid out for the given width/height ratio.
    Ratio(f32),
}

impl AspectConstraint {
    #[inline]
    fn target_ratio(self) -> f32 {
        match self {
            AspectConstraint::Square => 1.0,
            AspectConstraint::Ratio(r) => r,
        }
    }
}

/// Half-extent of the visible plot area along each axis.
///
/// `(1, 1)` shows `[-1, 1]²`. Shaders divide positions by this value.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::unit()
    }
}

impl Viewport {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn unit() -> Self {
        Self::new(1.0, 1.0)
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.x > 0.0 && self.y > 0.0 && self.x.is_finite() && self.y.is_finite()
    }

    /// Viewport for a window of the given size.
    ///
    /// The wider axis is stretched so the other one keeps `[-1, 1]`. Without a
    /// constraint, or for a degenerate window, the unit viewport is returned.
    pub fn for_window(size: WindowSize, constraint: Option<AspectConstraint>) -> Self {
        let (Some(constraint), Some(aspect)) = (constraint, size.aspect_ratio()) else {
            return Self::unit();
        };

        let target = constraint.target_ratio();
        if !(target.is_finite() && target > 0.0) {
            return Self::unit();
        }

        let a = aspect / target;
        if a > 1.0 { Self::new(a, 1.0) } else { Self::new(1.0, 1.0 / a) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconstrained_window_keeps_unit_viewport() {
        let v = Viewport::for_window(WindowSize::new(800, 400), None);
        assert_eq!(v, Viewport::unit());
    }

    #[test]
    fn wide_window_stretches_x() {
        let v = Viewport::for_window(WindowSize::new(800, 400), Some(AspectConstraint::Square));
        assert_eq!(v, Viewport::new(2.0, 1.0));
    }

    #[test]
    fn tall_window_stretches_y() {
        let v = Viewport::for_window(WindowSize::new(400, 800), Some(AspectConstraint::Square));
        assert_eq!(v, Viewport::new(1.0, 2.0));
    }

    #[test]
    fn ratio_constraint_is_relative() {
        let v = Viewport::for_window(WindowSize::new(800, 400), Some(AspectConstraint::Ratio(2.0)));
        assert_eq!(v, Viewport::unit());
    }

    #[test]
    fn degenerate_window_is_ignored() {
        let v = Viewport::for_window(WindowSize::new(0, 400), Some(AspectConstraint::Square));
        assert_eq!(v, Viewport::unit());
        assert!(!WindowSize::new(0, 10).is_valid());
    }
}

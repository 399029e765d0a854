//! Window and viewport coordinates.
//!
//! Plot space is normalized: the visible area spans `[-1, 1]` on both axes,
//! scaled by [`Viewport`] so that a non-square window does not stretch the
//! data when the aspect ratio is constrained.

mod viewport;

pub use viewport::{AspectConstraint, Viewport, WindowSize};

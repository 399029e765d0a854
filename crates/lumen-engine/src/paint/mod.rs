//! Color values handed to the GPU.
//!
//! Plot colors are straight (non-premultiplied) RGBA, which is what the
//! default `SRC_ALPHA, ONE_MINUS_SRC_ALPHA` blend function expects.

pub mod color;

pub use color::Color;

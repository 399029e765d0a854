//! Logging utilities.
//!
//! The engine logs through the `log` facade only. Construction failures are
//! returned as errors; everything that happens per frame (ignored updates,
//! unused shader variables, missing textures) is reported here instead.

mod init;

pub use init::{init_logging, LoggingConfig};

//! # vmview Utilities
//!
//! Shared utilities for the vmview workspace, currently the `tracing`
//! logging setup used by the CLI.

pub mod logging;

pub use logging::{init_logging, init_logging_with_level, LogFormat, LogLevel, LoggingError};
pub use tracing::{debug, error, info, trace, warn};

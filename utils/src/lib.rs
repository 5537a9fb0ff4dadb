//! Shared process utilities for hookpay binaries.

pub mod logging;

pub use logging::{init_logging, LogFormat, LoggingError};

//! Observability module
//!
//! Structured logging for validation and generation runs.

pub mod logging;

pub use logging::{LogFormat, init_logging};

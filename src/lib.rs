//! `ld2415h-codegen` - configuration schema and code generation for the
//! HLK-LD2415H speed radar
//!
//! Validates `ld2415h` hub declarations and the `sensor`, `number` and
//! `select` platform entries bound to them, then builds the object graph
//! and setup statements that wire each output to its hub.

pub mod cli;
pub mod codegen;
pub mod config;
pub mod error;
pub mod observability;

//! Command-line interface
//!
//! Argument parsing and command handlers for the `ld2415h-codegen` binary.

pub mod args;
pub mod commands;

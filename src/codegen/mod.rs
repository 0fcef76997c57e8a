//! Code generation
//!
//! Builds the object graph of LD2415H hubs and their outputs from a
//! validated configuration and renders it as setup statements.

pub mod binding;
pub mod context;
pub mod program;

pub use binding::{GeneratedProgram, Generator, HUB_CLASS};
pub use context::{
    GenerationContext, IdRegistry, ObjectGraph, OwningComponent, SensorHandle, SensorOutput,
};
pub use program::{Arg, Lifecycle, Program, Statement};

//! Configuration module
//!
//! Loading and validation of LD2415H configuration documents: the hub
//! declaration, its UART bus and the `sensor`/`number`/`select` platform
//! entries bound to it.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLimits, ConfigLoader, LoadResult, LoadWarning, LoaderOptions};
pub use schema::*;
pub use validation::{ComponentKind, Validator};

//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod completions;
pub mod generate;
pub mod validate;
pub mod version;

use std::path::Path;

use crate::cli::args::{Cli, Commands};
use crate::codegen::{GeneratedProgram, Generator};
use crate::config::{ConfigLoader, LoadResult, LoadWarning};
use crate::error::CodegenError;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub fn dispatch(cli: Cli) -> Result<(), CodegenError> {
    match cli.command {
        Commands::Validate(args) => validate::run(&args, cli.quiet),
        Commands::Generate(args) => generate::run(&args),
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(())
        }
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Loads, validates and generates one file.
fn build(loader: &ConfigLoader, path: &Path) -> Result<(LoadResult, GeneratedProgram), CodegenError> {
    tracing::info!(file = %path.display(), "loading configuration");
    let loaded = loader.load(path)?;
    log_warnings(&loaded.warnings);
    let generated = Generator::generate(&loaded.config)?;
    Ok((loaded, generated))
}

fn log_warnings(warnings: &[LoadWarning]) {
    for warning in warnings {
        tracing::warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }
}

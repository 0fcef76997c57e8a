//! `validate` command
//!
//! Loads each file, validates it and dry-runs generation. Every file is
//! checked even after a failure; the command fails if any file did.

use serde_json::json;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::cli::commands::build;
use crate::config::ConfigLoader;
use crate::config::loader::display_path;
use crate::error::{CodegenError, ConfigError};

/// Validate configuration files.
///
/// With `quiet`, valid files are not listed in human output.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationFailed`] if any file is invalid.
pub fn run(args: &ValidateArgs, quiet: bool) -> Result<(), CodegenError> {
    let loader = ConfigLoader::with_defaults();
    let mut failed = 0usize;
    let mut reports = Vec::with_capacity(args.files.len());

    for path in &args.files {
        let shown = display_path(path);
        match build(&loader, path) {
            Ok((loaded, generated)) => {
                tracing::info!(
                    file = %path.display(),
                    statements = generated.program.len(),
                    "configuration valid"
                );
                match args.format {
                    OutputFormat::Human if quiet => {}
                    OutputFormat::Human => println!("{}: ok", shown.display()),
                    OutputFormat::Json => reports.push(json!({
                        "file": shown.display().to_string(),
                        "valid": true,
                        "warnings": loaded
                            .warnings
                            .iter()
                            .map(|w| json!({"message": w.message, "location": w.location}))
                            .collect::<Vec<_>>(),
                        "components": generated.graph.components.len(),
                        "outputs": generated.graph.sensors.len()
                            + generated.graph.numbers.len()
                            + generated.graph.selects.len(),
                    })),
                }
            }
            Err(e) => {
                failed += 1;
                tracing::debug!(file = %path.display(), error = ?e, "validation failed");
                match args.format {
                    OutputFormat::Human => eprintln!("{}: {e}", shown.display()),
                    OutputFormat::Json => reports.push(json!({
                        "file": shown.display().to_string(),
                        "valid": false,
                        "kind": error_kind(&e),
                        "error": e.to_string(),
                    })),
                }
            }
        }
    }

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    if failed > 0 {
        return Err(ConfigError::ValidationFailed { count: failed }.into());
    }
    Ok(())
}

/// Classifies an error for machine-readable reports.
const fn error_kind(err: &CodegenError) -> &'static str {
    match err {
        CodegenError::Config(e) if e.is_schema_error() => "schema",
        CodegenError::Config(e) if e.is_reference_error() => "reference",
        CodegenError::Config(_) => "config",
        CodegenError::Binding(_) => "binding",
        CodegenError::Io(_) => "io",
        CodegenError::Json(_) => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BindingError;

    #[test]
    fn test_error_kind_classification() {
        let schema: CodegenError = ConfigError::Schema {
            location: "sensor[0]".to_string(),
            message: "bad".to_string(),
        }
        .into();
        assert_eq!(error_kind(&schema), "schema");

        let reference: CodegenError = ConfigError::Reference {
            location: "sensor[0].ld2415h_id".to_string(),
            id: None,
            message: "missing".to_string(),
        }
        .into();
        assert_eq!(error_kind(&reference), "reference");

        let binding: CodegenError = BindingError::UnresolvedReference {
            id: "radar1".to_string(),
        }
        .into();
        assert_eq!(error_kind(&binding), "binding");
    }
}

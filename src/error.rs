//! Error types for `ld2415h-codegen`
//!
//! Configuration problems (schema and reference errors) are detected by the
//! validator, binding problems by the generator. Both abort the run; nothing
//! here is retried.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for CLI operations.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, schema or reference failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Binding error (unresolved reference, duplicate binding)
    pub const BINDING_ERROR: i32 = 4;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type.
///
/// Aggregates the domain errors and maps each one to an exit code.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Binding generation error
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CodegenError {
    /// Returns the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => ExitCode::CONFIG_ERROR,
            Self::Binding(_) => ExitCode::BINDING_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
            Self::Json(_) => ExitCode::ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
///
/// The validator stops at the first problem, so each error describes exactly
/// one location in the document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}{}: {message}", line.map_or_else(String::new, |l| format!(" (line {l})")))]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Configuration file not found or unreadable
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// The document contains nothing
    #[error("configuration is empty: {path}")]
    EmptyDocument {
        /// Path to the configuration file
        path: PathBuf,
    },

    /// A key is not part of the schema at this location
    #[error("unknown key '{key}' at {location}{}", suggestion.as_ref().map_or_else(String::new, |s| format!(" (did you mean '{s}'?)")))]
    UnknownKey {
        /// Location of the mapping that holds the key
        location: String,
        /// The offending key
        key: String,
        /// Closest recognized key, if any is close enough
        suggestion: Option<String>,
    },

    /// A value has the wrong shape, type or range
    #[error("invalid value at {location}: {message}")]
    Schema {
        /// Location of the value (e.g., `sensor[0].speed.accuracy_decimals`)
        location: String,
        /// What is wrong with it
        message: String,
    },

    /// An identifier is declared more than once
    #[error("ID '{id}' at {location} is already declared at {previous}")]
    DuplicateId {
        /// The identifier
        id: String,
        /// Where the second declaration appears
        location: String,
        /// Where the first declaration appears
        previous: String,
    },

    /// A component reference is missing, undeclared or of the wrong type
    #[error("reference error at {location}: {message}")]
    Reference {
        /// Location of the reference key
        location: String,
        /// Referenced identifier, when one was given
        id: Option<String>,
        /// What is wrong with the reference
        message: String,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// A `${name:?message}` substitution has no value
    #[error("substitution '{var}' not set ({message})")]
    SubstitutionNotSet {
        /// Name of the substitution variable
        var: String,
        /// Message given in the reference
        message: String,
    },

    /// One or more configuration files failed validation.
    #[error("{count} file(s) failed validation")]
    ValidationFailed {
        /// Number of files that failed validation.
        count: usize,
    },
}

impl ConfigError {
    /// Returns `true` for errors about keys, types and ranges.
    #[must_use]
    pub const fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownKey { .. } | Self::Schema { .. } | Self::DuplicateId { .. }
        )
    }

    /// Returns `true` for errors about component references.
    #[must_use]
    pub const fn is_reference_error(&self) -> bool {
        matches!(self, Self::Reference { .. })
    }
}

// ============================================================================
// Binding Errors
// ============================================================================

/// Errors raised while building the object graph.
#[derive(Debug, Error)]
pub enum BindingError {
    /// The owning component is not present in the generation context
    #[error("unresolved reference: no component '{id}' in the generation context")]
    UnresolvedReference {
        /// The referenced identifier
        id: String,
    },

    /// An identifier was claimed twice
    #[error("duplicate identifier '{id}' in the generated object graph")]
    DuplicateId {
        /// The identifier
        id: String,
    },

    /// The owner already has an output of this kind
    #[error("component '{owner}' already has a {slot} bound ('{existing}')")]
    AlreadyBound {
        /// The owning component
        owner: String,
        /// The output slot (e.g., `speed sensor`)
        slot: String,
        /// The identifier already bound to the slot
        existing: String,
    },

    /// The output is already owned by a component
    #[error("'{child}' is already owned by '{owner}'")]
    AlreadyOwned {
        /// The output
        child: String,
        /// Its current owner
        owner: String,
    },
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for codegen operations.
pub type Result<T> = std::result::Result<T, CodegenError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::ERROR, 1);
        assert_eq!(ExitCode::CONFIG_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::BINDING_ERROR, 4);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
    }

    #[test]
    fn test_config_error_exit_code() {
        let err: CodegenError = ConfigError::MissingFile {
            path: PathBuf::from("/test"),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::CONFIG_ERROR);
    }

    #[test]
    fn test_binding_error_exit_code() {
        let err: CodegenError = BindingError::UnresolvedReference {
            id: "radar1".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::BINDING_ERROR);
    }

    #[test]
    fn test_io_error_exit_code() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: CodegenError = io_err.into();
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
    }

    #[test]
    fn test_unknown_key_display_with_suggestion() {
        let err = ConfigError::UnknownKey {
            location: "sensor[0]".to_string(),
            key: "sped".to_string(),
            suggestion: Some("speed".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "unknown key 'sped' at sensor[0] (did you mean 'speed'?)"
        );
        assert!(err.is_schema_error());
        assert!(!err.is_reference_error());
    }

    #[test]
    fn test_unknown_key_display_without_suggestion() {
        let err = ConfigError::UnknownKey {
            location: "sensor[0]".to_string(),
            key: "colour".to_string(),
            suggestion: None,
        };
        assert_eq!(err.to_string(), "unknown key 'colour' at sensor[0]");
    }

    #[test]
    fn test_parse_error_display_includes_line() {
        let err = ConfigError::ParseError {
            path: PathBuf::from("radar.yaml"),
            line: Some(7),
            message: "unexpected token".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "parse error in radar.yaml (line 7): unexpected token"
        );
    }

    #[test]
    fn test_reference_error_classification() {
        let err = ConfigError::Reference {
            location: "sensor[0].ld2415h_id".to_string(),
            id: None,
            message: "required reference is missing".to_string(),
        };
        assert!(err.is_reference_error());
        assert!(!err.is_schema_error());
        assert!(err.to_string().contains("sensor[0].ld2415h_id"));
    }

    #[test]
    fn test_already_bound_display() {
        let err = BindingError::AlreadyBound {
            owner: "radar1".to_string(),
            slot: "speed sensor".to_string(),
            existing: "radar1_speed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "component 'radar1' already has a speed sensor bound ('radar1_speed')"
        );
    }
}

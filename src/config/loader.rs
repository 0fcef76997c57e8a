//! Configuration loader
//!
//! Loading pipeline:
//! 1. Size check and raw read (UTF-8 BOM stripped)
//! 2. YAML parsing
//! 3. `${name}` expansion inside string scalars, from the `substitutions:`
//!    block
//! 4. Validation
//! 5. Freeze with `Arc`

use crate::config::schema::ProjectConfig;
use crate::config::validation::Validator;
use crate::error::ConfigError;

use indexmap::IndexMap;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the top-level section holding substitution variables.
pub const SUBSTITUTIONS_KEY: &str = "substitutions";

// ============================================================================
// Public API
// ============================================================================

/// Options for the configuration loader.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Limits for configuration size.
    pub config_limits: ConfigLimits,
}

/// Limits for configuration size to prevent resource exhaustion.
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    /// Maximum configuration file size in bytes.
    pub max_config_size: usize,

    /// Maximum number of entries in one section.
    pub max_entries: usize,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_config_size: env_or("LD2415H_MAX_CONFIG_SIZE", 1024 * 1024),
            max_entries: env_or("LD2415H_MAX_ENTRIES", 64),
        }
    }
}

/// Result of loading a configuration file.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated configuration.
    pub config: Arc<ProjectConfig>,

    /// Warnings encountered during loading.
    pub warnings: Vec<LoadWarning>,
}

/// Warning during configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Location where the warning occurred.
    pub location: Option<String>,
}

/// Configuration loader.
///
/// Handles the full pipeline from YAML file to frozen `ProjectConfig`.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: LoaderOptions,
}

impl ConfigLoader {
    /// Creates a new configuration loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Creates a new configuration loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// Loads a configuration file and returns the frozen configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read or exceeds the size limit
    /// - Substitution or YAML parsing fails
    /// - Validation fails
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        let limit = self.options.config_limits.max_config_size;
        let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if file_size > limit {
            return Err(ConfigError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{file_size} bytes"),
                expected: format!("at most {limit} bytes"),
            });
        }

        let raw = std::fs::read(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        let raw = String::from_utf8(raw).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            line: None,
            message: format!("file is not valid UTF-8: {e}"),
        })?;

        self.load_source(&raw, path)
    }

    /// Loads a configuration from an in-memory string.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigLoader::load`], minus file access.
    pub fn load_from_str(&self, yaml: &str) -> Result<LoadResult, ConfigError> {
        self.load_source(yaml, Path::new("<string>"))
    }

    fn load_source(&self, raw: &str, path: &Path) -> Result<LoadResult, ConfigError> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
        if raw.trim().is_empty() {
            return Err(ConfigError::EmptyDocument {
                path: path.to_path_buf(),
            });
        }

        let mut root = parse_yaml(raw, path)?;
        if root.is_null() {
            return Err(ConfigError::EmptyDocument {
                path: path.to_path_buf(),
            });
        }

        // Substitution never changes the document's structure
        let vars = collect_substitutions(&root)?;
        tracing::debug!(count = vars.len(), "collected substitutions");
        let mut substitution = Substitution::new(vars);
        if let Value::Mapping(sections) = &mut root {
            for (key, section) in sections.iter_mut() {
                if key.as_str() != Some(SUBSTITUTIONS_KEY) {
                    substitution.expand(section, path)?;
                }
            }
        }
        let mut warnings = substitution.warnings;

        let mut validator = Validator::new(self.options.config_limits.clone());
        let config = validator.validate(&root)?;
        warnings.extend(validator.take_warnings());

        tracing::debug!(
            hubs = config.hubs.len(),
            sensors = config.sensors.len(),
            numbers = config.numbers.len(),
            selects = config.selects.len(),
            "configuration validated"
        );

        Ok(LoadResult {
            config: Arc::new(config),
            warnings,
        })
    }
}

// ============================================================================
// Substitution
// ============================================================================

/// Expands `${name}` references inside string scalars.
///
/// Values come from the document's `substitutions:` block only. Mapping
/// keys are left alone.
struct Substitution {
    vars: IndexMap<String, String>,
    warnings: Vec<LoadWarning>,
}

impl Substitution {
    const fn new(vars: IndexMap<String, String>) -> Self {
        Self {
            vars,
            warnings: Vec::new(),
        }
    }

    /// Expands every string scalar below `value`.
    ///
    /// A scalar that is exactly one reference (`sensitivity: ${level}`)
    /// takes the type of the substituted text when that is a number or a
    /// boolean; everything else stays a string.
    fn expand(&mut self, value: &mut Value, path: &Path) -> Result<(), ConfigError> {
        match value {
            Value::String(text) => {
                if !text.contains('$') {
                    return Ok(());
                }
                let single = is_single_reference(text);
                let expanded = self.substitute(text, path)?;
                *value = if single {
                    typed_scalar(expanded)
                } else {
                    Value::String(expanded)
                };
            }
            Value::Sequence(items) => {
                for item in items {
                    self.expand(item, path)?;
                }
            }
            Value::Mapping(map) => {
                for (_, item) in map.iter_mut() {
                    self.expand(item, path)?;
                }
            }
            Value::Tagged(tagged) => self.expand(&mut tagged.value, path)?,
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
        Ok(())
    }

    /// Substitutes variables in one scalar.
    ///
    /// Supports:
    /// - `${name}` - expand to value (empty string if unset with warning)
    /// - `${name:-default}` - expand to default if unset
    /// - `${name:?message}` - fail if unset
    /// - `$$` - literal `$`
    fn substitute(&mut self, text: &str, source_path: &Path) -> Result<String, ConfigError> {
        let mut result = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                result.push(c);
                continue;
            }
            match chars.peek() {
                Some('$') => {
                    chars.next();
                    result.push('$');
                }
                Some('{') => {
                    chars.next();
                    let (name, default, error_msg) = parse_var_spec(&mut chars, source_path)?;

                    if let Some(value) = self.vars.get(&name) {
                        result.push_str(value);
                    } else if let Some(default_val) = default {
                        result.push_str(&default_val);
                    } else if let Some(message) = error_msg {
                        return Err(ConfigError::SubstitutionNotSet { var: name, message });
                    } else {
                        self.warnings.push(LoadWarning {
                            message: format!(
                                "Substitution '{name}' is not set, using empty string"
                            ),
                            location: Some(source_path.display().to_string()),
                        });
                    }
                }
                _ => result.push(c),
            }
        }

        Ok(result)
    }
}

/// Returns `true` if `text` is exactly one `${...}` reference.
fn is_single_reference(text: &str) -> bool {
    text.strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
        .is_some_and(|inner| !inner.contains('}'))
}

/// Reads substituted text as a number or boolean where it is one.
fn typed_scalar(text: String) -> Value {
    match serde_yaml::from_str::<Value>(&text) {
        Ok(scalar @ (Value::Number(_) | Value::Bool(_))) => scalar,
        _ => Value::String(text),
    }
}

/// Parses a variable specification from `${...}`.
///
/// Returns (`name`, `default_value`, `error_message`).
fn parse_var_spec(
    chars: &mut std::iter::Peekable<std::str::Chars>,
    source_path: &Path,
) -> Result<(String, Option<String>, Option<String>), ConfigError> {
    let mut name = String::new();

    while let Some(&c) = chars.peek() {
        match c {
            '}' => {
                chars.next();
                return Ok((name, None, None));
            }
            ':' => {
                chars.next();
                match chars.peek() {
                    Some('-') => {
                        chars.next();
                        let default = read_until_close(chars, source_path)?;
                        return Ok((name, Some(default), None));
                    }
                    Some('?') => {
                        chars.next();
                        let msg = read_until_close(chars, source_path)?;
                        return Ok((name, None, Some(msg)));
                    }
                    _ => name.push(':'),
                }
            }
            _ => {
                chars.next();
                name.push(c);
            }
        }
    }

    Err(ConfigError::ParseError {
        path: source_path.to_path_buf(),
        line: None,
        message: format!("unclosed substitution reference: ${{{name}"),
    })
}

/// Reads content until the closing `}`, handling nested braces.
fn read_until_close(
    chars: &mut std::iter::Peekable<std::str::Chars>,
    source_path: &Path,
) -> Result<String, ConfigError> {
    let mut value = String::new();
    let mut depth = 1;

    for c in chars.by_ref() {
        match c {
            '{' => {
                depth += 1;
                value.push(c);
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(value);
                }
                value.push(c);
            }
            _ => value.push(c),
        }
    }

    Err(ConfigError::ParseError {
        path: source_path.to_path_buf(),
        line: None,
        message: "unclosed substitution reference".to_string(),
    })
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_yaml(text: &str, path: &Path) -> Result<Value, ConfigError> {
    serde_yaml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        line: e.location().map(|l| l.line()),
        message: e.to_string(),
    })
}

/// Reads the `substitutions:` block into name → text pairs.
fn collect_substitutions(root: &Value) -> Result<IndexMap<String, String>, ConfigError> {
    let mut vars = IndexMap::new();
    let Some(block) = root.get(SUBSTITUTIONS_KEY) else {
        return Ok(vars);
    };
    let Value::Mapping(map) = block else {
        return Err(ConfigError::Schema {
            location: SUBSTITUTIONS_KEY.to_string(),
            message: "expected a mapping of names to values".to_string(),
        });
    };

    for (key, value) in map {
        let Some(name) = key.as_str() else {
            return Err(ConfigError::Schema {
                location: SUBSTITUTIONS_KEY.to_string(),
                message: "substitution names must be strings".to_string(),
            });
        };
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => {
                return Err(ConfigError::Schema {
                    location: format!("{SUBSTITUTIONS_KEY}.{name}"),
                    message: "substitution values must be scalars".to_string(),
                });
            }
        };
        vars.insert(name.to_string(), text);
    }

    Ok(vars)
}

/// Parses an environment variable with a default value.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Resolves a path relative to the current directory for display.
#[must_use]
pub fn display_path(path: &Path) -> PathBuf {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_substitution_from_block() {
        let mut sub = Substitution::new(vars(&[("radar", "radar1")]));
        let result = sub
            .substitute("ld2415h_id: ${radar}", Path::new("test.yaml"))
            .unwrap();
        assert_eq!(result, "ld2415h_id: radar1");
        assert!(sub.warnings.is_empty());
    }

    #[test]
    fn test_substitution_ignores_environment() {
        // PATH is always set on Unix/Windows
        let mut sub = Substitution::new(IndexMap::new());
        let result = sub
            .substitute("${PATH}", Path::new("test.yaml"))
            .unwrap();
        assert_eq!(result, "");
        assert_eq!(sub.warnings.len(), 1);
    }

    #[test]
    fn test_single_reference_detection() {
        assert!(is_single_reference("${radar}"));
        assert!(is_single_reference("${level:-10}"));
        assert!(!is_single_reference("${device} Speed"));
        assert!(!is_single_reference("${a}${b}"));
        assert!(!is_single_reference("radar"));
    }

    #[test]
    fn test_single_reference_keeps_scalar_type() {
        let mut sub = Substitution::new(vars(&[("level", "12"), ("label", "12 fps")]));
        let mut value: Value =
            serde_yaml::from_str("sensitivity: ${level}
name: ${label}
quoted: v${level}
")
                .unwrap();
        sub.expand(&mut value, Path::new("test.yaml")).unwrap();
        assert_eq!(value["sensitivity"], Value::from(12));
        assert_eq!(value["name"], Value::from("12 fps"));
        assert_eq!(value["quoted"], Value::from("v12"));
    }

    #[test]
    fn test_substitution_default() {
        let mut sub = Substitution::new(IndexMap::new());
        let result = sub
            .substitute(
                "name: ${LD2415H_TEST_NONEXISTENT_XYZ123:-Speed}",
                Path::new("test.yaml"),
            )
            .unwrap();
        assert_eq!(result, "name: Speed");
    }

    #[test]
    fn test_substitution_required_missing() {
        let mut sub = Substitution::new(IndexMap::new());
        let result = sub.substitute(
            "name: ${LD2415H_TEST_REQUIRED_XYZ123:?must be set}",
            Path::new("test.yaml"),
        );
        match result {
            Err(ConfigError::SubstitutionNotSet { var, message }) => {
                assert_eq!(var, "LD2415H_TEST_REQUIRED_XYZ123");
                assert_eq!(message, "must be set");
            }
            other => panic!("Expected SubstitutionNotSet error, got {other:?}"),
        }
    }

    #[test]
    fn test_substitution_escaped_dollar() {
        let mut sub = Substitution::new(IndexMap::new());
        let result = sub
            .substitute("name: $$5 radar", Path::new("test.yaml"))
            .unwrap();
        assert_eq!(result, "name: $5 radar");
    }

    #[test]
    fn test_substitution_missing_warning() {
        let mut sub = Substitution::new(IndexMap::new());
        let result = sub
            .substitute("name: ${LD2415H_TEST_WARN_XYZ123}", Path::new("test.yaml"))
            .unwrap();
        assert_eq!(result, "name: ");
        assert_eq!(sub.warnings.len(), 1);
        assert!(sub.warnings[0].message.contains("LD2415H_TEST_WARN_XYZ123"));
    }

    #[test]
    fn test_substitution_unclosed_is_parse_error() {
        let mut sub = Substitution::new(IndexMap::new());
        let result = sub.substitute("name: ${radar", Path::new("test.yaml"));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_collect_substitutions_scalars() {
        let root: Value =
            serde_yaml::from_str("substitutions:\n  radar: radar1\n  angle: 15\n  on: true\n")
                .unwrap();
        let vars = collect_substitutions(&root).unwrap();
        assert_eq!(vars.get("radar").map(String::as_str), Some("radar1"));
        assert_eq!(vars.get("angle").map(String::as_str), Some("15"));
    }

    #[test]
    fn test_collect_substitutions_rejects_nested_values() {
        let root: Value = serde_yaml::from_str("substitutions:\n  radar: [a, b]\n").unwrap();
        let err = collect_substitutions(&root).unwrap_err();
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_load_from_str_expands_block_substitutions() {
        let yaml = "\
substitutions:
  radar: radar1
uart:
  id: uart_bus
ld2415h:
  id: ${radar}
sensor:
  - platform: ld2415h
    ld2415h_id: ${radar}
    speed:
      name: Speed
";
        let result = ConfigLoader::with_defaults().load_from_str(yaml).unwrap();
        assert_eq!(result.config.hubs[0].id, "radar1");
        assert_eq!(result.config.sensors[0].ld2415h_id, "radar1");
    }

    #[test]
    fn test_substituted_value_with_colon_stays_a_string() {
        let yaml = "\
substitutions:
  label: \"Speed: front\"
uart:
  id: uart_bus
ld2415h:
  id: radar1
sensor:
  - platform: ld2415h
    ld2415h_id: radar1
    speed:
      name: ${label}
";
        let result = ConfigLoader::with_defaults().load_from_str(yaml).unwrap();
        let speed = result.config.sensors[0].speed.as_ref().unwrap();
        assert_eq!(speed.entity.name.as_deref(), Some("Speed: front"));
    }

    #[test]
    fn test_substituted_newlines_cannot_add_keys() {
        let yaml = "\
substitutions:
  label: \"Speed\\n    velocity:\\n      name: injected\"
uart:
  id: uart_bus
ld2415h:
  id: radar1
sensor:
  - platform: ld2415h
    ld2415h_id: radar1
    speed:
      name: ${label}
";
        let result = ConfigLoader::with_defaults().load_from_str(yaml).unwrap();
        let entry = &result.config.sensors[0];
        assert!(entry.velocity.is_none());
        let name = entry.speed.as_ref().unwrap().entity.name.as_deref().unwrap();
        assert!(name.starts_with("Speed\n"), "got {name:?}");
    }

    #[test]
    fn test_load_from_str_strips_bom() {
        let yaml = "\u{feff}ld2415h: []\n";
        let result = ConfigLoader::with_defaults().load_from_str(yaml).unwrap();
        assert!(result.config.hubs.is_empty());
    }

    #[test]
    fn test_load_from_str_empty_document() {
        let err = ConfigLoader::with_defaults().load_from_str("").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyDocument { .. }));
    }

    #[test]
    fn test_load_rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.yaml");
        std::fs::write(&path, "ld2415h: []\n".repeat(16)).unwrap();

        let loader = ConfigLoader::new(LoaderOptions {
            config_limits: ConfigLimits {
                max_config_size: 32,
                max_entries: 64,
            },
        });
        let err = loader.load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "file_size"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ConfigLoader::with_defaults()
            .load(Path::new("/nonexistent/ld2415h.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }

    #[test]
    fn test_config_limits_default() {
        let limits = ConfigLimits::default();
        assert!(limits.max_config_size > 0);
        assert!(limits.max_entries > 0);
    }
}

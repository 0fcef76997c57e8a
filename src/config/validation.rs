//! Configuration validation
//!
//! Turns a raw YAML document into a [`ProjectConfig`]. Validation runs in
//! two passes: the first collects every declared identifier, the second
//! checks keys, types, ranges and references against those declarations.
//!
//! Validation stops at the first error. Nothing is kept from a failed run.

use crate::config::loader::{ConfigLimits, LoadWarning, SUBSTITUTIONS_KEY};
use crate::config::schema::{
    DisplayMetadata, DriverSettings, EntityCategory, EntityConfig, HubConfig, NumberConfig,
    NumberKind, NumberPlatformConfig, NumberRange, PLATFORM, ProjectConfig, SampleRate,
    SelectConfig, SelectKind, SelectPlatformConfig, SensorConfig, SensorKind,
    SensorPlatformConfig, StateClass, TrackingMode, UartConfig,
};
use crate::error::ConfigError;

use indexmap::IndexMap;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::sync::LazyLock;

static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("valid regex"));

static ICON_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w\-]+:[\w\-]+$").expect("valid regex"));

/// Key holding the owning-component reference.
pub const HUB_REFERENCE_KEY: &str = "ld2415h_id";

const UART_SECTION: &str = "uart";
const HUB_SECTION: &str = "ld2415h";
const SENSOR_SECTION: &str = "sensor";
const NUMBER_SECTION: &str = "number";
const SELECT_SECTION: &str = "select";

const ENTITY_KEYS: &[&str] = &[
    "id",
    "name",
    "internal",
    "disabled_by_default",
    "icon",
    "entity_category",
];

const SENSOR_ONLY_KEYS: &[&str] = &[
    "unit_of_measurement",
    "accuracy_decimals",
    "device_class",
    "state_class",
    "force_update",
    "filters",
];

const ACCURACY_RANGE: NumberRange = NumberRange {
    min: 0,
    max: 6,
    step: 1,
};

// ============================================================================
// Declarations
// ============================================================================

/// The type of object an identifier was declared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    /// A UART bus.
    Uart,
    /// An LD2415H hub.
    Ld2415h,
    /// A sensor output.
    Sensor,
    /// A number output.
    Number,
    /// A select output.
    Select,
    /// A platform entry's own identifier.
    PlatformEntry,
}

impl ComponentKind {
    /// Human-readable name used in messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Uart => "uart bus",
            Self::Ld2415h => "ld2415h component",
            Self::Sensor => "sensor",
            Self::Number => "number",
            Self::Select => "select",
            Self::PlatformEntry => "platform entry",
        }
    }
}

#[derive(Debug, Clone)]
struct Declaration {
    kind: ComponentKind,
    location: String,
}

// ============================================================================
// Validator
// ============================================================================

/// Configuration validator.
///
/// A validator may be reused; each call to [`Validator::validate`] starts
/// from a clean declaration table.
#[derive(Debug, Default)]
pub struct Validator {
    limits: ConfigLimits,
    declared: IndexMap<String, Declaration>,
    foreign_ids: Vec<String>,
    warnings: Vec<LoadWarning>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new(limits: ConfigLimits) -> Self {
        Self {
            limits,
            declared: IndexMap::new(),
            foreign_ids: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Returns and clears the warnings collected so far.
    pub fn take_warnings(&mut self) -> Vec<LoadWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Declares an identifier, as if it appeared in the document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateId`] if the identifier is already
    /// declared, or a schema error if it is not a valid identifier.
    pub fn declare(
        &mut self,
        id: &str,
        kind: ComponentKind,
        location: &str,
    ) -> Result<(), ConfigError> {
        check_id_syntax(id, location)?;
        if let Some(previous) = self.declared.get(id) {
            return Err(ConfigError::DuplicateId {
                id: id.to_string(),
                location: location.to_string(),
                previous: previous.location.clone(),
            });
        }
        self.declared.insert(
            id.to_string(),
            Declaration {
                kind,
                location: location.to_string(),
            },
        );
        Ok(())
    }

    /// Validates a whole document.
    ///
    /// # Errors
    ///
    /// Returns the first schema or reference error found.
    pub fn validate(&mut self, root: &Value) -> Result<ProjectConfig, ConfigError> {
        self.declared.clear();
        self.foreign_ids.clear();
        self.warnings.clear();

        let Value::Mapping(root) = root else {
            return Err(schema_error("<root>", "expected a mapping of sections"));
        };

        for (key, value) in root {
            let Some(section) = key.as_str() else {
                return Err(schema_error("<root>", "section names must be strings"));
            };
            if ![
                SUBSTITUTIONS_KEY,
                UART_SECTION,
                HUB_SECTION,
                SENSOR_SECTION,
                NUMBER_SECTION,
                SELECT_SECTION,
            ]
            .contains(&section)
            {
                self.add_warning(
                    section,
                    &format!("Section '{section}' is handled by another component, skipping"),
                );
                collect_ids(value, &mut self.foreign_ids);
            }
        }

        let uarts = self.section(root, UART_SECTION)?;
        let hubs = self.section(root, HUB_SECTION)?;
        let sensors = self.platform_section(root, SENSOR_SECTION)?;
        let numbers = self.platform_section(root, NUMBER_SECTION)?;
        let selects = self.platform_section(root, SELECT_SECTION)?;

        // Pass 1: declarations
        for (location, value) in &uarts {
            self.declare_required_id(value, location, ComponentKind::Uart)?;
        }
        for (location, value) in &hubs {
            self.declare_required_id(value, location, ComponentKind::Ld2415h)?;
        }
        let sensor_keys: Vec<&str> = SensorKind::ALL.iter().map(|k| k.key()).collect();
        let number_keys: Vec<&str> = NumberKind::ALL.iter().map(|k| k.key()).collect();
        let select_keys: Vec<&str> = SelectKind::ALL.iter().map(|k| k.key()).collect();
        for (location, value) in &sensors {
            self.declare_platform_ids(value, location, &sensor_keys, ComponentKind::Sensor)?;
        }
        for (location, value) in &numbers {
            self.declare_platform_ids(value, location, &number_keys, ComponentKind::Number)?;
        }
        for (location, value) in &selects {
            self.declare_platform_ids(value, location, &select_keys, ComponentKind::Select)?;
        }

        // Pass 2: schema and references
        let mut config = ProjectConfig {
            foreign_ids: self.foreign_ids.clone(),
            ..ProjectConfig::default()
        };
        for (location, value) in &uarts {
            config.uarts.push(Self::validate_uart(value, location)?);
        }
        for (location, value) in &hubs {
            config.hubs.push(self.validate_hub(value, location)?);
        }
        for (location, value) in &sensors {
            config.sensors.push(self.validate_sensor_entry(value, location)?);
        }
        for (location, value) in &numbers {
            config.numbers.push(self.validate_number_entry(value, location)?);
        }
        for (location, value) in &selects {
            config.selects.push(self.validate_select_entry(value, location)?);
        }

        self.warn_unused_hubs(&config);

        tracing::debug!(declared = self.declared.len(), "declarations collected");
        Ok(config)
    }

    // ========================================================================
    // Sections
    // ========================================================================

    /// Returns the entries of a section, accepting a mapping or a list.
    fn section<'a>(
        &self,
        root: &'a Mapping,
        name: &str,
    ) -> Result<Vec<(String, &'a Value)>, ConfigError> {
        let entries: Vec<(String, &Value)> = match root.get(name) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Sequence(items)) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| (format!("{name}[{idx}]"), item))
                .collect(),
            Some(item @ Value::Mapping(_)) => vec![(name.to_string(), item)],
            Some(_) => {
                return Err(schema_error(name, "expected a mapping or a list of mappings"));
            }
        };

        if entries.len() > self.limits.max_entries {
            return Err(ConfigError::InvalidValue {
                field: name.to_string(),
                value: format!("{} entries", entries.len()),
                expected: format!("at most {} entries", self.limits.max_entries),
            });
        }

        Ok(entries)
    }

    /// Returns the entries of a platform section that belong to this platform.
    fn platform_section<'a>(
        &mut self,
        root: &'a Mapping,
        name: &str,
    ) -> Result<Vec<(String, &'a Value)>, ConfigError> {
        let mut ours = Vec::new();
        for (location, value) in self.section(root, name)? {
            let entry = Entry::new(value, &location)?;
            let platform = entry
                .string("platform")?
                .ok_or_else(|| schema_error(&location, "missing required key 'platform'"))?;
            if platform == PLATFORM {
                ours.push((location, value));
            } else {
                self.add_warning(
                    &location,
                    &format!("Platform '{platform}' is handled by another component, skipping"),
                );
                collect_ids(value, &mut self.foreign_ids);
            }
        }
        Ok(ours)
    }

    fn declare_required_id(
        &mut self,
        value: &Value,
        location: &str,
        kind: ComponentKind,
    ) -> Result<(), ConfigError> {
        let entry = Entry::new(value, location)?;
        let id = entry
            .string("id")?
            .ok_or_else(|| schema_error(location, "missing required key 'id'"))?;
        self.declare(&id, kind, &entry.child("id"))
    }

    fn declare_platform_ids(
        &mut self,
        value: &Value,
        location: &str,
        output_keys: &[&str],
        kind: ComponentKind,
    ) -> Result<(), ConfigError> {
        let entry = Entry::new(value, location)?;
        if let Some(id) = entry.string("id")? {
            self.declare(&id, ComponentKind::PlatformEntry, &entry.child("id"))?;
        }
        for key in output_keys {
            let Some(output) = entry.get(key) else {
                continue;
            };
            let output = Entry::new(output, &entry.child(key))?;
            if let Some(id) = output.string("id")? {
                self.declare(&id, kind, &output.child("id"))?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Entries
    // ========================================================================

    fn validate_uart(value: &Value, location: &str) -> Result<UartConfig, ConfigError> {
        // Bus parameters belong to the uart component.
        let entry = Entry::new(value, location)?;
        let id = entry
            .string("id")?
            .ok_or_else(|| schema_error(location, "missing required key 'id'"))?;
        Ok(UartConfig { id })
    }

    fn validate_hub(&self, value: &Value, location: &str) -> Result<HubConfig, ConfigError> {
        let entry = Entry::new(value, location)?;

        let mut allowed = vec!["id", "uart_id"];
        allowed.extend(NumberKind::ALL.iter().map(|k| k.key()));
        allowed.extend(SelectKind::ALL.iter().map(|k| k.key()));
        entry.reject_unknown(&allowed)?;

        let id = entry
            .string("id")?
            .ok_or_else(|| schema_error(location, "missing required key 'id'"))?;

        let uart_id = if entry.get("uart_id").is_some() {
            self.resolve_reference(&entry, "uart_id", ComponentKind::Uart)?
        } else {
            self.default_uart(&entry.child("uart_id"))?
        };

        let mut settings = DriverSettings::default();
        for kind in NumberKind::ALL {
            if let Some(value) = entry.int_in(kind.key(), kind.range())? {
                settings.set(kind, value);
            }
        }
        if let Some(label) = entry.string(SelectKind::TrackingMode.key())? {
            settings.tracking_mode = TrackingMode::from_label(&label).ok_or_else(|| {
                unknown_option(&entry, SelectKind::TrackingMode, &label)
            })?;
        }
        if let Some(label) = entry.string(SelectKind::SampleRate.key())? {
            settings.sample_rate = SampleRate::from_label(&label)
                .ok_or_else(|| unknown_option(&entry, SelectKind::SampleRate, &label))?;
        }

        Ok(HubConfig {
            id,
            uart_id,
            settings,
        })
    }

    /// Validates one `sensor:` entry of this platform.
    ///
    /// Identifiers used by the entry must already be declared, either by a
    /// prior [`Validator::validate`] pass or through [`Validator::declare`].
    ///
    /// # Errors
    ///
    /// Returns a schema error for unknown keys or malformed values and a
    /// reference error when `ld2415h_id` is missing or does not name an
    /// LD2415H component.
    pub fn validate_sensor_entry(
        &self,
        value: &Value,
        location: &str,
    ) -> Result<SensorPlatformConfig, ConfigError> {
        let entry = Entry::new(value, location)?;

        let mut allowed = vec!["platform", "id", HUB_REFERENCE_KEY];
        allowed.extend(SensorKind::ALL.iter().map(|k| k.key()));
        entry.reject_unknown(&allowed)?;

        let ld2415h_id = self.resolve_reference(&entry, HUB_REFERENCE_KEY, ComponentKind::Ld2415h)?;

        let speed = entry
            .get(SensorKind::Speed.key())
            .map(|v| sensor_output(v, &entry.child(SensorKind::Speed.key()), SensorKind::Speed))
            .transpose()?;
        let velocity = entry
            .get(SensorKind::Velocity.key())
            .map(|v| {
                sensor_output(
                    v,
                    &entry.child(SensorKind::Velocity.key()),
                    SensorKind::Velocity,
                )
            })
            .transpose()?;

        Ok(SensorPlatformConfig {
            id: entry.string("id")?,
            ld2415h_id,
            speed,
            velocity,
        })
    }

    /// Validates one `number:` entry of this platform.
    ///
    /// # Errors
    ///
    /// Same as [`Validator::validate_sensor_entry`].
    pub fn validate_number_entry(
        &self,
        value: &Value,
        location: &str,
    ) -> Result<NumberPlatformConfig, ConfigError> {
        let entry = Entry::new(value, location)?;

        let mut allowed = vec!["platform", "id", HUB_REFERENCE_KEY];
        allowed.extend(NumberKind::ALL.iter().map(|k| k.key()));
        entry.reject_unknown(&allowed)?;

        let ld2415h_id = self.resolve_reference(&entry, HUB_REFERENCE_KEY, ComponentKind::Ld2415h)?;

        let mut outputs = Vec::new();
        for kind in NumberKind::ALL {
            let Some(value) = entry.get(kind.key()) else {
                continue;
            };
            let output = Entry::new(value, &entry.child(kind.key()))?;
            output.reject_unknown(ENTITY_KEYS)?;
            outputs.push((
                kind,
                NumberConfig {
                    entity: entity_config(&output, Some(EntityCategory::Config))?,
                    icon: output.icon()?.unwrap_or_else(|| kind.icon().to_string()),
                },
            ));
        }

        Ok(NumberPlatformConfig {
            id: entry.string("id")?,
            ld2415h_id,
            outputs,
        })
    }

    /// Validates one `select:` entry of this platform.
    ///
    /// # Errors
    ///
    /// Same as [`Validator::validate_sensor_entry`].
    pub fn validate_select_entry(
        &self,
        value: &Value,
        location: &str,
    ) -> Result<SelectPlatformConfig, ConfigError> {
        let entry = Entry::new(value, location)?;

        let mut allowed = vec!["platform", "id", HUB_REFERENCE_KEY];
        allowed.extend(SelectKind::ALL.iter().map(|k| k.key()));
        entry.reject_unknown(&allowed)?;

        let ld2415h_id = self.resolve_reference(&entry, HUB_REFERENCE_KEY, ComponentKind::Ld2415h)?;

        let mut outputs = Vec::new();
        for kind in SelectKind::ALL {
            let Some(value) = entry.get(kind.key()) else {
                continue;
            };
            let output = Entry::new(value, &entry.child(kind.key()))?;
            output.reject_unknown(ENTITY_KEYS)?;
            outputs.push((
                kind,
                SelectConfig {
                    entity: entity_config(&output, Some(EntityCategory::Config))?,
                    icon: output.icon()?.unwrap_or_else(|| kind.icon().to_string()),
                },
            ));
        }

        Ok(SelectPlatformConfig {
            id: entry.string("id")?,
            ld2415h_id,
            outputs,
        })
    }

    // ========================================================================
    // References
    // ========================================================================

    fn resolve_reference(
        &self,
        entry: &Entry<'_>,
        key: &str,
        expected: ComponentKind,
    ) -> Result<String, ConfigError> {
        let location = entry.child(key);
        let reference_error = |id: Option<&str>, message: String| ConfigError::Reference {
            location: location.clone(),
            id: id.map(str::to_string),
            message,
        };

        let Some(value) = entry.get(key) else {
            return Err(reference_error(
                None,
                format!("missing required reference '{key}'"),
            ));
        };
        let Some(id) = value.as_str() else {
            return Err(reference_error(
                None,
                format!("expected the ID of a {}", expected.label()),
            ));
        };

        match self.declared.get(id) {
            Some(decl) if decl.kind == expected => Ok(id.to_string()),
            Some(decl) => Err(reference_error(
                Some(id),
                format!(
                    "ID '{id}' is a {} (declared at {}), expected a {}",
                    decl.kind.label(),
                    decl.location,
                    expected.label()
                ),
            )),
            None => {
                let hint = suggest(
                    id,
                    self.declared
                        .iter()
                        .filter(|(_, d)| d.kind == expected)
                        .map(|(name, _)| name.as_str()),
                )
                .map_or_else(String::new, |s| format!(" (did you mean '{s}'?)"));
                Err(reference_error(
                    Some(id),
                    format!("{} '{id}' is not declared{hint}", expected.label()),
                ))
            }
        }
    }

    fn default_uart(&self, location: &str) -> Result<String, ConfigError> {
        let uarts: Vec<&String> = self
            .declared
            .iter()
            .filter(|(_, d)| d.kind == ComponentKind::Uart)
            .map(|(id, _)| id)
            .collect();
        match uarts.as_slice() {
            [only] => Ok((*only).clone()),
            [] => Err(ConfigError::Reference {
                location: location.to_string(),
                id: None,
                message: "no uart bus is declared".to_string(),
            }),
            _ => Err(ConfigError::Reference {
                location: location.to_string(),
                id: None,
                message: "several uart buses are declared, set 'uart_id'".to_string(),
            }),
        }
    }

    fn warn_unused_hubs(&mut self, config: &ProjectConfig) {
        for hub in &config.hubs {
            let used = config.sensors.iter().any(|e| e.ld2415h_id == hub.id)
                || config.numbers.iter().any(|e| e.ld2415h_id == hub.id)
                || config.selects.iter().any(|e| e.ld2415h_id == hub.id);
            if !used {
                self.add_warning(
                    HUB_SECTION,
                    &format!("Component '{}' has no outputs bound to it", hub.id),
                );
            }
        }
    }

    /// Adds a warning to the collection.
    fn add_warning(&mut self, location: &str, message: &str) {
        self.warnings.push(LoadWarning {
            message: message.to_string(),
            location: Some(location.to_string()),
        });
    }
}

// ============================================================================
// Output Schemas
// ============================================================================

fn sensor_output(
    value: &Value,
    location: &str,
    kind: SensorKind,
) -> Result<SensorConfig, ConfigError> {
    let entry = Entry::new(value, location)?;

    let mut allowed = ENTITY_KEYS.to_vec();
    allowed.extend_from_slice(SENSOR_ONLY_KEYS);
    entry.reject_unknown(&allowed)?;

    let defaults = kind.defaults();
    let display = DisplayMetadata {
        unit_of_measurement: entry
            .string("unit_of_measurement")?
            .unwrap_or(defaults.unit_of_measurement),
        icon: entry.icon()?.unwrap_or(defaults.icon),
        accuracy_decimals: entry
            .int_in("accuracy_decimals", ACCURACY_RANGE)?
            .unwrap_or(defaults.accuracy_decimals),
        device_class: entry
            .string("device_class")?
            .unwrap_or(defaults.device_class),
        state_class: entry
            .enum_value::<StateClass>("state_class", "measurement, total or total_increasing")?
            .unwrap_or(defaults.state_class),
    };

    let filters = match entry.get("filters") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Sequence(items)) => items.clone(),
        Some(_) => return Err(schema_error(&entry.child("filters"), "expected a list")),
    };

    Ok(SensorConfig {
        entity: entity_config(&entry, None)?,
        display,
        force_update: entry.bool("force_update")?.unwrap_or(false),
        filters,
    })
}

fn entity_config(
    entry: &Entry<'_>,
    default_category: Option<EntityCategory>,
) -> Result<EntityConfig, ConfigError> {
    let name = entry.string("name")?;
    if name.as_deref().is_some_and(str::is_empty) {
        return Err(schema_error(&entry.child("name"), "name cannot be empty"));
    }
    let internal = entry.bool("internal")?.unwrap_or(name.is_none());
    Ok(EntityConfig {
        id: entry.string("id")?,
        internal,
        disabled_by_default: entry.bool("disabled_by_default")?.unwrap_or(false),
        entity_category: entry
            .enum_value::<EntityCategory>("entity_category", "config or diagnostic")?
            .or(default_category),
        name,
    })
}

// ============================================================================
// Raw Mapping Access
// ============================================================================

/// A mapping under validation together with its location in the document.
///
/// A YAML null (`speed:` with nothing after it) reads as an empty mapping.
struct Entry<'a> {
    map: Option<&'a Mapping>,
    location: String,
}

impl<'a> Entry<'a> {
    fn new(value: &'a Value, location: &str) -> Result<Self, ConfigError> {
        let map = match value {
            Value::Mapping(map) => Some(map),
            Value::Null => None,
            _ => return Err(schema_error(location, "expected a mapping")),
        };
        Ok(Self {
            map,
            location: location.to_string(),
        })
    }

    fn child(&self, key: &str) -> String {
        format!("{}.{key}", self.location)
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.and_then(|m| m.get(key))
    }

    fn reject_unknown(&self, allowed: &[&str]) -> Result<(), ConfigError> {
        let Some(map) = self.map else {
            return Ok(());
        };
        for key in map.keys() {
            let Some(key) = key.as_str() else {
                return Err(schema_error(&self.location, "keys must be strings"));
            };
            if !allowed.contains(&key) {
                return Err(ConfigError::UnknownKey {
                    location: self.location.clone(),
                    key: key.to_string(),
                    suggestion: suggest(key, allowed.iter().copied()),
                });
            }
        }
        Ok(())
    }

    fn string(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(schema_error(
                &self.child(key),
                &format!("expected a string, got {}", describe(other)),
            )),
        }
    }

    fn bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(schema_error(
                &self.child(key),
                &format!("expected a boolean, got {}", describe(other)),
            )),
        }
    }

    fn int_in(&self, key: &str, range: NumberRange) -> Result<Option<u8>, ConfigError> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        let expected = format!("an integer between {} and {}", range.min, range.max);
        let Some(n) = value.as_i64() else {
            return Err(schema_error(
                &self.child(key),
                &format!("expected {expected}, got {}", describe(value)),
            ));
        };
        if !range.contains(n) {
            return Err(schema_error(
                &self.child(key),
                &format!("expected {expected}, got {n}"),
            ));
        }
        u8::try_from(n)
            .map(Some)
            .map_err(|_| schema_error(&self.child(key), &format!("expected {expected}, got {n}")))
    }

    fn enum_value<T: DeserializeOwned>(
        &self,
        key: &str,
        expected: &str,
    ) -> Result<Option<T>, ConfigError> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        serde_yaml::from_value(value.clone()).map(Some).map_err(|_| {
            schema_error(
                &self.child(key),
                &format!("expected one of {expected}, got {}", describe(value)),
            )
        })
    }

    fn icon(&self) -> Result<Option<String>, ConfigError> {
        let icon = self.string("icon")?;
        if let Some(icon) = &icon {
            if !ICON_PATTERN.is_match(icon) {
                return Err(schema_error(
                    &self.child("icon"),
                    &format!("icon '{icon}' must look like 'mdi:name'"),
                ));
            }
        }
        Ok(icon)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn schema_error(location: &str, message: &str) -> ConfigError {
    ConfigError::Schema {
        location: location.to_string(),
        message: message.to_string(),
    }
}

fn unknown_option(entry: &Entry<'_>, kind: SelectKind, label: &str) -> ConfigError {
    schema_error(
        &entry.child(kind.key()),
        &format!(
            "unknown option '{label}', expected one of: {}",
            kind.options().join(", ")
        ),
    )
}

/// Collects every `id` value below a section owned by another component.
fn collect_ids(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Mapping(map) => {
            for (key, item) in map {
                match (key.as_str(), item.as_str()) {
                    (Some("id"), Some(id)) => out.push(id.to_string()),
                    _ => collect_ids(item, out),
                }
            }
        }
        Value::Sequence(items) => items.iter().for_each(|item| collect_ids(item, out)),
        Value::Tagged(tagged) => collect_ids(&tagged.value, out),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
}

fn check_id_syntax(id: &str, location: &str) -> Result<(), ConfigError> {
    if ID_PATTERN.is_match(id) {
        Ok(())
    } else {
        Err(schema_error(
            location,
            &format!("'{id}' is not a valid ID (letters, digits and underscores, not starting with a digit)"),
        ))
    }
}

/// Returns the closest candidate within a Damerau-Levenshtein distance of 3.
fn suggest<'a>(input: &str, candidates: impl Iterator<Item = &'a str>) -> Option<String> {
    candidates
        .map(|c| (c, strsim::damerau_levenshtein(input, c)))
        .filter(|(_, dist)| *dist <= 3)
        .min_by_key(|(_, dist)| *dist)
        .map(|(c, _)| c.to_string())
}

const fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

//! Configuration schema types
//!
//! Validated, typed form of an LD2415H configuration document. The validator
//! produces these from raw YAML; the binding generator consumes them.

use serde::{Deserialize, Serialize};

/// Platform name used by `sensor:`, `number:` and `select:` entries.
pub const PLATFORM: &str = "ld2415h";

/// Default icon for speed and velocity outputs.
pub const ICON_SPEEDOMETER: &str = "mdi:speedometer";

/// Default unit for speed and velocity outputs.
pub const UNIT_KILOMETER_PER_HOUR: &str = "km/h";

/// Device class shared by both sensor outputs.
pub const DEVICE_CLASS_SPEED: &str = "speed";

// ============================================================================
// Document
// ============================================================================

/// A fully validated configuration document.
///
/// Sections keep document order. Entries belonging to other platforms are
/// not represented here.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectConfig {
    /// Declared UART buses.
    pub uarts: Vec<UartConfig>,

    /// Declared radar hubs (owning components).
    pub hubs: Vec<HubConfig>,

    /// `sensor:` entries for this platform.
    pub sensors: Vec<SensorPlatformConfig>,

    /// `number:` entries for this platform.
    pub numbers: Vec<NumberPlatformConfig>,

    /// `select:` entries for this platform.
    pub selects: Vec<SelectPlatformConfig>,

    /// Identifiers used by other components in the same document.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub foreign_ids: Vec<String>,
}

/// A UART bus declaration. Only the identifier is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UartConfig {
    /// Bus identifier.
    pub id: String,
}

// ============================================================================
// Hub
// ============================================================================

/// An `ld2415h:` hub declaration.
#[derive(Debug, Clone, Serialize)]
pub struct HubConfig {
    /// Hub identifier, referenced by `ld2415h_id`.
    pub id: String,

    /// UART bus the radar is attached to.
    pub uart_id: String,

    /// Initial driver settings.
    pub settings: DriverSettings,
}

/// Radar settings pushed to the module at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DriverSettings {
    /// Minimum reported speed in km/h.
    pub min_speed_threshold: u8,
    /// Mounting angle compensation in degrees.
    pub compensation_angle: u8,
    /// Detection sensitivity.
    pub sensitivity: u8,
    /// Direction filter.
    pub tracking_mode: TrackingMode,
    /// Reporting rate.
    pub sample_rate: SampleRate,
    /// Anti-vibration correction.
    pub vibration_correction: u8,
    /// Relay hold time in seconds.
    pub relay_trigger_duration: u8,
    /// Relay trigger speed in km/h.
    pub relay_trigger_speed: u8,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            min_speed_threshold: 1,
            compensation_angle: 0,
            sensitivity: 10,
            tracking_mode: TrackingMode::ApproachingAndRetreating,
            sample_rate: SampleRate::Fps11,
            vibration_correction: 18,
            relay_trigger_duration: 0,
            relay_trigger_speed: 1,
        }
    }
}

impl DriverSettings {
    /// Returns the numeric setting backing a number output.
    #[must_use]
    pub const fn get(&self, kind: NumberKind) -> u8 {
        match kind {
            NumberKind::MinSpeedThreshold => self.min_speed_threshold,
            NumberKind::CompensationAngle => self.compensation_angle,
            NumberKind::Sensitivity => self.sensitivity,
            NumberKind::VibrationCorrection => self.vibration_correction,
            NumberKind::RelayTriggerDuration => self.relay_trigger_duration,
            NumberKind::RelayTriggerSpeed => self.relay_trigger_speed,
        }
    }

    /// Sets the numeric setting backing a number output.
    pub const fn set(&mut self, kind: NumberKind, value: u8) {
        match kind {
            NumberKind::MinSpeedThreshold => self.min_speed_threshold = value,
            NumberKind::CompensationAngle => self.compensation_angle = value,
            NumberKind::Sensitivity => self.sensitivity = value,
            NumberKind::VibrationCorrection => self.vibration_correction = value,
            NumberKind::RelayTriggerDuration => self.relay_trigger_duration = value,
            NumberKind::RelayTriggerSpeed => self.relay_trigger_speed = value,
        }
    }
}

/// Direction filter of the radar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackingMode {
    /// Report both directions.
    ApproachingAndRetreating,
    /// Report approaching targets only.
    Approaching,
    /// Report retreating targets only.
    Retreating,
}

impl TrackingMode {
    /// All modes in wire-code order.
    pub const ALL: [Self; 3] = [
        Self::ApproachingAndRetreating,
        Self::Approaching,
        Self::Retreating,
    ];

    /// Option label shown to users.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ApproachingAndRetreating => "Approaching and Retreating",
            Self::Approaching => "Approaching",
            Self::Retreating => "Retreating",
        }
    }

    /// Code the driver sends to the module.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Parses an option label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.label() == label)
    }
}

/// Reporting rate of the radar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SampleRate {
    /// About 22 frames per second.
    Fps22,
    /// About 11 frames per second.
    Fps11,
    /// About 6 frames per second.
    Fps6,
}

impl SampleRate {
    /// All rates in wire-code order.
    pub const ALL: [Self; 3] = [Self::Fps22, Self::Fps11, Self::Fps6];

    /// Option label shown to users.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fps22 => "~22 fps",
            Self::Fps11 => "~11 fps",
            Self::Fps6 => "~6 fps",
        }
    }

    /// Code the driver sends to the module.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Parses an option label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.label() == label)
    }
}

// ============================================================================
// Entity Metadata
// ============================================================================

/// Keys shared by every output entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityConfig {
    /// Explicit identifier; a fresh one is generated when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display name. Entities without a name are internal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Hidden from the frontend.
    pub internal: bool,

    /// Disabled until the user enables it.
    pub disabled_by_default: bool,

    /// Entity category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_category: Option<EntityCategory>,
}

/// Entity category of an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    /// A setting.
    Config,
    /// A diagnostic value.
    Diagnostic,
}

impl EntityCategory {
    /// Name of the runtime constant.
    #[must_use]
    pub const fn constant(self) -> &'static str {
        match self {
            Self::Config => "ENTITY_CATEGORY_CONFIG",
            Self::Diagnostic => "ENTITY_CATEGORY_DIAGNOSTIC",
        }
    }
}

// ============================================================================
// Sensor Outputs
// ============================================================================

/// The physical quantity a sensor output reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Absolute speed.
    Speed,
    /// Signed velocity (negative when retreating).
    Velocity,
}

impl SensorKind {
    /// Binding order.
    pub const ALL: [Self; 2] = [Self::Speed, Self::Velocity];

    /// Configuration key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Speed => "speed",
            Self::Velocity => "velocity",
        }
    }

    /// Setter invoked on the owning component.
    #[must_use]
    pub const fn setter(self) -> &'static str {
        match self {
            Self::Speed => "set_speed_sensor",
            Self::Velocity => "set_velocity_sensor",
        }
    }

    /// Default display metadata.
    #[must_use]
    pub fn defaults(self) -> DisplayMetadata {
        match self {
            Self::Speed | Self::Velocity => DisplayMetadata {
                unit_of_measurement: UNIT_KILOMETER_PER_HOUR.to_string(),
                icon: ICON_SPEEDOMETER.to_string(),
                accuracy_decimals: 1,
                device_class: DEVICE_CLASS_SPEED.to_string(),
                state_class: StateClass::Measurement,
            },
        }
    }
}

/// Display metadata of a numeric sensor output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayMetadata {
    /// Unit of measurement.
    pub unit_of_measurement: String,
    /// Frontend icon.
    pub icon: String,
    /// Decimal places shown.
    pub accuracy_decimals: u8,
    /// Device class.
    pub device_class: String,
    /// State class.
    pub state_class: StateClass,
}

/// State class of a sensor output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    /// Instantaneous measurement.
    Measurement,
    /// Total that may go up and down.
    Total,
    /// Monotonically increasing total.
    TotalIncreasing,
}

impl StateClass {
    /// Name of the runtime constant.
    #[must_use]
    pub const fn constant(self) -> &'static str {
        match self {
            Self::Measurement => "sensor::STATE_CLASS_MEASUREMENT",
            Self::Total => "sensor::STATE_CLASS_TOTAL",
            Self::TotalIncreasing => "sensor::STATE_CLASS_TOTAL_INCREASING",
        }
    }
}

/// One `speed:` or `velocity:` sub-entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorConfig {
    /// Entity keys.
    #[serde(flatten)]
    pub entity: EntityConfig,

    /// Display metadata after applying overrides to the variant defaults.
    pub display: DisplayMetadata,

    /// Publish even when the value did not change.
    pub force_update: bool,

    /// Filter chain, handed to the sensor platform unchanged.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<serde_yaml::Value>,
}

/// A `sensor:` entry with `platform: ld2415h`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorPlatformConfig {
    /// Identifier of the entry itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Owning hub.
    pub ld2415h_id: String,

    /// Speed output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<SensorConfig>,

    /// Velocity output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity: Option<SensorConfig>,
}

impl SensorPlatformConfig {
    /// Present outputs in binding order.
    pub fn outputs(&self) -> impl Iterator<Item = (SensorKind, &SensorConfig)> {
        SensorKind::ALL
            .into_iter()
            .filter_map(|kind| self.output(kind).map(|cfg| (kind, cfg)))
    }

    /// The output configured for `kind`, if any.
    #[must_use]
    pub const fn output(&self, kind: SensorKind) -> Option<&SensorConfig> {
        match kind {
            SensorKind::Speed => self.speed.as_ref(),
            SensorKind::Velocity => self.velocity.as_ref(),
        }
    }
}

// ============================================================================
// Number Outputs
// ============================================================================

/// A tunable radar setting exposed as a number entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberKind {
    /// Minimum reported speed.
    MinSpeedThreshold,
    /// Mounting angle compensation.
    CompensationAngle,
    /// Detection sensitivity.
    Sensitivity,
    /// Anti-vibration correction.
    VibrationCorrection,
    /// Relay hold time.
    RelayTriggerDuration,
    /// Relay trigger speed.
    RelayTriggerSpeed,
}

/// Value range of a number output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumberRange {
    /// Lowest accepted value.
    pub min: u8,
    /// Highest accepted value.
    pub max: u8,
    /// Step between values.
    pub step: u8,
}

impl NumberRange {
    /// Returns `true` if `value` lies within the range.
    #[must_use]
    pub const fn contains(&self, value: i64) -> bool {
        value >= self.min as i64 && value <= self.max as i64
    }
}

impl NumberKind {
    /// Binding order.
    pub const ALL: [Self; 6] = [
        Self::MinSpeedThreshold,
        Self::CompensationAngle,
        Self::Sensitivity,
        Self::VibrationCorrection,
        Self::RelayTriggerDuration,
        Self::RelayTriggerSpeed,
    ];

    /// Configuration key, shared by the hub setting and the number entry.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::MinSpeedThreshold => "min_speed_threshold",
            Self::CompensationAngle => "compensation_angle",
            Self::Sensitivity => "sensitivity",
            Self::VibrationCorrection => "vibration_correction",
            Self::RelayTriggerDuration => "relay_trigger_duration",
            Self::RelayTriggerSpeed => "relay_trigger_speed",
        }
    }

    /// Generated class of the number entity.
    #[must_use]
    pub const fn class(self) -> &'static str {
        match self {
            Self::MinSpeedThreshold => "ld2415h::MinSpeedThresholdNumber",
            Self::CompensationAngle => "ld2415h::CompensationAngleNumber",
            Self::Sensitivity => "ld2415h::SensitivityNumber",
            Self::VibrationCorrection => "ld2415h::VibrationCorrectionNumber",
            Self::RelayTriggerDuration => "ld2415h::RelayTriggerDurationNumber",
            Self::RelayTriggerSpeed => "ld2415h::RelayTriggerSpeedNumber",
        }
    }

    /// Setter for the entity on the owning component.
    #[must_use]
    pub const fn setter(self) -> &'static str {
        match self {
            Self::MinSpeedThreshold => "set_min_speed_threshold_number",
            Self::CompensationAngle => "set_compensation_angle_number",
            Self::Sensitivity => "set_sensitivity_number",
            Self::VibrationCorrection => "set_vibration_correction_number",
            Self::RelayTriggerDuration => "set_relay_trigger_duration_number",
            Self::RelayTriggerSpeed => "set_relay_trigger_speed_number",
        }
    }

    /// Setter for the initial setting on the owning component.
    #[must_use]
    pub const fn value_setter(self) -> &'static str {
        match self {
            Self::MinSpeedThreshold => "set_min_speed_threshold",
            Self::CompensationAngle => "set_compensation_angle",
            Self::Sensitivity => "set_sensitivity",
            Self::VibrationCorrection => "set_vibration_correction",
            Self::RelayTriggerDuration => "set_relay_trigger_duration",
            Self::RelayTriggerSpeed => "set_relay_trigger_speed",
        }
    }

    /// Accepted values.
    #[must_use]
    pub const fn range(self) -> NumberRange {
        let (min, max) = match self {
            Self::MinSpeedThreshold => (1, 60),
            Self::CompensationAngle => (0, 90),
            Self::Sensitivity => (1, 15),
            Self::VibrationCorrection => (0, 112),
            Self::RelayTriggerDuration | Self::RelayTriggerSpeed => (0, 255),
        };
        NumberRange { min, max, step: 1 }
    }

    /// Unit of measurement, if the setting has one.
    #[must_use]
    pub const fn unit(self) -> Option<&'static str> {
        match self {
            Self::MinSpeedThreshold | Self::RelayTriggerSpeed => Some(UNIT_KILOMETER_PER_HOUR),
            Self::CompensationAngle => Some("°"),
            Self::RelayTriggerDuration => Some("s"),
            Self::Sensitivity | Self::VibrationCorrection => None,
        }
    }

    /// Default frontend icon.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::MinSpeedThreshold => "mdi:speedometer-slow",
            Self::CompensationAngle => "mdi:angle-acute",
            Self::Sensitivity => "mdi:signal-distance-variant",
            Self::VibrationCorrection => "mdi:vibrate",
            Self::RelayTriggerDuration => "mdi:timer-outline",
            Self::RelayTriggerSpeed => ICON_SPEEDOMETER,
        }
    }
}

/// One number sub-entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberConfig {
    /// Entity keys.
    #[serde(flatten)]
    pub entity: EntityConfig,

    /// Frontend icon.
    pub icon: String,
}

/// A `number:` entry with `platform: ld2415h`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberPlatformConfig {
    /// Identifier of the entry itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Owning hub.
    pub ld2415h_id: String,

    /// Present outputs in binding order.
    pub outputs: Vec<(NumberKind, NumberConfig)>,
}

// ============================================================================
// Select Outputs
// ============================================================================

/// A radar mode exposed as a select entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectKind {
    /// Direction filter.
    TrackingMode,
    /// Reporting rate.
    SampleRate,
}

impl SelectKind {
    /// Binding order.
    pub const ALL: [Self; 2] = [Self::TrackingMode, Self::SampleRate];

    /// Configuration key, shared by the hub setting and the select entry.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::TrackingMode => "tracking_mode",
            Self::SampleRate => "sample_rate",
        }
    }

    /// Generated class of the select entity.
    #[must_use]
    pub const fn class(self) -> &'static str {
        match self {
            Self::TrackingMode => "ld2415h::TrackingModeSelect",
            Self::SampleRate => "ld2415h::SampleRateSelect",
        }
    }

    /// Setter for the entity on the owning component.
    #[must_use]
    pub const fn setter(self) -> &'static str {
        match self {
            Self::TrackingMode => "set_tracking_mode_select",
            Self::SampleRate => "set_sample_rate_select",
        }
    }

    /// Option labels in wire-code order.
    #[must_use]
    pub fn options(self) -> Vec<&'static str> {
        match self {
            Self::TrackingMode => TrackingMode::ALL.iter().map(|m| m.label()).collect(),
            Self::SampleRate => SampleRate::ALL.iter().map(|r| r.label()).collect(),
        }
    }

    /// Default frontend icon.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::TrackingMode => "mdi:radar",
            Self::SampleRate => "mdi:speedometer",
        }
    }
}

/// One select sub-entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectConfig {
    /// Entity keys.
    #[serde(flatten)]
    pub entity: EntityConfig,

    /// Frontend icon.
    pub icon: String,
}

/// A `select:` entry with `platform: ld2415h`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectPlatformConfig {
    /// Identifier of the entry itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Owning hub.
    pub ld2415h_id: String,

    /// Present outputs in binding order.
    pub outputs: Vec<(SelectKind, SelectConfig)>,
}

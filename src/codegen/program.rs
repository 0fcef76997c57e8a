//! Generated statements and the component-lifecycle interface.
//!
//! The binding generator never writes text directly. It talks to a
//! [`Lifecycle`] implementation, which turns `register_component`,
//! `new_sensor` and friends into [`Statement`]s. [`Program`] records them
//! in order and renders them as C++.

use std::fmt;

use crate::config::schema::{EntityConfig, SensorConfig};

/// Class of every sensor output object.
pub const SENSOR_CLASS: &str = "sensor::Sensor";

// ============================================================================
// Statements
// ============================================================================

/// A call argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Reference to a generated object.
    Id(String),
    /// Integer literal.
    Int(i64),
    /// String literal.
    Str(String),
    /// Boolean literal.
    Bool(bool),
    /// Expression emitted verbatim (enum constants).
    Raw(String),
    /// Brace-initialized list of string literals.
    StrList(Vec<String>),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) | Self::Raw(id) => f.write_str(id),
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => write_c_string(f, s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::StrList(items) => {
                f.write_str("{")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write_c_string(f, item)?;
                }
                f.write_str("}")
            }
        }
    }
}

fn write_c_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            // Octal escapes stop after three digits, hex ones do not.
            c if c.is_ascii_control() => write!(f, "\\{:03o}", u32::from(c))?,
            c if c.is_control() => write!(f, "\\u{:04x}", u32::from(c))?,
            _ => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

/// One generated statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `Class *id = new Class();`
    New {
        /// Fully qualified class name.
        class: String,
        /// Variable name.
        id: String,
    },
    /// `App.register_component(id);`
    RegisterComponent {
        /// Variable name.
        id: String,
    },
    /// `App.register_<entity>(id);`
    RegisterEntity {
        /// Registrar method (e.g., `register_sensor`).
        registrar: &'static str,
        /// Variable name.
        id: String,
    },
    /// `target->method(args...);`
    Call {
        /// Receiver variable.
        target: String,
        /// Method name, possibly through a member (`traits.set_step`).
        method: String,
        /// Arguments.
        args: Vec<Arg>,
    },
}

impl Statement {
    /// Shorthand for a [`Statement::Call`].
    #[must_use]
    pub fn call(target: &str, method: &str, args: Vec<Arg>) -> Self {
        Self::Call {
            target: target.to_string(),
            method: method.to_string(),
            args,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New { class, id } => write!(f, "{class} *{id} = new {class}();"),
            Self::RegisterComponent { id } => write!(f, "App.register_component({id});"),
            Self::RegisterEntity { registrar, id } => write!(f, "App.{registrar}({id});"),
            Self::Call {
                target,
                method,
                args,
            } => {
                write!(f, "{target}->{method}(")?;
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(");")
            }
        }
    }
}

// ============================================================================
// Lifecycle Interface
// ============================================================================

/// Registration interface of the component runtime.
///
/// Only [`Lifecycle::emit`] is required; the registration helpers describe
/// how each lifecycle operation maps onto statements.
pub trait Lifecycle {
    /// Appends a statement to the output.
    fn emit(&mut self, statement: Statement);

    /// Instantiates a component and hands it to the scheduler.
    fn register_component(&mut self, class: &str, id: &str) {
        self.emit(Statement::New {
            class: class.to_string(),
            id: id.to_string(),
        });
        self.emit(Statement::RegisterComponent { id: id.to_string() });
    }

    /// Points a parented entity at its owning component.
    fn register_parented(&mut self, child: &str, parent: &str) {
        self.emit(Statement::call(
            child,
            "set_parent",
            vec![Arg::Id(parent.to_string())],
        ));
    }

    /// Instantiates and registers a sensor output with its metadata.
    fn new_sensor(&mut self, id: &str, sensor: &SensorConfig) {
        self.emit(Statement::New {
            class: SENSOR_CLASS.to_string(),
            id: id.to_string(),
        });
        self.emit(Statement::RegisterEntity {
            registrar: "register_sensor",
            id: id.to_string(),
        });
        self.setup_entity(id, &sensor.entity, Some(&sensor.display.icon));

        let display = &sensor.display;
        self.emit(Statement::call(
            id,
            "set_unit_of_measurement",
            vec![Arg::Str(display.unit_of_measurement.clone())],
        ));
        self.emit(Statement::call(
            id,
            "set_accuracy_decimals",
            vec![Arg::Int(i64::from(display.accuracy_decimals))],
        ));
        self.emit(Statement::call(
            id,
            "set_device_class",
            vec![Arg::Str(display.device_class.clone())],
        ));
        self.emit(Statement::call(
            id,
            "set_state_class",
            vec![Arg::Raw(display.state_class.constant().to_string())],
        ));
        if sensor.force_update {
            self.emit(Statement::call(id, "set_force_update", vec![Arg::Bool(true)]));
        }
    }

    /// Instantiates and registers a non-sensor entity.
    fn new_entity(
        &mut self,
        class: &str,
        registrar: &'static str,
        id: &str,
        entity: &EntityConfig,
        icon: &str,
    ) {
        self.emit(Statement::New {
            class: class.to_string(),
            id: id.to_string(),
        });
        self.emit(Statement::RegisterEntity {
            registrar,
            id: id.to_string(),
        });
        self.setup_entity(id, entity, Some(icon));
    }

    /// Emits the setters shared by every entity.
    fn setup_entity(&mut self, id: &str, entity: &EntityConfig, icon: Option<&str>) {
        if let Some(name) = &entity.name {
            self.emit(Statement::call(id, "set_name", vec![Arg::Str(name.clone())]));
        }
        if entity.internal {
            self.emit(Statement::call(id, "set_internal", vec![Arg::Bool(true)]));
        }
        if entity.disabled_by_default {
            self.emit(Statement::call(
                id,
                "set_disabled_by_default",
                vec![Arg::Bool(true)],
            ));
        }
        if let Some(icon) = icon {
            self.emit(Statement::call(id, "set_icon", vec![Arg::Str(icon.to_string())]));
        }
        if let Some(category) = entity.entity_category {
            self.emit(Statement::call(
                id,
                "set_entity_category",
                vec![Arg::Raw(category.constant().to_string())],
            ));
        }
    }
}

// ============================================================================
// Program
// ============================================================================

/// Statements in generation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    statements: Vec<Statement>,
}

impl Program {
    /// Creates an empty program.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            statements: Vec::new(),
        }
    }

    /// All statements in order.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Number of statements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.statements.len()
    }

    /// Returns `true` if nothing was emitted.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Calls made on `target`, as `(method, args)` pairs.
    pub fn calls_on<'a>(
        &'a self,
        target: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a [Arg])> + 'a {
        self.statements.iter().filter_map(move |s| match s {
            Statement::Call {
                target: t,
                method,
                args,
            } if t == target => Some((method.as_str(), args.as_slice())),
            _ => None,
        })
    }

    /// Renders the program, one statement per line.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for statement in &self.statements {
            out.push_str(&statement.to_string());
            out.push('\n');
        }
        out
    }
}

impl Lifecycle for Program {
    fn emit(&mut self, statement: Statement) {
        tracing::trace!(%statement, "emit");
        self.statements.push(statement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::SensorKind;

    #[test]
    fn test_statement_rendering() {
        let new = Statement::New {
            class: "ld2415h::LD2415HComponent".to_string(),
            id: "radar1".to_string(),
        };
        assert_eq!(
            new.to_string(),
            "ld2415h::LD2415HComponent *radar1 = new ld2415h::LD2415HComponent();"
        );
        let call = Statement::call(
            "radar1_speed",
            "set_name",
            vec![Arg::Str("Speed \"front\"".to_string())],
        );
        assert_eq!(
            call.to_string(),
            r#"radar1_speed->set_name("Speed \"front\"");"#
        );
        let options = Statement::call(
            "mode",
            "traits.set_options",
            vec![Arg::StrList(vec!["a".to_string(), "b".to_string()])],
        );
        assert_eq!(options.to_string(), r#"mode->traits.set_options({"a", "b"});"#);
    }

    #[test]
    fn test_control_characters_are_escaped() {
        let call = Statement::call(
            "radar1_speed",
            "set_name",
            vec![Arg::Str("a\r\0b\x07c\u{85}d".to_string())],
        );
        assert_eq!(
            call.to_string(),
            r#"radar1_speed->set_name("a\r\000b\007c\u0085d");"#
        );

        let list = Statement::call(
            "mode",
            "traits.set_options",
            vec![Arg::StrList(vec!["x\x1b1".to_string()])],
        );
        assert_eq!(list.to_string(), r#"mode->traits.set_options({"x\0331"});"#);
    }

    #[test]
    fn test_register_component_emits_new_and_registration() {
        let mut program = Program::new();
        program.register_component("ld2415h::LD2415HComponent", "radar1");
        assert_eq!(program.len(), 2);
        assert_eq!(
            program.statements()[1],
            Statement::RegisterComponent {
                id: "radar1".to_string()
            }
        );
    }

    #[test]
    fn test_new_sensor_emits_metadata() {
        let sensor = SensorConfig {
            entity: EntityConfig {
                name: Some("Speed".to_string()),
                ..EntityConfig::default()
            },
            display: SensorKind::Speed.defaults(),
            force_update: false,
            filters: Vec::new(),
        };
        let mut program = Program::new();
        program.new_sensor("radar1_speed", &sensor);

        let rendered = program.render();
        assert!(rendered.starts_with("sensor::Sensor *radar1_speed = new sensor::Sensor();\n"));
        assert!(rendered.contains("App.register_sensor(radar1_speed);"));
        assert!(rendered.contains(r#"radar1_speed->set_icon("mdi:speedometer");"#));
        assert!(rendered.contains("radar1_speed->set_accuracy_decimals(1);"));
        assert!(rendered.contains(
            "radar1_speed->set_state_class(sensor::STATE_CLASS_MEASUREMENT);"
        ));
        assert!(!rendered.contains("set_internal"));
        assert!(!rendered.contains("set_force_update"));
    }

    #[test]
    fn test_calls_on_filters_by_target() {
        let mut program = Program::new();
        program.register_parented("angle", "radar1");
        program.emit(Statement::call("radar1", "set_sensitivity", vec![Arg::Int(10)]));
        let calls: Vec<_> = program.calls_on("angle").map(|(m, _)| m).collect();
        assert_eq!(calls, vec!["set_parent"]);
    }
}

//! Binding generator
//!
//! Turns a validated [`ProjectConfig`] into an object graph: hubs first,
//! then every platform entry in document order. Each output is created,
//! recorded as owned by its hub, and handed to the hub through the hub's
//! setter.

use serde_json::json;

use crate::codegen::context::{
    GenerationContext, NumberHandle, NumberOutput, ObjectGraph, OwningComponent, SelectHandle,
    SelectOutput, SensorHandle, SensorOutput,
};
use crate::codegen::program::{Arg, Lifecycle, Program, Statement};
use crate::config::schema::{
    HubConfig, NumberPlatformConfig, ProjectConfig, SelectKind, SelectPlatformConfig,
    SensorPlatformConfig, UartConfig,
};
use crate::config::validation::ComponentKind;
use crate::config::NumberKind;
use crate::error::BindingError;

/// Class of the owning component.
pub const HUB_CLASS: &str = "ld2415h::LD2415HComponent";

// ============================================================================
// Generated Program
// ============================================================================

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GeneratedProgram {
    /// The object graph.
    pub graph: ObjectGraph,
    /// Statements that build it.
    pub program: Program,
}

impl GeneratedProgram {
    /// Renders the statements as C++.
    #[must_use]
    pub fn render_cpp(&self) -> String {
        self.program.render()
    }

    /// Serializes the graph and the rendered statements.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph cannot be serialized.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let statements: Vec<String> = self
            .program
            .statements()
            .iter()
            .map(ToString::to_string)
            .collect();
        serde_json::to_string_pretty(&json!({
            "graph": self.graph,
            "statements": statements,
        }))
    }
}

// ============================================================================
// Generator
// ============================================================================

/// Builds the object graph for one configuration.
#[derive(Debug, Default)]
pub struct Generator {
    ctx: GenerationContext,
}

impl Generator {
    /// Creates a generator with an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates the whole program for a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`BindingError`]; nothing is retried.
    pub fn generate(config: &ProjectConfig) -> Result<GeneratedProgram, BindingError> {
        let mut generator = Self::new();
        generator.reserve_ids(config);

        for uart in &config.uarts {
            generator.declare_uart(uart)?;
        }
        for hub in &config.hubs {
            generator.materialize_hub(hub)?;
        }
        for entry in &config.sensors {
            generator.bind_sensor_entry(entry)?;
        }
        for entry in &config.numbers {
            generator.bind_number_entry(entry)?;
        }
        for entry in &config.selects {
            generator.bind_select_entry(entry)?;
        }

        let generated = generator.finish();
        tracing::info!(
            components = generated.graph.components.len(),
            sensors = generated.graph.sensors.len(),
            numbers = generated.graph.numbers.len(),
            selects = generated.graph.selects.len(),
            statements = generated.program.len(),
            "program generated"
        );
        Ok(generated)
    }

    /// The generation context.
    #[must_use]
    pub const fn context(&self) -> &GenerationContext {
        &self.ctx
    }

    /// Reserves every explicit identifier so fresh ones avoid them.
    pub fn reserve_ids(&mut self, config: &ProjectConfig) {
        let ids = self.ctx.ids_mut();
        for uart in &config.uarts {
            ids.reserve(&uart.id);
        }
        for hub in &config.hubs {
            ids.reserve(&hub.id);
        }
        for id in &config.foreign_ids {
            ids.reserve(id);
        }
        for entry in &config.sensors {
            entry.id.iter().for_each(|id| ids.reserve(id));
            for (_, output) in entry.outputs() {
                output.entity.id.iter().for_each(|id| ids.reserve(id));
            }
        }
        for entry in &config.numbers {
            entry.id.iter().for_each(|id| ids.reserve(id));
            for (_, output) in &entry.outputs {
                output.entity.id.iter().for_each(|id| ids.reserve(id));
            }
        }
        for entry in &config.selects {
            entry.id.iter().for_each(|id| ids.reserve(id));
            for (_, output) in &entry.outputs {
                output.entity.id.iter().for_each(|id| ids.reserve(id));
            }
        }
    }

    /// Records a UART bus. The bus object itself is generated elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::DuplicateId`] if the identifier is taken.
    pub fn declare_uart(&mut self, uart: &UartConfig) -> Result<(), BindingError> {
        tracing::debug!(id = %uart.id, "declaring uart bus");
        self.ctx.declare_external(&uart.id, ComponentKind::Uart)
    }

    /// Instantiates a hub and pushes its initial settings.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::UnresolvedReference`] if the hub's UART bus
    /// was not declared, or [`BindingError::DuplicateId`].
    pub fn materialize_hub(&mut self, hub: &HubConfig) -> Result<(), BindingError> {
        if !self.ctx.is_external(&hub.uart_id, ComponentKind::Uart) {
            return Err(BindingError::UnresolvedReference {
                id: hub.uart_id.clone(),
            });
        }
        self.ctx
            .add_component(OwningComponent::new(&hub.id, &hub.uart_id, hub.settings))?;
        tracing::debug!(id = %hub.id, uart = %hub.uart_id, "materializing hub");

        let program = self.ctx.program_mut();
        program.register_component(HUB_CLASS, &hub.id);
        program.emit(Statement::call(
            &hub.id,
            "set_uart_parent",
            vec![Arg::Id(hub.uart_id.clone())],
        ));
        for kind in NumberKind::ALL {
            program.emit(Statement::call(
                &hub.id,
                kind.value_setter(),
                vec![Arg::Int(i64::from(hub.settings.get(kind)))],
            ));
        }
        program.emit(Statement::call(
            &hub.id,
            "set_tracking_mode",
            vec![Arg::Int(i64::from(hub.settings.tracking_mode.code()))],
        ));
        program.emit(Statement::call(
            &hub.id,
            "set_sample_rate",
            vec![Arg::Int(i64::from(hub.settings.sample_rate.code()))],
        ));
        Ok(())
    }

    /// Binds the outputs of one `sensor:` entry to its hub.
    ///
    /// Outputs are bound in the order speed, velocity. All slots and
    /// identifiers are checked before anything is emitted, so a rejected
    /// entry leaves the context untouched.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::UnresolvedReference`] if the hub is not in
    /// the context, [`BindingError::AlreadyBound`] if it already has an
    /// output of the same kind and [`BindingError::DuplicateId`] if an
    /// identifier is taken or repeated.
    pub fn bind_sensor_entry(
        &mut self,
        entry: &SensorPlatformConfig,
    ) -> Result<Vec<SensorHandle>, BindingError> {
        let owner = self.ctx.resolve(&entry.ld2415h_id)?.id.clone();
        for (kind, _) in entry.outputs() {
            self.ctx.ensure_sensor_vacant(&owner, kind)?;
        }
        let ids = self.plan_ids(
            entry.id.as_deref(),
            &owner,
            entry
                .outputs()
                .map(|(kind, config)| (kind.key(), config.entity.id.as_deref())),
        )?;

        let mut handles = Vec::new();
        for ((kind, config), id) in entry.outputs().zip(ids) {
            tracing::debug!(%id, %owner, kind = kind.key(), "binding sensor");

            self.ctx.program_mut().new_sensor(&id, config);
            self.ctx.register_parented(&id, &owner)?;
            let handle = self.ctx.push_sensor(SensorOutput {
                id: id.clone(),
                kind,
                owner: owner.clone(),
                config: config.clone(),
            });
            self.ctx.set_sensor(&owner, kind, handle)?;
            self.ctx
                .program_mut()
                .emit(Statement::call(&owner, kind.setter(), vec![Arg::Id(id)]));
            handles.push(handle);
        }

        if handles.is_empty() {
            tracing::debug!(%owner, "sensor entry binds no outputs");
        }
        Ok(handles)
    }

    /// Binds the outputs of one `number:` entry to its hub.
    ///
    /// # Errors
    ///
    /// Same as [`Generator::bind_sensor_entry`].
    pub fn bind_number_entry(
        &mut self,
        entry: &NumberPlatformConfig,
    ) -> Result<Vec<NumberHandle>, BindingError> {
        let owner = self.ctx.resolve(&entry.ld2415h_id)?.id.clone();
        for (kind, _) in &entry.outputs {
            self.ctx.ensure_number_vacant(&owner, *kind)?;
        }
        let ids = self.plan_ids(
            entry.id.as_deref(),
            &owner,
            entry
                .outputs
                .iter()
                .map(|(kind, config)| (kind.key(), config.entity.id.as_deref())),
        )?;

        let mut handles = Vec::with_capacity(entry.outputs.len());
        for ((kind, config), id) in entry.outputs.iter().zip(ids) {
            let kind = *kind;
            let range = kind.range();
            tracing::debug!(%id, %owner, kind = kind.key(), "binding number");

            let program = self.ctx.program_mut();
            program.new_entity(
                kind.class(),
                "register_number",
                &id,
                &config.entity,
                &config.icon,
            );
            program.emit(Statement::call(
                &id,
                "traits.set_min_value",
                vec![Arg::Int(i64::from(range.min))],
            ));
            program.emit(Statement::call(
                &id,
                "traits.set_max_value",
                vec![Arg::Int(i64::from(range.max))],
            ));
            program.emit(Statement::call(
                &id,
                "traits.set_step",
                vec![Arg::Int(i64::from(range.step))],
            ));
            if let Some(unit) = kind.unit() {
                program.emit(Statement::call(
                    &id,
                    "traits.set_unit_of_measurement",
                    vec![Arg::Str(unit.to_string())],
                ));
            }

            self.parent(&id, &owner)?;
            let handle = self.ctx.push_number(NumberOutput {
                id: id.clone(),
                kind,
                owner: owner.clone(),
                range,
                config: config.clone(),
            });
            self.ctx.set_number(&owner, kind, handle)?;
            self.ctx
                .program_mut()
                .emit(Statement::call(&owner, kind.setter(), vec![Arg::Id(id)]));
            handles.push(handle);
        }
        Ok(handles)
    }

    /// Binds the outputs of one `select:` entry to its hub.
    ///
    /// # Errors
    ///
    /// Same as [`Generator::bind_sensor_entry`].
    pub fn bind_select_entry(
        &mut self,
        entry: &SelectPlatformConfig,
    ) -> Result<Vec<SelectHandle>, BindingError> {
        let owner = self.ctx.resolve(&entry.ld2415h_id)?.id.clone();
        for (kind, _) in &entry.outputs {
            self.ctx.ensure_select_vacant(&owner, *kind)?;
        }
        let ids = self.plan_ids(
            entry.id.as_deref(),
            &owner,
            entry
                .outputs
                .iter()
                .map(|(kind, config)| (kind.key(), config.entity.id.as_deref())),
        )?;

        let mut handles = Vec::with_capacity(entry.outputs.len());
        for ((kind, config), id) in entry.outputs.iter().zip(ids) {
            let kind: SelectKind = *kind;
            let options = kind.options();
            tracing::debug!(%id, %owner, kind = kind.key(), "binding select");

            let program = self.ctx.program_mut();
            program.new_entity(
                kind.class(),
                "register_select",
                &id,
                &config.entity,
                &config.icon,
            );
            program.emit(Statement::call(
                &id,
                "traits.set_options",
                vec![Arg::StrList(
                    options.iter().map(ToString::to_string).collect(),
                )],
            ));

            self.parent(&id, &owner)?;
            let handle = self.ctx.push_select(SelectOutput {
                id: id.clone(),
                kind,
                owner: owner.clone(),
                options,
                config: config.clone(),
            });
            self.ctx.set_select(&owner, kind, handle)?;
            self.ctx
                .program_mut()
                .emit(Statement::call(&owner, kind.setter(), vec![Arg::Id(id)]));
            handles.push(handle);
        }
        Ok(handles)
    }

    /// Consumes the generator.
    #[must_use]
    pub fn finish(self) -> GeneratedProgram {
        let (graph, program) = self.ctx.finish();
        GeneratedProgram { graph, program }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Claims the entry id and one id per output, explicit or fresh.
    ///
    /// Explicit ids are all checked before any is claimed.
    fn plan_ids<'e>(
        &mut self,
        entry_id: Option<&'e str>,
        owner: &str,
        outputs: impl Iterator<Item = (&'e str, Option<&'e str>)>,
    ) -> Result<Vec<String>, BindingError> {
        let outputs: Vec<_> = outputs.collect();
        let ids = self.ctx.ids_mut();

        let explicit: Vec<&str> = entry_id
            .into_iter()
            .chain(outputs.iter().filter_map(|(_, id)| *id))
            .collect();
        for (i, id) in explicit.iter().enumerate() {
            if ids.is_taken(id) || explicit[..i].contains(id) {
                return Err(BindingError::DuplicateId { id: (*id).to_string() });
            }
        }
        for id in &explicit {
            ids.claim(id)?;
        }

        Ok(outputs
            .into_iter()
            .map(|(key, explicit)| match explicit {
                Some(id) => id.to_string(),
                None => ids.fresh(&format!("{owner}_{key}")),
            })
            .collect())
    }

    /// Ownership edge plus `set_parent` for `Parented` entities.
    fn parent(&mut self, child: &str, owner: &str) -> Result<(), BindingError> {
        self.ctx.register_parented(child, owner)?;
        self.ctx.program_mut().register_parented(child, owner);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{
        DriverSettings, EntityConfig, NumberConfig, SelectConfig, SensorConfig, SensorKind,
    };

    fn sensor(name: Option<&str>, id: Option<&str>) -> SensorConfig {
        SensorConfig {
            entity: EntityConfig {
                id: id.map(str::to_string),
                name: name.map(str::to_string),
                internal: name.is_none(),
                ..EntityConfig::default()
            },
            display: SensorKind::Speed.defaults(),
            force_update: false,
            filters: Vec::new(),
        }
    }

    fn config() -> ProjectConfig {
        ProjectConfig {
            uarts: vec![UartConfig {
                id: "uart_bus".to_string(),
            }],
            hubs: vec![HubConfig {
                id: "radar1".to_string(),
                uart_id: "uart_bus".to_string(),
                settings: DriverSettings::default(),
            }],
            ..ProjectConfig::default()
        }
    }

    fn sensor_entry(speed: Option<SensorConfig>, velocity: Option<SensorConfig>) -> SensorPlatformConfig {
        SensorPlatformConfig {
            id: None,
            ld2415h_id: "radar1".to_string(),
            speed,
            velocity,
        }
    }

    #[test]
    fn test_speed_only_binds_one_sensor() {
        let mut cfg = config();
        cfg.sensors
            .push(sensor_entry(Some(sensor(Some("Speed"), None)), None));
        let generated = Generator::generate(&cfg).unwrap();

        assert_eq!(generated.graph.sensors.len(), 1);
        let output = &generated.graph.sensors[0];
        assert_eq!(output.id, "radar1_speed");
        assert_eq!(output.kind, SensorKind::Speed);
        assert_eq!(output.owner, "radar1");

        let hub = &generated.graph.components[0];
        assert_eq!(hub.outputs.get("speed").map(String::as_str), Some("radar1_speed"));
        assert!(!hub.outputs.contains_key("velocity"));

        let calls: Vec<_> = generated.program.calls_on("radar1").map(|(m, _)| m).collect();
        assert!(calls.contains(&"set_speed_sensor"));
        assert!(!calls.contains(&"set_velocity_sensor"));
    }

    #[test]
    fn test_speed_and_velocity_share_owner() {
        let mut cfg = config();
        cfg.sensors.push(sensor_entry(
            Some(sensor(Some("Speed"), None)),
            Some(sensor(Some("Velocity"), None)),
        ));
        let generated = Generator::generate(&cfg).unwrap();

        let ids: Vec<_> = generated.graph.sensors.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["radar1_speed", "radar1_velocity"]);
        assert!(generated.graph.sensors.iter().all(|s| s.owner == "radar1"));
    }

    #[test]
    fn test_empty_entry_binds_nothing() {
        let mut cfg = config();
        cfg.sensors.push(sensor_entry(None, None));
        let generated = Generator::generate(&cfg).unwrap();
        assert!(generated.graph.sensors.is_empty());
        assert!(generated.graph.components[0].outputs.is_empty());
    }

    #[test]
    fn test_unmaterialized_owner_is_unresolved() {
        let mut generator = Generator::new();
        let err = generator
            .bind_sensor_entry(&sensor_entry(Some(sensor(None, None)), None))
            .unwrap_err();
        assert!(matches!(err, BindingError::UnresolvedReference { ref id } if id == "radar1"));
        assert!(generator.context().program().is_empty());
    }

    #[test]
    fn test_second_speed_binding_is_rejected() {
        let mut cfg = config();
        cfg.sensors
            .push(sensor_entry(Some(sensor(Some("Front"), None)), None));
        cfg.sensors
            .push(sensor_entry(Some(sensor(Some("Back"), None)), None));
        let err = Generator::generate(&cfg).unwrap_err();
        assert!(matches!(err, BindingError::AlreadyBound { ref slot, .. } if slot == "speed sensor"));
    }

    #[test]
    fn test_fresh_id_avoids_later_explicit_id() {
        let mut cfg = config();
        cfg.sensors
            .push(sensor_entry(Some(sensor(Some("Speed"), None)), None));
        cfg.sensors.push(sensor_entry(
            None,
            Some(sensor(Some("Velocity"), Some("radar1_speed"))),
        ));
        let generated = Generator::generate(&cfg).unwrap();
        let ids: Vec<_> = generated.graph.sensors.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["radar1_speed_2", "radar1_speed"]);
    }

    #[test]
    fn test_fresh_id_avoids_foreign_id() {
        let mut cfg = config();
        cfg.foreign_ids.push("radar1_speed".to_string());
        cfg.sensors
            .push(sensor_entry(Some(sensor(Some("Speed"), None)), None));
        let generated = Generator::generate(&cfg).unwrap();
        assert_eq!(generated.graph.sensors[0].id, "radar1_speed_2");
    }

    #[test]
    fn test_repeated_explicit_id_emits_nothing() {
        let mut generator = Generator::new();
        let cfg = config();
        generator.declare_uart(&cfg.uarts[0]).unwrap();
        generator.materialize_hub(&cfg.hubs[0]).unwrap();
        let before = generator.context().program().len();

        let err = generator
            .bind_sensor_entry(&sensor_entry(
                Some(sensor(Some("Speed"), Some("dup"))),
                Some(sensor(Some("Velocity"), Some("dup"))),
            ))
            .unwrap_err();
        assert!(matches!(err, BindingError::DuplicateId { ref id } if id == "dup"));
        assert_eq!(generator.context().program().len(), before);
        assert!(generator.context().sensors().is_empty());
        assert!(!generator.context().ids().is_taken("dup"));
    }

    #[test]
    fn test_taken_entry_id_emits_nothing() {
        let mut generator = Generator::new();
        let cfg = config();
        generator.declare_uart(&cfg.uarts[0]).unwrap();
        generator.materialize_hub(&cfg.hubs[0]).unwrap();
        let before = generator.context().program().len();

        let mut entry = sensor_entry(Some(sensor(Some("Speed"), None)), None);
        entry.id = Some("radar1".to_string());
        let err = generator.bind_sensor_entry(&entry).unwrap_err();
        assert!(matches!(err, BindingError::DuplicateId { ref id } if id == "radar1"));
        assert_eq!(generator.context().program().len(), before);
        assert!(!generator.context().ids().is_taken("radar1_speed"));
    }

    #[test]
    fn test_hub_materialization_order() {
        let generated = Generator::generate(&config()).unwrap();
        let rendered = generated.render_cpp();
        let mut lines = rendered.lines();
        assert_eq!(
            lines.next(),
            Some("ld2415h::LD2415HComponent *radar1 = new ld2415h::LD2415HComponent();")
        );
        assert_eq!(lines.next(), Some("App.register_component(radar1);"));
        assert_eq!(lines.next(), Some("radar1->set_uart_parent(uart_bus);"));
        assert!(rendered.contains("radar1->set_sensitivity(10);"));
        assert!(rendered.contains("radar1->set_sample_rate(1);"));
    }

    #[test]
    fn test_hub_without_uart_is_unresolved() {
        let mut cfg = config();
        cfg.uarts.clear();
        let err = Generator::generate(&cfg).unwrap_err();
        assert!(matches!(err, BindingError::UnresolvedReference { ref id } if id == "uart_bus"));
    }

    #[test]
    fn test_number_binding_sets_parent_and_traits() {
        let mut cfg = config();
        cfg.numbers.push(NumberPlatformConfig {
            id: None,
            ld2415h_id: "radar1".to_string(),
            outputs: vec![(
                NumberKind::CompensationAngle,
                NumberConfig {
                    entity: EntityConfig {
                        name: Some("Angle".to_string()),
                        ..EntityConfig::default()
                    },
                    icon: NumberKind::CompensationAngle.icon().to_string(),
                },
            )],
        });
        let generated = Generator::generate(&cfg).unwrap();
        let id = "radar1_compensation_angle";
        let calls: Vec<_> = generated.program.calls_on(id).map(|(m, _)| m).collect();
        assert!(calls.contains(&"set_parent"));
        assert!(calls.contains(&"traits.set_max_value"));
        assert!(generated
            .render_cpp()
            .contains("radar1->set_compensation_angle_number(radar1_compensation_angle);"));
        assert_eq!(generated.graph.numbers[0].range.max, 90);
    }

    #[test]
    fn test_select_binding_lists_options() {
        let mut cfg = config();
        cfg.selects.push(SelectPlatformConfig {
            id: Some("radar_selects".to_string()),
            ld2415h_id: "radar1".to_string(),
            outputs: vec![(
                SelectKind::TrackingMode,
                SelectConfig {
                    entity: EntityConfig::default(),
                    icon: SelectKind::TrackingMode.icon().to_string(),
                },
            )],
        });
        let generated = Generator::generate(&cfg).unwrap();
        let rendered = generated.render_cpp();
        assert!(rendered.contains(
            r#"radar1_tracking_mode->traits.set_options({"Approaching and Retreating", "Approaching", "Retreating"});"#
        ));
        assert!(rendered.contains("radar1->set_tracking_mode_select(radar1_tracking_mode);"));
    }

    #[test]
    fn test_json_output_contains_graph_and_statements() {
        let mut cfg = config();
        cfg.sensors
            .push(sensor_entry(Some(sensor(Some("Speed"), None)), None));
        let json = Generator::generate(&cfg).unwrap().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["graph"]["sensors"][0]["id"], "radar1_speed");
        assert!(value["statements"].as_array().is_some_and(|s| !s.is_empty()));
    }
}

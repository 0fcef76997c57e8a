//! Generation context
//!
//! The in-memory registry for one generation run: which identifiers are
//! taken, which components exist, which outputs they own. Outputs live in
//! arenas owned by the context; components hold copyable handles into them,
//! so an output can never outlive the run or be shared by two owners.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::Serialize;

use crate::codegen::program::Program;
use crate::config::schema::{
    DriverSettings, NumberConfig, NumberKind, NumberRange, SelectConfig, SelectKind, SensorConfig,
    SensorKind,
};
use crate::config::validation::ComponentKind;
use crate::error::BindingError;

// ============================================================================
// Identifier Registry
// ============================================================================

/// Tracks identifiers in the generated object graph.
///
/// Explicit identifiers are reserved up front so that a fresh identifier
/// never takes a name some later entry asks for.
#[derive(Debug, Default)]
pub struct IdRegistry {
    reserved: HashSet<String>,
    taken: HashSet<String>,
}

impl IdRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps `id` away from [`IdRegistry::fresh`].
    pub fn reserve(&mut self, id: &str) {
        self.reserved.insert(id.to_string());
    }

    /// Takes `id` for an object.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::DuplicateId`] if `id` is already taken.
    pub fn claim(&mut self, id: &str) -> Result<(), BindingError> {
        if self.taken.insert(id.to_string()) {
            Ok(())
        } else {
            Err(BindingError::DuplicateId { id: id.to_string() })
        }
    }

    /// Takes and returns the first free identifier among `base`, `base_2`,
    /// `base_3`, ...
    pub fn fresh(&mut self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut n = 1usize;
        while self.taken.contains(&candidate) || self.reserved.contains(&candidate) {
            n += 1;
            candidate = format!("{base}_{n}");
        }
        self.taken.insert(candidate.clone());
        candidate
    }

    /// Returns `true` if `id` is taken.
    #[must_use]
    pub fn is_taken(&self, id: &str) -> bool {
        self.taken.contains(id)
    }

    /// Number of identifiers taken.
    #[must_use]
    pub fn len(&self) -> usize {
        self.taken.len()
    }

    /// Returns `true` if nothing is taken.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}

// ============================================================================
// Handles and Outputs
// ============================================================================

/// Non-owning reference to a [`SensorOutput`] in the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SensorHandle(usize);

/// Non-owning reference to a [`NumberOutput`] in the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumberHandle(usize);

/// Non-owning reference to a [`SelectOutput`] in the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectHandle(usize);

/// A generated sensor output.
#[derive(Debug, Clone, Serialize)]
pub struct SensorOutput {
    /// Generated identifier.
    pub id: String,
    /// Physical quantity.
    pub kind: SensorKind,
    /// Owning component.
    pub owner: String,
    /// Validated configuration.
    #[serde(flatten)]
    pub config: SensorConfig,
}

/// A generated number output.
#[derive(Debug, Clone, Serialize)]
pub struct NumberOutput {
    /// Generated identifier.
    pub id: String,
    /// Setting controlled.
    pub kind: NumberKind,
    /// Owning component.
    pub owner: String,
    /// Accepted values.
    pub range: NumberRange,
    /// Validated configuration.
    #[serde(flatten)]
    pub config: NumberConfig,
}

/// A generated select output.
#[derive(Debug, Clone, Serialize)]
pub struct SelectOutput {
    /// Generated identifier.
    pub id: String,
    /// Mode controlled.
    pub kind: SelectKind,
    /// Owning component.
    pub owner: String,
    /// Option labels.
    pub options: Vec<&'static str>,
    /// Validated configuration.
    #[serde(flatten)]
    pub config: SelectConfig,
}

// ============================================================================
// Owning Component
// ============================================================================

/// A materialized LD2415H hub.
///
/// Output slots are set once during generation and never change afterwards.
#[derive(Debug, Clone)]
pub struct OwningComponent {
    /// Identifier.
    pub id: String,
    /// UART bus the hub is attached to.
    pub uart_id: String,
    /// Initial driver settings.
    pub settings: DriverSettings,
    speed_sensor: Option<SensorHandle>,
    velocity_sensor: Option<SensorHandle>,
    numbers: IndexMap<NumberKind, NumberHandle>,
    selects: IndexMap<SelectKind, SelectHandle>,
}

impl OwningComponent {
    /// Creates a hub with no outputs bound.
    #[must_use]
    pub fn new(id: &str, uart_id: &str, settings: DriverSettings) -> Self {
        Self {
            id: id.to_string(),
            uart_id: uart_id.to_string(),
            settings,
            speed_sensor: None,
            velocity_sensor: None,
            numbers: IndexMap::new(),
            selects: IndexMap::new(),
        }
    }

    /// The sensor bound for `kind`, if any.
    #[must_use]
    pub const fn sensor(&self, kind: SensorKind) -> Option<SensorHandle> {
        match kind {
            SensorKind::Speed => self.speed_sensor,
            SensorKind::Velocity => self.velocity_sensor,
        }
    }

    /// The number bound for `kind`, if any.
    #[must_use]
    pub fn number(&self, kind: NumberKind) -> Option<NumberHandle> {
        self.numbers.get(&kind).copied()
    }

    /// The select bound for `kind`, if any.
    #[must_use]
    pub fn select(&self, kind: SelectKind) -> Option<SelectHandle> {
        self.selects.get(&kind).copied()
    }

    /// Number of outputs bound to this hub.
    #[must_use]
    pub fn output_count(&self) -> usize {
        usize::from(self.speed_sensor.is_some())
            + usize::from(self.velocity_sensor.is_some())
            + self.numbers.len()
            + self.selects.len()
    }

    fn sensor_slot(&mut self, kind: SensorKind) -> &mut Option<SensorHandle> {
        match kind {
            SensorKind::Speed => &mut self.speed_sensor,
            SensorKind::Velocity => &mut self.velocity_sensor,
        }
    }
}

// ============================================================================
// Object Graph
// ============================================================================

/// Serializable view of a hub and the identifiers of its outputs.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentView {
    /// Identifier.
    pub id: String,
    /// UART bus.
    pub uart_id: String,
    /// Initial driver settings.
    pub settings: DriverSettings,
    /// Output slot key to output identifier, in binding order.
    pub outputs: IndexMap<&'static str, String>,
}

/// The generated object graph of one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ObjectGraph {
    /// Hubs in declaration order.
    pub components: Vec<ComponentView>,
    /// Sensor outputs in binding order.
    pub sensors: Vec<SensorOutput>,
    /// Number outputs in binding order.
    pub numbers: Vec<NumberOutput>,
    /// Select outputs in binding order.
    pub selects: Vec<SelectOutput>,
}

// ============================================================================
// Context
// ============================================================================

/// State of one generation run.
#[derive(Debug, Default)]
pub struct GenerationContext {
    ids: IdRegistry,
    external: IndexMap<String, ComponentKind>,
    components: IndexMap<String, OwningComponent>,
    sensors: Vec<SensorOutput>,
    numbers: Vec<NumberOutput>,
    selects: Vec<SelectOutput>,
    owners: HashMap<String, String>,
    program: Program,
}

impl GenerationContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The identifier registry.
    #[must_use]
    pub const fn ids(&self) -> &IdRegistry {
        &self.ids
    }

    /// The identifier registry, mutably.
    pub const fn ids_mut(&mut self) -> &mut IdRegistry {
        &mut self.ids
    }

    /// The statements emitted so far.
    #[must_use]
    pub const fn program(&self) -> &Program {
        &self.program
    }

    /// The statements emitted so far, mutably.
    pub const fn program_mut(&mut self) -> &mut Program {
        &mut self.program
    }

    /// Records an object generated elsewhere (e.g., a UART bus).
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::DuplicateId`] if `id` is taken.
    pub fn declare_external(&mut self, id: &str, kind: ComponentKind) -> Result<(), BindingError> {
        self.ids.claim(id)?;
        self.external.insert(id.to_string(), kind);
        Ok(())
    }

    /// Returns `true` if `id` was declared external with the given kind.
    #[must_use]
    pub fn is_external(&self, id: &str, kind: ComponentKind) -> bool {
        self.external.get(id) == Some(&kind)
    }

    /// Adds a materialized hub.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::DuplicateId`] if its identifier is taken.
    pub fn add_component(&mut self, component: OwningComponent) -> Result<(), BindingError> {
        self.ids.claim(&component.id)?;
        self.components.insert(component.id.clone(), component);
        Ok(())
    }

    /// Looks up a hub by identifier.
    #[must_use]
    pub fn component(&self, id: &str) -> Option<&OwningComponent> {
        self.components.get(id)
    }

    /// Looks up a hub by identifier, failing if it was never materialized.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::UnresolvedReference`] if there is no such hub.
    pub fn resolve(&self, id: &str) -> Result<&OwningComponent, BindingError> {
        self.components
            .get(id)
            .ok_or_else(|| BindingError::UnresolvedReference { id: id.to_string() })
    }

    fn resolve_mut(&mut self, id: &str) -> Result<&mut OwningComponent, BindingError> {
        self.components
            .get_mut(id)
            .ok_or_else(|| BindingError::UnresolvedReference { id: id.to_string() })
    }

    /// Hubs in materialization order.
    pub fn components(&self) -> impl Iterator<Item = &OwningComponent> {
        self.components.values()
    }

    /// Records that `child` is owned by `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::AlreadyOwned`] if `child` already has an
    /// owner, or [`BindingError::UnresolvedReference`] if `parent` is not a
    /// materialized hub.
    pub fn register_parented(&mut self, child: &str, parent: &str) -> Result<(), BindingError> {
        self.resolve(parent)?;
        if let Some(owner) = self.owners.get(child) {
            return Err(BindingError::AlreadyOwned {
                child: child.to_string(),
                owner: owner.clone(),
            });
        }
        self.owners.insert(child.to_string(), parent.to_string());
        Ok(())
    }

    /// The owner of `child`, if it has one.
    #[must_use]
    pub fn owner_of(&self, child: &str) -> Option<&str> {
        self.owners.get(child).map(String::as_str)
    }

    // ========================================================================
    // Output Arenas
    // ========================================================================

    /// Stores a sensor output and returns its handle.
    pub fn push_sensor(&mut self, output: SensorOutput) -> SensorHandle {
        self.sensors.push(output);
        SensorHandle(self.sensors.len() - 1)
    }

    /// Stores a number output and returns its handle.
    pub fn push_number(&mut self, output: NumberOutput) -> NumberHandle {
        self.numbers.push(output);
        NumberHandle(self.numbers.len() - 1)
    }

    /// Stores a select output and returns its handle.
    pub fn push_select(&mut self, output: SelectOutput) -> SelectHandle {
        self.selects.push(output);
        SelectHandle(self.selects.len() - 1)
    }

    /// Dereferences a sensor handle.
    #[must_use]
    pub fn sensor(&self, handle: SensorHandle) -> &SensorOutput {
        &self.sensors[handle.0]
    }

    /// Dereferences a number handle.
    #[must_use]
    pub fn number(&self, handle: NumberHandle) -> &NumberOutput {
        &self.numbers[handle.0]
    }

    /// Dereferences a select handle.
    #[must_use]
    pub fn select(&self, handle: SelectHandle) -> &SelectOutput {
        &self.selects[handle.0]
    }

    /// All sensor outputs.
    #[must_use]
    pub fn sensors(&self) -> &[SensorOutput] {
        &self.sensors
    }

    /// All number outputs.
    #[must_use]
    pub fn numbers(&self) -> &[NumberOutput] {
        &self.numbers
    }

    /// All select outputs.
    #[must_use]
    pub fn selects(&self) -> &[SelectOutput] {
        &self.selects
    }

    // ========================================================================
    // Slots
    // ========================================================================

    /// Fails if `owner` already has a sensor of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::AlreadyBound`] or
    /// [`BindingError::UnresolvedReference`].
    pub fn ensure_sensor_vacant(&self, owner: &str, kind: SensorKind) -> Result<(), BindingError> {
        match self.resolve(owner)?.sensor(kind) {
            Some(existing) => Err(already_bound(
                owner,
                &format!("{} sensor", kind.key()),
                &self.sensor(existing).id,
            )),
            None => Ok(()),
        }
    }

    /// Fails if `owner` already has a number of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::AlreadyBound`] or
    /// [`BindingError::UnresolvedReference`].
    pub fn ensure_number_vacant(&self, owner: &str, kind: NumberKind) -> Result<(), BindingError> {
        match self.resolve(owner)?.number(kind) {
            Some(existing) => Err(already_bound(
                owner,
                &format!("{} number", kind.key()),
                &self.number(existing).id,
            )),
            None => Ok(()),
        }
    }

    /// Fails if `owner` already has a select of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::AlreadyBound`] or
    /// [`BindingError::UnresolvedReference`].
    pub fn ensure_select_vacant(&self, owner: &str, kind: SelectKind) -> Result<(), BindingError> {
        match self.resolve(owner)?.select(kind) {
            Some(existing) => Err(already_bound(
                owner,
                &format!("{} select", kind.key()),
                &self.select(existing).id,
            )),
            None => Ok(()),
        }
    }

    /// Stores the owner's reference to its sensor (`set_speed_sensor` /
    /// `set_velocity_sensor`).
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::AlreadyBound`] if the slot is occupied.
    pub fn set_sensor(
        &mut self,
        owner: &str,
        kind: SensorKind,
        handle: SensorHandle,
    ) -> Result<(), BindingError> {
        self.ensure_sensor_vacant(owner, kind)?;
        *self.resolve_mut(owner)?.sensor_slot(kind) = Some(handle);
        Ok(())
    }

    /// Stores the owner's reference to a number output.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::AlreadyBound`] if the slot is occupied.
    pub fn set_number(
        &mut self,
        owner: &str,
        kind: NumberKind,
        handle: NumberHandle,
    ) -> Result<(), BindingError> {
        self.ensure_number_vacant(owner, kind)?;
        self.resolve_mut(owner)?.numbers.insert(kind, handle);
        Ok(())
    }

    /// Stores the owner's reference to a select output.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError::AlreadyBound`] if the slot is occupied.
    pub fn set_select(
        &mut self,
        owner: &str,
        kind: SelectKind,
        handle: SelectHandle,
    ) -> Result<(), BindingError> {
        self.ensure_select_vacant(owner, kind)?;
        self.resolve_mut(owner)?.selects.insert(kind, handle);
        Ok(())
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Builds the serializable object graph.
    #[must_use]
    pub fn graph(&self) -> ObjectGraph {
        let components = self
            .components
            .values()
            .map(|c| {
                let mut outputs = IndexMap::new();
                for kind in SensorKind::ALL {
                    if let Some(h) = c.sensor(kind) {
                        outputs.insert(kind.key(), self.sensor(h).id.clone());
                    }
                }
                for kind in NumberKind::ALL {
                    if let Some(h) = c.number(kind) {
                        outputs.insert(kind.key(), self.number(h).id.clone());
                    }
                }
                for kind in SelectKind::ALL {
                    if let Some(h) = c.select(kind) {
                        outputs.insert(kind.key(), self.select(h).id.clone());
                    }
                }
                ComponentView {
                    id: c.id.clone(),
                    uart_id: c.uart_id.clone(),
                    settings: c.settings,
                    outputs,
                }
            })
            .collect();

        ObjectGraph {
            components,
            sensors: self.sensors.clone(),
            numbers: self.numbers.clone(),
            selects: self.selects.clone(),
        }
    }

    /// Consumes the context, returning the graph and the program.
    #[must_use]
    pub fn finish(self) -> (ObjectGraph, Program) {
        let graph = self.graph();
        (graph, self.program)
    }
}

fn already_bound(owner: &str, slot: &str, existing: &str) -> BindingError {
    BindingError::AlreadyBound {
        owner: owner.to_string(),
        slot: slot.to_string(),
        existing: existing.to_string(),
    }
}

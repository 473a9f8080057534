//! The [`World`]: entities, component columns, filters, and change events.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use crate::component::{Component, ComponentMask, ComponentRegistry, ComponentSet, ComponentTypeId};
use crate::entity::{EntityAllocator, EntityId};
use crate::events::{ChangeKind, ChangeLog, ComponentEvent};
use crate::storage::{Column, ComponentColumn};
use crate::EcsError;

// ---------------------------------------------------------------------------
// FilterId
// ---------------------------------------------------------------------------

/// Handle to a component-set filter registered with [`World::register_filter`].
///
/// Registering the same mask twice returns the same id, so systems can register
/// their filters in their constructor and keep the handle for every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterId(u32);

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// The central entity-component store.
///
/// Storage is one sparse column per registered component type plus a
/// per-entity [`ComponentMask`]. Entity iteration through filters is in
/// entity order, which makes system ticks deterministic.
#[derive(Default)]
pub struct World {
    allocator: EntityAllocator,
    registry: ComponentRegistry,
    /// Indexed by `ComponentTypeId::index()`.
    columns: Vec<Box<dyn ComponentColumn>>,
    /// Mask of every live entity.
    masks: BTreeMap<EntityId, ComponentMask>,
    filters: Vec<ComponentMask>,
    filter_index: HashMap<ComponentMask, FilterId>,
    changes: ChangeLog,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entity_count", &self.masks.len())
            .field("component_types", &self.registry.len())
            .field("filters", &self.filters.len())
            .finish()
    }
}

impl World {
    /// Create a new, empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only access to the component registry.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Register a component type under `name` and allocate its column.
    ///
    /// Registering the same type again is a no-op returning the existing id.
    pub fn register_component<T: Component>(&mut self, name: &str) -> ComponentTypeId {
        let id = self.registry.register::<T>(name);
        if id.index() == self.columns.len() {
            self.columns.push(Box::new(Column::<T>::new()));
            tracing::debug!(component = name, id = id.index(), "component type registered");
        }
        id
    }

    /// Id of a registered component type.
    pub fn component_id<T: 'static>(&self) -> Option<ComponentTypeId> {
        self.registry.lookup::<T>()
    }

    /// Mask with the bits of every type in `S`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownComponent`] naming the first member of `S`
    /// that has not been registered.
    pub fn mask_of<S: ComponentSet>(&self) -> Result<ComponentMask, EcsError> {
        let ids = S::type_ids(&self.registry)
            .map_err(|name| EcsError::UnknownComponent(name.to_owned()))?;
        Ok(ComponentMask::from_ids(&ids))
    }

    fn type_id_of<T: 'static>(&self) -> Result<ComponentTypeId, EcsError> {
        self.registry
            .lookup::<T>()
            .ok_or_else(|| EcsError::UnknownComponent(std::any::type_name::<T>().to_owned()))
    }

    fn ensure_alive(&self, entity: EntityId) -> Result<(), EcsError> {
        if self.allocator.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::StaleEntity(entity))
        }
    }

    fn column<T: Component>(&self, id: ComponentTypeId) -> Option<&Column<T>> {
        self.columns.get(id.index())?.as_any().downcast_ref()
    }

    fn column_mut<T: Component>(&mut self, id: ComponentTypeId) -> Option<&mut Column<T>> {
        self.columns.get_mut(id.index())?.as_any_mut().downcast_mut()
    }

    // -- entity lifecycle ---------------------------------------------------

    /// Spawn an entity with no components.
    pub fn spawn(&mut self) -> EntityId {
        let entity = self.allocator.allocate();
        self.masks.insert(entity, ComponentMask::new());
        entity
    }

    /// Spawn an entity carrying exactly one component.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownComponent`] if `T` is not registered; no
    /// entity is created in that case.
    pub fn spawn_with<T: Component>(&mut self, component: T) -> Result<EntityId, EcsError> {
        self.type_id_of::<T>()?;
        let entity = self.spawn();
        self.insert_component(entity, component)?;
        Ok(entity)
    }

    /// Despawn an entity, dropping all of its components and recycling the id.
    ///
    /// A `Removed` event is recorded for every component the entity carried.
    pub fn despawn(&mut self, entity: EntityId) -> Result<(), EcsError> {
        self.ensure_alive(entity)?;
        let mask = self.masks.remove(&entity).unwrap_or_default();
        for id in mask.iter() {
            if let Some(column) = self.columns.get_mut(id.index()) {
                column.remove(entity);
            }
            self.changes.record(ChangeKind::Removed, entity, id);
        }
        self.allocator.deallocate(entity);
        Ok(())
    }

    /// Whether `entity` is a live, current-generation handle.
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// All live entities in entity order.
    pub fn entities(&self) -> Vec<EntityId> {
        self.masks.keys().copied().collect()
    }

    // -- component access ---------------------------------------------------

    /// Attach `value` to `entity`, overwriting any existing `T`.
    ///
    /// Records `Added` for a new component, `Changed` for an overwrite.
    pub fn insert_component<T: Component>(
        &mut self,
        entity: EntityId,
        value: T,
    ) -> Result<(), EcsError> {
        let id = self.type_id_of::<T>()?;
        self.ensure_alive(entity)?;
        let replaced = self
            .column_mut::<T>(id)
            .ok_or_else(|| EcsError::UnknownComponent(std::any::type_name::<T>().to_owned()))?
            .insert(entity, value);
        self.after_insert(entity, id, replaced);
        Ok(())
    }

    /// Attach a type-erased value to `entity`, by component id.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::TypeMismatch`] if `value` is not an instance of the
    /// type registered under `id`.
    pub fn insert_erased(
        &mut self,
        id: ComponentTypeId,
        entity: EntityId,
        value: Box<dyn Any + Send + Sync>,
    ) -> Result<(), EcsError> {
        self.ensure_alive(entity)?;
        let info = self
            .registry
            .get_info(id)
            .ok_or_else(|| EcsError::UnknownComponent(format!("{id:?}")))?;
        let (name, expected) = (info.name.clone(), info.type_name);
        let column = self
            .columns
            .get_mut(id.index())
            .ok_or_else(|| EcsError::UnknownComponent(name.clone()))?;
        let replaced = column
            .insert_boxed(entity, value)
            .map_err(|_| EcsError::TypeMismatch {
                component: name,
                expected,
            })?;
        self.after_insert(entity, id, replaced);
        Ok(())
    }

    /// Set a component from JSON, by its registered name.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownComponent`] for an unregistered name,
    /// [`EcsError::StaleEntity`] for a dead entity, and
    /// [`EcsError::Deserialize`] if the JSON does not match the component.
    pub fn set_component_by_name(
        &mut self,
        entity: EntityId,
        component_name: &str,
        value: &serde_json::Value,
    ) -> Result<(), EcsError> {
        let id = self
            .registry
            .lookup_by_name(component_name)
            .ok_or_else(|| EcsError::UnknownComponent(component_name.to_owned()))?;
        self.ensure_alive(entity)?;
        let column = self
            .columns
            .get_mut(id.index())
            .ok_or_else(|| EcsError::UnknownComponent(component_name.to_owned()))?;
        let replaced = column
            .insert_json(entity, value)
            .map_err(|e| EcsError::Deserialize {
                component: component_name.to_owned(),
                details: e.to_string(),
            })?;
        self.after_insert(entity, id, replaced);
        Ok(())
    }

    fn after_insert(&mut self, entity: EntityId, id: ComponentTypeId, replaced: bool) {
        if let Some(mask) = self.masks.get_mut(&entity) {
            mask.insert(id);
        }
        let kind = if replaced {
            ChangeKind::Changed
        } else {
            ChangeKind::Added
        };
        self.changes.record(kind, entity, id);
    }

    /// Whether `entity` currently has a `T`.
    pub fn has_component<T: 'static>(&self, entity: EntityId) -> bool {
        self.registry
            .lookup::<T>()
            .is_some_and(|id| self.has_component_id(entity, id))
    }

    /// Whether `entity` currently has the component with id `id`.
    pub fn has_component_id(&self, entity: EntityId, id: ComponentTypeId) -> bool {
        self.masks.get(&entity).is_some_and(|m| m.contains(id))
    }

    /// Borrow `entity`'s `T`.
    pub fn get_component<T: Component>(&self, entity: EntityId) -> Option<&T> {
        let id = self.registry.lookup::<T>()?;
        self.column::<T>(id)?.get(entity)
    }

    /// Mutably borrow `entity`'s `T`.
    ///
    /// In-place mutation does not record a `Changed` event; call
    /// [`mark_changed`](Self::mark_changed) when reactive systems should see it.
    pub fn get_component_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        let id = self.registry.lookup::<T>()?;
        self.column_mut::<T>(id)?.get_mut(entity)
    }

    /// Detach `T` from `entity`. Removing a component the entity does not
    /// have is a no-op.
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) -> Result<(), EcsError> {
        let id = self.type_id_of::<T>()?;
        self.ensure_alive(entity)?;
        let removed = self
            .columns
            .get_mut(id.index())
            .is_some_and(|column| column.remove(entity));
        if removed {
            if let Some(mask) = self.masks.get_mut(&entity) {
                mask.remove(id);
            }
            self.changes.record(ChangeKind::Removed, entity, id);
        }
        Ok(())
    }

    /// Record a `Changed` event for `entity`'s `T` after in-place mutation.
    /// Does nothing if the entity does not have a `T`.
    pub fn mark_changed<T: Component>(&mut self, entity: EntityId) -> Result<(), EcsError> {
        let id = self.type_id_of::<T>()?;
        self.ensure_alive(entity)?;
        if self.has_component_id(entity, id) {
            self.changes.record(ChangeKind::Changed, entity, id);
        }
        Ok(())
    }

    // -- filters ------------------------------------------------------------

    /// Register a component-set filter and return its handle.
    pub fn register_filter(&mut self, mask: ComponentMask) -> FilterId {
        if let Some(&id) = self.filter_index.get(&mask) {
            return id;
        }
        let id = FilterId(self.filters.len() as u32);
        self.filters.push(mask.clone());
        self.filter_index.insert(mask, id);
        id
    }

    /// Live entities whose components include every type in the filter, in
    /// entity order.
    pub fn filter_entities(&self, filter: FilterId) -> Result<Vec<EntityId>, EcsError> {
        let mask = self
            .filters
            .get(filter.0 as usize)
            .ok_or(EcsError::UnknownFilter(filter))?;
        Ok(self
            .masks
            .iter()
            .filter(|(_, m)| m.contains_all(mask))
            .map(|(&e, _)| e)
            .collect())
    }

    // -- change notifications -----------------------------------------------

    /// Start recording `kind` events for `component`.
    pub fn watch(&mut self, component: ComponentTypeId, kind: ChangeKind) {
        self.changes.watch(component, kind);
    }

    /// Whether `kind` events for `component` are being recorded.
    pub fn is_watched(&self, component: ComponentTypeId, kind: ChangeKind) -> bool {
        self.changes.is_watched(component, kind)
    }

    /// Take every pending event, oldest first.
    pub fn drain_events(&mut self) -> Vec<ComponentEvent> {
        self.changes.drain()
    }

    // -- diagnostics --------------------------------------------------------

    /// Registered names of `entity`'s components, in registration order.
    pub fn component_names(&self, entity: EntityId) -> Vec<&str> {
        self.masks
            .get(&entity)
            .map(|mask| mask.iter().map(|id| self.registry.name_of(id)).collect())
            .unwrap_or_default()
    }

    /// Multi-line dump of an entity and its component values, for logs.
    pub fn describe_entity(&self, entity: EntityId) -> String {
        let Some(mask) = self.masks.get(&entity) else {
            return format!("entity {entity} (dead)");
        };
        let mut out = format!("entity {entity} ({} components)", mask.len());
        for id in mask.iter() {
            let value = self
                .columns
                .get(id.index())
                .and_then(|column| column.to_json(entity))
                .map(|v| v.to_string())
                .unwrap_or_else(|| "?".to_owned());
            let _ = write!(out, "\n  {}: {value}", self.registry.name_of(id));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

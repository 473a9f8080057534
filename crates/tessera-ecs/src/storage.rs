//! Typed component columns behind a type-erased interface.
//!
//! Each registered component type owns exactly one [`Column<T>`]. The world
//! talks to columns through [`ComponentColumn`], which covers the operations
//! that must work without knowing `T`: erased insertion, JSON insertion and
//! inspection, removal on despawn.

use std::any::Any;
use std::collections::HashMap;

use crate::component::Component;
use crate::entity::EntityId;

/// Object-safe view of a [`Column<T>`].
pub(crate) trait ComponentColumn: Send + Sync {
    /// Insert a boxed value. Hands the box back if it does not hold `T`.
    /// On success, returns whether an existing value was replaced.
    fn insert_boxed(
        &mut self,
        entity: EntityId,
        value: Box<dyn Any + Send + Sync>,
    ) -> Result<bool, Box<dyn Any + Send + Sync>>;

    /// Deserialize `value` as `T` and insert it. Returns whether an existing
    /// value was replaced.
    fn insert_json(
        &mut self,
        entity: EntityId,
        value: &serde_json::Value,
    ) -> Result<bool, serde_json::Error>;

    /// Serialize the stored value, if any.
    fn to_json(&self, entity: EntityId) -> Option<serde_json::Value>;

    /// Remove the value for `entity`. Returns whether one was present.
    fn remove(&mut self, entity: EntityId) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Sparse storage for one component type, keyed by entity.
#[derive(Debug)]
pub(crate) struct Column<T> {
    values: HashMap<EntityId, T>,
}

impl<T> Column<T> {
    pub(crate) fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub(crate) fn get(&self, entity: EntityId) -> Option<&T> {
        self.values.get(&entity)
    }

    pub(crate) fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        self.values.get_mut(&entity)
    }

    /// Returns whether an existing value was replaced.
    pub(crate) fn insert(&mut self, entity: EntityId, value: T) -> bool {
        self.values.insert(entity, value).is_some()
    }
}

impl<T: Component> ComponentColumn for Column<T> {
    fn insert_boxed(
        &mut self,
        entity: EntityId,
        value: Box<dyn Any + Send + Sync>,
    ) -> Result<bool, Box<dyn Any + Send + Sync>> {
        let value = value.downcast::<T>()?;
        Ok(self.insert(entity, *value))
    }

    fn insert_json(
        &mut self,
        entity: EntityId,
        value: &serde_json::Value,
    ) -> Result<bool, serde_json::Error> {
        let typed: T = serde_json::from_value(value.clone())?;
        Ok(self.insert(entity, typed))
    }

    fn to_json(&self, entity: EntityId) -> Option<serde_json::Value> {
        self.values
            .get(&entity)
            .and_then(|v| serde_json::to_value(v).ok())
    }

    fn remove(&mut self, entity: EntityId) -> bool {
        self.values.remove(&entity).is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

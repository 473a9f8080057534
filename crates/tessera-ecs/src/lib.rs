//! Tessera ECS -- a compact entity-component store.
//!
//! Entities are generational ids; components live in one sparse column per
//! registered type. Systems find their entities through registered
//! component-set filters, and reactive code observes additions, removals and
//! changes through the world's change log.
//!
//! # Quick Start
//!
//! ```
//! use tessera_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
//! struct Position { x: f32, y: f32 }
//!
//! #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! let mut world = World::new();
//! world.register_component::<Position>("position");
//! world.register_component::<Velocity>("velocity");
//!
//! let entity = world.spawn_with(Position { x: 0.0, y: 0.0 }).unwrap();
//! world.insert_component(entity, Velocity { dx: 1.0, dy: 0.0 }).unwrap();
//!
//! let moving = world.register_filter(world.mask_of::<(Position, Velocity)>().unwrap());
//! assert_eq!(world.filter_entities(moving).unwrap(), vec![entity]);
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod events;
mod storage;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by store operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The entity does not exist (stale generation or never allocated).
    #[error("entity {0:?} does not exist (stale or never allocated)")]
    StaleEntity(entity::EntityId),

    /// A component type was referenced that has not been registered.
    #[error("component type '{0}' not registered")]
    UnknownComponent(String),

    /// A type-erased value did not hold the registered component type.
    #[error("value for component '{component}' is not a {expected}")]
    TypeMismatch {
        component: String,
        expected: &'static str,
    },

    /// Deserialization of a component value failed.
    #[error("failed to deserialize component '{component}': {details}")]
    Deserialize { component: String, details: String },

    /// The filter handle was not produced by this world.
    #[error("filter {0:?} is not registered")]
    UnknownFilter(world::FilterId),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{
        Component, ComponentInfo, ComponentMask, ComponentRegistry, ComponentSet, ComponentTypeId,
    };
    pub use crate::entity::{EntityAllocator, EntityId};
    pub use crate::events::{ChangeKind, ComponentEvent};
    pub use crate::world::{FilterId, World};
    pub use crate::EcsError;
}

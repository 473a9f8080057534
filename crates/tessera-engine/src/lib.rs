//! Tessera Engine -- category-scheduled ECS pipelines and descriptor-driven
//! entity assembly.
//!
//! This crate builds on [`tessera_ecs`]. Systems are registered by name in a
//! [`TypeRegistry`](registry::TypeRegistry) and scheduled per
//! [`SystemCategory`](system::SystemCategory) in a
//! [`SystemSchedule`](schedule::SystemSchedule). A
//! [`Pipeline`](pipeline::Pipeline) instantiates and ticks one schedule; the
//! [`PipelineController`](controller::PipelineController) owns the world and
//! keeps exactly one pipeline switched on. Entities are assembled from
//! serializable [`EntityDescriptor`](descriptor::EntityDescriptor)s.
//!
//! # Quick Start
//!
//! ```
//! use tessera_engine::prelude::*;
//!
//! #[derive(Default, Clone, serde::Serialize, serde::Deserialize)]
//! struct Score(u32);
//!
//! #[derive(Default)]
//! struct Scorer;
//!
//! impl System for Scorer {
//!     fn tick(&mut self, world: &mut World) {
//!         for entity in world.entities() {
//!             if let Some(score) = world.get_component_mut::<Score>(entity) {
//!                 score.0 += 1;
//!             }
//!         }
//!     }
//! }
//!
//! let registry = TypeRegistry::builder()
//!     .system::<Scorer>("scorer", SystemCategories::UPDATE)
//!     .component_with_schema::<Score>("score", Vec::new())
//!     .build();
//! let schedule = SystemSchedule::new().with(SystemCategory::Update, SystemEntry::new("scorer"));
//!
//! let mut controller = PipelineController::new(registry, vec![Pipeline::new("game", schedule)]);
//! controller.start(&[]).unwrap();
//! let player = controller.create_entity_with_component(Score(0)).unwrap();
//!
//! let mut driver = FrameDriver::new(TickConfig::default());
//! driver.run_fixed_frames(&mut controller, 3);
//! assert_eq!(controller.world().get_component::<Score>(player).unwrap().0, 3);
//! ```

#![deny(unsafe_code)]

pub mod assembler;
pub mod clock;
pub mod collision;
pub mod config;
pub mod controller;
pub mod descriptor;
pub mod driver;
pub mod error;
pub mod pipeline;
pub mod preset;
pub mod registry;
pub mod schedule;
pub mod system;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the ECS crate for convenience.
pub use tessera_ecs;

pub use error::{AssemblyError, ConfigError, DecodeError, StartupError};

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use tessera_ecs::prelude::*;

    pub use crate::assembler::assemble;
    pub use crate::clock::{CancellationToken, FixedStepScheduler};
    pub use crate::collision::{
        add_or_override, on_collision_enter, on_collision_exit, on_controller_collider_hit,
        on_trigger_enter, on_trigger_exit, register_collision_components, CollisionEnter,
        CollisionExit, Contact, ControllerColliderHit, OverrideCollision, OverrideTriggerEnter,
        OverrideTriggerExit, Participant, Recorded, TriggerEnter, TriggerExit,
    };
    pub use crate::config::{EngineConfig, PipelineConfig, TickConfig};
    pub use crate::controller::{PipelineController, Service, StartupStatus};
    pub use crate::descriptor::{
        ComponentDescriptor, DescribeFields, EntityDescriptor, FieldDescriptor, FieldKind,
        FieldSchema, FieldValue, ObjectHandle, PresetRef,
    };
    pub use crate::driver::{FrameDiagnostics, FrameDriver};
    pub use crate::error::{AssemblyError, ConfigError, DecodeError, StartupError};
    pub use crate::pipeline::Pipeline;
    pub use crate::preset::{EntityPreset, EntityTemplate, PresetLibrary};
    pub use crate::registry::{TypeRegistry, TypeRegistryBuilder};
    pub use crate::schedule::{MoveDirection, SystemEntry, SystemFeature, SystemSchedule};
    pub use crate::system::{FromWorld, Subscription, System, SystemCategories, SystemCategory};
}

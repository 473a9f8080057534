//! Collision and trigger snapshots written by external event sources.
//!
//! Physics can report several contacts for one entity in the same step. Each
//! entity keeps one snapshot component per event kind, and
//! [`add_or_override`] decides what a later event does to it: the first event
//! always lands; later ones replace it only when the entity carries the
//! matching override marker, and are dropped otherwise.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tessera_ecs::prelude::*;

use crate::descriptor::{DescribeFields, FieldKind, FieldSchema, ObjectHandle};
use crate::registry::TypeRegistryBuilder;

// ---------------------------------------------------------------------------
// Snapshot components
// ---------------------------------------------------------------------------

/// Most recent collision start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CollisionEnter {
    /// Entity on the other side, or [`EntityId::NULL`].
    pub other: EntityId,
    pub collider: ObjectHandle,
    pub other_collider: ObjectHandle,
    pub contact_point: Vec3,
    /// Contact normal, pointing away from the other body.
    pub normal: Vec3,
    /// Rigid body of the other side.
    pub body: ObjectHandle,
}

/// Most recent collision end. Same layout as [`CollisionEnter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CollisionExit {
    pub other: EntityId,
    pub collider: ObjectHandle,
    pub other_collider: ObjectHandle,
    pub contact_point: Vec3,
    pub normal: Vec3,
    pub body: ObjectHandle,
}

/// Most recent trigger entry. `collider` is the other side's collider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerEnter {
    pub other: EntityId,
    pub collider: ObjectHandle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerExit {
    pub other: EntityId,
    pub collider: ObjectHandle,
}

/// Most recent hit reported by a character controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerColliderHit {
    pub other: EntityId,
    pub collider: ObjectHandle,
    pub other_collider: ObjectHandle,
    pub contact_point: Vec3,
    pub body: ObjectHandle,
}

// -- override markers --------------------------------------------------------

/// Later collision events (enter, exit, controller hits) replace the snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideCollision;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideTriggerEnter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideTriggerExit;

impl DescribeFields for OverrideCollision {
    fn describe_fields() -> Vec<FieldSchema> {
        Vec::new()
    }
}

impl DescribeFields for OverrideTriggerEnter {
    fn describe_fields() -> Vec<FieldSchema> {
        Vec::new()
    }
}

impl DescribeFields for OverrideTriggerExit {
    fn describe_fields() -> Vec<FieldSchema> {
        Vec::new()
    }
}

/// Register the snapshot components and override markers under their
/// conventional names. Snapshots are written by event sources, so they expose
/// no authored fields; the markers are meant to be placed on templates.
pub fn register_collision_components(builder: TypeRegistryBuilder) -> TypeRegistryBuilder {
    builder
        .component_with_schema::<CollisionEnter>("collision_enter", Vec::new())
        .component_with_schema::<CollisionExit>("collision_exit", Vec::new())
        .component_with_schema::<TriggerEnter>("trigger_enter", vec![FieldSchema::new("collider", FieldKind::Object)])
        .component_with_schema::<TriggerExit>("trigger_exit", vec![FieldSchema::new("collider", FieldKind::Object)])
        .component_with_schema::<ControllerColliderHit>("controller_collider_hit", Vec::new())
        .component::<OverrideCollision>("override_collision")
        .component::<OverrideTriggerEnter>("override_trigger_enter")
        .component::<OverrideTriggerExit>("override_trigger_exit")
}

// ---------------------------------------------------------------------------
// Override policy
// ---------------------------------------------------------------------------

/// What [`add_or_override`] did with a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    Added,
    Overridden,
    Dropped,
}

/// Store `value` on `entity` unless an earlier `T` must be kept.
///
/// Missing `T` is added; an existing `T` is replaced when the entity also has
/// marker `M`, and kept otherwise.
pub fn add_or_override<T: Component, M: 'static>(
    world: &mut World,
    entity: EntityId,
    value: T,
) -> Result<Recorded, EcsError> {
    if !world.is_alive(entity) {
        return Err(EcsError::StaleEntity(entity));
    }
    let outcome = if !world.has_component::<T>(entity) {
        Recorded::Added
    } else if world.has_component::<M>(entity) {
        Recorded::Overridden
    } else {
        return Ok(Recorded::Dropped);
    };
    world.insert_component(entity, value)?;
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Event sources
// ---------------------------------------------------------------------------

/// One side of a physics contact.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Participant {
    /// Entity tracking this object, if any.
    pub entity: Option<EntityId>,
    pub collider: ObjectHandle,
    pub body: ObjectHandle,
}

impl Participant {
    pub fn new(entity: Option<EntityId>, collider: ObjectHandle) -> Self {
        Self {
            entity,
            collider,
            body: ObjectHandle::default(),
        }
    }

    pub fn with_body(mut self, body: ObjectHandle) -> Self {
        self.body = body;
        self
    }

    fn entity_or_null(&self) -> EntityId {
        self.entity.unwrap_or(EntityId::NULL)
    }
}

/// Contact geometry as seen from the first participant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Contact {
    pub point: Vec3,
    pub normal: Vec3,
}

/// Per-participant results of one event: `(entity, outcome)` for every side
/// that was recorded, first participant first.
pub type EventOutcome = Vec<(EntityId, Recorded)>;

/// Run `record` for each tracked, live side of `a`/`b`. The closure receives
/// the side being recorded, the opposite side, and whether the side is `a`.
fn for_both_sides(
    world: &mut World,
    event: &'static str,
    a: &Participant,
    b: &Participant,
    mut record: impl FnMut(&mut World, EntityId, &Participant, &Participant, bool) -> Result<Recorded, EcsError>,
) -> Result<EventOutcome, EcsError> {
    let mut out = EventOutcome::new();
    for (this, other, first) in [(a, b, true), (b, a, false)] {
        let Some(entity) = this.entity else {
            continue;
        };
        if !world.is_alive(entity) {
            tracing::debug!(event, %entity, "event for a dead entity skipped");
            continue;
        }
        let outcome = record(world, entity, this, other, first)?;
        if outcome == Recorded::Dropped {
            tracing::trace!(event, %entity, "snapshot kept, event dropped");
        }
        out.push((entity, outcome));
    }
    Ok(out)
}

fn oriented(contact: &Contact, first: bool) -> Vec3 {
    if first { contact.normal } else { -contact.normal }
}

pub fn on_collision_enter(
    world: &mut World,
    a: &Participant,
    b: &Participant,
    contact: &Contact,
) -> Result<EventOutcome, EcsError> {
    for_both_sides(world, "collision_enter", a, b, |world, entity, this, other, first| {
        let snapshot = CollisionEnter {
            other: other.entity_or_null(),
            collider: this.collider,
            other_collider: other.collider,
            contact_point: contact.point,
            normal: oriented(contact, first),
            body: other.body,
        };
        add_or_override::<_, OverrideCollision>(world, entity, snapshot)
    })
}

pub fn on_collision_exit(
    world: &mut World,
    a: &Participant,
    b: &Participant,
    contact: &Contact,
) -> Result<EventOutcome, EcsError> {
    for_both_sides(world, "collision_exit", a, b, |world, entity, this, other, first| {
        let snapshot = CollisionExit {
            other: other.entity_or_null(),
            collider: this.collider,
            other_collider: other.collider,
            contact_point: contact.point,
            normal: oriented(contact, first),
            body: other.body,
        };
        add_or_override::<_, OverrideCollision>(world, entity, snapshot)
    })
}

pub fn on_trigger_enter(world: &mut World, a: &Participant, b: &Participant) -> Result<EventOutcome, EcsError> {
    for_both_sides(world, "trigger_enter", a, b, |world, entity, _, other, _| {
        let snapshot = TriggerEnter {
            other: other.entity_or_null(),
            collider: other.collider,
        };
        add_or_override::<_, OverrideTriggerEnter>(world, entity, snapshot)
    })
}

pub fn on_trigger_exit(world: &mut World, a: &Participant, b: &Participant) -> Result<EventOutcome, EcsError> {
    for_both_sides(world, "trigger_exit", a, b, |world, entity, _, other, _| {
        let snapshot = TriggerExit {
            other: other.entity_or_null(),
            collider: other.collider,
        };
        add_or_override::<_, OverrideTriggerExit>(world, entity, snapshot)
    })
}

/// `controller` is the character controller that moved into `hit`.
pub fn on_controller_collider_hit(
    world: &mut World,
    controller: &Participant,
    hit: &Participant,
    point: Vec3,
) -> Result<EventOutcome, EcsError> {
    for_both_sides(world, "controller_collider_hit", controller, hit, |world, entity, this, other, _| {
        let snapshot = ControllerColliderHit {
            other: other.entity_or_null(),
            collider: this.collider,
            other_collider: other.collider,
            contact_point: point,
            body: other.body,
        };
        add_or_override::<_, OverrideCollision>(world, entity, snapshot)
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistry;

    fn world() -> World {
        let registry = register_collision_components(TypeRegistry::builder()).build();
        let mut world = World::new();
        registry.install_components(&mut world);
        world
    }

    fn side(entity: Option<EntityId>, collider: u64) -> Participant {
        Participant::new(entity, ObjectHandle(collider))
    }

    // -- add_or_override ----------------------------------------------------

    #[test]
    fn first_writer_wins_without_marker() {
        let mut world = world();
        let e = world.spawn();
        let first = TriggerEnter { other: EntityId::NULL, collider: ObjectHandle(1) };
        let second = TriggerEnter { other: EntityId::NULL, collider: ObjectHandle(2) };
        assert_eq!(add_or_override::<_, OverrideTriggerEnter>(&mut world, e, first).unwrap(), Recorded::Added);
        assert_eq!(add_or_override::<_, OverrideTriggerEnter>(&mut world, e, second).unwrap(), Recorded::Dropped);
        assert_eq!(world.get_component::<TriggerEnter>(e), Some(&first));
    }

    #[test]
    fn marker_lets_latest_win() {
        let mut world = world();
        let e = world.spawn();
        world.insert_component(e, OverrideTriggerEnter).unwrap();
        let second = TriggerEnter { other: EntityId::NULL, collider: ObjectHandle(2) };
        add_or_override::<_, OverrideTriggerEnter>(&mut world, e, TriggerEnter::default()).unwrap();
        assert_eq!(
            add_or_override::<_, OverrideTriggerEnter>(&mut world, e, second).unwrap(),
            Recorded::Overridden
        );
        assert_eq!(world.get_component::<TriggerEnter>(e), Some(&second));
    }

    #[test]
    fn wrong_marker_does_not_override() {
        let mut world = world();
        let e = world.spawn();
        world.insert_component(e, OverrideTriggerExit).unwrap();
        add_or_override::<_, OverrideTriggerEnter>(&mut world, e, TriggerEnter::default()).unwrap();
        assert_eq!(
            add_or_override::<_, OverrideTriggerEnter>(&mut world, e, TriggerEnter::default()).unwrap(),
            Recorded::Dropped
        );
    }

    #[test]
    fn dead_entity_is_an_error() {
        let mut world = world();
        let e = world.spawn();
        world.despawn(e).unwrap();
        assert!(matches!(
            add_or_override::<_, OverrideCollision>(&mut world, e, CollisionEnter::default()),
            Err(EcsError::StaleEntity(_))
        ));
    }

    // -- event sources ------------------------------------------------------

    #[test]
    fn collision_is_recorded_for_both_sides() {
        let mut world = world();
        let a = world.spawn();
        let b = world.spawn();
        let contact = Contact { point: Vec3::new(1.0, 0.0, 0.0), normal: Vec3::Y };
        let outcome = on_collision_enter(
            &mut world,
            &side(Some(a), 10).with_body(ObjectHandle(100)),
            &side(Some(b), 20).with_body(ObjectHandle(200)),
            &contact,
        )
        .unwrap();
        assert_eq!(outcome, vec![(a, Recorded::Added), (b, Recorded::Added)]);

        let on_a = world.get_component::<CollisionEnter>(a).unwrap();
        assert_eq!((on_a.other, on_a.collider, on_a.other_collider), (b, ObjectHandle(10), ObjectHandle(20)));
        assert_eq!(on_a.body, ObjectHandle(200));
        assert_eq!(on_a.normal, Vec3::Y);
        let on_b = world.get_component::<CollisionEnter>(b).unwrap();
        assert_eq!(on_b.other, a);
        assert_eq!(on_b.normal, -Vec3::Y);
    }

    #[test]
    fn untracked_side_is_null() {
        let mut world = world();
        let a = world.spawn();
        let outcome = on_trigger_exit(&mut world, &side(None, 7), &side(Some(a), 8)).unwrap();
        assert_eq!(outcome, vec![(a, Recorded::Added)]);
        let exit = world.get_component::<TriggerExit>(a).unwrap();
        assert!(exit.other.is_null());
        assert_eq!(exit.collider, ObjectHandle(7));
    }

    #[test]
    fn dead_participant_is_skipped() {
        let mut world = world();
        let a = world.spawn();
        let b = world.spawn();
        world.despawn(b).unwrap();
        let outcome = on_controller_collider_hit(&mut world, &side(Some(a), 1), &side(Some(b), 2), Vec3::ZERO).unwrap();
        assert_eq!(outcome, vec![(a, Recorded::Added)]);
        assert_eq!(world.get_component::<ControllerColliderHit>(a).unwrap().other, b);
    }

    #[test]
    fn collision_exit_uses_collision_marker() {
        let mut world = world();
        let a = world.spawn();
        world.insert_component(a, OverrideCollision).unwrap();
        let contact = Contact::default();
        on_collision_exit(&mut world, &side(Some(a), 1), &side(None, 2), &contact).unwrap();
        let outcome = on_collision_exit(&mut world, &side(Some(a), 1), &side(None, 3), &contact).unwrap();
        assert_eq!(outcome, vec![(a, Recorded::Overridden)]);
        assert_eq!(world.get_component::<CollisionExit>(a).unwrap().other_collider, ObjectHandle(3));
    }
}

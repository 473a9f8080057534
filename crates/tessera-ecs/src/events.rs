//! Component change notifications.
//!
//! The world records an event only for `(component, kind)` pairs someone has
//! asked to watch, so unobserved mutations cost a single set lookup.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::component::ComponentTypeId;
use crate::entity::EntityId;

/// What happened to a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// The component was attached to an entity that did not have it.
    Added,
    /// The component was detached, or its entity despawned.
    Removed,
    /// An existing value was overwritten or explicitly marked changed.
    Changed,
}

/// One recorded change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentEvent {
    pub kind: ChangeKind,
    pub entity: EntityId,
    pub component: ComponentTypeId,
}

/// Watch set plus the pending event queue.
#[derive(Debug, Default)]
pub(crate) struct ChangeLog {
    watched: HashSet<(ComponentTypeId, ChangeKind)>,
    pending: Vec<ComponentEvent>,
}

impl ChangeLog {
    pub(crate) fn watch(&mut self, component: ComponentTypeId, kind: ChangeKind) {
        self.watched.insert((component, kind));
    }

    pub(crate) fn is_watched(&self, component: ComponentTypeId, kind: ChangeKind) -> bool {
        self.watched.contains(&(component, kind))
    }

    pub(crate) fn record(&mut self, kind: ChangeKind, entity: EntityId, component: ComponentTypeId) {
        if self.is_watched(component, kind) {
            self.pending.push(ComponentEvent {
                kind,
                entity,
                component,
            });
        }
    }

    pub(crate) fn drain(&mut self) -> Vec<ComponentEvent> {
        std::mem::take(&mut self.pending)
    }
}

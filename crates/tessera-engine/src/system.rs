//! Systems and the scheduling categories they run in.
//!
//! A system is a unit of behavior over the [`World`]. It is constructed once
//! per schedule entry, from the world alone ([`FromWorld`]), so that any
//! filters it needs are registered before the first tick and stay stable.

use std::fmt;

use serde::{Deserialize, Serialize};
use tessera_ecs::prelude::*;

// ---------------------------------------------------------------------------
// SystemCategory
// ---------------------------------------------------------------------------

/// A scheduling phase.
///
/// `Init` runs once per activation. `Update`, `LateUpdate`, `FixedUpdate` and
/// `LateFixedUpdate` tick on their clocks. `OnEnable` / `OnDisable` run once per
/// pause transition. `Reactive` systems never tick; they receive store change
/// events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SystemCategory {
    Init,
    Update,
    LateUpdate,
    FixedUpdate,
    LateFixedUpdate,
    OnEnable,
    OnDisable,
    Reactive,
}

impl SystemCategory {
    /// Every category, in schedule order.
    pub const ALL: [SystemCategory; 8] = [
        SystemCategory::Init,
        SystemCategory::Update,
        SystemCategory::LateUpdate,
        SystemCategory::FixedUpdate,
        SystemCategory::LateFixedUpdate,
        SystemCategory::OnEnable,
        SystemCategory::OnDisable,
        SystemCategory::Reactive,
    ];

    /// Position in [`ALL`](Self::ALL); used to index per-category tables.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The single-bit [`SystemCategories`] value for this category.
    pub fn flag(self) -> SystemCategories {
        SystemCategories::from_bits_truncate(1 << self.index())
    }
}

impl fmt::Display for SystemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

bitflags::bitflags! {
    /// The set of categories a system type may be scheduled in. Fixed when the
    /// type is registered.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct SystemCategories: u16 {
        const INIT = 1 << 0;
        const UPDATE = 1 << 1;
        const LATE_UPDATE = 1 << 2;
        const FIXED_UPDATE = 1 << 3;
        const LATE_FIXED_UPDATE = 1 << 4;
        const ON_ENABLE = 1 << 5;
        const ON_DISABLE = 1 << 6;
        const REACTIVE = 1 << 7;
    }
}

impl SystemCategories {
    /// Whether `category` is in this set.
    pub fn includes(self, category: SystemCategory) -> bool {
        self.contains(category.flag())
    }

    /// Member categories, in schedule order.
    pub fn iter_categories(self) -> impl Iterator<Item = SystemCategory> {
        SystemCategory::ALL
            .into_iter()
            .filter(move |c| self.includes(*c))
    }
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// A store change a reactive system wants to hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub component: ComponentTypeId,
    pub kind: ChangeKind,
}

impl Subscription {
    /// Subscribe to `kind` events of the component type `T`.
    ///
    /// Returns `None` if `T` is not registered in `world`.
    pub fn to<T: 'static>(world: &World, kind: ChangeKind) -> Option<Self> {
        world
            .component_id::<T>()
            .map(|component| Self { component, kind })
    }
}

/// A unit of behavior.
///
/// `tick` must tolerate empty filters; a system with nothing to do returns.
pub trait System: Send {
    /// One-time setup when the owning pipeline activates. Called once for each
    /// category the system is scheduled in, only while its entry is active.
    fn init(&mut self, _world: &mut World) {}

    /// One step of work.
    fn tick(&mut self, world: &mut World);

    /// Changes a `Reactive` system wants delivered to [`react`](Self::react).
    fn subscriptions(&self) -> Vec<Subscription> {
        Vec::new()
    }

    /// Handle one change event matching [`subscriptions`](Self::subscriptions).
    fn react(&mut self, _world: &mut World, _event: &ComponentEvent) {}
}

/// Construction from the world alone.
pub trait FromWorld {
    fn from_world(world: &mut World) -> Self;
}

impl<T: Default> FromWorld for T {
    fn from_world(_world: &mut World) -> Self {
        T::default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

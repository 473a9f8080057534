//! Pipelines: per-category system instances with lifecycle and pause control.
//!
//! A [`Pipeline`] is created from a [`SystemSchedule`]. [`init`](Pipeline::init)
//! resolves every entry through the [`TypeRegistry`] and constructs one system
//! per entry; from then on the schedule's entries and the instances of each
//! category are index-aligned. The entry carries the switches (`active`,
//! `non_pausable`), the instance carries the behavior.
//!
//! Tick policy for a category: inactive entries are skipped; while the
//! pipeline is paused, entries that are not `non_pausable` are skipped too,
//! unless the tick is forced (OnDisable on pause or switch-off).

use std::any::TypeId;
use std::collections::HashMap;

use tessera_ecs::prelude::*;

use crate::clock::{CancellationToken, FixedStepScheduler};
use crate::error::ConfigError;
use crate::registry::TypeRegistry;
use crate::schedule::SystemSchedule;
use crate::system::{Subscription, System, SystemCategory};

/// Ordered systems per category, with lifecycle and pause state.
pub struct Pipeline {
    name: String,
    schedule: SystemSchedule,
    /// Indexed by `SystemCategory::index()`. Empty until `init`.
    systems: Vec<Vec<Box<dyn System>>>,
    index: HashMap<(SystemCategory, TypeId), usize>,
    /// Reactive subscriptions and the Reactive slot they belong to.
    subscriptions: Vec<(Subscription, usize)>,
    active: bool,
    paused: bool,
    late_fixed: Option<CancellationToken>,
    /// Key of this pipeline's registrations with the fixed-step scheduler.
    clock_key: usize,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("initialized", &self.is_initialized())
            .field("active", &self.active)
            .field("paused", &self.paused)
            .finish()
    }
}

impl Pipeline {
    /// Create an uninitialized, inactive pipeline.
    pub fn new(name: impl Into<String>, schedule: SystemSchedule) -> Self {
        Self {
            name: name.into(),
            schedule,
            systems: Vec::new(),
            index: HashMap::new(),
            subscriptions: Vec::new(),
            active: false,
            paused: false,
            late_fixed: None,
            clock_key: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schedule(&self) -> &SystemSchedule {
        &self.schedule
    }

    /// Mutable schedule access. Edits must happen before [`init`](Self::init);
    /// adding or removing entries afterwards desynchronizes entries and
    /// instances.
    pub fn schedule_mut(&mut self) -> &mut SystemSchedule {
        &mut self.schedule
    }

    pub fn is_initialized(&self) -> bool {
        !self.systems.is_empty()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether a late-fixed-update loop is currently registered.
    pub fn is_late_fixed_running(&self) -> bool {
        self.late_fixed
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    /// Number of instantiated systems in `category`.
    pub fn system_count(&self, category: SystemCategory) -> usize {
        self.systems.get(category.index()).map_or(0, Vec::len)
    }

    pub(crate) fn set_clock_key(&mut self, key: usize) {
        self.clock_key = key;
    }

    // -- initialization -----------------------------------------------------

    /// Construct every scheduled system.
    ///
    /// All names are resolved before anything is constructed: an unknown name
    /// fails with [`ConfigError::UnknownSystem`] and leaves the pipeline
    /// exactly as it was. Reactive subscriptions are registered with the
    /// world's change log.
    pub fn init(&mut self, world: &mut World, registry: &TypeRegistry) -> Result<(), ConfigError> {
        let mut resolved = Vec::with_capacity(SystemCategory::ALL.len());
        for category in SystemCategory::ALL {
            let registrations = self
                .schedule
                .entries(category)
                .iter()
                .map(|entry| {
                    registry.system(&entry.name).ok_or_else(|| {
                        tracing::error!(
                            pipeline = %self.name,
                            system = %entry.name,
                            %category,
                            "cannot resolve system"
                        );
                        ConfigError::UnknownSystem {
                            name: entry.name.clone(),
                            category,
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            resolved.push((category, registrations));
        }

        let mut systems = Vec::with_capacity(resolved.len());
        let mut index = HashMap::new();
        for (category, registrations) in resolved {
            let mut instances = Vec::with_capacity(registrations.len());
            for (slot, registration) in registrations.into_iter().enumerate() {
                if !registration.categories.includes(category) {
                    tracing::warn!(
                        pipeline = %self.name,
                        system = %registration.name,
                        %category,
                        "system scheduled outside its declared categories"
                    );
                }
                index.entry((category, registration.type_id)).or_insert(slot);
                instances.push(registration.construct(world));
                tracing::debug!(pipeline = %self.name, system = %registration.name, %category, "system constructed");
            }
            systems.push(instances);
        }

        let mut subscriptions = Vec::new();
        for (slot, system) in systems[SystemCategory::Reactive.index()].iter().enumerate() {
            for subscription in system.subscriptions() {
                world.watch(subscription.component, subscription.kind);
                subscriptions.push((subscription, slot));
            }
        }

        self.systems = systems;
        self.index = index;
        self.subscriptions = subscriptions;
        tracing::info!(pipeline = %self.name, "pipeline initialized");
        Ok(())
    }

    /// Tick `Init` once, then run [`System::init`] for every active entry of
    /// every category.
    pub fn run_init_systems(&mut self, world: &mut World) {
        if !self.is_initialized() {
            tracing::warn!(pipeline = %self.name, "run_init_systems on uninitialized pipeline ignored");
            return;
        }
        self.tick_category(world, SystemCategory::Init, false);
        for category in SystemCategory::ALL {
            let entries = self.schedule.entries(category);
            let systems = &mut self.systems[category.index()];
            debug_assert_eq!(
                entries.len(),
                systems.len(),
                "systems and schedule entries desynchronized in {category}"
            );
            for (entry, system) in entries.iter().zip(systems.iter_mut()) {
                if entry.active {
                    system.init(world);
                }
            }
        }
    }

    // -- lifecycle ----------------------------------------------------------

    /// Turn the pipeline on or off.
    ///
    /// On: run the init systems and, unless paused, start the late-fixed-update
    /// loop if any of its entries is active. Turning on an active pipeline
    /// re-runs init.
    /// Off: force-tick `OnDisable` once (skipped if pausing already ran it)
    /// and stop the loop. Turning off an inactive pipeline does nothing.
    pub fn switch(&mut self, world: &mut World, on: bool, clock: &mut FixedStepScheduler) {
        if on {
            self.active = true;
            tracing::info!(pipeline = %self.name, "pipeline switched on");
            self.run_init_systems(world);
            if !self.paused {
                self.start_late_fixed_loop(clock);
            }
        } else {
            if !self.active {
                return;
            }
            if !self.paused {
                self.tick_category(world, SystemCategory::OnDisable, true);
            }
            self.active = false;
            self.stop_late_fixed_loop();
            tracing::info!(pipeline = %self.name, "pipeline switched off");
        }
    }

    /// Pause: force-tick `OnDisable` and stop the late-fixed loop. No-op if
    /// already paused.
    pub fn pause(&mut self, world: &mut World) {
        if self.paused {
            return;
        }
        self.paused = true;
        self.tick_category(world, SystemCategory::OnDisable, true);
        self.stop_late_fixed_loop();
        tracing::info!(pipeline = %self.name, "pipeline paused");
    }

    /// Unpause: tick `OnEnable` and restart the late-fixed loop. No-op if not
    /// paused.
    pub fn unpause(&mut self, world: &mut World, clock: &mut FixedStepScheduler) {
        if !self.paused {
            return;
        }
        self.paused = false;
        self.tick_category(world, SystemCategory::OnEnable, false);
        self.start_late_fixed_loop(clock);
        tracing::info!(pipeline = %self.name, "pipeline unpaused");
    }

    fn start_late_fixed_loop(&mut self, clock: &mut FixedStepScheduler) -> bool {
        let any_active = self
            .schedule
            .entries(SystemCategory::LateFixedUpdate)
            .iter()
            .any(|entry| entry.active);
        if !any_active {
            return false;
        }
        // A restart replaces the previous loop instead of running beside it.
        self.stop_late_fixed_loop();
        let token = CancellationToken::new();
        clock.schedule(self.clock_key, token.clone());
        self.late_fixed = Some(token);
        true
    }

    fn stop_late_fixed_loop(&mut self) {
        if let Some(token) = self.late_fixed.take() {
            token.cancel();
        }
    }

    // -- ticking ------------------------------------------------------------

    /// Frame hook: tick `Update`. No-op while the pipeline is off.
    pub fn update(&mut self, world: &mut World) {
        if self.active {
            self.tick_category(world, SystemCategory::Update, false);
        }
    }

    /// Frame hook: tick `LateUpdate`. No-op while the pipeline is off.
    pub fn late_update(&mut self, world: &mut World) {
        if self.active {
            self.tick_category(world, SystemCategory::LateUpdate, false);
        }
    }

    /// Fixed-step hook: tick `FixedUpdate`. No-op while the pipeline is off.
    pub fn fixed_update(&mut self, world: &mut World) {
        if self.active {
            self.tick_category(world, SystemCategory::FixedUpdate, false);
        }
    }

    /// Body of the late-fixed-update loop, run at a fixed-step boundary.
    /// Returns `false` once the pipeline is off, ending the loop.
    pub fn late_fixed_step(&mut self, world: &mut World) -> bool {
        if !self.active {
            return false;
        }
        self.tick_category(world, SystemCategory::LateFixedUpdate, false);
        true
    }

    fn tick_category(&mut self, world: &mut World, category: SystemCategory, force: bool) {
        let Some(systems) = self.systems.get_mut(category.index()) else {
            return;
        };
        let entries = self.schedule.entries(category);
        debug_assert_eq!(
            entries.len(),
            systems.len(),
            "systems and schedule entries desynchronized in {category}"
        );
        let gated = self.paused && !force;
        for (entry, system) in entries.iter().zip(systems.iter_mut()) {
            if !entry.active || (gated && !entry.non_pausable) {
                continue;
            }
            system.tick(world);
        }
    }

    /// Deliver change events to `Reactive` systems with matching
    /// subscriptions. Active and pause gating apply as for ticks.
    pub fn dispatch_events(&mut self, world: &mut World, events: &[ComponentEvent]) {
        if !self.active || self.subscriptions.is_empty() {
            return;
        }
        let entries = self.schedule.entries(SystemCategory::Reactive);
        let systems = &mut self.systems[SystemCategory::Reactive.index()];
        debug_assert_eq!(
            entries.len(),
            systems.len(),
            "systems and schedule entries desynchronized in Reactive"
        );
        for event in events {
            for &(subscription, slot) in &self.subscriptions {
                if subscription.component != event.component || subscription.kind != event.kind {
                    continue;
                }
                let entry = &entries[slot];
                if !entry.active || (self.paused && !entry.non_pausable) {
                    continue;
                }
                systems[slot].react(world, event);
            }
        }
    }

    // -- toggles ------------------------------------------------------------

    /// Turn the system of type `T` in `category` on or off without removing
    /// it. When several entries share `T`, the earliest one is toggled.
    /// Returns `false` (and logs) if no such system is scheduled there.
    pub fn switch_system<T: System + 'static>(&mut self, category: SystemCategory, on: bool) -> bool {
        let Some(&slot) = self.index.get(&(category, TypeId::of::<T>())) else {
            tracing::warn!(
                pipeline = %self.name,
                system = std::any::type_name::<T>(),
                %category,
                "switch_system: system not scheduled in category"
            );
            return false;
        };
        self.schedule.set_active(category, slot, on)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

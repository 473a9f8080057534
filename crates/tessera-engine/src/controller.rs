//! The composition root: one world, several pipelines, one of them on.

use std::fmt;
use std::sync::Arc;

use tessera_ecs::prelude::*;

use crate::clock::FixedStepScheduler;
use crate::error::{AssemblyError, StartupError};
use crate::pipeline::Pipeline;
use crate::preset::{EntityTemplate, PresetLibrary};
use crate::registry::TypeRegistry;

/// An external dependency that must be ready before the controller starts.
pub trait Service: Send + Sync {
    fn name(&self) -> &str;
    fn is_ready(&self) -> bool;
}

/// Result of [`PipelineController::poll_startup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupStatus {
    /// At least one required service is not ready yet.
    Waiting,
    /// Startup ran on this poll; carries the entities created from templates.
    Started(Vec<EntityId>),
    /// Startup had already run.
    Running,
}

/// Owns the shared [`World`] and the pipelines that drive it.
///
/// Exactly one pipeline is switched on after [`start`](Self::start); frame
/// hooks and pause control go to that pipeline only.
pub struct PipelineController {
    world: World,
    registry: Arc<TypeRegistry>,
    pipelines: Vec<Pipeline>,
    current: usize,
    clock: FixedStepScheduler,
    services: Vec<Arc<dyn Service>>,
    started: bool,
}

impl fmt::Debug for PipelineController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineController")
            .field("pipelines", &self.pipelines.len())
            .field("current", &self.current)
            .field("entities", &self.world.entity_count())
            .field("started", &self.started)
            .finish()
    }
}

impl PipelineController {
    /// Create the world and install every registered component type.
    pub fn new(registry: Arc<TypeRegistry>, mut pipelines: Vec<Pipeline>) -> Self {
        let mut world = World::new();
        registry.install_components(&mut world);
        for (key, pipeline) in pipelines.iter_mut().enumerate() {
            pipeline.set_clock_key(key);
        }
        Self {
            world,
            registry,
            pipelines,
            current: 0,
            clock: FixedStepScheduler::new(),
            services: Vec::new(),
            started: false,
        }
    }

    // -- startup ------------------------------------------------------------

    /// Hold [`poll_startup`](Self::poll_startup) until `service` is ready.
    pub fn require_service(&mut self, service: Arc<dyn Service>) {
        self.services.push(service);
    }

    /// Initialize every pipeline, switch them all off, instantiate each
    /// template node that is active or force-initialized, then switch to
    /// pipeline 0. Returns the entities created from templates.
    ///
    /// A failing template despawns every entity created by this call, so a
    /// retry starts from the same world. Pipelines initialized by an earlier
    /// attempt are not initialized again.
    pub fn start(&mut self, templates: &[EntityTemplate]) -> Result<Vec<EntityId>, StartupError> {
        for pipeline in &mut self.pipelines {
            if !pipeline.is_initialized() {
                pipeline.init(&mut self.world, &self.registry)?;
            }
        }
        for pipeline in &mut self.pipelines {
            pipeline.switch(&mut self.world, false, &mut self.clock);
        }

        let mut entities = Vec::new();
        for template in templates {
            if let Err(err) = template.init_for_startup(&mut self.world, &self.registry, &mut entities) {
                tracing::error!(template = %template.name, error = %err, "startup template failed");
                for entity in entities.drain(..).rev() {
                    if let Err(despawn) = self.world.despawn(entity) {
                        tracing::warn!(%entity, error = %despawn, "rollback despawn failed");
                    }
                }
                return Err(err.into());
            }
        }

        self.started = true;
        self.switch_pipeline(0);
        tracing::info!(
            pipelines = self.pipelines.len(),
            entities = entities.len(),
            "controller started"
        );
        Ok(entities)
    }

    /// Call once per simulation step. Waits, without timeout, until every
    /// required service is ready, then runs [`start`](Self::start).
    pub fn poll_startup(&mut self, templates: &[EntityTemplate]) -> Result<StartupStatus, StartupError> {
        if self.started {
            return Ok(StartupStatus::Running);
        }
        if let Some(pending) = self.services.iter().find(|s| !s.is_ready()) {
            tracing::debug!(service = pending.name(), "waiting for service");
            return Ok(StartupStatus::Waiting);
        }
        self.start(templates).map(StartupStatus::Started)
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    // -- pipeline selection -------------------------------------------------

    /// Switch every other pipeline off, then `idx` on. Out of range: logged,
    /// nothing changes, returns `false`.
    pub fn switch_pipeline(&mut self, idx: usize) -> bool {
        if idx >= self.pipelines.len() {
            tracing::error!(idx, pipelines = self.pipelines.len(), "pipeline index out of range");
            return false;
        }
        for (i, pipeline) in self.pipelines.iter_mut().enumerate() {
            if i != idx {
                pipeline.switch(&mut self.world, false, &mut self.clock);
            }
        }
        self.pipelines[idx].switch(&mut self.world, true, &mut self.clock);
        self.current = idx;
        self.dispatch_events();
        true
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_pipeline(&self) -> Option<&Pipeline> {
        self.pipelines.get(self.current)
    }

    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    /// Mutable access for toggling individual systems.
    pub fn pipeline_mut(&mut self, idx: usize) -> Option<&mut Pipeline> {
        self.pipelines.get_mut(idx)
    }

    // -- pause --------------------------------------------------------------

    pub fn pause(&mut self) {
        if let Some(pipeline) = self.pipelines.get_mut(self.current) {
            pipeline.pause(&mut self.world);
        }
    }

    pub fn unpause(&mut self) {
        if let Some(pipeline) = self.pipelines.get_mut(self.current) {
            pipeline.unpause(&mut self.world, &mut self.clock);
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.is_paused() {
            self.unpause();
        } else {
            self.pause();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.current_pipeline().is_some_and(Pipeline::is_paused)
    }

    // -- entities -----------------------------------------------------------

    /// Spawn an entity carrying `component`.
    pub fn create_entity_with_component<T: Component>(&mut self, component: T) -> Result<EntityId, EcsError> {
        self.world.spawn_with(component)
    }

    /// Run the current pipeline's init systems again.
    pub fn rerun_init(&mut self) {
        if let Some(pipeline) = self.pipelines.get_mut(self.current) {
            pipeline.run_init_systems(&mut self.world);
        }
    }

    /// Assemble `template` and its active descendants.
    pub fn instantiate(&mut self, template: &EntityTemplate) -> Result<Vec<EntityId>, AssemblyError> {
        template.init_with_children(&mut self.world, &self.registry)
    }

    pub fn instantiate_preset(&mut self, library: &PresetLibrary, name: &str) -> Result<EntityId, AssemblyError> {
        library.instantiate(&mut self.world, &self.registry, name)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    // -- frame hooks --------------------------------------------------------

    pub fn update(&mut self) {
        if let Some(pipeline) = self.pipelines.get_mut(self.current) {
            pipeline.update(&mut self.world);
        }
        self.dispatch_events();
    }

    pub fn late_update(&mut self) {
        if let Some(pipeline) = self.pipelines.get_mut(self.current) {
            pipeline.late_update(&mut self.world);
        }
        self.dispatch_events();
    }

    /// Tick `FixedUpdate`, then fire the fixed-step boundary that drives the
    /// late-fixed-update loops.
    pub fn fixed_update(&mut self) {
        if let Some(pipeline) = self.pipelines.get_mut(self.current) {
            pipeline.fixed_update(&mut self.world);
        }
        let pipelines = &mut self.pipelines;
        let world = &mut self.world;
        self.clock.run_boundary(|key| {
            pipelines
                .get_mut(key)
                .is_some_and(|pipeline| pipeline.late_fixed_step(world))
        });
        self.dispatch_events();
    }

    /// Fixed-step boundaries fired so far.
    pub fn fixed_boundaries(&self) -> u64 {
        self.clock.boundaries()
    }

    fn dispatch_events(&mut self) {
        let events = self.world.drain_events();
        if events.is_empty() {
            return;
        }
        if let Some(pipeline) = self.pipelines.get_mut(self.current) {
            pipeline.dispatch_events(&mut self.world, &events);
        }
    }
}

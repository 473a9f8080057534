//! End-to-end: JSON config to running controller, driven frame by frame.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tessera_engine::prelude::*;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Position(f64);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Velocity(f64);

/// Integrates velocity once per fixed step, through a filter registered at
/// construction.
struct Integrate {
    moving: FilterId,
    dt: f64,
}

impl FromWorld for Integrate {
    fn from_world(world: &mut World) -> Self {
        // The controller installs registered components before building systems.
        let mask = world
            .mask_of::<(Position, Velocity)>()
            .expect("position and velocity are registered");
        Self {
            moving: world.register_filter(mask),
            dt: 0.5,
        }
    }
}

impl System for Integrate {
    fn tick(&mut self, world: &mut World) {
        let Ok(entities) = world.filter_entities(self.moving) else {
            return;
        };
        for entity in entities {
            let Some(v) = world.get_component::<Velocity>(entity).map(|v| v.0) else {
                continue;
            };
            if let Some(p) = world.get_component_mut::<Position>(entity) {
                p.0 += v * self.dt;
            }
        }
    }
}

/// Records the frame phase it is scheduled in.
struct Phase {
    label: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl System for Phase {
    fn tick(&mut self, _world: &mut World) {
        self.log.lock().unwrap().push(self.label);
    }
}

const CONFIG: &str = r#"{
    "tick": { "fixed_dt": 0.5, "max_fixed_steps_per_frame": 4 },
    "pipelines": [
        {
            "name": "gameplay",
            "schedule": {
                "Update": [{ "name": "update_phase" }],
                "LateUpdate": [{ "name": "late_phase" }],
                "FixedUpdate": [{ "name": "integrate" }, { "name": "fixed_phase" }],
                "LateFixedUpdate": [{ "name": "late_fixed_phase" }]
            }
        },
        { "name": "menu" }
    ]
}"#;

fn registry(log: &Arc<Mutex<Vec<&'static str>>>) -> Arc<TypeRegistry> {
    let mut builder = TypeRegistry::builder()
        .system::<Integrate>("integrate", SystemCategories::FIXED_UPDATE)
        .component_with_schema::<Position>("position", Vec::new())
        .component_with_schema::<Velocity>("velocity", Vec::new());
    let phases = [
        ("update_phase", SystemCategories::UPDATE),
        ("late_phase", SystemCategories::LATE_UPDATE),
        ("fixed_phase", SystemCategories::FIXED_UPDATE),
        ("late_fixed_phase", SystemCategories::LATE_FIXED_UPDATE),
    ];
    for (label, categories) in phases {
        let log = log.clone();
        builder = builder.system_with(label, categories, move |_| Phase { label, log: log.clone() });
    }
    builder.build()
}

fn setup() -> (PipelineController, FrameDriver, Arc<Mutex<Vec<&'static str>>>) {
    let log = Arc::default();
    let registry = registry(&log);
    let config = EngineConfig::from_json_str(CONFIG).unwrap();
    config.validate(&registry).unwrap();
    let driver = FrameDriver::new(config.tick);
    let mut controller = PipelineController::new(registry, config.into_pipelines());
    controller.start(&[]).unwrap();
    (controller, driver, log)
}

#[test]
fn frame_runs_phases_in_order() {
    let (mut controller, mut driver, log) = setup();
    let diagnostics = driver.advance(&mut controller, 1.0);
    assert_eq!(diagnostics.fixed_steps, 2);
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "update_phase",
            "late_phase",
            "fixed_phase",
            "late_fixed_phase",
            "fixed_phase",
            "late_fixed_phase",
        ]
    );
}

#[test]
fn systems_move_entities_each_fixed_step() {
    let (mut controller, mut driver, _log) = setup();
    let world = controller.world_mut();
    let mover = world.spawn();
    world.insert_component(mover, Position(0.0)).unwrap();
    world.insert_component(mover, Velocity(2.0)).unwrap();
    let idle = controller.create_entity_with_component(Position(5.0)).unwrap();

    driver.run_fixed_frames(&mut controller, 3);
    assert_eq!(driver.sim_time(), 1.5);
    assert_eq!(controller.world().get_component::<Position>(mover), Some(&Position(3.0)));
    assert_eq!(controller.world().get_component::<Position>(idle), Some(&Position(5.0)));
}

#[test]
fn switched_off_pipeline_stops_driving_frames() {
    let (mut controller, mut driver, log) = setup();
    assert!(controller.switch_pipeline(1));
    driver.advance(&mut controller, 1.0);
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(controller.current_pipeline().map(Pipeline::name), Some("menu"));

    assert!(controller.switch_pipeline(0));
    driver.advance(&mut controller, 0.5);
    assert_eq!(log.lock().unwrap().len(), 4);
}

#[test]
fn describe_entity_lists_components() {
    let (mut controller, _driver, _log) = setup();
    let e = controller.create_entity_with_component(Velocity(1.0)).unwrap();
    let text = controller.world().describe_entity(e);
    assert!(text.contains("velocity"), "{text}");
}

//! Headless bouncing-ball demo.
//!
//! A gameplay pipeline integrates gravity, detects floor contacts in the
//! late-fixed-update loop, and bounces balls from a reactive system fed by the
//! collision snapshots. Halfway through, the game pauses and switches to a
//! menu pipeline.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example headless_demo -p tessera-engine

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tessera_engine::prelude::*;

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Ball {
    position: Vec3,
    velocity: Vec3,
    bounciness: f32,
}

impl DescribeFields for Ball {
    fn describe_fields() -> Vec<FieldSchema> {
        vec![
            FieldSchema::new("position", FieldKind::Vector3),
            FieldSchema::new("velocity", FieldKind::Vector3),
            FieldSchema::new("bounciness", FieldKind::Float),
        ]
    }
}

const FIXED_DT: f32 = 1.0 / 60.0;
const FLOOR: ObjectHandle = ObjectHandle(1);

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

struct Gravity {
    balls: FilterId,
}

impl FromWorld for Gravity {
    fn from_world(world: &mut World) -> Self {
        let mask = world.mask_of::<(Ball,)>().expect("ball is registered");
        Self {
            balls: world.register_filter(mask),
        }
    }
}

impl System for Gravity {
    fn tick(&mut self, world: &mut World) {
        for entity in world.filter_entities(self.balls).unwrap_or_default() {
            if let Some(ball) = world.get_component_mut::<Ball>(entity) {
                ball.velocity.y -= 9.81 * FIXED_DT;
                ball.position += ball.velocity * FIXED_DT;
            }
        }
    }
}

/// Reports floor contacts as collision events.
struct FloorContacts {
    balls: FilterId,
}

impl FromWorld for FloorContacts {
    fn from_world(world: &mut World) -> Self {
        let mask = world.mask_of::<(Ball,)>().expect("ball is registered");
        Self {
            balls: world.register_filter(mask),
        }
    }
}

impl System for FloorContacts {
    fn tick(&mut self, world: &mut World) {
        for entity in world.filter_entities(self.balls).unwrap_or_default() {
            let Some(ball) = world.get_component::<Ball>(entity) else {
                continue;
            };
            if ball.position.y > 0.0 || ball.velocity.y >= 0.0 {
                continue;
            }
            let point = Vec3::new(ball.position.x, 0.0, ball.position.z);
            let result = on_collision_enter(
                world,
                &Participant::new(Some(entity), ObjectHandle(entity.to_raw())),
                &Participant::new(None, FLOOR),
                &Contact { point, normal: Vec3::Y },
            );
            if let Err(err) = result {
                tracing::warn!(%entity, error = %err, "floor contact not recorded");
            }
        }
    }
}

/// Bounces a ball whenever its collision snapshot is written.
struct Bounce {
    subscriptions: Vec<Subscription>,
}

impl FromWorld for Bounce {
    fn from_world(world: &mut World) -> Self {
        let subscriptions = [ChangeKind::Added, ChangeKind::Changed]
            .into_iter()
            .filter_map(|kind| Subscription::to::<CollisionEnter>(world, kind))
            .collect();
        Self { subscriptions }
    }
}

impl System for Bounce {
    fn tick(&mut self, _world: &mut World) {}

    fn subscriptions(&self) -> Vec<Subscription> {
        self.subscriptions.clone()
    }

    fn react(&mut self, world: &mut World, event: &ComponentEvent) {
        let Some(normal) = world.get_component::<CollisionEnter>(event.entity).map(|c| c.normal) else {
            return;
        };
        if let Some(ball) = world.get_component_mut::<Ball>(event.entity) {
            let v = ball.velocity;
            ball.velocity = (v - 2.0 * v.dot(normal) * normal) * ball.bounciness;
            ball.position.y = 0.0;
            tracing::info!(entity = %event.entity, speed = ball.velocity.length(), "bounce");
        }
    }
}

#[derive(Default)]
struct MenuIdle;

impl System for MenuIdle {
    fn tick(&mut self, _world: &mut World) {
        tracing::trace!("menu idle");
    }
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

const CONFIG: &str = r#"{
    "tick": { "fixed_dt": 0.016666666666666666 },
    "pipelines": [
        {
            "name": "gameplay",
            "schedule": {
                "FixedUpdate": [{ "name": "gravity" }],
                "LateFixedUpdate": [{ "name": "floor_contacts" }],
                "Reactive": [{ "name": "bounce" }]
            }
        },
        {
            "name": "menu",
            "schedule": { "Update": [{ "name": "menu_idle", "non_pausable": true }] }
        }
    ]
}"#;

const SCENE: &str = r#"[
    {
        "name": "balls",
        "descriptor": [],
        "children": [
            { "name": "red", "descriptor": [{ "component": "ball", "fields": [
                { "kind": "Vector3", "name": "position", "text": "0 2 0" },
                { "kind": "Float", "name": "bounciness", "text": "0.8" }
            ]}, { "component": "override_collision" }] },
            { "name": "blue", "descriptor": [{ "component": "ball", "fields": [
                { "kind": "Vector3", "name": "position", "text": "1 4 0" },
                { "kind": "Vector3", "name": "velocity", "text": "0.5 0 0" },
                { "kind": "Float", "name": "bounciness", "text": "0.6" }
            ]}, { "component": "override_collision" }] },
            { "name": "spare", "active": false, "descriptor": [{ "component": "ball" }] }
        ]
    }
]"#;

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let registry = register_collision_components(TypeRegistry::builder())
        .system::<Gravity>("gravity", SystemCategories::FIXED_UPDATE)
        .system::<FloorContacts>("floor_contacts", SystemCategories::LATE_FIXED_UPDATE)
        .system::<Bounce>("bounce", SystemCategories::REACTIVE)
        .system::<MenuIdle>("menu_idle", SystemCategories::UPDATE)
        .component::<Ball>("ball")
        .build();

    let config = EngineConfig::from_json_str(CONFIG)?;
    config.validate(&registry)?;
    let scene: Vec<EntityTemplate> = serde_json::from_str(SCENE)?;

    let mut driver = FrameDriver::new(config.tick);
    let mut controller = PipelineController::new(registry, config.into_pipelines());
    let balls = controller.start(&scene)?;
    tracing::info!(entities = balls.len(), "scene loaded");

    let dt = driver.config().fixed_dt;
    for frame in 0..240u32 {
        driver.advance(&mut controller, dt);
        if frame == 120 {
            controller.toggle_pause();
            tracing::info!(paused = controller.is_paused(), "game paused");
        }
        if frame == 180 {
            controller.switch_pipeline(1);
        }
    }

    for entity in &balls {
        println!("{}", controller.world().describe_entity(*entity));
    }
    println!(
        "frames: {}, fixed steps: {}, sim time: {:.2}s",
        driver.frame_count(),
        driver.fixed_step_count(),
        driver.sim_time()
    );
    Ok(())
}

//! Scheduling behaviour of pipelines and the controller: category isolation,
//! pause gating, activation idempotence, and pipeline switch exclusivity.

use std::sync::{Arc, Mutex};

use tessera_engine::prelude::*;

// ---------------------------------------------------------------------------
// Recording systems
// ---------------------------------------------------------------------------

type Log = Arc<Mutex<Vec<String>>>;

/// Appends `"<label>:<hook>"` to a shared log on every call.
struct Recorder {
    label: String,
    log: Log,
}

impl Recorder {
    fn push(&self, hook: &str) {
        self.log.lock().unwrap().push(format!("{}:{hook}", self.label));
    }
}

impl System for Recorder {
    fn init(&mut self, _world: &mut World) {
        self.push("init");
    }

    fn tick(&mut self, _world: &mut World) {
        self.push("tick");
    }
}

const LABELS: [&str; 7] = [
    "init",
    "update",
    "late_update",
    "fixed",
    "late_fixed",
    "on_enable",
    "on_disable",
];

fn registry(log: &Log) -> Arc<TypeRegistry> {
    let mut builder = TypeRegistry::builder();
    for label in LABELS {
        for suffix in ["", "_np"] {
            let name = format!("{label}{suffix}");
            let log = log.clone();
            let system_label = name.clone();
            builder = builder.system_with(&name, SystemCategories::all(), move |_| Recorder {
                label: system_label.clone(),
                log: log.clone(),
            });
        }
    }
    builder.build()
}

/// One recorder per category, each named after its category.
fn full_schedule() -> SystemSchedule {
    SystemSchedule::new()
        .with(SystemCategory::Init, SystemEntry::new("init"))
        .with(SystemCategory::Update, SystemEntry::new("update"))
        .with(SystemCategory::LateUpdate, SystemEntry::new("late_update"))
        .with(SystemCategory::FixedUpdate, SystemEntry::new("fixed"))
        .with(SystemCategory::LateFixedUpdate, SystemEntry::new("late_fixed"))
        .with(SystemCategory::OnEnable, SystemEntry::new("on_enable"))
        .with(SystemCategory::OnDisable, SystemEntry::new("on_disable"))
}

fn take(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.lock().unwrap())
}

fn ticks(log: &[String]) -> Vec<&str> {
    log.iter()
        .filter_map(|line| line.strip_suffix(":tick"))
        .collect()
}

fn started(log: &Log, schedules: Vec<SystemSchedule>) -> PipelineController {
    let pipelines = schedules
        .into_iter()
        .enumerate()
        .map(|(i, schedule)| Pipeline::new(format!("p{i}"), schedule))
        .collect();
    let mut controller = PipelineController::new(registry(log), pipelines);
    controller.start(&[]).unwrap();
    take(log);
    controller
}

// -- 1. category isolation ---------------------------------------------------

#[test]
fn each_hook_ticks_only_its_category() {
    let log = Log::default();
    let mut c = started(&log, vec![full_schedule()]);

    c.update();
    assert_eq!(ticks(&take(&log)), vec!["update"]);
    c.late_update();
    assert_eq!(ticks(&take(&log)), vec!["late_update"]);
    c.fixed_update();
    assert_eq!(ticks(&take(&log)), vec!["fixed", "late_fixed"]);
}

#[test]
fn activation_runs_init_tick_then_init_hooks() {
    let log = Log::default();
    let mut pipeline = Pipeline::new("main", full_schedule());
    let mut world = World::new();
    let mut clock = FixedStepScheduler::new();
    pipeline.init(&mut world, &registry(&log)).unwrap();
    pipeline.switch(&mut world, true, &mut clock);

    let lines = take(&log);
    assert_eq!(lines[0], "init:tick");
    // Every category's entry has its init hook run once, in category order.
    let hooks: Vec<&str> = lines[1..]
        .iter()
        .filter_map(|l| l.strip_suffix(":init"))
        .collect();
    assert_eq!(
        hooks,
        vec!["init", "update", "late_update", "fixed", "late_fixed", "on_enable", "on_disable"]
    );
    assert_eq!(lines.len(), 8);
}

#[test]
fn entries_tick_in_schedule_order() {
    let log = Log::default();
    let schedule = SystemSchedule::new()
        .with(SystemCategory::Update, SystemEntry::new("late_update"))
        .with(SystemCategory::Update, SystemEntry::new("update"))
        .with(SystemCategory::Update, SystemEntry::new("fixed"));
    let mut c = started(&log, vec![schedule]);
    c.update();
    assert_eq!(ticks(&take(&log)), vec!["late_update", "update", "fixed"]);
}

// -- 2. pause gating -----------------------------------------------------------

#[test]
fn paused_pipeline_ticks_only_non_pausable_entries() {
    let log = Log::default();
    let schedule = SystemSchedule::new()
        .with(SystemCategory::Update, SystemEntry::new("update"))
        .with(SystemCategory::Update, SystemEntry::new("update_np").non_pausable())
        .with(SystemCategory::OnDisable, SystemEntry::new("on_disable"))
        .with(SystemCategory::OnEnable, SystemEntry::new("on_enable"));
    let mut c = started(&log, vec![schedule]);

    c.pause();
    assert_eq!(ticks(&take(&log)), vec!["on_disable"], "OnDisable is forced on pause");
    c.update();
    assert_eq!(ticks(&take(&log)), vec!["update_np"]);

    c.unpause();
    c.update();
    assert_eq!(ticks(&take(&log)), vec!["on_enable", "update", "update_np"]);
}

#[test]
fn pause_stops_the_late_fixed_loop() {
    let log = Log::default();
    let schedule = SystemSchedule::new()
        .with(SystemCategory::LateFixedUpdate, SystemEntry::new("late_fixed_np").non_pausable());
    let mut c = started(&log, vec![schedule]);

    c.fixed_update();
    assert_eq!(ticks(&take(&log)), vec!["late_fixed_np"]);
    c.pause();
    c.fixed_update();
    assert!(ticks(&take(&log)).is_empty(), "loop cancelled even for non-pausable entries");
    c.unpause();
    c.fixed_update();
    assert_eq!(ticks(&take(&log)), vec!["late_fixed_np"]);
}

// -- 3. activation idempotence -------------------------------------------------

#[test]
fn repeated_pause_and_unpause_run_hooks_once() {
    let log = Log::default();
    let mut c = started(&log, vec![full_schedule()]);

    c.pause();
    c.pause();
    assert_eq!(ticks(&take(&log)), vec!["on_disable"]);
    c.unpause();
    c.unpause();
    assert_eq!(ticks(&take(&log)), vec!["on_enable"]);
}

#[test]
fn switching_off_twice_runs_on_disable_once() {
    let log = Log::default();
    let mut pipeline = Pipeline::new("main", full_schedule());
    let mut world = World::new();
    let mut clock = FixedStepScheduler::new();
    pipeline.init(&mut world, &registry(&log)).unwrap();
    pipeline.switch(&mut world, true, &mut clock);
    take(&log);

    pipeline.switch(&mut world, false, &mut clock);
    pipeline.switch(&mut world, false, &mut clock);
    assert_eq!(ticks(&take(&log)), vec!["on_disable"]);
    pipeline.update(&mut world);
    assert!(take(&log).is_empty());
}

#[test]
fn switch_system_toggles_without_removal() {
    let log = Log::default();
    let schedule = SystemSchedule::new().with(SystemCategory::Update, SystemEntry::new("update"));
    let mut c = started(&log, vec![schedule]);

    let pipeline = c.pipeline_mut(0).unwrap();
    assert!(pipeline.switch_system::<Recorder>(SystemCategory::Update, false));
    assert!(!pipeline.switch_system::<Recorder>(SystemCategory::LateUpdate, false));
    assert_eq!(pipeline.system_count(SystemCategory::Update), 1);
    c.update();
    assert!(take(&log).is_empty());

    c.pipeline_mut(0).unwrap().switch_system::<Recorder>(SystemCategory::Update, true);
    c.update();
    assert_eq!(ticks(&take(&log)), vec!["update"]);
}

#[test]
fn inactive_entries_skip_init_hooks() {
    let log = Log::default();
    let schedule = SystemSchedule::new()
        .with(SystemCategory::Update, SystemEntry::new("update").inactive());
    let mut c = started(&log, vec![schedule]);
    c.rerun_init();
    assert!(take(&log).is_empty());
}

// -- 7. switch exclusivity ---------------------------------------------------

#[test]
fn switching_pipelines_leaves_exactly_one_active() {
    let log = Log::default();
    let second = SystemSchedule::new()
        .with(SystemCategory::Update, SystemEntry::new("update_np"))
        .with(SystemCategory::OnDisable, SystemEntry::new("on_disable_np"));
    let mut c = started(&log, vec![full_schedule(), second, SystemSchedule::new()]);

    assert!(c.switch_pipeline(1));
    let lines = take(&log);
    assert_eq!(ticks(&lines), vec!["on_disable"], "previous OnDisable ticked once");
    assert!(lines.contains(&"update_np:init".to_owned()));
    let active: Vec<bool> = c.pipelines().iter().map(Pipeline::is_active).collect();
    assert_eq!(active, vec![false, true, false]);

    c.update();
    assert_eq!(ticks(&take(&log)), vec!["update_np"]);

    assert!(c.switch_pipeline(2));
    assert_eq!(ticks(&take(&log)), vec!["on_disable_np"]);
    assert_eq!(c.pipelines().iter().filter(|p| p.is_active()).count(), 1);
}

#[test]
fn switch_away_from_paused_pipeline_skips_on_disable() {
    let log = Log::default();
    let mut c = started(&log, vec![full_schedule(), SystemSchedule::new()]);
    c.pause();
    take(&log);
    assert!(c.switch_pipeline(1));
    assert!(ticks(&take(&log)).is_empty());
}

#[test]
fn paused_pipeline_switched_back_keeps_late_fixed_loop_stopped() {
    let log = Log::default();
    let schedule = SystemSchedule::new()
        .with(SystemCategory::LateFixedUpdate, SystemEntry::new("late_fixed_np").non_pausable());
    let mut c = started(&log, vec![schedule, SystemSchedule::new()]);

    c.pause();
    assert!(c.switch_pipeline(1));
    assert!(c.switch_pipeline(0));
    take(&log);
    c.fixed_update();
    assert!(ticks(&take(&log)).is_empty(), "still paused after switching back");

    c.unpause();
    c.fixed_update();
    assert_eq!(ticks(&take(&log)), vec!["late_fixed_np"]);
}

//! Property tests for schedule editing and tick order.
//!
//! Random add/remove/move/toggle sequences are applied to a schedule and to a
//! plain list model; the pipeline built from the result must tick exactly the
//! active entries, in model order.

use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use tessera_engine::prelude::*;

const NAMES: [&str; 6] = ["a", "b", "c", "d", "e", "f"];

#[derive(Debug, Clone)]
enum EditOp {
    Add(usize),
    Remove(usize),
    Move(usize, bool),
    SetActive(usize, bool),
}

fn edit_op_strategy() -> impl Strategy<Value = EditOp> {
    prop_oneof![
        (0..NAMES.len()).prop_map(EditOp::Add),
        (0..8usize).prop_map(EditOp::Remove),
        (0..8usize, any::<bool>()).prop_map(|(i, up)| EditOp::Move(i, up)),
        (0..8usize, any::<bool>()).prop_map(|(i, on)| EditOp::SetActive(i, on)),
    ]
}

struct Named {
    name: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl System for Named {
    fn tick(&mut self, _world: &mut World) {
        self.log.lock().unwrap().push(self.name);
    }
}

fn registry(log: &Arc<Mutex<Vec<&'static str>>>) -> Arc<TypeRegistry> {
    let mut builder = TypeRegistry::builder();
    for name in NAMES {
        let log = log.clone();
        builder = builder.system_with(name, SystemCategories::UPDATE, move |_| Named { name, log: log.clone() });
    }
    builder.build()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn edits_match_model_and_drive_tick_order(ops in prop::collection::vec(edit_op_strategy(), 1..40)) {
        let mut schedule = SystemSchedule::new();
        let mut model: Vec<(&'static str, bool)> = Vec::new();

        for op in ops {
            match op {
                EditOp::Add(n) => {
                    let name = NAMES[n];
                    let fresh = !model.iter().any(|(m, _)| *m == name);
                    prop_assert_eq!(schedule.add_system(SystemCategory::Update, name), fresh);
                    if fresh {
                        model.push((name, true));
                    }
                }
                EditOp::Remove(i) => {
                    let removed = schedule.remove_at(SystemCategory::Update, i);
                    prop_assert_eq!(removed.is_some(), i < model.len());
                    if i < model.len() {
                        model.remove(i);
                    }
                }
                EditOp::Move(i, up) => {
                    let direction = if up { MoveDirection::Up } else { MoveDirection::Down };
                    let target = if up { i.checked_sub(1) } else { Some(i + 1) };
                    let valid = matches!(target, Some(t) if i < model.len() && t < model.len());
                    prop_assert_eq!(schedule.move_entry(SystemCategory::Update, i, direction), valid);
                    if let (true, Some(t)) = (valid, target) {
                        model.swap(i, t);
                    }
                }
                EditOp::SetActive(i, on) => {
                    prop_assert_eq!(schedule.set_active(SystemCategory::Update, i, on), i < model.len());
                    if let Some(entry) = model.get_mut(i) {
                        entry.1 = on;
                    }
                }
            }

            let entries: Vec<(&str, bool)> = schedule
                .entries(SystemCategory::Update)
                .iter()
                .map(|e| (e.name.as_str(), e.active))
                .collect();
            let expected: Vec<(&str, bool)> = model.iter().map(|&(n, a)| (n, a)).collect();
            prop_assert_eq!(entries, expected);
        }

        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = registry(&log);
        let mut world = World::new();
        let mut clock = FixedStepScheduler::new();
        let mut pipeline = Pipeline::new("prop", schedule);
        pipeline.init(&mut world, &registry).unwrap();
        pipeline.switch(&mut world, true, &mut clock);
        prop_assert_eq!(pipeline.system_count(SystemCategory::Update), model.len());

        pipeline.update(&mut world);
        let expected: Vec<&str> = model.iter().filter(|(_, a)| *a).map(|(n, _)| *n).collect();
        prop_assert_eq!(log.lock().unwrap().clone(), expected);
    }
}

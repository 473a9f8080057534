//! Engine configuration: clock settings and pipeline schedules, loadable from
//! JSON.
//!
//! ```
//! use tessera_engine::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{
//!     "tick": { "fixed_dt": 0.02 },
//!     "pipelines": [
//!         { "name": "gameplay", "schedule": { "Update": [{ "name": "input" }] } }
//!     ]
//! }"#).unwrap();
//! assert_eq!(config.tick.max_fixed_steps_per_frame, 8);
//! assert_eq!(config.pipelines[0].name, "gameplay");
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pipeline::Pipeline;
use crate::registry::TypeRegistry;
use crate::schedule::SystemSchedule;

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Fixed-step clock settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Seconds per fixed step. Must be positive and finite.
    pub fixed_dt: f64,
    /// Upper bound on fixed steps run in one frame; the rest of the
    /// accumulated time is discarded.
    pub max_fixed_steps_per_frame: u32,
}

impl Default for TickConfig {
    /// 60 Hz, at most 8 fixed steps per frame.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_fixed_steps_per_frame: 8,
        }
    }
}

impl TickConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fixed_dt > 0.0 && self.fixed_dt.is_finite()) {
            return Err(ConfigError::InvalidTick(format!(
                "fixed_dt must be positive and finite, got {}",
                self.fixed_dt
            )));
        }
        if self.max_fixed_steps_per_frame == 0 {
            return Err(ConfigError::InvalidTick(
                "max_fixed_steps_per_frame must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// A named pipeline and its schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    #[serde(default)]
    pub schedule: SystemSchedule,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub tick: TickConfig,
    #[serde(default)]
    pub pipelines: Vec<PipelineConfig>,
}

impl EngineConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        tracing::info!(path = %path.display(), pipelines = config.pipelines.len(), "engine config loaded");
        Ok(config)
    }

    /// Check the clock settings and every schedule against `registry`.
    pub fn validate(&self, registry: &TypeRegistry) -> Result<(), ConfigError> {
        self.tick.validate()?;
        for pipeline in &self.pipelines {
            pipeline.schedule.validate(registry)?;
        }
        Ok(())
    }

    /// Uninitialized pipelines, in config order.
    pub fn into_pipelines(self) -> Vec<Pipeline> {
        self.pipelines
            .into_iter()
            .map(|p| Pipeline::new(p.name, p.schedule))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::{SystemCategories, SystemCategory, System};
    use tessera_ecs::prelude::World;

    #[derive(Default)]
    struct Input;
    impl System for Input {
        fn tick(&mut self, _world: &mut World) {}
    }

    #[test]
    fn default_config_is_60hz() {
        let config = TickConfig::default();
        assert!((config.fixed_dt - 1.0 / 60.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bad_tick_values_are_rejected() {
        for fixed_dt in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            let config = TickConfig { fixed_dt, ..Default::default() };
            assert!(matches!(config.validate(), Err(ConfigError::InvalidTick(_))), "{fixed_dt}");
        }
        let config = TickConfig { max_fixed_steps_per_frame: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_and_validates_pipelines() {
        let registry = TypeRegistry::builder()
            .system::<Input>("input", SystemCategories::UPDATE)
            .build();
        let config = EngineConfig::from_json_str(
            r#"{"pipelines": [
                {"name": "menu"},
                {"name": "game", "schedule": {"Update": [{"name": "input", "non_pausable": true}]}}
            ]}"#,
        )
        .unwrap();
        assert!(config.validate(&registry).is_ok());

        let pipelines = config.into_pipelines();
        assert_eq!(pipelines.len(), 2);
        assert_eq!(pipelines[1].name(), "game");
        assert!(pipelines[1].schedule().entries(SystemCategory::Update)[0].non_pausable);
    }

    #[test]
    fn unknown_system_fails_validation() {
        let registry = TypeRegistry::builder().build();
        let config =
            EngineConfig::from_json_str(r#"{"pipelines": [{"name": "game", "schedule": {"Update": [{"name": "x"}]}}]}"#)
                .unwrap();
        assert!(matches!(config.validate(&registry), Err(ConfigError::UnknownSystem { .. })));
    }

    #[test]
    fn malformed_json_and_missing_file() {
        assert!(matches!(EngineConfig::from_json_str("{"), Err(ConfigError::Json(_))));
        assert!(matches!(
            EngineConfig::load("/definitely/not/here.json"),
            Err(ConfigError::Io { .. })
        ));
    }
}

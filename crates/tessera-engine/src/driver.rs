//! Accumulator-based frame stepping over a [`PipelineController`].
//!
//! Each [`advance`](FrameDriver::advance) runs one frame in a fixed order:
//!
//! 1. `update`, then `late_update`;
//! 2. `fixed_update` zero or more times, once per whole `fixed_dt` in the
//!    accumulator, capped at `max_fixed_steps_per_frame`. Each fixed step
//!    fires its late-fixed-update boundary.
//!
//! Simulation time is `fixed_steps * fixed_dt`, computed by multiplication so
//! it does not drift.

use std::time::{Duration, Instant};

use crate::config::TickConfig;
use crate::controller::PipelineController;

/// Timing for the last frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameDiagnostics {
    /// Fixed steps run during the frame.
    pub fixed_steps: u32,
    /// Wall-clock time spent in the frame.
    pub wall_time: Duration,
}

#[derive(Debug)]
pub struct FrameDriver {
    config: TickConfig,
    accumulator: f64,
    frame_count: u64,
    fixed_steps: u64,
    last: FrameDiagnostics,
}

impl FrameDriver {
    /// # Panics
    ///
    /// Panics if `config` does not validate.
    pub fn new(config: TickConfig) -> Self {
        if let Err(err) = config.validate() {
            panic!("{err}");
        }
        Self {
            config,
            accumulator: 0.0,
            frame_count: 0,
            fixed_steps: 0,
            last: FrameDiagnostics::default(),
        }
    }

    /// Run one frame covering `dt` seconds of real time.
    pub fn advance(&mut self, controller: &mut PipelineController, dt: f64) -> FrameDiagnostics {
        let start = Instant::now();
        controller.update();
        controller.late_update();

        self.accumulator += dt.max(0.0);
        let mut steps = 0;
        while self.accumulator >= self.config.fixed_dt {
            if steps == self.config.max_fixed_steps_per_frame {
                tracing::warn!(
                    skipped = self.accumulator / self.config.fixed_dt,
                    "frame hit the fixed-step cap, dropping accumulated time"
                );
                self.accumulator = 0.0;
                break;
            }
            controller.fixed_update();
            self.accumulator -= self.config.fixed_dt;
            steps += 1;
        }

        self.frame_count += 1;
        self.fixed_steps += u64::from(steps);
        self.last = FrameDiagnostics {
            fixed_steps: steps,
            wall_time: start.elapsed(),
        };
        self.last
    }

    /// Run `frames` frames of exactly one fixed step each.
    pub fn run_fixed_frames(&mut self, controller: &mut PipelineController, frames: u64) {
        for _ in 0..frames {
            self.advance(controller, self.config.fixed_dt);
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn fixed_step_count(&self) -> u64 {
        self.fixed_steps
    }

    /// Seconds of simulated fixed-step time.
    pub fn sim_time(&self) -> f64 {
        self.fixed_steps as f64 * self.config.fixed_dt
    }

    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    pub fn last_diagnostics(&self) -> &FrameDiagnostics {
        &self.last
    }
}

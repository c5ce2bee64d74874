//! Ramping stage plan
//!
//! A stage ramps the live virtual-user count linearly from its predecessor's
//! target to its own over its duration. The plan is pure; the runner samples
//! it against the wall clock.

use stampede_config::domains::scenario::StageConfig;
use std::time::Duration;

/// Immutable ramp schedule for one run
#[derive(Debug, Clone)]
pub struct StagePlan {
    start_vus: u32,
    stages: Vec<StageConfig>,
}

impl StagePlan {
    pub fn new(start_vus: u32, stages: &[StageConfig]) -> Self {
        Self {
            start_vus,
            stages: stages.to_vec(),
        }
    }

    /// Sum of all stage durations
    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|stage| stage.duration).sum()
    }

    /// Highest virtual-user count the plan ever asks for
    pub fn peak(&self) -> u32 {
        self.stages
            .iter()
            .map(|stage| stage.target)
            .max()
            .unwrap_or(0)
            .max(self.start_vus)
    }

    /// Desired virtual-user count after `elapsed`, or `None` once the plan
    /// is over
    pub fn target_at(&self, elapsed: Duration) -> Option<u32> {
        let mut from = self.start_vus;
        let mut stage_start = Duration::ZERO;

        for stage in &self.stages {
            let stage_end = stage_start + stage.duration;
            if elapsed < stage_end {
                let progress =
                    (elapsed - stage_start).as_secs_f64() / stage.duration.as_secs_f64();
                let desired =
                    from as f64 + (stage.target as f64 - from as f64) * progress;
                return Some(desired.round() as u32);
            }
            from = stage.target;
            stage_start = stage_end;
        }

        None
    }
}

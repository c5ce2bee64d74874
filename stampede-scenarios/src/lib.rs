//! Virtual-user scenarios and the ramping runner
//!
//! A scenario scripts what one virtual user does per iteration against the
//! platform, pacing itself with think-time pauses. The runner plays a stage
//! plan that ramps the number of concurrently active users up and down, and
//! [`RunMetrics`] collects what happened for the final threshold check.

pub mod context;
pub mod errors;
pub mod metrics;
pub mod runner;
pub mod scenarios;
pub mod stages;
pub mod subjects;
pub mod thresholds;

mod actions;

#[cfg(test)]
mod testing;

// Re-export main types
pub use context::{real_sleeper, ClientFactory, VuContext};
pub use errors::{ScenarioError, ScenarioResult};
pub use metrics::{MetricsObserver, RunMetrics, RunSummary};
pub use runner::ScenarioRunner;
pub use scenarios::{build_scenario, Scenario, SCENARIO_NAMES};
pub use stages::StagePlan;
pub use subjects::{SeedSubject, SubjectPool};
pub use thresholds::{evaluate, ThresholdViolation};

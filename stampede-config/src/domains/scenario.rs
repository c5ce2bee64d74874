//! Scenario execution configuration
//!
//! Ramping stages and pass/fail thresholds for a load run. A stage ramps the
//! live virtual-user count linearly from its predecessor's target to its own
//! over its duration, k6-style.

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_ratio, Validatable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Scenario execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Virtual users alive at run start
    #[serde(default = "default_start_vus")]
    pub start_vus: u32,

    /// Ramping stages, applied in order
    #[serde(default = "default_stages")]
    pub stages: Vec<StageConfig>,

    /// Per-scenario stage replacements, keyed by scenario name
    #[serde(default = "default_overrides")]
    pub overrides: BTreeMap<String, Vec<StageConfig>>,

    /// How long finishing iterations may keep running after the last stage
    #[serde(with = "humantime_serde", default = "default_graceful_stop")]
    pub graceful_stop: Duration,

    /// Pause between scenario iterations, drawn uniformly from this range
    #[serde(default)]
    pub think_time: ThinkTimeConfig,

    /// Pass/fail thresholds evaluated at the end of the run
    #[serde(default)]
    pub thresholds: ThresholdsConfig,

    /// Environment-specific ids the scenarios act on
    #[serde(default)]
    pub targets: TargetsConfig,
}

impl ScenarioConfig {
    /// Stages for one scenario, falling back to the shared set
    pub fn stages_for(&self, scenario: &str) -> &[StageConfig] {
        self.overrides
            .get(scenario)
            .map(Vec::as_slice)
            .unwrap_or(&self.stages)
    }
}

/// One ramping stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Stage length
    #[serde(with = "humantime_serde")]
    pub duration: Duration,

    /// Virtual-user count to reach by the end of the stage
    pub target: u32,
}

/// Think-time range between iterations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThinkTimeConfig {
    #[serde(with = "humantime_serde", default = "default_think_min")]
    pub min: Duration,

    #[serde(with = "humantime_serde", default = "default_think_max")]
    pub max: Duration,
}

/// Ids the scenarios need from the environment under test
///
/// The timeline and quiz scenarios browse specific groups rather than the
/// subject's own feed, so the groups to hit are part of the run
/// configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetsConfig {
    /// Groups whose timelines the timeline scenario pages through
    pub timeline_group_ids: Vec<String>,

    /// Group whose timeline is searched for quizzes to answer
    pub quiz_group_id: Option<String>,

    /// Virtual-user ids skipped by the quiz scenario
    pub excluded_vus: Vec<u32>,
}

/// Run thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdsConfig {
    /// Maximum tolerated request failure rate
    #[serde(default = "default_max_error_rate")]
    pub max_error_rate: f64,

    /// 95th-percentile latency ceiling
    #[serde(with = "humantime_serde", default = "default_p95_latency")]
    pub p95_latency: Duration,

    /// Maximum tolerated server-down classifications
    #[serde(default = "default_count_threshold")]
    pub max_server_down: u64,

    /// Maximum tolerated request timeouts
    #[serde(default = "default_count_threshold")]
    pub max_request_timeout: u64,

    /// Maximum iterations that found no publishable audience
    #[serde(default = "default_count_threshold")]
    pub max_missing_audiences: u64,

    /// Maximum iterations that found no quiz to answer
    #[serde(default = "default_count_threshold")]
    pub max_missing_quizzes: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            start_vus: default_start_vus(),
            stages: default_stages(),
            overrides: default_overrides(),
            graceful_stop: default_graceful_stop(),
            think_time: ThinkTimeConfig::default(),
            thresholds: ThresholdsConfig::default(),
            targets: TargetsConfig::default(),
        }
    }
}

impl Default for ThinkTimeConfig {
    fn default() -> Self {
        Self {
            min: default_think_min(),
            max: default_think_max(),
        }
    }
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            max_error_rate: default_max_error_rate(),
            p95_latency: default_p95_latency(),
            max_server_down: default_count_threshold(),
            max_request_timeout: default_count_threshold(),
            max_missing_audiences: default_count_threshold(),
            max_missing_quizzes: default_count_threshold(),
        }
    }
}

impl Validatable for ScenarioConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.stages.is_empty() {
            return Err(self.validation_error("at least one stage must be configured"));
        }

        for (i, stage) in self.stages.iter().enumerate() {
            if stage.duration.is_zero() {
                return Err(
                    self.validation_error(format!("stage {} has zero duration", i))
                );
            }
        }

        for (name, stages) in &self.overrides {
            if stages.is_empty() {
                return Err(self.validation_error(format!(
                    "override for scenario '{}' has no stages",
                    name
                )));
            }
            for (i, stage) in stages.iter().enumerate() {
                if stage.duration.is_zero() {
                    return Err(self.validation_error(format!(
                        "override for scenario '{}' stage {} has zero duration",
                        name, i
                    )));
                }
            }
        }

        if self.think_time.min > self.think_time.max {
            return Err(self.validation_error(format!(
                "think_time.min ({:?}) exceeds think_time.max ({:?})",
                self.think_time.min, self.think_time.max
            )));
        }

        validate_ratio(
            self.thresholds.max_error_rate,
            "thresholds.max_error_rate",
            self.domain_name(),
        )?;
        validate_positive(
            self.thresholds.p95_latency.as_millis(),
            "thresholds.p95_latency",
            self.domain_name(),
        )?;

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "scenario"
    }
}

// Default value functions
fn default_start_vus() -> u32 {
    1
}

fn default_stages() -> Vec<StageConfig> {
    vec![
        StageConfig {
            duration: Duration::from_secs(5 * 60),
            target: 100,
        },
        StageConfig {
            duration: Duration::from_secs(5 * 60),
            target: 500,
        },
        StageConfig {
            duration: Duration::from_secs(10 * 60),
            target: 1000,
        },
        StageConfig {
            duration: Duration::from_secs(5 * 60),
            target: 1000,
        },
        StageConfig {
            duration: Duration::from_secs(15 * 60),
            target: 800,
        },
    ]
}

// The write-heavy scenarios ramp to a tenth of the browse load
fn default_overrides() -> BTreeMap<String, Vec<StageConfig>> {
    let light = vec![
        StageConfig {
            duration: Duration::from_secs(5 * 60),
            target: 10,
        },
        StageConfig {
            duration: Duration::from_secs(5 * 60),
            target: 50,
        },
        StageConfig {
            duration: Duration::from_secs(10 * 60),
            target: 100,
        },
        StageConfig {
            duration: Duration::from_secs(5 * 60),
            target: 100,
        },
        StageConfig {
            duration: Duration::from_secs(15 * 60),
            target: 80,
        },
    ];

    let mut overrides = BTreeMap::new();
    overrides.insert("publish-content".to_string(), light.clone());
    overrides.insert("join-leave-group".to_string(), light);
    overrides
}

fn default_graceful_stop() -> Duration {
    Duration::from_secs(30)
}

fn default_think_min() -> Duration {
    Duration::from_secs(1)
}

fn default_think_max() -> Duration {
    Duration::from_secs(5)
}

fn default_max_error_rate() -> f64 {
    0.01
}

fn default_p95_latency() -> Duration {
    Duration::from_secs(1)
}

fn default_count_threshold() -> u64 {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_config_defaults() {
        let config = ScenarioConfig::default();
        assert_eq!(config.start_vus, 1);
        assert_eq!(config.stages.len(), 5);
        assert_eq!(config.stages[2].target, 1000);
        assert_eq!(config.thresholds.max_error_rate, 0.01);
        assert_eq!(config.graceful_stop, Duration::from_secs(30));
        assert!(config.targets.timeline_group_ids.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_stages_for_falls_back_to_shared_set() {
        let config = ScenarioConfig::default();
        assert_eq!(config.stages_for("newsfeed").len(), 5);
        assert_eq!(config.stages_for("newsfeed")[2].target, 1000);
        // The write-heavy scenarios carry their own ramp
        assert_eq!(config.stages_for("publish-content")[2].target, 100);
        assert_eq!(config.stages_for("join-leave-group")[4].target, 80);
    }

    #[test]
    fn test_scenario_config_stage_parsing() {
        let yaml = r#"
stages:
  - duration: 30s
    target: 10
  - duration: 2m
    target: 0
"#;
        let config: ScenarioConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.stages.len(), 2);
        assert_eq!(config.stages[0].duration, Duration::from_secs(30));
        assert_eq!(config.stages[1].duration, Duration::from_secs(120));
    }

    #[test]
    fn test_scenario_config_validation() {
        let mut config = ScenarioConfig::default();
        config.stages.clear();
        assert!(config.validate().is_err());

        config = ScenarioConfig::default();
        config.think_time.min = Duration::from_secs(10);
        config.think_time.max = Duration::from_secs(1);
        assert!(config.validate().is_err());

        config = ScenarioConfig::default();
        config.thresholds.max_error_rate = 1.5;
        assert!(config.validate().is_err());

        config = ScenarioConfig::default();
        config.overrides.insert("broken".to_string(), vec![]);
        assert!(config.validate().is_err());
    }
}

//! Virtual-user scenarios
//!
//! Each scenario plays one behaviour pattern through a [`VuContext`]: feed
//! browsing, group churn, content publishing or quiz taking. The registry
//! maps configured scenario names to instances; anything a scenario needs
//! beyond the context comes out of [`ScenarioConfig`] at build time.

mod answer_quiz;
mod filter_newsfeed;
mod join_leave_group;
mod newsfeed;
mod publish_content;
mod timeline;

use std::sync::Arc;

use async_trait::async_trait;
use stampede_config::ScenarioConfig;

use crate::context::VuContext;
use crate::errors::{ScenarioError, ScenarioResult};

pub use answer_quiz::AnswerQuizScenario;
pub use filter_newsfeed::FilterNewsfeedScenario;
pub use join_leave_group::JoinLeaveGroupScenario;
pub use newsfeed::NewsfeedScenario;
pub use publish_content::PublishContentScenario;
pub use timeline::TimelineScenario;

/// One repeatable virtual-user behaviour
#[async_trait]
pub trait Scenario: Send + Sync {
    /// Name the scenario is configured and reported under
    fn name(&self) -> &'static str;

    /// One full iteration for one virtual user
    async fn run(&self, ctx: &VuContext) -> ScenarioResult<()>;
}

/// Scenario names the registry can build
pub const SCENARIO_NAMES: [&str; 6] = [
    "newsfeed",
    "filter-newsfeed",
    "timeline",
    "publish-content",
    "join-leave-group",
    "answer-quiz",
];

/// Build the named scenario from the run configuration
pub fn build_scenario(name: &str, config: &ScenarioConfig) -> ScenarioResult<Arc<dyn Scenario>> {
    match name {
        "newsfeed" => Ok(Arc::new(NewsfeedScenario)),
        "filter-newsfeed" => Ok(Arc::new(FilterNewsfeedScenario)),
        "timeline" => {
            if config.targets.timeline_group_ids.is_empty() {
                return Err(ScenarioError::MissingTarget {
                    scenario: "timeline",
                    what: "at least one timeline group id",
                });
            }
            Ok(Arc::new(TimelineScenario::new(
                config.targets.timeline_group_ids.clone(),
            )))
        }
        "publish-content" => Ok(Arc::new(PublishContentScenario)),
        "join-leave-group" => Ok(Arc::new(JoinLeaveGroupScenario)),
        "answer-quiz" => {
            let group_id = config.targets.quiz_group_id.clone().ok_or(
                ScenarioError::MissingTarget {
                    scenario: "answer-quiz",
                    what: "a quiz group id",
                },
            )?;
            Ok(Arc::new(AnswerQuizScenario::new(
                group_id,
                config.targets.excluded_vus.clone(),
            )))
        }
        other => Err(ScenarioError::UnknownScenario(other.to_string())),
    }
}

/// Share of encounters already acted on; zero until something loaded
pub(crate) fn ratio(times: u64, loaded: u64) -> f64 {
    if loaded == 0 {
        0.0
    } else {
        times as f64 / loaded as f64
    }
}

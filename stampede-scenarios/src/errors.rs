//! Scenario error types

use stampede_client::ClientError;
use thiserror::Error;

/// Result type for scenario execution
pub type ScenarioResult<T> = std::result::Result<T, ScenarioError>;

/// Errors raised by scenario iterations and the runner
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// A platform call failed after the executor gave up on it
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The subject has no group it may publish into
    #[error("No publishable audience group for this subject")]
    NoAudienceGroups,

    /// The run configuration lacks an id this scenario needs
    #[error("Scenario '{scenario}' needs {what} in the run configuration")]
    MissingTarget {
        scenario: &'static str,
        what: &'static str,
    },

    /// The requested scenario does not exist
    #[error("Unknown scenario '{0}'")]
    UnknownScenario(String),
}

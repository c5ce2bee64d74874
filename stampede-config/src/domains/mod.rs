//! Domain-specific configuration modules

pub mod classifier;
pub mod http;
pub mod identity;
pub mod logging;
pub mod platform;
pub mod retry;
pub mod scenario;
pub mod seed;
pub mod store;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main Stampede configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StampedeConfig {
    /// Identity-provider configuration
    #[serde(default)]
    pub identity: identity::IdentityConfig,

    /// Platform API configuration
    #[serde(default)]
    pub platform: platform::PlatformConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: http::HttpConfig,

    /// Retry policies
    #[serde(default)]
    pub retry: retry::RetryConfig,

    /// Failure-classification allow-lists
    #[serde(default)]
    pub classifier: classifier::ClassifierConfig,

    /// Credential store configuration
    #[serde(default)]
    pub store: store::StoreConfig,

    /// Seed-data configuration
    #[serde(default)]
    pub seed: seed::SeedConfig,

    /// Scenario execution configuration
    #[serde(default)]
    pub scenario: scenario::ScenarioConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl StampedeConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.identity.validate()?;
        self.platform.validate()?;
        self.http.validate()?;
        self.retry.validate()?;
        self.classifier.validate()?;
        self.store.validate()?;
        self.seed.validate()?;
        self.scenario.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = StampedeConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}

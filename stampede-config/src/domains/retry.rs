//! Retry policy configuration
//!
//! Three independent policies: the main platform request loop, first-time
//! login, and token refresh. Durations accept humantime strings ("30s",
//! "5m") in YAML.

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policies for all outbound traffic
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RetryConfig {
    /// Platform request loop
    #[serde(default)]
    pub request: RequestRetryPolicy,

    /// First-time password login
    #[serde(default)]
    pub login: LoginRetryPolicy,

    /// Token refresh
    #[serde(default)]
    pub refresh: RefreshRetryPolicy,
}

/// Policy for the resilient platform request loop
///
/// Backoff grows linearly: the sleep before attempt N is `backoff_base * N`.
/// Once `max_attempts` retryable failures accumulate, transport-level
/// failures fall through to the escape valve, which sleeps a random interval
/// up to `valve_sleep_cap` and starts the count over.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestRetryPolicy {
    #[serde(default = "default_request_attempts")]
    pub max_attempts: u32,

    #[serde(with = "humantime_serde", default = "default_request_backoff")]
    pub backoff_base: Duration,

    #[serde(with = "humantime_serde", default = "default_valve_sleep_cap")]
    pub valve_sleep_cap: Duration,
}

/// Policy for first-time password login
///
/// The delay is fixed rather than growing; a cold identity provider recovers
/// quickly or not at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRetryPolicy {
    #[serde(default = "default_auth_attempts")]
    pub max_attempts: u32,

    #[serde(with = "humantime_serde", default = "default_login_delay")]
    pub delay: Duration,
}

/// Policy for refreshing an expired token
///
/// Linear backoff: the sleep before attempt N is `backoff_base * N`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshRetryPolicy {
    #[serde(default = "default_auth_attempts")]
    pub max_attempts: u32,

    #[serde(with = "humantime_serde", default = "default_refresh_backoff")]
    pub backoff_base: Duration,
}

impl Default for RequestRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_request_attempts(),
            backoff_base: default_request_backoff(),
            valve_sleep_cap: default_valve_sleep_cap(),
        }
    }
}

impl Default for LoginRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_auth_attempts(),
            delay: default_login_delay(),
        }
    }
}

impl Default for RefreshRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_auth_attempts(),
            backoff_base: default_refresh_backoff(),
        }
    }
}

impl Validatable for RetryConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.request.max_attempts,
            "request.max_attempts",
            self.domain_name(),
        )?;
        validate_positive(
            self.request.backoff_base.as_millis(),
            "request.backoff_base",
            self.domain_name(),
        )?;
        validate_positive(
            self.login.max_attempts,
            "login.max_attempts",
            self.domain_name(),
        )?;
        validate_positive(
            self.refresh.max_attempts,
            "refresh.max_attempts",
            self.domain_name(),
        )?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "retry"
    }
}

// Default value functions
fn default_request_attempts() -> u32 {
    10
}

fn default_request_backoff() -> Duration {
    Duration::from_secs(30)
}

fn default_valve_sleep_cap() -> Duration {
    Duration::from_secs(30)
}

fn default_auth_attempts() -> u32 {
    6
}

fn default_login_delay() -> Duration {
    Duration::from_secs(3)
}

fn default_refresh_backoff() -> Duration {
    Duration::from_secs(5)
}

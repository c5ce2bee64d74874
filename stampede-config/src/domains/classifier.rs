//! Failure-classification allow-lists
//!
//! The request executor decides what to do with a failed call by looking the
//! response up in these lists. They are plain data so a deployment can widen
//! or narrow them without a rebuild.

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};

/// Error-classification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Body codes treated as success with no payload. These arise when a
    /// provisioning action was already applied (duplicate join, replayed
    /// sync) and retrying would only generate noise.
    #[serde(default = "default_benign_conflicts")]
    pub benign_conflicts: Vec<String>,

    /// Body codes that are retryable despite a non-5xx status
    #[serde(default = "default_retryable_codes")]
    pub retryable_codes: Vec<String>,

    /// Transport failure kinds eligible for the escape valve once the
    /// attempt bound is reached
    #[serde(default = "default_transient_transport")]
    pub transient_transport: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            benign_conflicts: default_benign_conflicts(),
            retryable_codes: default_retryable_codes(),
            transient_transport: default_transient_transport(),
        }
    }
}

impl Validatable for ClassifierConfig {
    fn validate(&self) -> ConfigResult<()> {
        for code in &self.benign_conflicts {
            validate_required_string(code, "benign_conflicts entry", self.domain_name())?;
        }
        for code in &self.retryable_codes {
            validate_required_string(code, "retryable_codes entry", self.domain_name())?;
        }
        for kind in &self.transient_transport {
            validate_required_string(kind, "transient_transport entry", self.domain_name())?;
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "classifier"
    }
}

// Default value functions
fn default_benign_conflicts() -> Vec<String> {
    vec![
        "group.already_member".to_string(),
        "group.joining_request.already_sent".to_string(),
        "data_synchronization.error".to_string(),
    ]
}

fn default_retryable_codes() -> Vec<String> {
    vec!["forbidden".to_string()]
}

fn default_transient_transport() -> Vec<String> {
    vec![
        "connection_busy".to_string(),
        "connection_reset".to_string(),
        "timeout".to_string(),
        "dns_not_found".to_string(),
        "tls_handshake".to_string(),
        "tls_bad_record_mac".to_string(),
        "tls_wrong_version".to_string(),
        "tls_packet_length".to_string(),
        "socket_exhausted".to_string(),
    ]
}

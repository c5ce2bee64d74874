//! Identity-provider configuration
//!
//! The harness authenticates virtual users against a Cognito-style identity
//! provider. The wire protocol itself (auth flows, target headers) lives in
//! `stampede-auth`; this domain only carries the endpoint and pool identity.

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, validate_url, Validatable};
use serde::{Deserialize, Serialize};

/// Identity-provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Token endpoint of the identity provider
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// App client id passed with every auth call
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// User pool id (informational, some deployments omit it)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_pool_id: Option<String>,

    /// Username of the platform system administrator
    #[serde(default = "default_sys_admin")]
    pub sys_admin_username: String,

    /// Password shared by all seeded accounts
    #[serde(default = "default_password")]
    pub default_password: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            client_id: default_client_id(),
            user_pool_id: None,
            sys_admin_username: default_sys_admin(),
            default_password: default_password(),
        }
    }
}

impl Validatable for IdentityConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.endpoint, "endpoint", self.domain_name())?;
        validate_required_string(&self.client_id, "client_id", self.domain_name())?;
        validate_required_string(
            &self.sys_admin_username,
            "sys_admin_username",
            self.domain_name(),
        )?;
        validate_required_string(&self.default_password, "default_password", self.domain_name())?;

        if let Some(ref pool) = self.user_pool_id {
            validate_required_string(pool, "user_pool_id", self.domain_name())?;
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "identity"
    }
}

// Default value functions
fn default_endpoint() -> String {
    "https://cognito-idp.ap-southeast-1.amazonaws.com/".to_string()
}

fn default_client_id() -> String {
    "local-test-client".to_string()
}

fn default_sys_admin() -> String {
    "sysadmin".to_string()
}

fn default_password() -> String {
    "ChangeMe!1".to_string()
}

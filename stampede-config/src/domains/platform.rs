//! Platform API configuration
//!
//! The platform exposes its REST surface as versioned services (group, user,
//! notification, content) behind one gateway. Every request carries the
//! service's version in a dedicated header; a request id header is attached
//! for correlation.

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, validate_url, Validatable};
use serde::{Deserialize, Serialize};

/// Platform API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Gateway base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Header carrying the API version expected by the caller
    #[serde(default = "default_version_header")]
    pub version_header: String,

    /// Header carrying the per-request correlation id
    #[serde(default = "default_request_id_header")]
    pub request_id_header: String,

    /// Per-service hosts and latest versions
    #[serde(default)]
    pub services: ServicesConfig,
}

/// Hosts and versions for each platform service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    #[serde(default = "default_group_service")]
    pub group: ServiceConfig,

    #[serde(default = "default_user_service")]
    pub user: ServiceConfig,

    #[serde(default = "default_notification_service")]
    pub notification: ServiceConfig,

    #[serde(default = "default_content_service")]
    pub content: ServiceConfig,
}

/// A single service endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service host, including the gateway prefix
    pub host: String,

    /// Latest version advertised by the service
    pub version: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            version_header: default_version_header(),
            request_id_header: default_request_id_header(),
            services: ServicesConfig::default(),
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            group: default_group_service(),
            user: default_user_service(),
            notification: default_notification_service(),
            content: default_content_service(),
        }
    }
}

impl Validatable for PlatformConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.base_url, "base_url", self.domain_name())?;
        validate_required_string(&self.version_header, "version_header", self.domain_name())?;
        validate_required_string(
            &self.request_id_header,
            "request_id_header",
            self.domain_name(),
        )?;
        self.services.validate()?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "platform"
    }
}

impl Validatable for ServicesConfig {
    fn validate(&self) -> ConfigResult<()> {
        for (name, service) in [
            ("group", &self.group),
            ("user", &self.user),
            ("notification", &self.notification),
            ("content", &self.content),
        ] {
            validate_url(&service.host, &format!("{}.host", name), self.domain_name())?;
            validate_required_string(
                &service.version,
                &format!("{}.version", name),
                self.domain_name(),
            )?;
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "platform.services"
    }
}

// Default value functions
fn default_base_url() -> String {
    "https://api.example.com/v1".to_string()
}

fn default_version_header() -> String {
    "x-version-id".to_string()
}

fn default_request_id_header() -> String {
    "x-request-id".to_string()
}

fn default_group_service() -> ServiceConfig {
    ServiceConfig {
        host: format!("{}/group", default_base_url()),
        version: "1.1.0".to_string(),
    }
}

fn default_user_service() -> ServiceConfig {
    ServiceConfig {
        host: format!("{}/user", default_base_url()),
        version: "1.0.0".to_string(),
    }
}

fn default_notification_service() -> ServiceConfig {
    ServiceConfig {
        host: format!("{}/notification", default_base_url()),
        version: "1.1.0".to_string(),
    }
}

fn default_content_service() -> ServiceConfig {
    ServiceConfig {
        host: format!("{}/content", default_base_url()),
        version: "1.12.0".to_string(),
    }
}

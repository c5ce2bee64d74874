//! Credential store configuration

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};

/// Credential store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Storage backend
    #[serde(default)]
    pub backend: StoreBackend,

    /// File path for the `file` backend
    #[serde(default = "default_path")]
    pub path: String,
}

/// Available storage backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process map, shared by all virtual users of one run
    #[default]
    Memory,
    /// JSON file on disk, visible to concurrently running seeding processes
    File,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            path: default_path(),
        }
    }
}

impl Validatable for StoreConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.backend == StoreBackend::File {
            validate_required_string(&self.path, "path", self.domain_name())?;
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "store"
    }
}

fn default_path() -> String {
    ".stampede/credentials.json".to_string()
}

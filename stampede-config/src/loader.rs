//! Configuration loading and environment variable handling

use crate::domains::StampedeConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "STAMPEDE".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<StampedeConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: StampedeConfig = serde_yaml::from_str(&content)?;

        // Apply environment variable overrides
        self.apply_env_overrides(&mut config)?;

        // Validate all domains
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<StampedeConfig> {
        let mut config = StampedeConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<StampedeConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut StampedeConfig) -> ConfigResult<()> {
        self.apply_identity_overrides(&mut config.identity)?;
        self.apply_platform_overrides(&mut config.platform)?;
        self.apply_http_overrides(&mut config.http)?;
        self.apply_store_overrides(&mut config.store)?;
        self.apply_seed_overrides(&mut config.seed)?;
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    /// Apply identity config overrides
    fn apply_identity_overrides(
        &self,
        config: &mut crate::domains::identity::IdentityConfig,
    ) -> ConfigResult<()> {
        if let Ok(endpoint) = self.get_env_var("IDENTITY_ENDPOINT") {
            config.endpoint = endpoint;
        }

        if let Ok(client_id) = self.get_env_var("IDENTITY_CLIENT_ID") {
            config.client_id = client_id;
        }

        if let Ok(username) = self.get_env_var("SYS_ADMIN_USERNAME") {
            config.sys_admin_username = username;
        }

        if let Ok(password) = self.get_env_var("DEFAULT_PASSWORD") {
            config.default_password = password;
        }

        Ok(())
    }

    /// Apply platform config overrides
    fn apply_platform_overrides(
        &self,
        config: &mut crate::domains::platform::PlatformConfig,
    ) -> ConfigResult<()> {
        if let Ok(base_url) = self.get_env_var("PLATFORM_BASE_URL") {
            config.base_url = base_url;
        }

        Ok(())
    }

    /// Apply HTTP config overrides
    fn apply_http_overrides(
        &self,
        config: &mut crate::domains::http::HttpConfig,
    ) -> ConfigResult<()> {
        if let Ok(timeout) = self.get_env_var("HTTP_TIMEOUT") {
            let seconds: u64 = timeout
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid HTTP_TIMEOUT: {}", e)))?;
            config.timeout = std::time::Duration::from_secs(seconds);
        }

        if let Ok(user_agent) = self.get_env_var("HTTP_USER_AGENT") {
            config.user_agent = user_agent;
        }

        if let Ok(verify_tls) = self.get_env_var("HTTP_VERIFY_TLS") {
            config.verify_tls = verify_tls
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid HTTP_VERIFY_TLS: {}", e)))?;
        }

        Ok(())
    }

    /// Apply store config overrides
    fn apply_store_overrides(
        &self,
        config: &mut crate::domains::store::StoreConfig,
    ) -> ConfigResult<()> {
        if let Ok(backend) = self.get_env_var("STORE_BACKEND") {
            config.backend = match backend.to_lowercase().as_str() {
                "memory" => crate::domains::store::StoreBackend::Memory,
                "file" => crate::domains::store::StoreBackend::File,
                other => {
                    return Err(ConfigError::EnvError(format!(
                        "Invalid STORE_BACKEND: {}",
                        other
                    )))
                }
            };
        }

        if let Ok(path) = self.get_env_var("STORE_PATH") {
            config.path = path;
        }

        Ok(())
    }

    /// Apply seed config overrides
    fn apply_seed_overrides(
        &self,
        config: &mut crate::domains::seed::SeedConfig,
    ) -> ConfigResult<()> {
        if let Ok(users) = self.get_env_var("SEED_USERS") {
            config.users = users
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid SEED_USERS: {}", e)))?;
        }

        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            use std::str::FromStr;
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            use std::str::FromStr;
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

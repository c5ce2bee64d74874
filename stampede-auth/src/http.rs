//! Shared HTTP client construction

use stampede_config::HttpConfig;

/// Build a reqwest client from the harness HTTP configuration
///
/// Used for both identity-provider and platform traffic so all outbound
/// requests share the same timeout, pool, and TLS settings.
pub fn build_http_client(config: &HttpConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .user_agent(&config.user_agent)
        .danger_accept_invalid_certs(!config.verify_tls)
        .pool_max_idle_per_host(config.connection_pool.max_idle_per_host)
        .pool_idle_timeout(config.connection_pool.idle_timeout)
        .connect_timeout(config.connection_pool.connection_timeout)
        .build()
}

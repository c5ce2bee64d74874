//! Command implementations
//!
//! Every command that talks to the platform goes through [`Platform`]: one
//! HTTP client, one token source and one credential store shared by all the
//! acting clients the command builds.

pub mod provision;
pub mod run;
pub mod seed;

use anyhow::{Context, Result};
use std::sync::Arc;

use stampede_auth::{build_http_client, IdentityProvider, Session, TokenSource};
use stampede_client::{ActorClient, AdminClient, Classifier, RequestExecutor, RetryObserver};
use stampede_config::domains::platform::ServicesConfig;
use stampede_config::domains::store::StoreBackend;
use stampede_config::StampedeConfig;
use stampede_store::{CredentialStore, FileStore, MemoryStore};
use tracing::info;

/// Credential store selected by configuration
fn build_store(config: &StampedeConfig) -> Arc<dyn CredentialStore> {
    match config.store.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::File => {
            info!("Using file credential store at {}", config.store.path);
            Arc::new(FileStore::new(&config.store.path))
        }
    }
}

/// Shared wiring behind every networked command
pub struct Platform {
    executor: Arc<RequestExecutor>,
    services: ServicesConfig,
    sys_admin: String,
}

impl Platform {
    /// Wire HTTP client, identity provider, token source and executor from config
    pub fn connect(
        config: &StampedeConfig,
        observer: Option<Arc<dyn RetryObserver>>,
    ) -> Result<Self> {
        let client = build_http_client(&config.http).context("Failed to build HTTP client")?;
        let provider = Arc::new(IdentityProvider::with_client(
            client.clone(),
            &config.identity,
            &config.retry,
        ));
        let tokens = Arc::new(TokenSource::new(
            provider,
            build_store(config),
            config.identity.default_password.clone(),
        ));

        let mut executor = RequestExecutor::new(
            client,
            tokens,
            Classifier::from_config(&config.classifier),
            config.retry.request.clone(),
            &config.platform,
        );
        if let Some(observer) = observer {
            executor = executor.with_observer(observer);
        }

        Ok(Self {
            executor: Arc::new(executor),
            services: config.platform.services.clone(),
            sys_admin: config.identity.sys_admin_username.clone(),
        })
    }

    /// Executor shared by every client this platform builds
    pub fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }

    /// Service hosts and versions for building clients
    pub fn services(&self) -> &ServicesConfig {
        &self.services
    }

    /// Client acting as the given username
    pub fn actor(&self, username: &str) -> ActorClient {
        ActorClient::new(Arc::clone(&self.executor), self.services.clone(), username)
    }

    /// Admin client acting as the configured sys admin
    pub fn admin(&self) -> AdminClient {
        AdminClient::new(self.actor(&self.sys_admin))
    }

    /// Log the sys admin in and keep its token fresh while the returned
    /// session is alive. Provisioning flows hold one across their run.
    pub async fn admin_session(&self) -> Result<Session> {
        Session::open(
            Arc::clone(self.executor.tokens()),
            self.sys_admin.clone(),
        )
        .await
        .with_context(|| format!("Failed to authenticate '{}'", self.sys_admin))
    }
}

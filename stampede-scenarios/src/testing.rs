//! Shared unit-test fixtures
//!
//! Scenario tests run against a wiremock server with a pre-seeded credential
//! so no token call is needed, and against a sleeper that only records the
//! requested pauses instead of waiting them out.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use stampede_auth::{build_http_client, IdentityProvider, TokenSource};
use stampede_client::{Classifier, RequestExecutor, Sleeper};
use stampede_config::domains::platform::{ServiceConfig, ServicesConfig};
use stampede_config::domains::retry::RequestRetryPolicy;
use stampede_config::{ClassifierConfig, HttpConfig, IdentityConfig, PlatformConfig, RetryConfig};
use stampede_store::{Credential, CredentialStore, MemoryStore};
use wiremock::MockServer;

use crate::context::{ClientFactory, VuContext};
use crate::metrics::RunMetrics;
use crate::subjects::SeedSubject;

/// Sleeper that tallies requested pauses without sleeping
pub(crate) struct InstantSleeper {
    total: Mutex<Duration>,
}

impl InstantSleeper {
    pub(crate) fn new() -> Self {
        Self {
            total: Mutex::new(Duration::ZERO),
        }
    }

    /// Sum of every pause requested so far
    pub(crate) fn total(&self) -> Duration {
        *self.total.lock()
    }
}

#[async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, duration: Duration) {
        *self.total.lock() += duration;
    }
}

pub(crate) struct TestHarness {
    pub(crate) server: MockServer,
    pub(crate) metrics: Arc<RunMetrics>,
    pub(crate) sleeper: Arc<InstantSleeper>,
    pub(crate) factory: ClientFactory,
}

impl TestHarness {
    /// Context acting as the pre-seeded `loaduser1`
    pub(crate) fn context(&self, vu_id: u32, rng_seed: u64) -> VuContext {
        let subject = SeedSubject {
            username: "loaduser1".to_string(),
            community_name: "Load Test Community 1".to_string(),
            group_name: "Load Test Group 1".to_string(),
        };
        let actor = self.factory.client(&subject);
        VuContext::new(
            vu_id,
            0,
            actor,
            subject,
            Arc::clone(&self.metrics),
            self.sleeper.clone(),
        )
        .with_rng_seed(rng_seed)
    }
}

pub(crate) async fn harness() -> TestHarness {
    let server = MockServer::start().await;

    let identity = IdentityConfig {
        endpoint: server.uri(),
        ..IdentityConfig::default()
    };
    let client = build_http_client(&HttpConfig::default()).unwrap();
    let provider =
        IdentityProvider::with_client(client.clone(), &identity, &RetryConfig::default());
    let store = Arc::new(MemoryStore::new());
    store
        .put(Credential::from_grant(
            "loaduser1",
            "tok-1",
            "access",
            None,
            "Bearer",
            3600,
        ))
        .await
        .unwrap();
    let tokens = Arc::new(TokenSource::new(Arc::new(provider), store, "hunter2!A"));

    let mut platform = PlatformConfig::default();
    platform.services = ServicesConfig {
        group: ServiceConfig {
            host: format!("{}/group", server.uri()),
            version: "1.1.0".to_string(),
        },
        user: ServiceConfig {
            host: format!("{}/user", server.uri()),
            version: "1.0.0".to_string(),
        },
        notification: ServiceConfig {
            host: format!("{}/notification", server.uri()),
            version: "1.1.0".to_string(),
        },
        content: ServiceConfig {
            host: format!("{}/content", server.uri()),
            version: "1.12.0".to_string(),
        },
    };

    let executor = RequestExecutor::new(
        client,
        tokens,
        Classifier::from_config(&ClassifierConfig::default()),
        RequestRetryPolicy::default(),
        &platform,
    );

    TestHarness {
        server,
        metrics: Arc::new(RunMetrics::default()),
        sleeper: Arc::new(InstantSleeper::new()),
        factory: ClientFactory::new(Arc::new(executor), platform.services),
    }
}

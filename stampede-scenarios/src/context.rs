//! Per-iteration scenario context
//!
//! Every scenario iteration runs against a [`VuContext`]: the acting client,
//! the seeded identity behind it, the shared run metrics and a pacing clock.
//! Scenarios never touch the executor or the metrics sink directly; calls go
//! through [`VuContext::observe`] so each request's latency and outcome land
//! in the run totals, and think-time goes through the injected [`Sleeper`] so
//! tests run without waiting.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use stampede_client::{ActorClient, ClientResult, RequestExecutor, Sleeper, TokioSleeper};
use stampede_config::domains::platform::ServicesConfig;

use crate::metrics::RunMetrics;
use crate::subjects::SeedSubject;

/// Builds acting clients over one shared executor
///
/// All virtual users share the executor (and with it the credential store and
/// retry policy); only the acting username differs per client.
#[derive(Clone)]
pub struct ClientFactory {
    executor: Arc<RequestExecutor>,
    services: ServicesConfig,
}

impl ClientFactory {
    pub fn new(executor: Arc<RequestExecutor>, services: ServicesConfig) -> Self {
        Self { executor, services }
    }

    pub fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }

    /// A client acting as the given subject
    pub fn client(&self, subject: &SeedSubject) -> ActorClient {
        ActorClient::new(
            Arc::clone(&self.executor),
            self.services.clone(),
            &subject.username,
        )
    }
}

/// Everything one scenario iteration needs
pub struct VuContext {
    vu_id: u32,
    iteration: u64,
    actor: ActorClient,
    subject: SeedSubject,
    metrics: Arc<RunMetrics>,
    sleeper: Arc<dyn Sleeper>,
    rng: Mutex<fastrand::Rng>,
}

impl VuContext {
    pub fn new(
        vu_id: u32,
        iteration: u64,
        actor: ActorClient,
        subject: SeedSubject,
        metrics: Arc<RunMetrics>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            vu_id,
            iteration,
            actor,
            subject,
            metrics,
            sleeper,
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// Replace the context's random source with a seeded one
    pub fn with_rng_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
            ..self
        }
    }

    pub fn vu_id(&self) -> u32 {
        self.vu_id
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn actor(&self) -> &ActorClient {
        &self.actor
    }

    pub fn subject(&self) -> &SeedSubject {
        &self.subject
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Uniform draw in `min..=max`
    pub fn random(&self, min: u64, max: u64) -> u64 {
        self.rng.lock().u64(min..=max)
    }

    /// Uniform index into a slice of `len` elements
    pub fn random_index(&self, len: usize) -> usize {
        self.rng.lock().usize(..len)
    }

    /// Random lowercase ASCII of the given length
    pub fn letters(&self, count: usize) -> String {
        let mut rng = self.rng.lock();
        (0..count).map(|_| rng.lowercase()).collect()
    }

    /// Think for a fixed number of seconds
    pub async fn pause_secs(&self, secs: u64) {
        self.sleeper.sleep(Duration::from_secs(secs)).await;
    }

    /// Think for a random number of seconds in `min..=max`
    pub async fn pause_between(&self, min: u64, max: u64) {
        let secs = self.random(min, max);
        self.sleeper.sleep(Duration::from_secs(secs)).await;
    }

    /// Run one client call, recording its latency and outcome
    pub async fn observe<T, F>(&self, call: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        let started = Instant::now();
        let outcome = call.await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(_) => self.metrics.record_request(true, elapsed_ms).await,
            Err(error) => self.metrics.record_failure(error, elapsed_ms).await,
        }
        outcome
    }
}

/// Default pacing clock for production runs
pub fn real_sleeper() -> Arc<dyn Sleeper> {
    Arc::new(TokioSleeper)
}

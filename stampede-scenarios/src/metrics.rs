//! Run metrics
//!
//! One [`RunMetrics`] is shared by every virtual user in a run. Counters are
//! atomics; latency samples go through a mutex and are only sorted once at
//! summary time.

use serde::Serialize;
use stampede_client::{ClientError, RetryObserver, TransportKind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Counters and latency samples collected while a run is in flight
#[derive(Debug, Default)]
pub struct RunMetrics {
    iterations: AtomicU64,
    failed_iterations: AtomicU64,
    requests: AtomicU64,
    failed_requests: AtomicU64,
    retries: AtomicU64,
    benign_conflicts: AtomicU64,
    server_down: AtomicU64,
    request_timeout: AtomicU64,
    missing_audiences: AtomicU64,
    missing_quizzes: AtomicU64,
    quizzes_generated: AtomicU64,
    latencies_ms: Mutex<Vec<u64>>,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed platform call
    pub async fn record_request(&self, success: bool, latency_ms: u64) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
        self.latencies_ms.lock().await.push(latency_ms);
    }

    /// Record one failed platform call, classifying it into the outage
    /// counters the thresholds watch
    pub async fn record_failure(&self, error: &ClientError, latency_ms: u64) {
        self.record_request(false, latency_ms).await;
        match error {
            ClientError::Transport {
                kind: TransportKind::Timeout,
                ..
            } => {
                self.request_timeout.fetch_add(1, Ordering::Relaxed);
            }
            ClientError::Transport { .. }
            | ClientError::RetriesExhausted { .. }
            | ClientError::UnexpectedStatus { .. } => {
                self.server_down.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    /// Record the end of one scenario iteration
    pub fn iteration_finished(&self, success: bool) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.failed_iterations.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// An iteration found no audience group to publish into
    pub fn missing_audience(&self) {
        self.missing_audiences.fetch_add(1, Ordering::Relaxed);
    }

    /// An iteration found no quiz to answer
    pub fn missing_quiz(&self) {
        self.missing_quizzes.fetch_add(1, Ordering::Relaxed);
    }

    /// A publish round generated a quiz from its post
    pub fn quiz_generated(&self) {
        self.quizzes_generated.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters and compute latency percentiles
    pub async fn summarize(&self) -> RunSummary {
        let mut latencies = self.latencies_ms.lock().await.clone();
        latencies.sort_unstable();

        let requests = self.requests.load(Ordering::Relaxed);
        let failed_requests = self.failed_requests.load(Ordering::Relaxed);
        let error_rate = if requests > 0 {
            failed_requests as f64 / requests as f64
        } else {
            0.0
        };

        let percentile = |p: usize| -> u64 {
            if latencies.is_empty() {
                0
            } else {
                latencies[latencies.len() * p / 100]
            }
        };
        let avg = if latencies.is_empty() {
            0
        } else {
            latencies.iter().sum::<u64>() / latencies.len() as u64
        };

        RunSummary {
            iterations: self.iterations.load(Ordering::Relaxed),
            failed_iterations: self.failed_iterations.load(Ordering::Relaxed),
            requests,
            failed_requests,
            error_rate,
            retries: self.retries.load(Ordering::Relaxed),
            benign_conflicts: self.benign_conflicts.load(Ordering::Relaxed),
            server_down: self.server_down.load(Ordering::Relaxed),
            request_timeout: self.request_timeout.load(Ordering::Relaxed),
            missing_audiences: self.missing_audiences.load(Ordering::Relaxed),
            missing_quizzes: self.missing_quizzes.load(Ordering::Relaxed),
            quizzes_generated: self.quizzes_generated.load(Ordering::Relaxed),
            min_latency_ms: latencies.first().copied().unwrap_or(0),
            max_latency_ms: latencies.last().copied().unwrap_or(0),
            avg_latency_ms: avg,
            p50_latency_ms: percentile(50),
            p95_latency_ms: percentile(95),
            p99_latency_ms: percentile(99),
        }
    }
}

/// Final numbers of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub iterations: u64,
    pub failed_iterations: u64,
    pub requests: u64,
    pub failed_requests: u64,
    pub error_rate: f64,
    pub retries: u64,
    pub benign_conflicts: u64,
    pub server_down: u64,
    pub request_timeout: u64,
    pub missing_audiences: u64,
    pub missing_quizzes: u64,
    pub quizzes_generated: u64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
    pub avg_latency_ms: u64,
    pub p50_latency_ms: u64,
    pub p95_latency_ms: u64,
    pub p99_latency_ms: u64,
}

/// Bridges executor retry events into the run counters
pub struct MetricsObserver {
    metrics: Arc<RunMetrics>,
}

impl MetricsObserver {
    pub fn new(metrics: Arc<RunMetrics>) -> Self {
        Self { metrics }
    }
}

impl RetryObserver for MetricsObserver {
    fn retry_started(&self) {
        self.metrics.retries.fetch_add(1, Ordering::Relaxed);
    }

    fn cleared(&self) {}

    fn benign_conflict(&self) {
        self.metrics.benign_conflicts.fetch_add(1, Ordering::Relaxed);
    }
}

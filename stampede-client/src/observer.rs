//! Retry observation
//!
//! The executor reports retry lifecycle events through an injected observer
//! so tests can assert on them and the CLI can show liveness during long
//! retry storms.

use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Callbacks invoked by the request executor
pub trait RetryObserver: Send + Sync {
    /// A retry was scheduled
    fn retry_started(&self);

    /// An in-flight call completed successfully
    fn cleared(&self);

    /// A conflict response was absorbed as already-applied
    fn benign_conflict(&self) {}
}

/// Fans events out to several observers
pub struct FanoutObserver {
    observers: Vec<Arc<dyn RetryObserver>>,
}

impl FanoutObserver {
    pub fn new(observers: Vec<Arc<dyn RetryObserver>>) -> Self {
        Self { observers }
    }
}

impl RetryObserver for FanoutObserver {
    fn retry_started(&self) {
        for observer in &self.observers {
            observer.retry_started();
        }
    }

    fn cleared(&self) {
        for observer in &self.observers {
            observer.cleared();
        }
    }

    fn benign_conflict(&self) {
        for observer in &self.observers {
            observer.benign_conflict();
        }
    }
}

/// Observer that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RetryObserver for NoopObserver {
    fn retry_started(&self) {}
    fn cleared(&self) {}
}

/// Process-wide liveness ticker
///
/// While any retry is outstanding a background task prints one dot per
/// second to stderr. The task is started by the first retry and stopped by
/// the first successful call; overlapping retries share the one task.
#[derive(Debug, Default)]
pub struct ProgressTicker {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ProgressTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the ticker task is currently running
    pub fn is_active(&self) -> bool {
        self.handle.lock().is_some()
    }
}

impl RetryObserver for ProgressTicker {
    fn retry_started(&self) {
        let mut handle = self.handle.lock();
        if handle.is_none() {
            *handle = Some(tokio::spawn(async {
                loop {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    let mut stderr = std::io::stderr();
                    let _ = write!(stderr, ".");
                    let _ = stderr.flush();
                }
            }));
        }
    }

    fn cleared(&self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }
}

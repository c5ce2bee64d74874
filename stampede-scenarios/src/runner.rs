//! Ramping scenario runner
//!
//! Spawns one worker per virtual-user slot up front and steers how many of
//! them are active through a watch channel the supervisor updates as the
//! stage plan progresses. Workers park when their slot is above the current
//! target, so ramping down never cancels an iteration mid-request; when the
//! plan ends, running iterations get a grace window to finish before the
//! remaining workers are aborted.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use stampede_client::Sleeper;
use stampede_config::domains::scenario::ThinkTimeConfig;

use crate::context::{ClientFactory, VuContext};
use crate::metrics::{RunMetrics, RunSummary};
use crate::scenarios::Scenario;
use crate::stages::StagePlan;
use crate::subjects::SubjectPool;

/// How often the supervisor re-evaluates the stage plan
const RAMP_TICK: Duration = Duration::from_secs(1);

/// Control state shared with every worker
#[derive(Debug, Clone, Copy)]
struct RampSignal {
    desired: u32,
    stopping: bool,
}

/// Drives one scenario through its stage plan
pub struct ScenarioRunner {
    scenario: Arc<dyn Scenario>,
    factory: ClientFactory,
    subjects: Arc<SubjectPool>,
    metrics: Arc<RunMetrics>,
    sleeper: Arc<dyn Sleeper>,
    plan: StagePlan,
    think_time: ThinkTimeConfig,
    graceful_stop: Duration,
}

impl ScenarioRunner {
    pub fn new(
        scenario: Arc<dyn Scenario>,
        factory: ClientFactory,
        subjects: Arc<SubjectPool>,
        metrics: Arc<RunMetrics>,
        sleeper: Arc<dyn Sleeper>,
        plan: StagePlan,
        think_time: ThinkTimeConfig,
        graceful_stop: Duration,
    ) -> Self {
        Self {
            scenario,
            factory,
            subjects,
            metrics,
            sleeper,
            plan,
            think_time,
            graceful_stop,
        }
    }

    /// Play the whole stage plan and summarize the run
    pub async fn run(&self) -> RunSummary {
        let peak = self.plan.peak();
        let (control, signal) = watch::channel(RampSignal {
            desired: 0,
            stopping: false,
        });

        info!(
            scenario = self.scenario.name(),
            peak,
            total = ?self.plan.total_duration(),
            "Starting run"
        );

        let workers: Vec<JoinHandle<()>> = (0..peak)
            .map(|index| {
                tokio::spawn(worker(
                    index,
                    Arc::clone(&self.scenario),
                    self.factory.clone(),
                    Arc::clone(&self.subjects),
                    Arc::clone(&self.metrics),
                    self.sleeper.clone(),
                    self.think_time.clone(),
                    signal.clone(),
                ))
            })
            .collect();
        drop(signal);

        self.supervise(&control).await;

        let _ = control.send(RampSignal {
            desired: 0,
            stopping: true,
        });
        self.drain(workers).await;

        self.metrics.summarize().await
    }

    /// Re-target the worker pool as the plan progresses
    async fn supervise(&self, control: &watch::Sender<RampSignal>) {
        let started = Instant::now();
        let mut ticker = tokio::time::interval(RAMP_TICK);
        let mut current = 0u32;

        loop {
            ticker.tick().await;
            match self.plan.target_at(started.elapsed()) {
                Some(desired) => {
                    if desired != current {
                        debug!(desired, "Ramp target changed");
                        let _ = control.send(RampSignal {
                            desired,
                            stopping: false,
                        });
                        current = desired;
                    }
                }
                None => break,
            }
        }

        info!(elapsed = ?started.elapsed(), "Stages complete, draining workers");
    }

    /// Give running iterations the grace window, then abort stragglers
    async fn drain(&self, workers: Vec<JoinHandle<()>>) {
        let deadline = Instant::now() + self.graceful_stop;
        let mut aborted = 0u32;

        for mut handle in workers {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if tokio::time::timeout(remaining, &mut handle).await.is_err() {
                handle.abort();
                aborted += 1;
            }
        }

        if aborted > 0 {
            warn!(aborted, grace = ?self.graceful_stop, "Workers aborted after the stop window");
        }
    }
}

async fn worker(
    index: u32,
    scenario: Arc<dyn Scenario>,
    factory: ClientFactory,
    subjects: Arc<SubjectPool>,
    metrics: Arc<RunMetrics>,
    sleeper: Arc<dyn Sleeper>,
    think_time: ThinkTimeConfig,
    mut signal: watch::Receiver<RampSignal>,
) {
    let vu_id = index + 1;
    let mut iteration = 0u64;
    let mut rng = fastrand::Rng::new();

    loop {
        let state = *signal.borrow_and_update();
        if state.stopping {
            break;
        }
        if index >= state.desired {
            // Parked; wake on the next ramp change
            if signal.changed().await.is_err() {
                break;
            }
            continue;
        }

        let subject = subjects.pick(&mut rng);
        let actor = factory.client(&subject);
        let ctx = VuContext::new(
            vu_id,
            iteration,
            actor,
            subject,
            Arc::clone(&metrics),
            sleeper.clone(),
        );

        match scenario.run(&ctx).await {
            Ok(()) => metrics.iteration_finished(true),
            Err(error) => {
                warn!(vu = vu_id, iteration, %error, "Iteration failed");
                metrics.iteration_finished(false);
            }
        }
        iteration += 1;

        let min = think_time.min.as_millis() as u64;
        let max = think_time.max.as_millis() as u64;
        let pause = if max > min { rng.u64(min..=max) } else { min };
        if pause > 0 {
            sleeper.sleep(Duration::from_millis(pause)).await;
        }
    }

    debug!(vu = vu_id, iterations = iteration, "Worker stopped");
}

//! Load run command

use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;

use stampede_client::{FanoutObserver, ProgressTicker, RetryObserver};
use stampede_config::StampedeConfig;
use stampede_scenarios::{
    build_scenario, evaluate, real_sleeper, ClientFactory, MetricsObserver, RunMetrics,
    RunSummary, ScenarioRunner, StagePlan, SubjectPool,
};
use tracing::info;

use super::Platform;

/// Run one named scenario and report the outcome
pub async fn execute(config: &StampedeConfig, scenario_name: &str) -> Result<()> {
    let scenario =
        build_scenario(scenario_name, &config.scenario).context("Failed to build scenario")?;

    let metrics = Arc::new(RunMetrics::new());
    let observer: Arc<dyn RetryObserver> = Arc::new(FanoutObserver::new(vec![
        Arc::new(ProgressTicker::new()) as Arc<dyn RetryObserver>,
        Arc::new(MetricsObserver::new(Arc::clone(&metrics))),
    ]));

    let platform = Platform::connect(config, Some(observer))?;

    // Start cold so every subject logs in through the identity provider once
    platform
        .executor()
        .tokens()
        .store()
        .clear()
        .await
        .context("Failed to clear the credential store")?;

    let plan = StagePlan::new(
        config.scenario.start_vus,
        config.scenario.stages_for(scenario_name),
    );
    info!(
        scenario = scenario_name,
        peak = plan.peak(),
        duration_secs = plan.total_duration().as_secs(),
        "Starting load run"
    );

    let subjects = Arc::new(SubjectPool::new(
        config.seed.clone(),
        config.identity.default_password.clone(),
    ));
    let factory = ClientFactory::new(Arc::clone(platform.executor()), platform.services().clone());

    let runner = ScenarioRunner::new(
        scenario,
        factory,
        subjects,
        metrics,
        real_sleeper(),
        plan,
        config.scenario.think_time.clone(),
        config.scenario.graceful_stop,
    );

    let summary = runner.run().await;
    print_summary(scenario_name, &summary);

    let violations = evaluate(&summary, &config.scenario.thresholds);
    if violations.is_empty() {
        println!("\n{}", "All thresholds passed".green().bold());
        Ok(())
    } else {
        println!();
        for violation in &violations {
            println!(
                "{} {}: {}",
                "✗".red().bold(),
                violation.name.red(),
                violation.detail
            );
        }
        Err(anyhow::anyhow!(
            "{} threshold(s) violated",
            violations.len()
        ))
    }
}

fn print_summary(scenario_name: &str, summary: &RunSummary) {
    println!("\n{} {}", "Scenario:".bold(), scenario_name.cyan());
    println!(
        "  iterations .......... {} ({} failed)",
        summary.iterations, summary.failed_iterations
    );
    println!(
        "  requests ............ {} ({} failed, error rate {:.2}%)",
        summary.requests,
        summary.failed_requests,
        summary.error_rate * 100.0
    );
    println!(
        "  retries ............. {} ({} benign conflicts)",
        summary.retries, summary.benign_conflicts
    );
    println!(
        "  latency ms .......... min={} avg={} p50={} p95={} p99={} max={}",
        summary.min_latency_ms,
        summary.avg_latency_ms,
        summary.p50_latency_ms,
        summary.p95_latency_ms,
        summary.p99_latency_ms,
        summary.max_latency_ms
    );
    println!(
        "  server down ......... {}   request timeouts: {}",
        summary.server_down, summary.request_timeout
    );
    println!(
        "  missing audiences ... {}   missing quizzes: {}   quizzes generated: {}",
        summary.missing_audiences, summary.missing_quizzes, summary.quizzes_generated
    );
}

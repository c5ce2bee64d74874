//! Pass/fail thresholds
//!
//! Evaluated once against the final [`RunSummary`]. Metric names follow the
//! load-testing convention the dashboards already chart.

use crate::metrics::RunSummary;
use stampede_config::domains::scenario::ThresholdsConfig;

/// One threshold the run failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdViolation {
    /// Metric name
    pub name: &'static str,

    /// Observed value against the configured bound
    pub detail: String,
}

/// Check the summary against every configured threshold
pub fn evaluate(summary: &RunSummary, config: &ThresholdsConfig) -> Vec<ThresholdViolation> {
    let mut violations = Vec::new();

    if summary.error_rate >= config.max_error_rate {
        violations.push(ThresholdViolation {
            name: "http_req_failed",
            detail: format!(
                "rate {:.4} >= {:.4}",
                summary.error_rate, config.max_error_rate
            ),
        });
    }

    let p95_cap = config.p95_latency.as_millis() as u64;
    if summary.p95_latency_ms >= p95_cap {
        violations.push(ThresholdViolation {
            name: "http_req_duration",
            detail: format!("p(95) {}ms >= {}ms", summary.p95_latency_ms, p95_cap),
        });
    }

    let counts = [
        ("server_down_count", summary.server_down, config.max_server_down),
        (
            "request_timeout_count",
            summary.request_timeout,
            config.max_request_timeout,
        ),
        (
            "non_audiences_count",
            summary.missing_audiences,
            config.max_missing_audiences,
        ),
        (
            "non_quizzes_count",
            summary.missing_quizzes,
            config.max_missing_quizzes,
        ),
    ];
    for (name, observed, cap) in counts {
        if observed >= cap {
            violations.push(ThresholdViolation {
                name,
                detail: format!("count {} >= {}", observed, cap),
            });
        }
    }

    violations
}

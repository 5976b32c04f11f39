//! Prometheus-compatible metrics for the NLQ gateway.
//!
//! Counts questions, intents by kind, and each failure class the gateway
//! absorbs, plus latency histograms for the two outbound calls.

use prometheus::{self, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::intent::IntentKind;

/// Global metrics instance.
static METRICS: std::sync::OnceLock<Arc<Metrics>> = std::sync::OnceLock::new();

/// Get or initialize the global metrics instance.
pub fn get_metrics() -> Arc<Metrics> {
    METRICS.get_or_init(|| Arc::new(Metrics::new())).clone()
}

/// Latency buckets in seconds, 10ms to 60s. Reasoning calls are slow.
fn default_latency_buckets() -> Vec<f64> {
    vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
}

/// All metrics for the gateway.
pub struct Metrics {
    /// Prometheus registry for all metrics.
    pub registry: Registry,

    // =========================================================================
    // Counters
    // =========================================================================
    /// Questions received.
    pub questions_total: IntCounter,
    /// Envelopes returned, labelled by final intent kind.
    pub intents_total: IntCounterVec,
    /// Oracle calls that ended in an error.
    pub oracle_failures_total: IntCounter,
    /// Oracle retries attempted.
    pub oracle_retries_total: IntCounter,
    /// Replies the interpreter downgraded to chat.
    pub interpret_fallbacks_total: IntCounter,
    /// Statements that failed or were rejected.
    pub execution_errors_total: IntCounter,

    // =========================================================================
    // Gauges
    // =========================================================================
    /// Questions currently being processed.
    pub in_flight: IntGauge,
    /// Uptime in seconds.
    pub uptime_seconds: IntGauge,

    // =========================================================================
    // Histograms (durations in seconds)
    // =========================================================================
    /// End-to-end question handling.
    pub request_duration_seconds: Histogram,
    /// Oracle round trip, including retries.
    pub oracle_duration_seconds: Histogram,
    /// Statement execution.
    pub execution_duration_seconds: Histogram,

    start_time: RwLock<Instant>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
    let counter = IntCounter::new(name, help).expect("failed to create counter");
    registry
        .register(Box::new(counter.clone()))
        .expect("failed to register counter");
    counter
}

fn gauge(registry: &Registry, name: &str, help: &str) -> IntGauge {
    let gauge = IntGauge::new(name, help).expect("failed to create gauge");
    registry
        .register(Box::new(gauge.clone()))
        .expect("failed to register gauge");
    gauge
}

fn histogram(registry: &Registry, name: &str, help: &str) -> Histogram {
    let histogram =
        Histogram::with_opts(HistogramOpts::new(name, help).buckets(default_latency_buckets()))
            .expect("failed to create histogram");
    registry
        .register(Box::new(histogram.clone()))
        .expect("failed to register histogram");
    histogram
}

impl Metrics {
    /// Create a new metrics instance with all metrics registered.
    pub fn new() -> Self {
        let registry = Registry::new();

        let questions_total = counter(&registry, "nlq_questions_total", "Questions received");
        let intents_total = IntCounterVec::new(
            Opts::new("nlq_intents_total", "Envelopes returned by intent kind"),
            &["kind"],
        )
        .expect("failed to create counter vec");
        registry
            .register(Box::new(intents_total.clone()))
            .expect("failed to register counter vec");
        let oracle_failures_total = counter(
            &registry,
            "nlq_oracle_failures_total",
            "Oracle calls that ended in an error",
        );
        let oracle_retries_total =
            counter(&registry, "nlq_oracle_retries_total", "Oracle retries attempted");
        let interpret_fallbacks_total = counter(
            &registry,
            "nlq_interpret_fallbacks_total",
            "Oracle replies downgraded to chat",
        );
        let execution_errors_total = counter(
            &registry,
            "nlq_execution_errors_total",
            "Generated statements that failed or were rejected",
        );

        let in_flight = gauge(&registry, "nlq_in_flight", "Questions currently being processed");
        let uptime_seconds = gauge(&registry, "nlq_uptime_seconds", "Server uptime in seconds");

        let request_duration_seconds = histogram(
            &registry,
            "nlq_request_duration_seconds",
            "End-to-end question handling duration in seconds",
        );
        let oracle_duration_seconds = histogram(
            &registry,
            "nlq_oracle_duration_seconds",
            "Oracle round trip duration in seconds",
        );
        let execution_duration_seconds = histogram(
            &registry,
            "nlq_execution_duration_seconds",
            "Statement execution duration in seconds",
        );

        Self {
            registry,
            questions_total,
            intents_total,
            oracle_failures_total,
            oracle_retries_total,
            interpret_fallbacks_total,
            execution_errors_total,
            in_flight,
            uptime_seconds,
            request_duration_seconds,
            oracle_duration_seconds,
            execution_duration_seconds,
            start_time: RwLock::new(Instant::now()),
        }
    }

    /// Count a returned envelope.
    pub fn record_intent(&self, kind: IntentKind) {
        self.intents_total
            .with_label_values(&[kind.wire_name()])
            .inc();
    }

    /// Update the uptime gauge.
    pub fn update_uptime(&self) {
        let uptime = self.start_time.read().elapsed();
        self.uptime_seconds.set(uptime.as_secs() as i64);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.read().elapsed()
    }

    /// Export metrics in Prometheus text format.
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;
        self.update_uptime();

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
            return String::new();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Start a timer that records duration to a histogram when dropped.
    pub fn start_timer(histogram: &Histogram) -> HistogramTimer {
        HistogramTimer {
            histogram: histogram.clone(),
            start: Instant::now(),
        }
    }
}

/// Timer that records duration to a histogram when dropped.
pub struct HistogramTimer {
    histogram: Histogram,
    start: Instant,
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.histogram.observe(duration.as_secs_f64());
    }
}

/// Decrements the in-flight gauge when dropped.
pub struct InFlightGuard {
    gauge: IntGauge,
}

impl InFlightGuard {
    pub fn new(gauge: &IntGauge) -> Self {
        gauge.inc();
        Self {
            gauge: gauge.clone(),
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

/// Health status for the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: HealthState,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: Vec<HealthCheck>,
}

impl HealthStatus {
    /// Aggregate individual checks: any unhealthy check makes the whole
    /// status unhealthy.
    pub fn from_checks(checks: Vec<HealthCheck>) -> Self {
        let status = if checks.iter().any(|c| c.status == HealthState::Unhealthy) {
            HealthState::Unhealthy
        } else {
            HealthState::Healthy
        };

        Self {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: get_metrics().uptime().as_secs(),
            checks,
        }
    }
}

/// Health state enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

impl HealthState {
    /// Convert to HTTP status code.
    pub fn to_status_code(self) -> u16 {
        match self {
            HealthState::Healthy => 200,
            HealthState::Unhealthy => 503,
        }
    }
}

/// Individual health check result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthState,
    pub message: Option<String>,
    pub duration_ms: Option<u64>,
}

impl HealthCheck {
    /// Create a healthy check with duration.
    pub fn healthy_with_duration(name: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            name: name.into(),
            status: HealthState::Healthy,
            message: None,
            duration_ms: Some(duration_ms),
        }
    }

    /// Create an unhealthy check.
    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthState::Unhealthy,
            message: Some(message.into()),
            duration_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_timer() {
        let hist = Histogram::with_opts(
            HistogramOpts::new("test_timer_histogram", "test").buckets(default_latency_buckets()),
        )
        .unwrap();
        {
            let _timer = Metrics::start_timer(&hist);
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(hist.get_sample_count(), 1);
        assert!(hist.get_sample_sum() >= 0.01);
    }

    #[test]
    fn test_in_flight_guard() {
        let metrics = Metrics::new();
        {
            let _a = InFlightGuard::new(&metrics.in_flight);
            let _b = InFlightGuard::new(&metrics.in_flight);
            assert_eq!(metrics.in_flight.get(), 2);
        }
        assert_eq!(metrics.in_flight.get(), 0);
    }

    #[test]
    fn test_prometheus_export() {
        let metrics = Metrics::new();
        metrics.questions_total.inc_by(3);
        metrics.record_intent(IntentKind::Read);
        metrics.record_intent(IntentKind::Chat);
        metrics.record_intent(IntentKind::Chat);

        let output = metrics.export_prometheus();
        assert!(output.contains("nlq_questions_total 3"));
        assert!(output.contains("nlq_intents_total{kind=\"SELECT\"} 1"));
        assert!(output.contains("nlq_intents_total{kind=\"CHAT\"} 2"));
        assert!(output.contains("nlq_oracle_duration_seconds"));
        assert!(output.contains("nlq_execution_duration_seconds"));
    }

    #[test]
    fn test_health_aggregation() {
        let healthy = HealthStatus::from_checks(vec![HealthCheck::healthy_with_duration("database", 3)]);
        assert_eq!(healthy.status, HealthState::Healthy);
        assert_eq!(healthy.status.to_status_code(), 200);

        let unhealthy = HealthStatus::from_checks(vec![HealthCheck::unhealthy(
            "database",
            "database unreachable",
        )]);
        assert_eq!(unhealthy.status, HealthState::Unhealthy);
        assert_eq!(unhealthy.status.to_status_code(), 503);
    }

    #[test]
    fn test_global_metrics() {
        let metrics = get_metrics();
        metrics.questions_total.inc();
        assert!(metrics.questions_total.get() >= 1);
    }
}

//! Observability for the incubator monitor
//!
//! Provides:
//! - Prometheus metrics (samples, sampler errors, evaluation latency, alerts)
//! - Structured JSON logging of alert lifecycle events with tracing

use std::sync::Arc;

use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, GaugeVec,
};
use tracing::{error, info, warn};

use crate::alert::{Alert, AlertHook, AlertSeverity};
use crate::error::SampleError;
use crate::models::MetricKind;

/// Histogram buckets for evaluation latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1,
];

struct MonitorMetricsInner {
    registry: Registry,
    samples_recorded: IntCounterVec,
    samples_rejected: IntCounter,
    sampler_errors: IntCounter,
    evaluation_latency_seconds: Histogram,
    alerts_raised: IntCounterVec,
    alerts_resolved: IntCounter,
    alerts_acknowledged: IntCounter,
    active_alerts: IntGauge,
    latest_reading: GaugeVec,
}

impl MonitorMetricsInner {
    fn new(device: &str) -> prometheus::Result<Self> {
        let registry = Registry::new_custom(
            Some("incubator".to_string()),
            Some([("device".to_string(), device.to_string())].into_iter().collect()),
        )?;

        let samples_recorded = IntCounterVec::new(
            Opts::new("samples_recorded_total", "Samples accepted into the history"),
            &["metric"],
        )?;
        let samples_rejected = IntCounter::new(
            "samples_rejected_total",
            "Samples rejected at the sampler boundary",
        )?;
        let sampler_errors =
            IntCounter::new("sampler_errors_total", "Failed reads from the sample source")?;
        let evaluation_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "evaluation_latency_seconds",
                "Time spent evaluating alert rules per tick",
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
        )?;
        let alerts_raised = IntCounterVec::new(
            Opts::new("alerts_raised_total", "Alerts raised by type"),
            &["alert_type"],
        )?;
        let alerts_resolved = IntCounter::new("alerts_resolved_total", "Alerts resolved")?;
        let alerts_acknowledged =
            IntCounter::new("alerts_acknowledged_total", "Alerts acknowledged by a user")?;
        let active_alerts = IntGauge::new("active_alerts", "Alerts without a resolution time")?;
        let latest_reading = GaugeVec::new(
            Opts::new("latest_reading", "Most recent accepted reading per metric"),
            &["metric"],
        )?;

        registry.register(Box::new(samples_recorded.clone()))?;
        registry.register(Box::new(samples_rejected.clone()))?;
        registry.register(Box::new(sampler_errors.clone()))?;
        registry.register(Box::new(evaluation_latency_seconds.clone()))?;
        registry.register(Box::new(alerts_raised.clone()))?;
        registry.register(Box::new(alerts_resolved.clone()))?;
        registry.register(Box::new(alerts_acknowledged.clone()))?;
        registry.register(Box::new(active_alerts.clone()))?;
        registry.register(Box::new(latest_reading.clone()))?;

        Ok(Self {
            registry,
            samples_recorded,
            samples_rejected,
            sampler_errors,
            evaluation_latency_seconds,
            alerts_raised,
            alerts_resolved,
            alerts_acknowledged,
            active_alerts,
            latest_reading,
        })
    }
}

/// Prometheus metrics for one monitor instance
///
/// Each instance owns its own registry; clones share it.
#[derive(Clone)]
pub struct MonitorMetrics {
    inner: Arc<MonitorMetricsInner>,
}

impl MonitorMetrics {
    pub fn new(device: &str) -> prometheus::Result<Self> {
        Ok(Self {
            inner: Arc::new(MonitorMetricsInner::new(device)?),
        })
    }

    /// Registry to expose on the metrics endpoint
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn record_sample(&self, metric: MetricKind, value: f64) {
        let label = metric.to_string();
        self.inner.samples_recorded.with_label_values(&[&label]).inc();
        self.inner.latest_reading.with_label_values(&[&label]).set(value);
    }

    pub fn inc_samples_rejected(&self) {
        self.inner.samples_rejected.inc();
    }

    pub fn inc_sampler_errors(&self) {
        self.inner.sampler_errors.inc();
    }

    pub fn observe_evaluation_latency(&self, duration_secs: f64) {
        self.inner.evaluation_latency_seconds.observe(duration_secs);
    }

    pub fn inc_alerts_raised(&self, alert: &Alert) {
        self.inner
            .alerts_raised
            .with_label_values(&[&alert.alert_type.to_string()])
            .inc();
        self.inner.active_alerts.inc();
    }

    pub fn inc_alerts_resolved(&self) {
        self.inner.alerts_resolved.inc();
        self.inner.active_alerts.dec();
    }

    pub fn inc_alerts_acknowledged(&self) {
        self.inner.alerts_acknowledged.inc();
    }

    pub fn active_alerts(&self) -> i64 {
        self.inner.active_alerts.get()
    }
}

/// Structured logger for monitor events
#[derive(Clone)]
pub struct StructuredLogger {
    device: String,
}

impl StructuredLogger {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Log a raised alert; emergencies are logged at error level
    pub fn log_alert_raised(&self, alert: &Alert) {
        match alert.severity {
            AlertSeverity::Emergency => {
                error!(
                    event = "alert_raised",
                    device = %self.device,
                    alert_id = %alert.id,
                    alert_type = %alert.alert_type,
                    severity = %alert.severity,
                    value = alert.value,
                    threshold = alert.threshold,
                    start_time = %alert.start_time,
                    duration_minutes = alert.duration_minutes,
                    "{}", alert.title
                );
            }
            _ => {
                warn!(
                    event = "alert_raised",
                    device = %self.device,
                    alert_id = %alert.id,
                    alert_type = %alert.alert_type,
                    severity = %alert.severity,
                    value = alert.value,
                    threshold = alert.threshold,
                    start_time = %alert.start_time,
                    duration_minutes = alert.duration_minutes,
                    "{}", alert.title
                );
            }
        }
    }

    pub fn log_alert_resolved(&self, alert: &Alert) {
        info!(
            event = "alert_resolved",
            device = %self.device,
            alert_id = %alert.id,
            alert_type = %alert.alert_type,
            resolved_time = ?alert.resolved_time,
            "Alert resolved"
        );
    }

    pub fn log_alert_acknowledged(&self, alert: &Alert) {
        info!(
            event = "alert_acknowledged",
            device = %self.device,
            alert_id = %alert.id,
            alert_type = %alert.alert_type,
            resolved = alert.is_resolved(),
            "Alert acknowledged"
        );
    }

    pub fn log_sample_rejected(&self, error: &SampleError) {
        warn!(
            event = "sample_rejected",
            device = %self.device,
            error = %error,
            "Rejected malformed sample"
        );
    }

    pub fn log_sampler_error(&self, error: &SampleError, consecutive_failures: u32) {
        warn!(
            event = "sampler_error",
            device = %self.device,
            error = %error,
            consecutive_failures = consecutive_failures,
            "Failed to read sample"
        );
    }

    pub fn log_startup(&self, version: &str) {
        info!(
            event = "monitor_started",
            device = %self.device,
            version = %version,
            "Incubator monitor started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "monitor_shutdown",
            device = %self.device,
            reason = %reason,
            "Incubator monitor shutting down"
        );
    }
}

/// Alert hook that logs lifecycle events and keeps alert metrics current
pub struct LoggingHook {
    logger: StructuredLogger,
    metrics: MonitorMetrics,
}

impl LoggingHook {
    pub fn new(logger: StructuredLogger, metrics: MonitorMetrics) -> Self {
        Self { logger, metrics }
    }
}

impl AlertHook for LoggingHook {
    fn alert_raised(&self, alert: &Alert) {
        self.metrics.inc_alerts_raised(alert);
        self.logger.log_alert_raised(alert);
    }

    fn alert_resolved(&self, alert: &Alert) {
        self.metrics.inc_alerts_resolved();
        self.logger.log_alert_resolved(alert);
    }

    fn alert_acknowledged(&self, alert: &Alert) {
        self.metrics.inc_alerts_acknowledged();
        self.logger.log_alert_acknowledged(alert);
    }
}

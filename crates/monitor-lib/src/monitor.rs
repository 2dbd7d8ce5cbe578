//! Alert monitor: the shared interface consumed by presentation layers
//!
//! `AlertMonitor` owns all alerting state for one device. `MonitorHandle`
//! wraps it for concurrent use: the monitor loop is the single writer and
//! HTTP handlers or other front-ends read through the same handle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, RwLockReadGuard};

use crate::alert::{
    AcknowledgeOutcome, Alert, AlertEvaluator, AlertHook, AlertRegistry, AlertRule, AlertSummary,
    AlertType, EvaluationOutcome,
};
use crate::config::{AlertThresholds, MonitorConfig};
use crate::error::ConfigError;
use crate::history::MetricHistory;
use crate::models::{DeviceTelemetry, MetricKind, Sample};
use crate::status::SystemStatus;

/// Details of a sampler outage reported to the monitor
#[derive(Debug, Clone, PartialEq)]
pub struct FailureReport {
    pub reason: String,
    /// Time of the first failure in the current streak
    pub since: DateTime<Utc>,
    pub consecutive_failures: u32,
    /// Streak length at which failures are reported
    pub threshold: u32,
}

/// Latest readings and overall status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub temperature: Option<Sample>,
    pub humidity: Option<Sample>,
    pub co2: Option<Sample>,
    pub status: Option<SystemStatus>,
    pub alerts: AlertSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceTelemetry>,
}

/// Alerting state for one incubator
pub struct AlertMonitor {
    config: MonitorConfig,
    history: MetricHistory,
    evaluator: AlertEvaluator,
    registry: AlertRegistry,
    hook: Arc<dyn AlertHook>,
    telemetry: Option<DeviceTelemetry>,
}

impl AlertMonitor {
    /// Build a monitor from validated configuration
    pub fn new(config: MonitorConfig, hook: Arc<dyn AlertHook>) -> Result<Self, ConfigError> {
        config.validate()?;

        let history = MetricHistory::new(MetricKind::ALL.map(|m| (m, config.retention(m))));
        let evaluator = AlertEvaluator::new(AlertRule::from_thresholds(&config.thresholds));

        Ok(Self {
            config,
            history,
            evaluator,
            registry: AlertRegistry::new(),
            hook,
            telemetry: None,
        })
    }

    /// Append a sample to the metric's history
    ///
    /// Samples are expected in time order; validation happens at the
    /// sampler boundary.
    pub fn record_sample(&mut self, metric: MetricKind, sample: Sample) {
        self.history.record(metric, sample);
    }

    /// Replace the latest device telemetry
    pub fn update_telemetry(&mut self, telemetry: DeviceTelemetry) {
        self.telemetry = Some(telemetry);
    }

    pub fn telemetry(&self) -> Option<DeviceTelemetry> {
        self.telemetry
    }

    /// Run one evaluation tick
    pub fn evaluate(&mut self, now: DateTime<Utc>) -> EvaluationOutcome {
        let outcome = self.evaluator.evaluate(&self.history, &mut self.registry, now);

        for alert in &outcome.raised {
            self.hook.alert_raised(alert);
        }
        for alert in &outcome.resolved {
            self.hook.alert_resolved(alert);
        }

        outcome
    }

    /// Acknowledge an alert; unknown or already acknowledged ids are no-ops
    pub fn acknowledge(&mut self, id: &str) -> AcknowledgeOutcome {
        let (outcome, alert) = self.registry.acknowledge(id);
        if let Some(alert) = alert {
            self.hook.alert_acknowledged(alert);
        }
        outcome
    }

    /// Raise a system failure alert unless one is already open
    pub fn report_failure(&mut self, report: &FailureReport, now: DateTime<Utc>) -> Option<Alert> {
        if self.registry.unresolved_of(AlertType::SystemFailure).is_some() {
            return None;
        }

        let alert = Alert::new(
            AlertType::SystemFailure,
            format!(
                "Sensor readings unavailable after {} consecutive failures: {}",
                report.consecutive_failures, report.reason
            ),
            f64::from(report.consecutive_failures),
            f64::from(report.threshold),
            report.since,
            now,
        );
        self.registry.push(alert.clone());
        self.hook.alert_raised(&alert);
        Some(alert)
    }

    /// Resolve the open system failure alert, if any
    pub fn clear_failure(&mut self, now: DateTime<Utc>) -> Option<Alert> {
        let id = self.registry.unresolved_of(AlertType::SystemFailure)?.id.clone();
        let alert = self.registry.resolve(&id, now)?.clone();
        self.hook.alert_resolved(&alert);
        Some(alert)
    }

    pub fn get(&self, id: &str) -> Option<&Alert> {
        self.registry.get(id)
    }

    pub fn active(&self) -> Vec<&Alert> {
        self.registry.active()
    }

    pub fn unacknowledged(&self) -> Vec<&Alert> {
        self.registry.unacknowledged()
    }

    pub fn resolved(&self) -> Vec<&Alert> {
        self.registry.resolved()
    }

    /// All alerts, newest first
    pub fn all(&self) -> Vec<&Alert> {
        self.registry.all()
    }

    pub fn summary(&self) -> AlertSummary {
        self.registry.summary()
    }

    pub fn latest(&self, metric: MetricKind) -> Option<Sample> {
        self.history.latest(metric).copied()
    }

    pub fn history(&self) -> &MetricHistory {
        &self.history
    }

    pub fn thresholds(&self) -> &AlertThresholds {
        &self.config.thresholds
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Status from the latest temperature and humidity, once both are known
    pub fn system_status(&self) -> Option<SystemStatus> {
        let temperature = self.history.latest(MetricKind::Temperature)?;
        let humidity = self.history.latest(MetricKind::Humidity)?;
        Some(SystemStatus::classify(temperature.value, humidity.value))
    }

    pub fn status_snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            temperature: self.latest(MetricKind::Temperature),
            humidity: self.latest(MetricKind::Humidity),
            co2: self.latest(MetricKind::Co2),
            status: self.system_status(),
            alerts: self.summary(),
            device: self.telemetry,
        }
    }
}

/// Cloneable, lock-protected handle to an `AlertMonitor`
#[derive(Clone)]
pub struct MonitorHandle {
    inner: Arc<RwLock<AlertMonitor>>,
}

impl MonitorHandle {
    pub fn new(monitor: AlertMonitor) -> Self {
        Self {
            inner: Arc::new(RwLock::new(monitor)),
        }
    }

    /// Read access for several queries under one lock
    pub async fn read(&self) -> RwLockReadGuard<'_, AlertMonitor> {
        self.inner.read().await
    }

    pub async fn record_sample(&self, metric: MetricKind, sample: Sample) {
        self.inner.write().await.record_sample(metric, sample);
    }

    pub async fn update_telemetry(&self, telemetry: DeviceTelemetry) {
        self.inner.write().await.update_telemetry(telemetry);
    }

    pub async fn evaluate(&self, now: DateTime<Utc>) -> EvaluationOutcome {
        self.inner.write().await.evaluate(now)
    }

    pub async fn acknowledge(&self, id: &str) -> AcknowledgeOutcome {
        self.inner.write().await.acknowledge(id)
    }

    pub async fn report_failure(&self, report: &FailureReport, now: DateTime<Utc>) -> Option<Alert> {
        self.inner.write().await.report_failure(report, now)
    }

    pub async fn clear_failure(&self, now: DateTime<Utc>) -> Option<Alert> {
        self.inner.write().await.clear_failure(now)
    }

    pub async fn get(&self, id: &str) -> Option<Alert> {
        self.inner.read().await.get(id).cloned()
    }

    pub async fn active(&self) -> Vec<Alert> {
        cloned(self.inner.read().await.active())
    }

    pub async fn unacknowledged(&self) -> Vec<Alert> {
        cloned(self.inner.read().await.unacknowledged())
    }

    pub async fn resolved(&self) -> Vec<Alert> {
        cloned(self.inner.read().await.resolved())
    }

    pub async fn all(&self) -> Vec<Alert> {
        cloned(self.inner.read().await.all())
    }

    pub async fn summary(&self) -> AlertSummary {
        self.inner.read().await.summary()
    }

    pub async fn thresholds(&self) -> AlertThresholds {
        *self.inner.read().await.thresholds()
    }

    pub async fn status_snapshot(&self) -> StatusSnapshot {
        self.inner.read().await.status_snapshot()
    }
}

fn cloned(alerts: Vec<&Alert>) -> Vec<Alert> {
    alerts.into_iter().cloned().collect()
}

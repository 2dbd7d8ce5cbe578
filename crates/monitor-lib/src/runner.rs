//! Monitor loop
//!
//! Periodically pulls readings from the sample source, records them and runs
//! an evaluation tick. Consecutive source failures raise a system failure
//! alert, which clears on the next successful reading.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::alert::{Alert, EvaluationOutcome};
use crate::error::SampleError;
use crate::health::{components, HealthRegistry};
use crate::models::MetricKind;
use crate::monitor::{FailureReport, MonitorHandle};
use crate::observability::{MonitorMetrics, StructuredLogger};
use crate::sampler::{SampleSource, SampleValidator};

/// Loop settings
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Time between evaluation ticks (default: 5 seconds)
    pub interval: Duration,
    /// Readings pulled from the source per tick (default: 3, one per metric)
    ///
    /// Every reading in a tick shares the tick timestamp, so at most one
    /// reading per metric fits.
    pub readings_per_tick: usize,
    /// Consecutive source failures before a system failure alert (default: 3)
    pub failure_threshold: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            readings_per_tick: 3,
            failure_threshold: 3,
        }
    }
}

/// What happened during one tick
#[derive(Debug, Default)]
pub struct TickReport {
    pub accepted: usize,
    pub rejected: usize,
    pub source_errors: usize,
    pub outcome: EvaluationOutcome,
    pub failure_raised: Option<Alert>,
    pub failure_cleared: Option<Alert>,
}

#[derive(Debug, Default)]
struct FailureStreak {
    count: u32,
    since: Option<DateTime<Utc>>,
    reported: bool,
}

pub struct MonitorLoop {
    source: Arc<dyn SampleSource>,
    handle: MonitorHandle,
    config: LoopConfig,
    validator: SampleValidator,
    streak: FailureStreak,
    metrics: Option<MonitorMetrics>,
    logger: Option<StructuredLogger>,
    health: Option<HealthRegistry>,
}

impl MonitorLoop {
    /// Run until a shutdown signal arrives
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            readings_per_tick = self.config.readings_per_tick,
            "Starting monitor loop"
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tick_count = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.tick(Utc::now()).await;
                    tick_count += 1;

                    if tick_count % 12 == 0 {
                        debug!(
                            ticks = tick_count,
                            accepted = report.accepted,
                            rejected = report.rejected,
                            source_errors = report.source_errors,
                            "Monitor tick complete"
                        );
                    }
                }
                _ = shutdown.recv() => {
                    info!("Shutting down monitor loop");
                    break;
                }
            }
        }
    }

    /// Pull readings, record them and evaluate at `now`
    pub async fn tick(&mut self, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();

        for _ in 0..self.config.readings_per_tick {
            match self.source.next_sample().await {
                Ok(reading) => {
                    report.failure_cleared = report.failure_cleared.or(self.reset_streak(now).await);

                    match self.validator.validate(reading, now) {
                        Ok(sample) => {
                            self.handle.record_sample(reading.metric, sample).await;
                            if let Some(metrics) = &self.metrics {
                                metrics.record_sample(reading.metric, sample.value);
                            }
                            report.accepted += 1;
                        }
                        Err(e) => {
                            if let Some(metrics) = &self.metrics {
                                metrics.inc_samples_rejected();
                            }
                            if let Some(logger) = &self.logger {
                                logger.log_sample_rejected(&e);
                            }
                            report.rejected += 1;
                        }
                    }
                }
                Err(e) => {
                    report.source_errors += 1;
                    if let Some(alert) = self.record_failure(&e, now).await {
                        report.failure_raised = Some(alert);
                    }
                }
            }
        }

        if let Some(telemetry) = self.source.telemetry(now).await {
            self.handle.update_telemetry(telemetry).await;
        }

        let started = Instant::now();
        report.outcome = self.handle.evaluate(now).await;
        if let Some(metrics) = &self.metrics {
            metrics.observe_evaluation_latency(started.elapsed().as_secs_f64());
        }

        if let Some(health) = &self.health {
            health.set_healthy(components::EVALUATOR).await;
            health.set_ready(true).await;
        }

        report
    }

    async fn record_failure(&mut self, error: &SampleError, now: DateTime<Utc>) -> Option<Alert> {
        self.streak.count += 1;
        let since = *self.streak.since.get_or_insert(now);

        if let Some(metrics) = &self.metrics {
            metrics.inc_sampler_errors();
        }
        if let Some(logger) = &self.logger {
            logger.log_sampler_error(error, self.streak.count);
        }

        let threshold = self.config.failure_threshold;
        if let Some(health) = &self.health {
            let message = format!("{} consecutive failed reads: {error}", self.streak.count);
            if self.streak.count >= threshold {
                health.set_unhealthy(components::SAMPLER, message).await;
            } else {
                health.set_degraded(components::SAMPLER, message).await;
            }
        }

        if self.streak.count < threshold || self.streak.reported {
            return None;
        }

        let report = FailureReport {
            reason: error.to_string(),
            since,
            consecutive_failures: self.streak.count,
            threshold,
        };
        self.streak.reported = true;
        self.handle.report_failure(&report, now).await
    }

    async fn reset_streak(&mut self, now: DateTime<Utc>) -> Option<Alert> {
        if self.streak.count == 0 {
            return None;
        }

        let reported = self.streak.reported;
        self.streak = FailureStreak::default();
        if let Some(health) = &self.health {
            health.set_healthy(components::SAMPLER).await;
        }

        if reported {
            self.handle.clear_failure(now).await
        } else {
            None
        }
    }
}

/// Builder for the monitor loop
#[derive(Default)]
pub struct MonitorLoopBuilder {
    source: Option<Arc<dyn SampleSource>>,
    handle: Option<MonitorHandle>,
    config: LoopConfig,
    metrics: Option<MonitorMetrics>,
    logger: Option<StructuredLogger>,
    health: Option<HealthRegistry>,
}

impl MonitorLoopBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, source: Arc<dyn SampleSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn handle(mut self, handle: MonitorHandle) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    pub fn readings_per_tick(mut self, readings: usize) -> Self {
        self.config.readings_per_tick = readings;
        self
    }

    pub fn failure_threshold(mut self, failures: u32) -> Self {
        self.config.failure_threshold = failures;
        self
    }

    pub fn metrics(mut self, metrics: MonitorMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn build(self) -> Result<MonitorLoop> {
        let source = self
            .source
            .ok_or_else(|| anyhow::anyhow!("Sample source is required"))?;
        let handle = self
            .handle
            .ok_or_else(|| anyhow::anyhow!("Monitor handle is required"))?;

        if self.config.interval.is_zero() {
            bail!("Evaluation interval must be greater than zero");
        }
        if self.config.readings_per_tick == 0 {
            bail!("At least one reading per tick is required");
        }
        if self.config.readings_per_tick > MetricKind::ALL.len() {
            bail!(
                "At most {} readings per tick are supported, got {}",
                MetricKind::ALL.len(),
                self.config.readings_per_tick
            );
        }
        if self.config.failure_threshold == 0 {
            bail!("Failure threshold must be at least 1");
        }

        Ok(MonitorLoop {
            source,
            handle,
            config: self.config,
            validator: SampleValidator::new(),
            streak: FailureStreak::default(),
            metrics: self.metrics,
            logger: self.logger,
            health: self.health,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{AlertType, NoopHook};
    use crate::config::MonitorConfig;
    use crate::health::ComponentStatus;
    use crate::models::MetricReading;
    use crate::monitor::AlertMonitor;
    use crate::sampler::{ScriptedSource, SimulatedSource};
    use chrono::TimeZone;

    fn t(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 2, 12, 0, 0).unwrap() + chrono::Duration::minutes(minute)
    }

    fn handle() -> MonitorHandle {
        MonitorHandle::new(AlertMonitor::new(MonitorConfig::default(), Arc::new(NoopHook)).unwrap())
    }

    fn co2(value: f64) -> MetricReading {
        MetricReading::new(MetricKind::Co2, value)
    }

    fn source_error() -> Result<MetricReading, SampleError> {
        Err(SampleError::Source("sensor bus timeout".into()))
    }

    fn build(source: ScriptedSource, handle: &MonitorHandle) -> MonitorLoop {
        MonitorLoopBuilder::new()
            .source(Arc::new(source))
            .handle(handle.clone())
            .readings_per_tick(1)
            .build()
            .unwrap()
    }

    #[test]
    fn test_loop_config_default() {
        let config = LoopConfig::default();
        assert_eq!(config.interval, Duration::from_secs(5));
        assert_eq!(config.readings_per_tick, 3);
        assert_eq!(config.failure_threshold, 3);
    }

    #[test]
    fn test_builder_requires_source_and_handle() {
        assert!(MonitorLoopBuilder::new().handle(handle()).build().is_err());
        assert!(MonitorLoopBuilder::new()
            .source(Arc::new(ScriptedSource::new([])))
            .build()
            .is_err());
        assert!(MonitorLoopBuilder::new()
            .source(Arc::new(ScriptedSource::new([])))
            .handle(handle())
            .failure_threshold(0)
            .build()
            .is_err());
    }

    #[test]
    fn test_builder_caps_readings_per_tick() {
        let build = |readings: usize| {
            MonitorLoopBuilder::new()
                .source(Arc::new(ScriptedSource::new([])))
                .handle(handle())
                .readings_per_tick(readings)
                .build()
        };

        assert!(build(0).is_err());
        assert!(build(3).is_ok());
        let err = build(6).err().unwrap();
        assert!(err.to_string().contains("At most 3 readings per tick"));
    }

    #[tokio::test]
    async fn test_full_round_is_accepted_with_telemetry() {
        let handle = handle();
        let mut monitor_loop = MonitorLoopBuilder::new()
            .source(Arc::new(SimulatedSource::new(Some(11)).with_critical_probability(0.0)))
            .handle(handle.clone())
            .build()
            .unwrap();

        for minute in 0..3 {
            let report = monitor_loop.tick(t(minute)).await;
            assert_eq!(report.accepted, 3);
            assert_eq!(report.rejected, 0);
        }

        let snapshot = handle.status_snapshot().await;
        assert!(snapshot.temperature.is_some());
        assert!(snapshot.humidity.is_some());
        assert!(snapshot.co2.is_some());
        assert!(snapshot.device.unwrap().last_rotation <= t(2));
    }

    #[tokio::test]
    async fn test_sustained_readings_raise_alert() {
        let handle = handle();
        let mut monitor_loop = build(ScriptedSource::new((0..=30).map(|_| co2(650.0))), &handle);

        for minute in 0..30 {
            let report = monitor_loop.tick(t(minute)).await;
            assert_eq!(report.accepted, 1);
            assert!(report.outcome.raised.is_empty());
        }

        let report = monitor_loop.tick(t(30)).await;
        assert_eq!(report.outcome.raised.len(), 1);
        assert_eq!(report.outcome.raised[0].alert_type, AlertType::Co2High);
        assert_eq!(handle.active().await.len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_reading_is_not_a_failure() {
        let handle = handle();
        let mut monitor_loop = build(
            ScriptedSource::new([co2(f64::INFINITY), co2(f64::NAN), co2(f64::NAN), co2(450.0)]),
            &handle,
        );

        for minute in 0..3 {
            let report = monitor_loop.tick(t(minute)).await;
            assert_eq!(report.rejected, 1);
            assert!(report.failure_raised.is_none());
        }
        monitor_loop.tick(t(3)).await;

        assert!(handle.all().await.is_empty());
        assert_eq!(handle.read().await.latest(MetricKind::Co2).unwrap().value, 450.0);
    }

    #[tokio::test]
    async fn test_consecutive_failures_raise_and_clear_system_failure() {
        let handle = handle();
        let health = HealthRegistry::for_monitor().await;
        let mut monitor_loop = MonitorLoopBuilder::new()
            .source(Arc::new(ScriptedSource::with_results([
                source_error(),
                source_error(),
                source_error(),
                source_error(),
                Ok(co2(450.0)),
            ])))
            .handle(handle.clone())
            .readings_per_tick(1)
            .health(health.clone())
            .build()
            .unwrap();

        assert!(monitor_loop.tick(t(0)).await.failure_raised.is_none());
        assert!(monitor_loop.tick(t(1)).await.failure_raised.is_none());
        let sampler = health.component(components::SAMPLER).await.unwrap();
        assert_eq!(sampler.status, ComponentStatus::Degraded);

        let alert = monitor_loop.tick(t(2)).await.failure_raised.unwrap();
        assert_eq!(alert.alert_type, AlertType::SystemFailure);
        assert_eq!(alert.start_time, t(0));
        assert_eq!(alert.value, 3.0);
        assert!(!health.readiness().await.ready);

        // Still failing: no duplicate alert
        assert!(monitor_loop.tick(t(3)).await.failure_raised.is_none());

        let cleared = monitor_loop.tick(t(4)).await.failure_cleared.unwrap();
        assert_eq!(cleared.id, alert.id);
        assert_eq!(cleared.resolved_time, Some(t(4)));
        assert!(handle.active().await.is_empty());
        assert!(health.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_short_failure_streak_leaves_no_alert() {
        let handle = handle();
        let mut monitor_loop = build(
            ScriptedSource::with_results([source_error(), source_error(), Ok(co2(450.0))]),
            &handle,
        );

        for minute in 0..3 {
            let report = monitor_loop.tick(t(minute)).await;
            assert!(report.failure_raised.is_none());
            assert!(report.failure_cleared.is_none());
        }
        assert!(handle.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let handle = handle();
        let monitor_loop = MonitorLoopBuilder::new()
            .source(Arc::new(ScriptedSource::new((0..100).map(|_| co2(450.0)))))
            .handle(handle.clone())
            .interval(Duration::from_millis(10))
            .readings_per_tick(1)
            .build()
            .unwrap();

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(monitor_loop.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
        assert!(handle.read().await.latest(MetricKind::Co2).is_some());
    }
}

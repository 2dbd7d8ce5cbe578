//! Sustained-breach alert evaluation
//!
//! On each tick every rule is checked against its metric's history:
//! - Raise when the trailing run of breaching samples reaches back at least
//!   the sustained duration
//! - Resolve an open alert as soon as the latest sample clears the bound
//!
//! Triggering needs the whole window, resolution only the latest sample.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{Alert, AlertRegistry, AlertRule};
use crate::history::MetricHistory;

/// Alerts changed by one evaluation tick
#[derive(Debug, Clone, Default)]
pub struct EvaluationOutcome {
    pub raised: Vec<Alert>,
    pub resolved: Vec<Alert>,
}

impl EvaluationOutcome {
    pub fn is_empty(&self) -> bool {
        self.raised.is_empty() && self.resolved.is_empty()
    }
}

/// Evaluates threshold rules against recorded history
#[derive(Debug, Clone)]
pub struct AlertEvaluator {
    rules: Vec<AlertRule>,
}

impl AlertEvaluator {
    pub fn new(rules: Vec<AlertRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[AlertRule] {
        &self.rules
    }

    /// Run one evaluation tick at `now`
    pub fn evaluate(
        &self,
        history: &MetricHistory,
        registry: &mut AlertRegistry,
        now: DateTime<Utc>,
    ) -> EvaluationOutcome {
        let mut outcome = EvaluationOutcome::default();

        for rule in &self.rules {
            if registry.unresolved_of(rule.alert_type).is_some() {
                continue;
            }
            if let Some(alert) = self.check_trigger(rule, history, now) {
                debug!(
                    alert_type = %alert.alert_type,
                    start_time = %alert.start_time,
                    value = alert.value,
                    "Sustained breach detected"
                );
                registry.push(alert.clone());
                outcome.raised.push(alert);
            }
        }

        let cleared: Vec<String> = registry
            .active()
            .into_iter()
            .filter(|alert| self.has_cleared(alert, history))
            .map(|alert| alert.id.clone())
            .collect();

        for id in cleared {
            if let Some(alert) = registry.resolve(&id, now) {
                outcome.resolved.push(alert.clone());
            }
        }

        outcome
    }

    fn check_trigger(
        &self,
        rule: &AlertRule,
        history: &MetricHistory,
        now: DateTime<Utc>,
    ) -> Option<Alert> {
        let buffer = history.buffer(rule.metric)?;
        let latest = buffer.latest()?;
        let run_start = buffer.trailing_run_start(|v| rule.breaches(v))?;

        // The breach must have held continuously across the whole window
        if run_start.timestamp > now - rule.sustained {
            return None;
        }

        Some(Alert::new(
            rule.alert_type,
            rule.message(),
            latest.value,
            rule.bound.value(),
            run_start.timestamp,
            now,
        ))
    }

    fn has_cleared(&self, alert: &Alert, history: &MetricHistory) -> bool {
        let Some(rule) = self.rules.iter().find(|r| r.alert_type == alert.alert_type) else {
            return false;
        };
        history
            .latest(rule.metric)
            .map(|sample| rule.clears(sample.value))
            .unwrap_or(false)
    }
}

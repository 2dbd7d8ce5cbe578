//! Append-only alert registry
//!
//! Holds every alert raised in the session in creation order. Alerts are
//! never removed; only the evaluator (resolution) and acknowledgement
//! mutate them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Alert, AlertType};

/// Result of an acknowledge request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcknowledgeOutcome {
    /// The alert was unacknowledged and now is acknowledged
    Acknowledged,
    /// No change, the alert was already acknowledged
    AlreadyAcknowledged,
    /// No change, no alert has this id
    NotFound,
}

/// Alert counts for dashboards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub total: usize,
    pub active: usize,
    pub unacknowledged: usize,
    pub resolved: usize,
}

#[derive(Debug, Default, Clone)]
pub struct AlertRegistry {
    alerts: Vec<Alert>,
}

impl AlertRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, alert: Alert) {
        self.alerts.push(alert);
    }

    /// Set `resolved_time` once; returns the alert if it changed
    pub(crate) fn resolve(&mut self, id: &str, now: DateTime<Utc>) -> Option<&Alert> {
        let alert = self
            .alerts
            .iter_mut()
            .find(|a| a.id == id && a.resolved_time.is_none())?;
        alert.resolved_time = Some(now);
        Some(&*alert)
    }

    pub(crate) fn acknowledge(&mut self, id: &str) -> (AcknowledgeOutcome, Option<&Alert>) {
        match self.alerts.iter_mut().find(|a| a.id == id) {
            None => (AcknowledgeOutcome::NotFound, None),
            Some(alert) if alert.acknowledged => (AcknowledgeOutcome::AlreadyAcknowledged, None),
            Some(alert) => {
                alert.acknowledged = true;
                (AcknowledgeOutcome::Acknowledged, Some(&*alert))
            }
        }
    }

    /// The unresolved alert of a given type, if any
    pub fn unresolved_of(&self, alert_type: AlertType) -> Option<&Alert> {
        self.alerts
            .iter()
            .find(|a| a.alert_type == alert_type && a.is_active())
    }

    pub fn get(&self, id: &str) -> Option<&Alert> {
        self.alerts.iter().find(|a| a.id == id)
    }

    /// Alerts without a resolution time, oldest first
    pub fn active(&self) -> Vec<&Alert> {
        self.alerts.iter().filter(|a| a.is_active()).collect()
    }

    pub fn unacknowledged(&self) -> Vec<&Alert> {
        self.alerts
            .iter()
            .filter(|a| a.is_active() && !a.acknowledged)
            .collect()
    }

    pub fn resolved(&self) -> Vec<&Alert> {
        self.alerts.iter().filter(|a| a.is_resolved()).collect()
    }

    /// Every alert, newest first
    pub fn all(&self) -> Vec<&Alert> {
        self.alerts.iter().rev().collect()
    }

    pub fn summary(&self) -> AlertSummary {
        let mut summary = AlertSummary {
            total: self.alerts.len(),
            ..AlertSummary::default()
        };
        for alert in &self.alerts {
            if alert.is_resolved() {
                summary.resolved += 1;
            } else {
                summary.active += 1;
                if !alert.acknowledged {
                    summary.unacknowledged += 1;
                }
            }
        }
        summary
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

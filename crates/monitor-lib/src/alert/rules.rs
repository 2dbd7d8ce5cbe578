//! Threshold rules derived from the alert configuration

use chrono::Duration;

use super::AlertType;
use crate::config::AlertThresholds;
use crate::models::MetricKind;

/// Direction and value of a threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// Breached at or above the value
    High(f64),
    /// Breached at or below the value
    Low(f64),
}

impl Bound {
    pub fn value(&self) -> f64 {
        match self {
            Bound::High(v) | Bound::Low(v) => *v,
        }
    }
}

/// One metric+direction check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertRule {
    pub alert_type: AlertType,
    pub metric: MetricKind,
    pub bound: Bound,
    pub sustained: Duration,
}

impl AlertRule {
    /// Whether a reading counts towards a breach
    pub fn breaches(&self, value: f64) -> bool {
        match self.bound {
            Bound::High(high) => value >= high,
            Bound::Low(low) => value <= low,
        }
    }

    /// Whether a reading clears a raised alert
    pub fn clears(&self, value: f64) -> bool {
        match self.bound {
            Bound::High(high) => value < high,
            Bound::Low(low) => value > low,
        }
    }

    /// Human-readable description of the breach
    pub fn message(&self) -> String {
        let unit = self.metric.unit();
        let minutes = self.sustained.num_minutes();
        match (self.alert_type, self.bound) {
            (AlertType::Co2High, Bound::High(high)) => format!(
                "CO₂ >= {high} {unit} for more than {minutes} minutes (optimal: 300-500 {unit})"
            ),
            (_, Bound::High(high)) => {
                format!("Temperature >= {high}{unit} for more than {minutes} minutes")
            }
            (_, Bound::Low(low)) => {
                format!("Temperature <= {low}{unit} for more than {minutes} minutes")
            }
        }
    }

    /// Build the rule set for the configured thresholds
    pub fn from_thresholds(thresholds: &AlertThresholds) -> Vec<AlertRule> {
        let mut rules = Vec::with_capacity(3);

        let temperature = &thresholds.temperature;
        if let Some(high) = temperature.high {
            rules.push(AlertRule {
                alert_type: AlertType::TemperatureHigh,
                metric: MetricKind::Temperature,
                bound: Bound::High(high),
                sustained: temperature.sustained(),
            });
        }
        if let Some(low) = temperature.low {
            rules.push(AlertRule {
                alert_type: AlertType::TemperatureLow,
                metric: MetricKind::Temperature,
                bound: Bound::Low(low),
                sustained: temperature.sustained(),
            });
        }
        if let Some(high) = thresholds.co2.high {
            rules.push(AlertRule {
                alert_type: AlertType::Co2High,
                metric: MetricKind::Co2,
                bound: Bound::High(high),
                sustained: thresholds.co2.sustained(),
            });
        }

        rules
    }
}

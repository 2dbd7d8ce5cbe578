//! Overall incubator status from the latest climate readings
//!
//! Independent of alerting: the status reacts to single readings and uses
//! tighter bands than the alert thresholds.

use serde::{Deserialize, Serialize};

/// Temperature band (°C) outside which the status is critical
const CRITICAL_TEMPERATURE: (f64, f64) = (37.2, 37.8);
/// Temperature band (°C) outside which the status is at least a warning
const WARNING_TEMPERATURE: (f64, f64) = (37.4, 37.6);
/// Humidity band (%) outside which the status is critical
const CRITICAL_HUMIDITY: (f64, f64) = (50.0, 70.0);
/// Humidity band (%) outside which the status is at least a warning
const WARNING_HUMIDITY: (f64, f64) = (55.0, 65.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemStatus {
    Optimal,
    Warning,
    Critical,
}

impl SystemStatus {
    /// Classify a temperature/humidity pair, most severe band first
    pub fn classify(temperature: f64, humidity: f64) -> Self {
        if outside(temperature, CRITICAL_TEMPERATURE) || outside(humidity, CRITICAL_HUMIDITY) {
            SystemStatus::Critical
        } else if outside(temperature, WARNING_TEMPERATURE) || outside(humidity, WARNING_HUMIDITY) {
            SystemStatus::Warning
        } else {
            SystemStatus::Optimal
        }
    }
}

impl std::fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SystemStatus::Optimal => write!(f, "optimal"),
            SystemStatus::Warning => write!(f, "warning"),
            SystemStatus::Critical => write!(f, "critical"),
        }
    }
}

fn outside(value: f64, (low, high): (f64, f64)) -> bool {
    value < low || value > high
}

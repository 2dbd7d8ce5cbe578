//! Alert records and their classification

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::MetricKind;

/// Alert severity levels, ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Critical,
    Emergency,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Warning => write!(f, "warning"),
            AlertSeverity::Critical => write!(f, "critical"),
            AlertSeverity::Emergency => write!(f, "emergency"),
        }
    }
}

/// Alert type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    TemperatureHigh,
    TemperatureLow,
    Co2High,
    SystemFailure,
}

impl AlertType {
    /// Fixed severity for each alert type
    pub fn severity(&self) -> AlertSeverity {
        match self {
            AlertType::TemperatureHigh | AlertType::TemperatureLow => AlertSeverity::Emergency,
            AlertType::Co2High => AlertSeverity::Critical,
            AlertType::SystemFailure => AlertSeverity::Warning,
        }
    }

    /// Metric watched by this alert type, if any
    pub fn metric(&self) -> Option<MetricKind> {
        match self {
            AlertType::TemperatureHigh | AlertType::TemperatureLow => Some(MetricKind::Temperature),
            AlertType::Co2High => Some(MetricKind::Co2),
            AlertType::SystemFailure => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AlertType::TemperatureHigh => "CRITICAL HIGH TEMPERATURE",
            AlertType::TemperatureLow => "CRITICAL LOW TEMPERATURE",
            AlertType::Co2High => "HIGH CO₂ LEVEL",
            AlertType::SystemFailure => "SYSTEM FAILURE",
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertType::TemperatureHigh => write!(f, "temperature_high"),
            AlertType::TemperatureLow => write!(f, "temperature_low"),
            AlertType::Co2High => write!(f, "co2_high"),
            AlertType::SystemFailure => write!(f, "system_failure"),
        }
    }
}

/// Presentation state of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
}

/// A raised alert
///
/// `value`, `threshold` and `duration_minutes` are snapshots taken when the
/// alert was raised. Only `acknowledged` and `resolved_time` change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    pub value: f64,
    pub threshold: f64,
    /// Timestamp of the earliest sample of the breach
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub acknowledged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_time: Option<DateTime<Utc>>,
}

impl Alert {
    /// Create an unacknowledged, unresolved alert with a fresh id
    pub fn new(
        alert_type: AlertType,
        message: String,
        value: f64,
        threshold: f64,
        start_time: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            alert_type,
            severity: alert_type.severity(),
            title: alert_type.title().to_string(),
            message,
            value,
            threshold,
            start_time,
            duration_minutes: round_minutes(now - start_time),
            acknowledged: false,
            resolved_time: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_time.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.resolved_time.is_none()
    }

    pub fn status(&self) -> AlertStatus {
        if self.is_resolved() {
            AlertStatus::Resolved
        } else if self.acknowledged {
            AlertStatus::Acknowledged
        } else {
            AlertStatus::Active
        }
    }

    /// Time the condition has lasted, frozen at resolution
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        self.resolved_time.unwrap_or(now) - self.start_time
    }

    /// Elapsed time in whole minutes, rounded to nearest
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> i64 {
        round_minutes(self.elapsed(now))
    }
}

fn round_minutes(duration: Duration) -> i64 {
    (duration.num_seconds() as f64 / 60.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(AlertType::TemperatureHigh.severity(), AlertSeverity::Emergency);
        assert_eq!(AlertType::TemperatureLow.severity(), AlertSeverity::Emergency);
        assert_eq!(AlertType::Co2High.severity(), AlertSeverity::Critical);
        assert_eq!(AlertType::SystemFailure.severity(), AlertSeverity::Warning);
        assert!(AlertSeverity::Emergency > AlertSeverity::Critical);
    }

    #[test]
    fn test_new_alert_snapshot() {
        let alert = Alert::new(
            AlertType::Co2High,
            "CO₂ high".to_string(),
            650.0,
            600.0,
            t0(),
            t0() + Duration::seconds(31 * 60 + 40),
        );

        assert_eq!(alert.severity, AlertSeverity::Critical);
        assert_eq!(alert.duration_minutes, 32);
        assert!(!alert.acknowledged);
        assert_eq!(alert.status(), AlertStatus::Active);
        assert!(!alert.id.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Alert::new(AlertType::SystemFailure, String::new(), 0.0, 0.0, t0(), t0());
        let b = Alert::new(AlertType::SystemFailure, String::new(), 0.0, 0.0, t0(), t0());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_elapsed_freezes_at_resolution() {
        let mut alert = Alert::new(
            AlertType::TemperatureHigh,
            String::new(),
            40.5,
            40.0,
            t0(),
            t0() + Duration::minutes(60),
        );
        assert_eq!(alert.elapsed_minutes(t0() + Duration::minutes(65)), 65);

        alert.resolved_time = Some(t0() + Duration::minutes(70));
        assert_eq!(alert.elapsed_minutes(t0() + Duration::minutes(200)), 70);
    }

    #[test]
    fn test_status_resolved_wins_over_acknowledged() {
        let mut alert = Alert::new(AlertType::Co2High, String::new(), 650.0, 600.0, t0(), t0());
        alert.acknowledged = true;
        assert_eq!(alert.status(), AlertStatus::Acknowledged);
        alert.resolved_time = Some(t0());
        assert_eq!(alert.status(), AlertStatus::Resolved);
    }

    #[test]
    fn test_serialization_uses_snake_case() {
        let alert = Alert::new(AlertType::TemperatureLow, String::new(), 34.1, 35.0, t0(), t0());
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["alert_type"], "temperature_low");
        assert_eq!(json["severity"], "emergency");
        assert!(json.get("resolved_time").is_none());
    }
}

//! Static alert configuration
//!
//! Thresholds and the evaluation period are fixed when the monitor is built
//! and never change at runtime.

use std::time::Duration as StdDuration;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::MetricKind;

/// Default evaluation period
const DEFAULT_EVALUATION_INTERVAL_SECS: u64 = 5;

/// Bounds and sustained duration for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    /// Minutes a breach must persist before an alert is raised
    pub sustained_minutes: u32,
}

impl ThresholdConfig {
    pub fn sustained(&self) -> Duration {
        Duration::minutes(i64::from(self.sustained_minutes))
    }

    fn validate(&self, metric: MetricKind) -> Result<(), ConfigError> {
        if self.sustained_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                field: format!("thresholds.{metric}.sustained_minutes"),
                reason: "must be greater than zero".into(),
            });
        }

        for (name, bound) in [("high", self.high), ("low", self.low)] {
            if let Some(value) = bound {
                if !value.is_finite() {
                    return Err(ConfigError::InvalidValue {
                        field: format!("thresholds.{metric}.{name}"),
                        reason: "must be a finite number".into(),
                    });
                }
            }
        }

        if let (Some(low), Some(high)) = (self.low, self.high) {
            if low >= high {
                return Err(ConfigError::InvertedBounds { metric, low, high });
            }
        }

        Ok(())
    }
}

/// Alert thresholds for the incubator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub temperature: ThresholdConfig,
    pub co2: ThresholdConfig,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            temperature: ThresholdConfig {
                high: Some(40.0),
                low: Some(35.0),
                sustained_minutes: 60,
            },
            co2: ThresholdConfig {
                high: Some(600.0),
                low: None,
                sustained_minutes: 30,
            },
        }
    }
}

impl AlertThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.temperature.validate(MetricKind::Temperature)?;
        self.co2.validate(MetricKind::Co2)
    }

    /// Threshold configuration for a metric, if it is alerted on
    pub fn for_metric(&self, metric: MetricKind) -> Option<&ThresholdConfig> {
        match metric {
            MetricKind::Temperature => Some(&self.temperature),
            MetricKind::Co2 => Some(&self.co2),
            MetricKind::Humidity => None,
        }
    }
}

/// Alert monitor configuration
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub thresholds: AlertThresholds,
    /// Period between evaluation ticks
    pub evaluation_interval: StdDuration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            thresholds: AlertThresholds::default(),
            evaluation_interval: StdDuration::from_secs(DEFAULT_EVALUATION_INTERVAL_SECS),
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.evaluation_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "evaluation_interval".into(),
                reason: "must be greater than zero".into(),
            });
        }
        self.thresholds.validate()
    }

    /// History retention for a metric: its sustained window plus one
    /// evaluation period
    pub fn retention(&self, metric: MetricKind) -> Duration {
        let period = Duration::from_std(self.evaluation_interval).unwrap_or(Duration::zero());
        let window = self
            .thresholds
            .for_metric(metric)
            .map(ThresholdConfig::sustained)
            .unwrap_or_else(Duration::zero);
        window + period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_incubator_limits() {
        let config = MonitorConfig::default();
        assert_eq!(config.thresholds.temperature.high, Some(40.0));
        assert_eq!(config.thresholds.temperature.low, Some(35.0));
        assert_eq!(config.thresholds.temperature.sustained_minutes, 60);
        assert_eq!(config.thresholds.co2.high, Some(600.0));
        assert_eq!(config.thresholds.co2.sustained_minutes, 30);
        assert_eq!(config.evaluation_interval, StdDuration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_retention_covers_window_plus_period() {
        let config = MonitorConfig::default();
        assert_eq!(
            config.retention(MetricKind::Temperature),
            Duration::minutes(60) + Duration::seconds(5)
        );
        assert_eq!(
            config.retention(MetricKind::Co2),
            Duration::minutes(30) + Duration::seconds(5)
        );
        assert_eq!(config.retention(MetricKind::Humidity), Duration::seconds(5));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut config = MonitorConfig::default();
        config.thresholds.temperature.low = Some(41.0);

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvertedBounds { metric: MetricKind::Temperature, .. }));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let mut config = MonitorConfig::default();
        config.thresholds.co2.sustained_minutes = 0;
        assert!(config.validate().is_err());

        let config = MonitorConfig {
            evaluation_interval: StdDuration::ZERO,
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_thresholds_deserialize() {
        let json = r#"{
            "temperature": {"high": 39.5, "low": 36.0, "sustained_minutes": 45},
            "co2": {"high": 700.0, "sustained_minutes": 20}
        }"#;
        let thresholds: AlertThresholds = serde_json::from_str(json).unwrap();
        assert_eq!(thresholds.temperature.high, Some(39.5));
        assert_eq!(thresholds.co2.low, None);
        assert_eq!(thresholds.co2.sustained(), Duration::minutes(20));
    }
}

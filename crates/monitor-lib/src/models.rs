//! Core data models for the incubator monitor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Environmental metric reported by the incubator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Air temperature in °C
    Temperature,
    /// Relative humidity in %
    Humidity,
    /// CO2 concentration in ppm
    Co2,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [MetricKind::Temperature, MetricKind::Humidity, MetricKind::Co2];

    /// Unit suffix used in alert messages
    pub fn unit(&self) -> &'static str {
        match self {
            MetricKind::Temperature => "°C",
            MetricKind::Humidity => "%",
            MetricKind::Co2 => "ppm",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricKind::Temperature => write!(f, "temperature"),
            MetricKind::Humidity => write!(f, "humidity"),
            MetricKind::Co2 => write!(f, "co2"),
        }
    }
}

/// One reading of one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Untimestamped reading produced by a sample source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    pub metric: MetricKind,
    pub value: f64,
}

impl MetricReading {
    pub fn new(metric: MetricKind, value: f64) -> Self {
        Self { metric, value }
    }

    /// Stamp the reading with its ingestion time
    pub fn at(self, timestamp: DateTime<Utc>) -> Sample {
        Sample::new(timestamp, self.value)
    }
}

/// Device housekeeping data shown alongside the environmental readings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceTelemetry {
    /// Battery charge in %
    pub battery_level: f64,
    /// Wi-Fi signal strength in %
    pub wifi_strength: f64,
    /// Last automatic egg rotation
    pub last_rotation: DateTime<Utc>,
}

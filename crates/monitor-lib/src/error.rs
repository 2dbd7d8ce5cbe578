//! Error types for the incubator monitor
//!
//! Configuration problems and rejected samples are the only failure modes of
//! the alert core. Acknowledging an unknown alert is not an error.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::MetricKind;

/// Invalid static configuration
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// A threshold pair where the low bound is not below the high bound
    #[error("{metric} thresholds inverted: low {low} must be below high {high}")]
    InvertedBounds {
        metric: MetricKind,
        low: f64,
        high: f64,
    },

    /// A value outside its accepted range
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Rejections raised at the sampler boundary
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SampleError {
    /// NaN or infinite reading
    #[error("{metric} reading is not a finite number: {value}")]
    NonFinite { metric: MetricKind, value: f64 },

    /// Timestamp not strictly after the last accepted sample of the metric
    #[error("{metric} sample at {timestamp} is not after previous sample at {previous}")]
    OutOfOrder {
        metric: MetricKind,
        timestamp: DateTime<Utc>,
        previous: DateTime<Utc>,
    },

    /// The source has no more readings to give
    #[error("sample source exhausted")]
    Exhausted,

    /// The underlying device or simulator failed
    #[error("sample source failed: {0}")]
    Source(String),
}

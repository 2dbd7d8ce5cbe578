//! Environmental alert monitor for a smart egg incubator
//!
//! This crate provides the core functionality for:
//! - Per-metric sample history with time-based retention
//! - Sustained-breach alert evaluation and the alert registry
//! - Sample sources (simulated and scripted) with boundary validation
//! - The periodic monitor loop
//! - Health checks and observability

pub mod alert;
pub mod config;
pub mod error;
pub mod health;
pub mod history;
pub mod models;
pub mod monitor;
pub mod observability;
pub mod runner;
pub mod sampler;
pub mod status;

pub use alert::{
    AcknowledgeOutcome, Alert, AlertHook, AlertSeverity, AlertStatus, AlertSummary, AlertType,
    NoopHook,
};
pub use config::{AlertThresholds, MonitorConfig, ThresholdConfig};
pub use error::{ConfigError, SampleError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use monitor::{AlertMonitor, FailureReport, MonitorHandle, StatusSnapshot};
pub use observability::{LoggingHook, MonitorMetrics, StructuredLogger};
pub use runner::{MonitorLoop, MonitorLoopBuilder};
pub use sampler::{SampleSource, SampleValidator, ScriptedSource, SimulatedSource};
pub use status::SystemStatus;

//! Environmental alerting for the incubator
//!
//! This module provides:
//! - Alert records with fixed per-type severity
//! - Threshold rules derived from configuration
//! - Sustained-breach evaluation with instantaneous resolution
//! - The append-only alert registry and lifecycle hooks

mod evaluator;
mod hook;
mod registry;
mod rules;
mod types;

pub use evaluator::{AlertEvaluator, EvaluationOutcome};
pub use hook::{AlertHook, NoopHook};
pub use registry::{AcknowledgeOutcome, AlertRegistry, AlertSummary};
pub use rules::{AlertRule, Bound};
pub use types::{Alert, AlertSeverity, AlertStatus, AlertType};

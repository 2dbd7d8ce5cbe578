//! Notification hooks for alert lifecycle events

use super::Alert;

/// Receives alert lifecycle notifications from the monitor
///
/// Hooks are called while the monitor state is locked, so implementations
/// must not block.
pub trait AlertHook: Send + Sync {
    fn alert_raised(&self, _alert: &Alert) {}

    fn alert_resolved(&self, _alert: &Alert) {}

    /// Called once per alert, on its first acknowledgement
    fn alert_acknowledged(&self, alert: &Alert);
}

/// Hook that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl AlertHook for NoopHook {
    fn alert_acknowledged(&self, _alert: &Alert) {}
}

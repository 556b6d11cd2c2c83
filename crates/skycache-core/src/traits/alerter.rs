// # Alerter Trait
//
// Defines the interface for user-facing failure notifications.
//
// Alerts are fire-and-forget modal notices with a single "OK"
// acknowledgement. The core never waits on or reads back the outcome.

/// A user-facing notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Short title
    pub title: String,
    /// Body text
    pub message: String,
}

impl Alert {
    /// Label of the single acknowledgement button
    pub const ACKNOWLEDGE: &'static str = "OK";

    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Trait for alert sinks
///
/// `alert` must not block: implementations that need I/O hand the alert
/// off and return immediately.
pub trait Alerter: Send + Sync {
    /// Surface an alert to the user
    fn alert(&self, alert: &Alert);
}

/// Alerter that writes alerts to the log
///
/// Used by headless deployments where there is no user to show a modal to.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlerter;

impl Alerter for LogAlerter {
    fn alert(&self, alert: &Alert) {
        tracing::warn!(title = %alert.title, "{} [{}]", alert.message, Alert::ACKNOWLEDGE);
    }
}

/// Alerter that discards every alert
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAlerter;

impl Alerter for NullAlerter {
    fn alert(&self, _alert: &Alert) {}
}

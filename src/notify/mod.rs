//! Alert delivery: the cooldown gate and its delivery collaborators.

pub mod gate;
pub mod sinks;

// Re-export commonly used types
pub use gate::{EmailSink, NotificationSink, NotifierGate, NotifyError, ALERT_TITLE};
pub use sinks::{ConsoleNotifier, LimitAlertMessage, OutboxMailer};

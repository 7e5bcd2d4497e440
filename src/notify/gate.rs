//! Debounced alert delivery.
//!
//! [`NotifierGate`] is the only path from usage evaluation to the outside
//! world. It keeps the per-application cooldown state and decides whether
//! an alert fires; delivery failures are logged and never escape.

use crate::core::catalog::display_name;
use crate::core::clock::SharedClock;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

/// Title used for every local notification.
pub const ALERT_TITLE: &str = "⏰ Screen Time Alert";

/// Errors from a delivery collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The transport rejected or failed to deliver the message
    Delivery(String),
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyError::Delivery(e) => write!(f, "Delivery failed: {e}"),
        }
    }
}

impl std::error::Error for NotifyError {}

/// Local desktop notifications.
pub trait NotificationSink: Send {
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError>;
}

/// Email delivery for limit breaches.
pub trait EmailSink: Send {
    fn send_limit_alert(
        &self,
        application_id: &str,
        usage_minutes: f64,
        profile_name: &str,
    ) -> Result<(), NotifyError>;
}

/// Cooldown-gated alert dispatcher. One instance per process.
pub struct NotifierGate {
    clock: SharedClock,
    cooldown: Duration,
    last_fired: HashMap<String, DateTime<Utc>>,
    notifications: Option<Box<dyn NotificationSink>>,
    email: Option<Box<dyn EmailSink>>,
    profile_name: String,
}

impl NotifierGate {
    /// Create a gate with no sinks attached and an empty throttle map.
    pub fn new(clock: SharedClock, cooldown: Duration) -> Self {
        Self {
            clock,
            cooldown,
            last_fired: HashMap::new(),
            notifications: None,
            email: None,
            profile_name: String::new(),
        }
    }

    pub fn with_notification_sink(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.notifications = Some(sink);
        self
    }

    pub fn with_email_sink(mut self, sink: Box<dyn EmailSink>) -> Self {
        self.email = Some(sink);
        self
    }

    /// Profile named in limit emails.
    pub fn set_profile_name(&mut self, name: &str) {
        self.profile_name = name.to_string();
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Last time an alert fired for this application.
    pub fn last_fired(&self, application_id: &str) -> Option<DateTime<Utc>> {
        self.last_fired.get(application_id).copied()
    }

    /// Fire an alert unless the application is still cooling down.
    ///
    /// The cooldown applies to every alert; `is_limit_reached` only adds
    /// the email delivery. Returns whether the alert fired.
    pub fn maybe_notify(
        &mut self,
        application_id: &str,
        usage_minutes: f64,
        is_limit_reached: bool,
    ) -> bool {
        let now = self.clock.now();

        if !self.cooled_down(application_id, now) {
            return false;
        }
        self.last_fired.insert(application_id.to_string(), now);

        let name = display_name(application_id);
        let message = if is_limit_reached {
            format!("⚠️ Time limit reached for {name}! Please close the application.")
        } else {
            format!("You've been using {name} for {usage_minutes:.1} minutes.\nTime for a quick break! 🎯")
        };

        info!(
            "Alert for {} ({:.1} min, limit reached: {})",
            application_id, usage_minutes, is_limit_reached
        );

        if let Some(ref sink) = self.notifications {
            if let Err(e) = sink.notify(ALERT_TITLE, &message) {
                warn!("Local notification for {} failed: {}", application_id, e);
            }
        }

        if is_limit_reached {
            if let Some(ref sink) = self.email {
                if let Err(e) =
                    sink.send_limit_alert(application_id, usage_minutes, &self.profile_name)
                {
                    warn!("Limit email for {} failed: {}", application_id, e);
                }
            }
        }

        true
    }

    fn cooled_down(&self, application_id: &str, now: DateTime<Utc>) -> bool {
        match self.last_fired.get(application_id) {
            None => true,
            Some(&last) => {
                let since = (now - last).to_std().unwrap_or(Duration::ZERO);
                since > self.cooldown
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder {
        notes: Arc<Mutex<Vec<String>>>,
        emails: Arc<Mutex<Vec<(String, String)>>>,
        fail: bool,
    }

    impl NotificationSink for Recorder {
        fn notify(&self, _title: &str, message: &str) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Delivery("offline".to_string()));
            }
            self.notes.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    impl EmailSink for Recorder {
        fn send_limit_alert(
            &self,
            application_id: &str,
            _usage_minutes: f64,
            profile_name: &str,
        ) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Delivery("smtp down".to_string()));
            }
            self.emails
                .lock()
                .unwrap()
                .push((application_id.to_string(), profile_name.to_string()));
            Ok(())
        }
    }

    fn gate(clock: &ManualClock, recorder: &Recorder) -> NotifierGate {
        NotifierGate::new(Arc::new(clock.clone()), Duration::from_secs(60))
            .with_notification_sink(Box::new(recorder.clone()))
            .with_email_sink(Box::new(recorder.clone()))
    }

    #[test]
    fn test_within_cooldown_delivers_once() {
        let clock = ManualClock::default();
        let recorder = Recorder::default();
        let mut gate = gate(&clock, &recorder);

        assert!(gate.maybe_notify("chrome.exe", 1.0, false));
        clock.advance(Duration::from_secs(30));
        assert!(!gate.maybe_notify("chrome.exe", 1.5, false));

        assert_eq!(recorder.notes.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_beyond_cooldown_delivers_twice() {
        let clock = ManualClock::default();
        let recorder = Recorder::default();
        let mut gate = gate(&clock, &recorder);

        assert!(gate.maybe_notify("chrome.exe", 1.0, false));
        clock.advance(Duration::from_secs(61));
        assert!(gate.maybe_notify("chrome.exe", 2.0, false));

        assert_eq!(recorder.notes.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_exactly_cooldown_is_still_throttled() {
        let clock = ManualClock::default();
        let recorder = Recorder::default();
        let mut gate = gate(&clock, &recorder);

        gate.maybe_notify("vlc.exe", 1.0, false);
        clock.advance(Duration::from_secs(60));
        assert!(!gate.maybe_notify("vlc.exe", 2.0, false));
    }

    #[test]
    fn test_cooldown_is_per_application() {
        let clock = ManualClock::default();
        let recorder = Recorder::default();
        let mut gate = gate(&clock, &recorder);

        assert!(gate.maybe_notify("chrome.exe", 1.0, false));
        assert!(gate.maybe_notify("slack.exe", 1.0, false));
    }

    #[test]
    fn test_email_only_for_limit_alerts() {
        let clock = ManualClock::default();
        let recorder = Recorder::default();
        let mut gate = gate(&clock, &recorder);
        gate.set_profile_name("Kids Profile");

        assert!(gate.maybe_notify("steam.exe", 1.0, false));
        assert!(recorder.emails.lock().unwrap().is_empty());

        clock.advance(Duration::from_secs(61));
        assert!(gate.maybe_notify("steam.exe", 2.0, true));
        let emails = recorder.emails.lock().unwrap();
        assert_eq!(
            emails.as_slice(),
            &[("steam.exe".to_string(), "Kids Profile".to_string())]
        );
        assert!(recorder.notes.lock().unwrap()[1].contains("Time limit reached"));
    }

    #[test]
    fn test_limit_alert_within_cooldown_is_suppressed() {
        let clock = ManualClock::default();
        let recorder = Recorder::default();
        let mut gate = gate(&clock, &recorder);

        assert!(gate.maybe_notify("chrome.exe", 1.0, true));
        clock.advance(Duration::from_secs(5));
        assert!(!gate.maybe_notify("chrome.exe", 1.1, true));

        assert_eq!(recorder.notes.lock().unwrap().len(), 1);
        assert_eq!(recorder.emails.lock().unwrap().len(), 1);

        // A usage alert right after a limit alert is throttled too
        assert!(!gate.maybe_notify("chrome.exe", 1.2, false));
    }

    #[test]
    fn test_sink_failures_are_swallowed() {
        let clock = ManualClock::default();
        let recorder = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let mut gate = gate(&clock, &recorder);

        assert!(gate.maybe_notify("chrome.exe", 1.0, true));
        assert!(gate.last_fired("chrome.exe").is_some());
    }
}

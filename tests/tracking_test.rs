//! End-to-end tests for the tracking pipeline on a virtual clock.

use screen_usage_agent::core::{ManualClock, SharedClock};
use screen_usage_agent::notify::{EmailSink, NotificationSink, NotifierGate, NotifyError};
use screen_usage_agent::provider::{ReplayProvider, WindowSample};
use screen_usage_agent::{
    Config, JsonFileStore, MemoryStore, PersistentStore, Profile, ProfileSet, UsageTracker,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct Outbox(Arc<Mutex<Vec<String>>>);

impl Outbox {
    fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl NotificationSink for Outbox {
    fn notify(&self, _title: &str, message: &str) -> Result<(), NotifyError> {
        self.0.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

impl EmailSink for Outbox {
    fn send_limit_alert(
        &self,
        application_id: &str,
        _usage_minutes: f64,
        profile_name: &str,
    ) -> Result<(), NotifyError> {
        self.0
            .lock()
            .unwrap()
            .push(format!("{profile_name}:{application_id}"));
        Ok(())
    }
}

struct Harness<S: PersistentStore> {
    tracker: UsageTracker<S>,
    notifications: Outbox,
    emails: Outbox,
}

fn harness<S: PersistentStore>(store: S) -> Harness<S> {
    let clock: SharedClock = Arc::new(ManualClock::default());
    let notifications = Outbox::default();
    let emails = Outbox::default();
    let gate = NotifierGate::new(clock.clone(), Duration::from_secs(60))
        .with_notification_sink(Box::new(notifications.clone()))
        .with_email_sink(Box::new(emails.clone()));
    let tracker = UsageTracker::open(&Config::default(), store, gate, clock);
    Harness {
        tracker,
        notifications,
        emails,
    }
}

fn replay(app: &str, ticks: usize) -> ReplayProvider {
    ReplayProvider::repeat(WindowSample::new(app, ""), ticks)
}

fn no_limits() -> Profile {
    Profile::new("test", HashMap::new())
}

#[test]
fn test_limit_alert_fires_once_per_session() {
    let mut h = harness(MemoryStore::new());
    let profiles = ProfileSet::default();
    let kids = profiles.get("kids").unwrap();
    let stop = AtomicBool::new(false);

    let mut provider = replay("chrome.exe", 65);
    let emails = h.emails.clone();
    let mut email_ticks = Vec::new();
    let report = h.tracker.track_session(&mut provider, kids, 65, &stop, |update| {
        if emails.messages().len() > email_ticks.len() {
            email_ticks.push(update.tick);
        }
    });

    assert_eq!(email_ticks, vec![60]);

    assert_eq!(report.session.record("chrome.exe").unwrap().elapsed_seconds, 65);

    let notifications = h.notifications.messages();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].starts_with("⚠️ Time limit reached for"));
    assert_eq!(h.emails.messages(), vec!["Kids Profile:chrome.exe".to_string()]);
}

#[test]
fn test_first_session_has_no_baseline() {
    let mut h = harness(MemoryStore::new());
    let stop = AtomicBool::new(false);

    let report = h
        .tracker
        .track_session(&mut replay("code.exe", 30), &no_limits(), 30, &stop, |_| {});

    assert!(!report.anomaly.is_anomaly);
    assert_eq!(
        report.anomaly.explanation,
        "Insufficient historical data for anomaly detection"
    );
    assert!(report.persisted);
    assert!(!report.retrained);
    assert_eq!(h.tracker.history().len(), 1);
    assert_eq!(h.tracker.history().store().saved().len(), 1);
}

#[test]
fn test_retrain_every_tenth_session() {
    let mut h = harness(MemoryStore::new());
    let stop = AtomicBool::new(false);

    let mut retrained_at = Vec::new();
    for n in 1..=20u64 {
        let mut provider = replay("code.exe", 5 + n as usize);
        let report = h
            .tracker
            .track_session(&mut provider, &no_limits(), 5 + n, &stop, |_| {});
        if report.retrained {
            retrained_at.push(n);
        }
    }

    assert_eq!(retrained_at, vec![10, 20]);
    assert_eq!(h.tracker.detector().trained_on(), Some(20));
}

#[test]
fn test_history_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    let stop = AtomicBool::new(false);

    {
        let mut h = harness(JsonFileStore::new(path.clone()));
        for ticks in [20, 40, 60] {
            let mut provider = replay("slack.exe", ticks);
            let report = h
                .tracker
                .track_session(&mut provider, &no_limits(), ticks as u64, &stop, |_| {});
            assert!(report.persisted);
        }
        assert!(!h.tracker.detector().is_fitted());
    }

    let h = harness(JsonFileStore::new(path));
    assert_eq!(h.tracker.history().len(), 3);
    assert!(h.tracker.detector().is_fitted());

    let latest = h.tracker.analyze_latest().unwrap();
    assert!(latest.explanation.contains("Unusual concentration in Communication category"));
}

#[test]
fn test_failed_write_keeps_session_in_memory() {
    let mut h = harness(MemoryStore::failing());
    let stop = AtomicBool::new(false);

    let report = h
        .tracker
        .track_session(&mut replay("code.exe", 10), &no_limits(), 10, &stop, |_| {});

    assert!(!report.persisted);
    assert_eq!(h.tracker.history().len(), 1);
    assert!(h.tracker.history().store().saved().is_empty());
}

#[test]
fn test_stop_returns_partial_session() {
    let mut h = harness(MemoryStore::new());
    let stop = AtomicBool::new(false);
    let mut ticks = 0;

    let report = h.tracker.track_session(
        &mut replay("code.exe", 100).looping(true),
        &no_limits(),
        100,
        &stop,
        |update| {
            ticks = update.tick;
            if update.tick == 12 {
                stop.store(true, std::sync::atomic::Ordering::SeqCst);
            }
        },
    );

    assert_eq!(ticks, 12);
    assert_eq!(report.session.total_seconds(), 12);
    assert_eq!(h.tracker.history().len(), 1);
}

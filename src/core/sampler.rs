//! Sampling loop that turns foreground-window polls into a usage table.
//!
//! A [`Sampler`] polls an [`ActiveWindowProvider`] once per tick for a
//! bounded duration, accumulating seconds per application. Limit and usage
//! alerts are raised through the [`NotifierGate`] while the loop runs.
//!
//! ```text
//! Idle ──run()──▶ Running ──duration elapsed──▶ Complete
//!                    │
//!                    └──────stop signal───────▶ Stopped
//! ```

use crate::config::{AppAlias, Profile};
use crate::core::catalog::{categorize, display_name, Category};
use crate::core::clock::SharedClock;
use crate::notify::NotifierGate;
use crate::provider::{ActiveWindowProvider, WindowSample};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Accumulated usage of one application within one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Process or module name, unique within a session
    pub application_id: String,
    /// Friendly label, presentation only
    pub display_name: String,
    /// Seconds this application held focus
    pub elapsed_seconds: u64,
    /// Window titles seen while this application held focus
    #[serde(default)]
    pub window_titles: BTreeSet<String>,
}

impl UsageRecord {
    pub fn new(application_id: impl Into<String>) -> Self {
        let application_id = application_id.into();
        Self {
            display_name: display_name(&application_id),
            application_id,
            elapsed_seconds: 0,
            window_titles: BTreeSet::new(),
        }
    }

    /// Convenience constructor for a record with a known duration.
    pub fn with_seconds(application_id: impl Into<String>, elapsed_seconds: u64) -> Self {
        let mut record = Self::new(application_id);
        record.elapsed_seconds = elapsed_seconds;
        record
    }

    /// Category, always derived from the current catalog rules.
    pub fn category(&self) -> Category {
        categorize(&self.application_id)
    }

    pub fn minutes(&self) -> f64 {
        self.elapsed_seconds as f64 / 60.0
    }
}

/// A completed sampling run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    /// When sampling ended
    pub timestamp: DateTime<Utc>,
    /// Requested sampling duration in seconds
    pub duration_config: u64,
    /// Per-application usage, most used first
    pub records: Vec<UsageRecord>,
}

impl Session {
    /// Build a session from records, merging duplicate application ids.
    pub fn new(timestamp: DateTime<Utc>, duration_config: u64, records: Vec<UsageRecord>) -> Self {
        let mut merged: HashMap<String, UsageRecord> = HashMap::new();
        for record in records {
            match merged.get_mut(&record.application_id) {
                Some(existing) => {
                    existing.elapsed_seconds += record.elapsed_seconds;
                    existing.window_titles.extend(record.window_titles);
                }
                None => {
                    merged.insert(record.application_id.clone(), record);
                }
            }
        }

        let mut records: Vec<UsageRecord> = merged.into_values().collect();
        records.sort_by(|a, b| {
            b.elapsed_seconds
                .cmp(&a.elapsed_seconds)
                .then_with(|| a.application_id.cmp(&b.application_id))
        });

        Self {
            id: Uuid::new_v4(),
            timestamp,
            duration_config,
            records,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.records.iter().map(|r| r.elapsed_seconds).sum()
    }

    pub fn total_minutes(&self) -> f64 {
        self.total_seconds() as f64 / 60.0
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, application_id: &str) -> Option<&UsageRecord> {
        self.records
            .iter()
            .find(|r| r.application_id == application_id)
    }
}

/// Lifecycle of a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    Idle,
    Running,
    /// The requested duration elapsed
    Complete,
    /// An external stop signal ended the run early
    Stopped,
}

/// Timing and filtering settings for the sampler.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Length of one tick; also the amount credited per sample.
    /// Usage is counted in whole seconds, so this is truncated to whole
    /// seconds with a minimum of one (see [`SamplerConfig::tick_seconds`]).
    pub tick_interval: Duration,
    /// Seconds of use before the recurring usage alert starts
    pub notification_threshold_secs: u64,
    /// Applications that are never counted
    pub ignored_apps: Vec<String>,
    /// Host-process rewrites for wrapped applications
    pub aliases: Vec<AppAlias>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        let config = crate::config::Config::default();
        Self::from(&config)
    }
}

impl SamplerConfig {
    /// Seconds credited and slept per tick: `tick_interval` truncated to
    /// whole seconds, at least one.
    pub fn tick_seconds(&self) -> u64 {
        self.tick_interval.as_secs().max(1)
    }
}

impl From<&crate::config::Config> for SamplerConfig {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            tick_interval: config.tick_interval,
            notification_threshold_secs: config.notification_threshold_secs,
            ignored_apps: config.ignored_apps.clone(),
            aliases: config.aliases.clone(),
        }
    }
}

/// Progress report handed to the tick callback after every counted sample.
#[derive(Debug, Clone)]
pub struct TickUpdate<'a> {
    pub tick: u64,
    pub elapsed: Duration,
    pub duration: Duration,
    pub application_id: &'a str,
    pub window_title: &'a str,
    pub elapsed_seconds: u64,
}

impl TickUpdate<'_> {
    /// Fraction of the session completed (0-1).
    pub fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }
}

/// Consecutive poll failures. Only the first failure of a run is worth a
/// warning; a provider that never yields would otherwise flood the log.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct FailureStreak {
    length: u64,
}

impl FailureStreak {
    /// Count a failure. Returns true when it starts a new streak.
    fn fail(&mut self) -> bool {
        self.length += 1;
        self.length == 1
    }

    /// End the streak. Returns its length if one was running.
    fn recover(&mut self) -> Option<u64> {
        let length = std::mem::take(&mut self.length);
        (length > 0).then_some(length)
    }
}

/// Polls the active window and accumulates per-application usage.
pub struct Sampler {
    config: SamplerConfig,
    clock: SharedClock,
    state: SamplerState,
}

impl Sampler {
    pub fn new(config: SamplerConfig, clock: SharedClock) -> Self {
        Self {
            config,
            clock,
            state: SamplerState::Idle,
        }
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    /// Run one session.
    ///
    /// Always returns whatever was accumulated, including when `stop` is
    /// raised early. Poll failures are logged and skipped.
    pub fn run<P, F>(
        &mut self,
        provider: &mut P,
        gate: &mut NotifierGate,
        profile: &Profile,
        duration_secs: u64,
        stop: &AtomicBool,
        mut on_tick: F,
    ) -> Session
    where
        P: ActiveWindowProvider + ?Sized,
        F: FnMut(&TickUpdate<'_>),
    {
        self.state = SamplerState::Running;
        gate.set_profile_name(&profile.name);

        let limits_enabled = match profile.validate_limits() {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Profile '{}' has invalid app limits, limit checks disabled for this session: {}",
                    profile.name, e
                );
                false
            }
        };

        let duration = Duration::from_secs(duration_secs);
        let tick_secs = self.config.tick_seconds();
        let tick_length = Duration::from_secs(tick_secs);
        let start = self.clock.now();

        let mut usage: HashMap<String, UsageRecord> = HashMap::new();
        let mut exceeded_limits: HashSet<String> = HashSet::new();
        let mut tick: u64 = 0;
        let mut failures = FailureStreak::default();

        loop {
            let elapsed = (self.clock.now() - start).to_std().unwrap_or(Duration::ZERO);
            if elapsed >= duration {
                self.state = SamplerState::Complete;
                break;
            }
            if stop.load(Ordering::SeqCst) {
                self.state = SamplerState::Stopped;
                break;
            }
            tick += 1;

            match provider.poll() {
                Ok(sample) => {
                    if let Some(length) = failures.recover() {
                        info!("Active window polling recovered after {} failed tick(s)", length);
                    }
                    if let Some(app) = self.resolve(&sample) {
                        let record = usage
                            .entry(app.clone())
                            .or_insert_with(|| UsageRecord::new(app.clone()));
                        record.elapsed_seconds += tick_secs;
                        if !sample.window_title.is_empty() {
                            record.window_titles.insert(sample.window_title.clone());
                        }
                        let elapsed_seconds = record.elapsed_seconds;
                        let minutes = record.minutes();

                        if limits_enabled && !exceeded_limits.contains(&app) {
                            if let Some(&limit) = profile.app_limits.get(&app) {
                                if minutes >= limit as f64 {
                                    gate.maybe_notify(&app, minutes, true);
                                    exceeded_limits.insert(app.clone());
                                }
                            }
                        }

                        if elapsed_seconds >= self.config.notification_threshold_secs {
                            gate.maybe_notify(&app, minutes, false);
                        }

                        on_tick(&TickUpdate {
                            tick,
                            elapsed,
                            duration,
                            application_id: &app,
                            window_title: &sample.window_title,
                            elapsed_seconds,
                        });
                    }
                }
                Err(e) => {
                    if failures.fail() {
                        warn!("Active window poll failed on tick {}: {}", tick, e);
                    } else {
                        debug!("Active window poll failed on tick {}: {}", tick, e);
                    }
                }
            }

            self.clock.sleep(tick_length);
        }

        Session::new(self.clock.now(), duration_secs, usage.into_values().collect())
    }

    /// Apply aliasing and the ignore list. `None` means discard the sample.
    fn resolve(&self, sample: &WindowSample) -> Option<String> {
        let raw = sample.application_id.trim();
        if raw.is_empty() || self.is_ignored(raw) {
            return None;
        }

        let app = self
            .config
            .aliases
            .iter()
            .find(|alias| alias.matches(raw, &sample.window_title))
            .map(|alias| alias.canonical.clone())
            .unwrap_or_else(|| raw.to_string());

        if self.is_ignored(&app) {
            return None;
        }
        Some(app)
    }

    fn is_ignored(&self, application_id: &str) -> bool {
        self.config
            .ignored_apps
            .iter()
            .any(|ignored| ignored.eq_ignore_ascii_case(application_id))
    }
}

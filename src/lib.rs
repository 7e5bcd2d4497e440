//! Screen Usage Agent - foreground-application usage tracking with
//! threshold alerts and anomaly detection.
//!
//! The agent polls the active window once per tick, builds a per-application
//! usage table for a session, raises debounced alerts while the session runs,
//! and afterwards evaluates the session against fixed usage thresholds and
//! against a model learned from past sessions.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        Screen Usage Agent                        │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐                │
//! │  │  Provider  │──▶│  Sampler   │──▶│  Insights  │                │
//! │  │  (window)  │   │  (1s tick) │   │ (evaluate) │                │
//! │  └────────────┘   └────────────┘   └────────────┘                │
//! │                         │                                        │
//! │                         ▼                                        │
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐                │
//! │  │  Notifier  │◀──│  Limits /  │   │  History   │──▶ retrain     │
//! │  │    Gate    │   │ threshold  │   │ (100 cap)  │    every 10    │
//! │  └────────────┘   └────────────┘   └────────────┘                │
//! │                                          │                       │
//! │                                          ▼                       │
//! │                                    ┌────────────┐                │
//! │                                    │  Anomaly   │                │
//! │                                    │  Detector  │                │
//! │                                    └────────────┘                │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::atomic::AtomicBool;
//! use screen_usage_agent::{
//!     core::system_clock, history::JsonFileStore, notify::NotifierGate,
//!     provider::ReplayProvider, Config, ProfileSet, UsageTracker,
//! };
//!
//! let config = Config::default();
//! let clock = system_clock();
//! let gate = NotifierGate::new(clock.clone(), config.notification_cooldown());
//! let store = JsonFileStore::new(config.history_path());
//! let mut tracker = UsageTracker::open(&config, store, gate, clock);
//!
//! let mut provider = ReplayProvider::parse(r#"{"app": "code.exe"}"#).unwrap().looping(true);
//! let profiles = ProfileSet::default();
//! let (_, profile) = profiles.default_profile().unwrap();
//! let report = tracker.track_session(&mut provider, profile, 60, &AtomicBool::new(false), |_| {});
//! println!("{}", report.anomaly.explanation);
//! ```

pub mod anomaly;
pub mod config;
pub mod core;
pub mod history;
pub mod notify;
pub mod provider;
pub mod tracker;

// Re-export key types at crate root for convenience
pub use anomaly::{extract_features, AnomalyDetector, AnomalyReport, FeatureVector};
pub use config::{Config, Profile, ProfileSet};
pub use core::{categorize, evaluate, Category, Insight, Sampler, Session, UsageRecord};
pub use history::{HistoryStore, JsonFileStore, MemoryStore, PersistentStore};
pub use notify::NotifierGate;
pub use provider::{ActiveWindowProvider, WindowSample};
pub use tracker::{SessionReport, UsageTracker};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

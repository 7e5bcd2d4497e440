//! Session orchestration: sample, evaluate, score, persist, retrain.

use std::sync::atomic::AtomicBool;

use serde::Serialize;
use tracing::info;

use crate::anomaly::{AnomalyDetector, AnomalyReport};
use crate::config::{Config, Profile};
use crate::core::clock::SharedClock;
use crate::core::insights::{evaluate, recommendations, Insight, SessionSummary};
use crate::core::sampler::{Sampler, SamplerConfig, Session, TickUpdate};
use crate::history::{HistoryStore, PersistentStore};
use crate::notify::NotifierGate;
use crate::provider::ActiveWindowProvider;

/// Everything produced by one tracked session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub session: Session,
    pub summary: Option<SessionSummary>,
    pub insights: Vec<Insight>,
    pub recommendations: Vec<String>,
    /// Verdict against the history as it was before this session
    pub anomaly: AnomalyReport,
    /// Whether the history write reached storage
    pub persisted: bool,
    /// Whether the append triggered a successful model refit
    pub retrained: bool,
}

/// Owns the process-wide state: history, model and notification cooldowns.
pub struct UsageTracker<S: PersistentStore> {
    sampler: Sampler,
    gate: NotifierGate,
    history: HistoryStore<S>,
    detector: AnomalyDetector,
}

impl<S: PersistentStore> UsageTracker<S> {
    /// Load history from `store` and fit the model once if enough exists.
    pub fn open(config: &Config, store: S, gate: NotifierGate, clock: SharedClock) -> Self {
        let history = HistoryStore::open(store, config.history_capacity, config.retrain_every);
        let mut detector = AnomalyDetector::default();
        detector.retrain(history.sessions());

        info!(
            sessions = history.len(),
            model_ready = detector.is_fitted(),
            "Usage tracker ready"
        );

        Self {
            sampler: Sampler::new(SamplerConfig::from(config), clock),
            gate,
            history,
            detector,
        }
    }

    /// Run one session to completion (or until `stop`) and record it.
    pub fn track_session<P, F>(
        &mut self,
        provider: &mut P,
        profile: &Profile,
        duration_secs: u64,
        stop: &AtomicBool,
        on_tick: F,
    ) -> SessionReport
    where
        P: ActiveWindowProvider + ?Sized,
        F: FnMut(&TickUpdate<'_>),
    {
        let session = self
            .sampler
            .run(provider, &mut self.gate, profile, duration_secs, stop, on_tick);
        info!(
            apps = session.records.len(),
            seconds = session.total_seconds(),
            state = ?self.sampler.state(),
            "Session finished"
        );

        let insights = evaluate(&session.records);
        let tips = recommendations(&session.records);
        let summary = SessionSummary::from_session(&session);
        let anomaly = self.detector.score(&session, self.history.sessions());

        let append = self.history.append(session.clone());
        let retrained = append.retrain_due && self.detector.retrain(self.history.sessions());

        SessionReport {
            session,
            summary,
            insights,
            recommendations: tips,
            anomaly,
            persisted: append.persisted,
            retrained,
        }
    }

    /// Force a full model refit on the current history.
    pub fn retrain(&mut self) -> bool {
        self.detector.retrain(self.history.sessions())
    }

    /// Score the most recent stored session against the ones before it.
    pub fn analyze_latest(&self) -> Option<AnomalyReport> {
        let (latest, earlier) = self.history.sessions().split_last()?;
        Some(self.detector.score(latest, earlier))
    }

    pub fn history(&self) -> &HistoryStore<S> {
        &self.history
    }

    pub fn detector(&self) -> &AnomalyDetector {
        &self.detector
    }

    pub fn gate(&self) -> &NotifierGate {
        &self.gate
    }
}

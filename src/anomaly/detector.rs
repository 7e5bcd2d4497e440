//! Session feature extraction and outlier scoring against history.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::{debug, info, warn};

use crate::anomaly::forest::{ForestParams, IsolationForest};
use crate::anomaly::scaler::StandardScaler;
use crate::core::catalog::Category;
use crate::core::sampler::Session;

/// Categories whose record share is part of the feature vector, in order.
pub const TRACKED_CATEGORIES: [Category; 5] = [
    Category::Development,
    Category::Office,
    Category::Entertainment,
    Category::Communication,
    Category::Browsers,
];

/// Share of a session's records above which a category counts as dominant.
const CONCENTRATION_SHARE: f64 = 0.7;

/// Ratio to the historical mean above which duration or app count is unusual.
const OUTLIER_RATIO: f64 = 1.5;

pub const INSUFFICIENT_DATA: &str = "Insufficient historical data for anomaly detection";
pub const GENERIC_EXPLANATION: &str = "Unusual pattern detected";

/// Errors from fitting the anomaly model.
#[derive(Debug)]
pub enum AnomalyError {
    InsufficientData { sessions: usize },
    FitFailed(String),
}

impl std::fmt::Display for AnomalyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyError::InsufficientData { sessions } => {
                write!(f, "Need at least 2 sessions to train, have {sessions}")
            }
            AnomalyError::FitFailed(msg) => write!(f, "Model fit failed: {msg}"),
        }
    }
}

impl std::error::Error for AnomalyError {}

/// Fixed-order numeric summary of a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Total tracked time in minutes
    pub total_minutes: f64,
    pub app_count: f64,
    pub avg_minutes: f64,
    /// Sample standard deviation of per-app minutes
    pub std_minutes: f64,
    pub max_minutes: f64,
    pub min_minutes: f64,
    /// Fraction of records in each of [`TRACKED_CATEGORIES`]
    pub category_shares: [f64; 5],
}

impl FeatureVector {
    /// Number of values in [`FeatureVector::to_vec`].
    pub const WIDTH: usize = 6 + TRACKED_CATEGORIES.len();

    pub fn to_vec(&self) -> Vec<f64> {
        let mut v = vec![
            self.total_minutes,
            self.app_count,
            self.avg_minutes,
            self.std_minutes,
            self.max_minutes,
            self.min_minutes,
        ];
        v.extend_from_slice(&self.category_shares);
        v
    }
}

/// Compute the feature vector for a session. An empty session yields zeros.
pub fn extract_features(session: &Session) -> FeatureVector {
    if session.records.is_empty() {
        return FeatureVector::default();
    }

    let minutes: Vec<f64> = session.records.iter().map(|r| r.minutes()).collect();
    let count = minutes.len() as f64;
    let shares = category_shares(session);

    let mut category_shares = [0.0; 5];
    for (slot, category) in category_shares.iter_mut().zip(TRACKED_CATEGORIES) {
        *slot = shares.get(&category).copied().unwrap_or(0.0);
    }

    FeatureVector {
        total_minutes: minutes.iter().sum(),
        app_count: count,
        avg_minutes: minutes.iter().mean(),
        std_minutes: if minutes.len() < 2 {
            0.0
        } else {
            minutes.iter().std_dev()
        },
        max_minutes: minutes.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b)),
        min_minutes: minutes.iter().fold(f64::INFINITY, |a, &b| a.min(b)),
        category_shares,
    }
}

/// Fraction of the session's records falling in each category.
fn category_shares(session: &Session) -> BTreeMap<Category, f64> {
    let mut counts: BTreeMap<Category, usize> = BTreeMap::new();
    for record in &session.records {
        *counts.entry(record.category()).or_default() += 1;
    }
    let total = session.records.len() as f64;
    counts
        .into_iter()
        .map(|(category, n)| (category, n as f64 / total))
        .collect()
}

/// Result of scoring one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    /// Authoritative verdict from the model
    pub is_anomaly: bool,
    pub explanation: String,
    /// Relative ranking signal; lower is more anomalous
    pub score: f64,
}

impl AnomalyReport {
    fn insufficient() -> Self {
        Self {
            is_anomaly: false,
            explanation: INSUFFICIENT_DATA.to_string(),
            score: 0.0,
        }
    }
}

/// Scaler and forest, always fit together.
#[derive(Debug, Clone)]
struct FittedModel {
    scaler: StandardScaler,
    forest: IsolationForest,
    trained_on: usize,
}

/// Outlier detector over historical sessions.
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    params: ForestParams,
    model: Option<FittedModel>,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(ForestParams::default())
    }
}

impl AnomalyDetector {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            model: None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// Number of sessions the current model was fit on.
    pub fn trained_on(&self) -> Option<usize> {
        self.model.as_ref().map(|m| m.trained_on)
    }

    /// Fully refit on `history`. On failure the previous model is kept.
    pub fn retrain(&mut self, history: &[Session]) -> bool {
        match self.fit(history) {
            Ok(model) => {
                info!(sessions = model.trained_on, "Anomaly model retrained");
                self.model = Some(model);
                true
            }
            Err(AnomalyError::InsufficientData { sessions }) => {
                debug!(sessions, "Skipping retrain, not enough history");
                false
            }
            Err(e) => {
                warn!(error = %e, "Retrain failed, keeping previous model");
                false
            }
        }
    }

    fn fit(&self, history: &[Session]) -> Result<FittedModel, AnomalyError> {
        if history.len() < 2 {
            return Err(AnomalyError::InsufficientData {
                sessions: history.len(),
            });
        }

        let rows: Vec<Vec<f64>> = history
            .iter()
            .map(|s| extract_features(s).to_vec())
            .collect();
        if rows.iter().flatten().any(|x| !x.is_finite()) {
            return Err(AnomalyError::FitFailed(
                "non-finite feature value".to_string(),
            ));
        }

        let scaler = StandardScaler::fit(&rows)
            .ok_or_else(|| AnomalyError::FitFailed("scaler rejected input".to_string()))?;
        let scaled = scaler.transform_all(&rows);
        let forest = IsolationForest::fit(&scaled, &self.params)
            .ok_or_else(|| AnomalyError::FitFailed("forest rejected input".to_string()))?;
        if scaler.width() != FeatureVector::WIDTH || forest.width() != scaler.width() {
            return Err(AnomalyError::FitFailed(format!(
                "width mismatch: scaler {}, forest {}, features {}",
                scaler.width(),
                forest.width(),
                FeatureVector::WIDTH
            )));
        }

        Ok(FittedModel {
            scaler,
            forest,
            trained_on: history.len(),
        })
    }

    /// Score `session` against `history` and the last fitted model.
    pub fn score(&self, session: &Session, history: &[Session]) -> AnomalyReport {
        if history.is_empty() {
            return AnomalyReport::insufficient();
        }

        let features = extract_features(session);
        let explanation = explain(session, &features, history);

        let (is_anomaly, score) = match &self.model {
            Some(model) => {
                let scaled = model.scaler.transform(&features.to_vec());
                (model.forest.is_outlier(&scaled), model.forest.score(&scaled))
            }
            None => (false, 0.0),
        };

        AnomalyReport {
            is_anomaly,
            explanation,
            score,
        }
    }
}

fn explain(session: &Session, features: &FeatureVector, history: &[Session]) -> String {
    let past: Vec<FeatureVector> = history.iter().map(extract_features).collect();
    let mean_total = past.iter().map(|f| f.total_minutes).mean();
    let mean_apps = past.iter().map(|f| f.app_count).mean();

    let mut phrases = Vec::new();
    if features.total_minutes > OUTLIER_RATIO * mean_total {
        phrases.push(format!(
            "Unusually long session duration: {:.1} minutes",
            features.total_minutes
        ));
    }
    if features.app_count > OUTLIER_RATIO * mean_apps {
        phrases.push(format!(
            "Unusually high number of applications: {}",
            features.app_count as u64
        ));
    }
    for (category, share) in category_shares(session) {
        if share > CONCENTRATION_SHARE {
            phrases.push(format!(
                "Unusual concentration in {category} category: {:.1}%",
                share * 100.0
            ));
        }
    }

    if phrases.is_empty() {
        GENERIC_EXPLANATION.to_string()
    } else {
        phrases.join(" | ")
    }
}

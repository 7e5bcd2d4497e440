//! Anomaly detection over session history.
//!
//! Sessions are reduced to a fixed [`FeatureVector`], standardized, and
//! scored by a seeded isolation forest fit on the stored history.

pub mod detector;
pub mod forest;
pub mod scaler;

pub use detector::{
    extract_features, AnomalyDetector, AnomalyError, AnomalyReport, FeatureVector,
    TRACKED_CATEGORIES,
};
pub use forest::{ForestParams, IsolationForest};
pub use scaler::StandardScaler;

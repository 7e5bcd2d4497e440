//! Core functionality for the usage agent.
//!
//! This module contains:
//! - The application catalog (categories and display names)
//! - The sampler that turns window polls into a session usage table
//! - Threshold evaluation and recommendations over a session
//! - An injectable clock

pub mod catalog;
pub mod clock;
pub mod insights;
pub mod sampler;

// Re-export commonly used types
pub use catalog::{categorize, display_name, Category, CategoryInfo};
pub use clock::{system_clock, Clock, ManualClock, SharedClock, SystemClock};
pub use insights::{
    category_minutes, evaluate, recommendations, CategoryPolicy, Insight, SessionSummary,
    Severity, UsageLevel,
};
pub use sampler::{
    Sampler, SamplerConfig, SamplerState, Session, TickUpdate, UsageRecord,
};

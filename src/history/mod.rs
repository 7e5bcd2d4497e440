//! Session history: the capped store and trend summaries over it.

pub mod store;
pub mod trends;

// Re-export commonly used types
pub use store::{
    AppendReport, HistoryStore, JsonFileStore, MemoryStore, PersistentStore, StoreError,
    DEFAULT_CAPACITY, DEFAULT_RETRAIN_EVERY,
};
pub use trends::{daily_usage, productivity_score, UsageTrends};

//! Active-window providers.
//!
//! Platform window detection lives outside this crate; the sampler only
//! sees the [`ActiveWindowProvider`] trait. Two providers ship here: a
//! replay provider for recorded sessions and tests, and a noop provider for
//! platforms without detection.

pub mod noop;
pub mod replay;
pub mod types;

// Re-export commonly used types
pub use noop::NoopProvider;
pub use replay::{ReplayEntry, ReplayError, ReplayProvider};
pub use types::{ActiveWindowProvider, ProviderError, WindowSample};

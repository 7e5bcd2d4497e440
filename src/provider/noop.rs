//! Placeholder provider for platforms without window detection.
//!
//! This exists so the binary can start anywhere; every poll reports
//! [`ProviderError::Unsupported`] and the sampler records nothing.

use crate::provider::types::{ActiveWindowProvider, ProviderError, WindowSample};

/// A provider that never observes a focused window.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProvider;

impl NoopProvider {
    pub fn new() -> Self {
        Self
    }
}

impl ActiveWindowProvider for NoopProvider {
    fn poll(&mut self) -> Result<WindowSample, ProviderError> {
        Err(ProviderError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_never_yields() {
        let mut provider = NoopProvider::new();
        assert_eq!(provider.poll(), Err(ProviderError::Unsupported));
    }
}

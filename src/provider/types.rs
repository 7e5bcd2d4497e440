//! Foreground-window samples and the provider seam that produces them.
//!
//! The core never talks to the operating system directly. Anything that can
//! answer "which application has focus right now?" implements
//! [`ActiveWindowProvider`].

use serde::{Deserialize, Serialize};

/// One observation of the focused window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSample {
    /// Process or module name of the focused application (e.g. `chrome.exe`)
    #[serde(rename = "app")]
    pub application_id: String,
    /// Title of the focused window, empty when unavailable
    #[serde(rename = "title", default)]
    pub window_title: String,
}

impl WindowSample {
    pub fn new(application_id: impl Into<String>, window_title: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            window_title: window_title.into(),
        }
    }
}

/// Errors a provider can report for a single poll.
///
/// Every variant is recoverable: the sampler logs it and moves on to the
/// next tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// No window detection is available on this platform
    Unsupported,
    /// The provider has no more samples to give
    Exhausted,
    /// The underlying query failed
    Query(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Unsupported => write!(f, "Active window detection is not supported"),
            ProviderError::Exhausted => write!(f, "No more samples available"),
            ProviderError::Query(e) => write!(f, "Active window query failed: {e}"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Source of foreground-window samples.
pub trait ActiveWindowProvider {
    /// Report the currently focused application and window title.
    fn poll(&mut self) -> Result<WindowSample, ProviderError>;
}

impl<P: ActiveWindowProvider + ?Sized> ActiveWindowProvider for &mut P {
    fn poll(&mut self) -> Result<WindowSample, ProviderError> {
        (**self).poll()
    }
}

impl<P: ActiveWindowProvider + ?Sized> ActiveWindowProvider for Box<P> {
    fn poll(&mut self) -> Result<WindowSample, ProviderError> {
        (**self).poll()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_json_field_names() {
        let sample: WindowSample =
            serde_json::from_str(r#"{"app": "code.exe", "title": "main.rs"}"#).unwrap();
        assert_eq!(sample, WindowSample::new("code.exe", "main.rs"));

        let untitled: WindowSample = serde_json::from_str(r#"{"app": "calc.exe"}"#).unwrap();
        assert!(untitled.window_title.is_empty());
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::Query("access denied".to_string());
        assert!(err.to_string().contains("access denied"));
    }
}

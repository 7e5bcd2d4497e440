//! Replay provider: feeds recorded window samples back into the sampler.
//!
//! Recordings are JSON lines. Each line is either a sample
//! (`{"app": "code.exe", "title": "main.rs"}`) or a failed poll
//! (`{"error": "access denied"}`). Blank lines are skipped.

use crate::provider::types::{ActiveWindowProvider, ProviderError, WindowSample};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

/// One recorded poll result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplayEntry {
    Sample(WindowSample),
    Failure { error: String },
}

/// Errors while reading a recording.
#[derive(Debug)]
pub enum ReplayError {
    IoError(String),
    ParseError { line: usize, message: String },
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplayError::IoError(e) => write!(f, "IO error: {e}"),
            ReplayError::ParseError { line, message } => {
                write!(f, "Parse error on line {line}: {message}")
            }
        }
    }
}

impl std::error::Error for ReplayError {}

/// Plays back a fixed sequence of poll results, optionally looping.
#[derive(Debug, Clone)]
pub struct ReplayProvider {
    entries: Vec<ReplayEntry>,
    queue: VecDeque<ReplayEntry>,
    looping: bool,
}

impl ReplayProvider {
    /// Create a provider from in-memory entries.
    pub fn new(entries: Vec<ReplayEntry>) -> Self {
        Self {
            queue: entries.iter().cloned().collect(),
            entries,
            looping: false,
        }
    }

    /// Create a provider that reports the same sample `count` times.
    pub fn repeat(sample: WindowSample, count: usize) -> Self {
        Self::new(vec![ReplayEntry::Sample(sample); count])
    }

    /// Restart from the first entry once the recording runs out.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Parse a JSON-lines recording.
    pub fn parse(content: &str) -> Result<Self, ReplayError> {
        let mut entries = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let entry = serde_json::from_str(line).map_err(|e| ReplayError::ParseError {
                line: idx + 1,
                message: e.to_string(),
            })?;
            entries.push(entry);
        }
        Ok(Self::new(entries))
    }

    /// Load a JSON-lines recording from disk.
    pub fn from_file(path: &Path) -> Result<Self, ReplayError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ReplayError::IoError(e.to_string()))?;
        Self::parse(&content)
    }

    /// Number of entries left before the recording is exhausted.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl ActiveWindowProvider for ReplayProvider {
    fn poll(&mut self) -> Result<WindowSample, ProviderError> {
        if self.queue.is_empty() && self.looping {
            self.queue.extend(self.entries.iter().cloned());
        }

        match self.queue.pop_front() {
            Some(ReplayEntry::Sample(sample)) => Ok(sample),
            Some(ReplayEntry::Failure { error }) => Err(ProviderError::Query(error)),
            None => Err(ProviderError::Exhausted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_samples_and_failures() {
        let content = r#"
{"app": "code.exe", "title": "main.rs"}
{"error": "access denied"}

{"app": "chrome.exe", "title": "Docs"}
"#;
        let mut provider = ReplayProvider::parse(content).unwrap();
        assert_eq!(provider.remaining(), 3);

        assert_eq!(
            provider.poll().unwrap(),
            WindowSample::new("code.exe", "main.rs")
        );
        assert_eq!(
            provider.poll(),
            Err(ProviderError::Query("access denied".to_string()))
        );
        assert_eq!(provider.poll().unwrap().application_id, "chrome.exe");
        assert_eq!(provider.poll(), Err(ProviderError::Exhausted));
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = ReplayProvider::parse("{\"app\": \"a.exe\"}\nnot json").unwrap_err();
        match err {
            ReplayError::ParseError { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_looping_restarts() {
        let mut provider =
            ReplayProvider::repeat(WindowSample::new("vlc.exe", "movie"), 2).looping(true);
        for _ in 0..5 {
            assert_eq!(provider.poll().unwrap().application_id, "vlc.exe");
        }
    }
}

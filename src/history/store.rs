//! Rolling history of completed sessions.
//!
//! The in-memory list is authoritative. Every append is written through to
//! a [`PersistentStore`]; a failed write is logged and reported but does
//! not roll the append back.

use crate::core::sampler::Session;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Default number of sessions kept.
pub const DEFAULT_CAPACITY: usize = 100;

/// Default retrain cadence, in appended sessions.
pub const DEFAULT_RETRAIN_EVERY: usize = 10;

/// Persistence errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::IoError(e) => write!(f, "IO error: {e}"),
            StoreError::ParseError(e) => write!(f, "Parse error: {e}"),
            StoreError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Backing storage for the session list.
pub trait PersistentStore {
    fn load(&self) -> Result<Vec<Session>, StoreError>;
    fn save(&self, sessions: &[Session]) -> Result<(), StoreError>;

    /// Move unreadable contents out of the way so the next `save` cannot
    /// overwrite them. Returns where they went, if anywhere.
    fn set_aside(&self) -> Result<Option<PathBuf>, StoreError> {
        Ok(None)
    }
}

/// Stores the whole session list as one pretty-printed JSON array.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Where an unreadable history file is moved to.
    pub fn backup_path(&self) -> PathBuf {
        self.sibling("bak")
    }

    fn sibling(&self, extension: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".");
        name.push(extension);
        PathBuf::from(name)
    }
}

impl PersistentStore for JsonFileStore {
    fn load(&self) -> Result<Vec<Session>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| StoreError::IoError(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| StoreError::ParseError(e.to_string()))
    }

    fn save(&self, sessions: &[Session]) -> Result<(), StoreError> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::IoError(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(sessions)
            .map_err(|e| StoreError::SerializeError(e.to_string()))?;

        // Write then rename, so a crash mid-write leaves the old file intact
        let tmp = self.sibling("tmp");
        std::fs::write(&tmp, json).map_err(|e| StoreError::IoError(e.to_string()))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StoreError::IoError(e.to_string()))
    }

    fn set_aside(&self) -> Result<Option<PathBuf>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let backup = self.backup_path();
        std::fs::rename(&self.path, &backup).map_err(|e| StoreError::IoError(e.to_string()))?;
        Ok(Some(backup))
    }
}

/// Keeps sessions in memory; can be told to fail writes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<Vec<Session>>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sessions(sessions: Vec<Session>) -> Self {
        Self {
            sessions: Mutex::new(sessions),
            fail_writes: false,
        }
    }

    /// A store whose every `save` fails.
    pub fn failing() -> Self {
        Self {
            sessions: Mutex::new(Vec::new()),
            fail_writes: true,
        }
    }

    pub fn saved(&self) -> Vec<Session> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl PersistentStore for MemoryStore {
    fn load(&self) -> Result<Vec<Session>, StoreError> {
        Ok(self.saved())
    }

    fn save(&self, sessions: &[Session]) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::IoError("write rejected".to_string()));
        }
        *self.sessions.lock().unwrap_or_else(|e| e.into_inner()) = sessions.to_vec();
        Ok(())
    }
}

/// Outcome of one append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendReport {
    /// Whether the write-through to storage succeeded
    pub persisted: bool,
    /// Whether this append lands on the retrain cadence
    pub retrain_due: bool,
    /// Sessions appended over the store's lifetime, including loaded ones
    pub append_number: u64,
}

/// Capped, append-only session log.
pub struct HistoryStore<S: PersistentStore> {
    store: S,
    sessions: Vec<Session>,
    capacity: usize,
    retrain_every: usize,
    total_appended: u64,
}

impl<S: PersistentStore> HistoryStore<S> {
    /// Load history from storage. Unreadable storage starts empty.
    pub fn open(store: S, capacity: usize, retrain_every: usize) -> Self {
        let mut sessions = match store.load() {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!("Could not load session history, starting empty: {}", e);
                match store.set_aside() {
                    Ok(Some(backup)) => warn!("Unreadable history moved to {:?}", backup),
                    Ok(None) => {}
                    Err(e) => warn!("Could not move unreadable history aside: {}", e),
                }
                Vec::new()
            }
        };

        let capacity = capacity.max(1);
        if sessions.len() > capacity {
            let excess = sessions.len() - capacity;
            sessions.drain(..excess);
        }
        debug!("Loaded {} historical sessions", sessions.len());

        Self {
            store,
            total_appended: sessions.len() as u64,
            sessions,
            capacity,
            retrain_every: retrain_every.max(1),
        }
    }

    /// Append a session, evict the oldest beyond capacity and write through.
    pub fn append(&mut self, session: Session) -> AppendReport {
        self.sessions.push(session);
        if self.sessions.len() > self.capacity {
            let excess = self.sessions.len() - self.capacity;
            self.sessions.drain(..excess);
        }
        self.total_appended += 1;

        let persisted = match self.store.save(&self.sessions) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Could not persist session history ({} sessions kept in memory): {}",
                    self.sessions.len(),
                    e
                );
                false
            }
        };

        AppendReport {
            persisted,
            retrain_due: self.total_appended % self.retrain_every as u64 == 0,
            append_number: self.total_appended,
        }
    }

    /// Sessions in append order, oldest first.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn latest(&self) -> Option<&Session> {
        self.sessions.last()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

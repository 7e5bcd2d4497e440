//! Configuration for the screen usage agent.
//!
//! [`Config`] is the single source of truth for tick length, alert
//! thresholds, cooldowns and history capacity. [`ProfileSet`] holds the
//! per-user application limits.

use crate::history::{DEFAULT_CAPACITY, DEFAULT_RETRAIN_EVERY};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Length of one sampling tick
    #[serde(with = "duration_serde")]
    pub tick_interval: Duration,

    /// Seconds an app must be used before recurring usage alerts start
    pub notification_threshold_secs: u64,

    /// Minimum seconds between two alerts for the same app
    pub notification_cooldown_secs: u64,

    /// Session length used when none is given
    pub default_session_secs: u64,

    /// Number of sessions kept in history
    pub history_capacity: usize,

    /// Retrain the anomaly model every this many appended sessions
    pub retrain_every: usize,

    /// Processes that are never counted
    pub ignored_apps: Vec<String>,

    /// Host-process rewrites for wrapped applications
    pub aliases: Vec<AppAlias>,

    /// IANA timezone used to group sessions by day
    pub timezone: String,

    /// Path for history, profiles and the alert outbox
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("screen-usage-agent");

        Self {
            tick_interval: Duration::from_secs(1),
            notification_threshold_secs: 60,
            notification_cooldown_secs: 60,
            default_session_secs: 60,
            history_capacity: DEFAULT_CAPACITY,
            retrain_every: DEFAULT_RETRAIN_EVERY,
            ignored_apps: default_ignored_apps(),
            aliases: vec![AppAlias::new(
                "ApplicationFrameHost.exe",
                "WhatsApp",
                "whatsapp.exe",
            )],
            timezone: "UTC".to_string(),
            data_path: data_dir,
        }
    }
}

fn default_ignored_apps() -> Vec<String> {
    [
        "svchost.exe",
        "System Idle Process",
        "explorer.exe",
        "Registry",
        "csrss.exe",
        "wininit.exe",
        "Conhost.exe",
        "RuntimeBroker.exe",
        "SearchHost.exe",
        "ShellExperienceHost.exe",
        "StartMenuExperienceHost.exe",
        "TextInputHost.exe",
        "dllhost.exe",
        "sihost.exe",
        "fontdrvhost.exe",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific file.
    pub fn save_to(&self, config_path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("screen-usage-agent")
            .join("config.json")
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_path.join("history.json")
    }

    pub fn profiles_path(&self) -> PathBuf {
        self.data_path.join("profiles.json")
    }

    pub fn outbox_path(&self) -> PathBuf {
        self.data_path.join("email_outbox.jsonl")
    }

    pub fn notification_cooldown(&self) -> Duration {
        Duration::from_secs(self.notification_cooldown_secs)
    }

    /// Parsed timezone, UTC when the configured name is unknown.
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or(chrono_tz::UTC)
    }
}

/// Rewrites a generic host process to the application it is hosting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppAlias {
    /// Process reported by the provider (e.g. `ApplicationFrameHost.exe`)
    pub host_process: String,
    /// Window title that identifies the hosted app
    pub window_title: String,
    /// Identifier to count the usage under
    pub canonical: String,
}

impl AppAlias {
    pub fn new(
        host_process: impl Into<String>,
        window_title: impl Into<String>,
        canonical: impl Into<String>,
    ) -> Self {
        Self {
            host_process: host_process.into(),
            window_title: window_title.into(),
            canonical: canonical.into(),
        }
    }

    pub fn matches(&self, application_id: &str, window_title: &str) -> bool {
        self.host_process.eq_ignore_ascii_case(application_id) && self.window_title == window_title
    }
}

/// A user profile with per-application limits in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub app_limits: HashMap<String, u32>,
    #[serde(default)]
    pub is_default: bool,
}

impl Profile {
    pub fn new(name: impl Into<String>, app_limits: HashMap<String, u32>) -> Self {
        Self {
            name: name.into(),
            app_limits,
            is_default: false,
        }
    }

    /// Check that every limit names an app and allows at least one minute.
    pub fn validate_limits(&self) -> Result<(), ProfileError> {
        for (app, &minutes) in &self.app_limits {
            if app.trim().is_empty() {
                return Err(ProfileError::InvalidLimit {
                    application_id: app.clone(),
                    reason: "empty application id".to_string(),
                });
            }
            if minutes == 0 {
                return Err(ProfileError::InvalidLimit {
                    application_id: app.clone(),
                    reason: "limit must be at least one minute".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// All known profiles, keyed by a short name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileSet {
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for ProfileSet {
    fn default() -> Self {
        let mut kid_limits = HashMap::new();
        kid_limits.insert("whatsapp.exe".to_string(), 1);
        kid_limits.insert("chrome.exe".to_string(), 1);
        kid_limits.insert("facebook.exe".to_string(), 1);

        let mut kids = Profile::new("Kids Profile", kid_limits);
        kids.is_default = true;
        let parent = Profile::new("Parent Profile", HashMap::new());

        let mut profiles = BTreeMap::new();
        profiles.insert("kids".to_string(), kids);
        profiles.insert("parent".to_string(), parent);
        Self { profiles }
    }
}

impl ProfileSet {
    /// Load profiles from a file, using the built-in profiles when absent.
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| ProfileError::IoError(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ProfileError::ParseError(e.to_string()))
    }

    pub fn get(&self, key: &str) -> Option<&Profile> {
        self.profiles.get(key)
    }

    /// Key and profile marked as default, or the first one.
    pub fn default_profile(&self) -> Option<(&str, &Profile)> {
        self.profiles
            .iter()
            .find(|(_, p)| p.is_default)
            .or_else(|| self.profiles.iter().next())
            .map(|(k, p)| (k.as_str(), p))
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Profile errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    IoError(String),
    ParseError(String),
    InvalidLimit {
        application_id: String,
        reason: String,
    },
}

impl std::fmt::Display for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileError::IoError(e) => write!(f, "IO error: {e}"),
            ProfileError::ParseError(e) => write!(f, "Parse error: {e}"),
            ProfileError::InvalidLimit {
                application_id,
                reason,
            } => write!(f, "Invalid limit for '{application_id}': {reason}"),
        }
    }
}

impl std::error::Error for ProfileError {}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.notification_threshold_secs, 60);
        assert_eq!(config.notification_cooldown(), Duration::from_secs(60));
        assert_eq!(config.history_capacity, 100);
        assert_eq!(config.retrain_every, 10);
        assert!(config.ignored_apps.iter().any(|a| a == "explorer.exe"));
        assert_eq!(config.tz(), chrono_tz::UTC);
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"tick_interval": 2, "timezone": "Europe/Madrid"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.tick_interval, Duration::from_secs(2));
        assert_eq!(config.notification_cooldown_secs, 60);
        assert_eq!(config.tz(), chrono_tz::Europe::Madrid);
    }

    #[test]
    fn test_missing_config_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.history_capacity, 100);
    }

    #[test]
    fn test_saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            retrain_every: 5,
            timezone: "Asia/Tokyo".to_string(),
            ..Config::default()
        };

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.retrain_every, 5);
        assert_eq!(loaded.tz(), chrono_tz::Asia::Tokyo);
        assert_eq!(loaded.aliases, config.aliases);
    }

    #[test]
    fn test_alias_matching() {
        let alias = AppAlias::new("ApplicationFrameHost.exe", "WhatsApp", "whatsapp.exe");
        assert!(alias.matches("applicationframehost.exe", "WhatsApp"));
        assert!(!alias.matches("ApplicationFrameHost.exe", "Photos"));
    }

    #[test]
    fn test_default_profiles() {
        let profiles = ProfileSet::default();
        let (key, kids) = profiles.default_profile().unwrap();
        assert_eq!(key, "kids");
        assert_eq!(kids.app_limits.get("chrome.exe"), Some(&1));
        assert!(profiles.get("parent").unwrap().app_limits.is_empty());
    }

    #[test]
    fn test_profiles_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        std::fs::write(
            &path,
            r#"{"work": {"name": "Work", "app_limits": {"steam.exe": 5}}}"#,
        )
        .unwrap();

        let profiles = ProfileSet::load(&path).unwrap();
        let (key, work) = profiles.default_profile().unwrap();
        assert_eq!(key, "work");
        assert_eq!(work.app_limits.get("steam.exe"), Some(&5));
    }

    #[test]
    fn test_validate_limits() {
        let mut limits = HashMap::new();
        limits.insert("chrome.exe".to_string(), 1);
        assert!(Profile::new("ok", limits.clone()).validate_limits().is_ok());

        limits.insert("steam.exe".to_string(), 0);
        let err = Profile::new("bad", limits).validate_limits().unwrap_err();
        assert!(matches!(err, ProfileError::InvalidLimit { .. }));
    }
}

//! Delivery collaborators shipped with the agent.
//!
//! Real desktop notifications and SMTP live outside this crate. The binary
//! prints notifications to the terminal and queues limit emails as JSON
//! lines in an outbox file for an external mailer to pick up.

use crate::notify::gate::{EmailSink, NotificationSink, NotifyError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

/// Prints notifications to the terminal and the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl NotificationSink for ConsoleNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        tracing::info!(target: "notification", "{}: {}", title, message.replace('\n', " "));
        println!("[{title}] {message}");
        Ok(())
    }
}

/// One queued limit email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitAlertMessage {
    pub subject: String,
    pub application_id: String,
    pub usage_minutes: f64,
    pub profile_name: String,
    pub device: String,
    pub created_at: DateTime<Utc>,
}

/// Appends limit emails to a JSON-lines outbox file.
#[derive(Debug, Clone)]
pub struct OutboxMailer {
    path: PathBuf,
    device: String,
}

impl OutboxMailer {
    pub fn new(path: PathBuf) -> Self {
        let device = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".to_string());
        Self { path, device }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Read back all queued messages.
    pub fn pending(&self) -> Result<Vec<LimitAlertMessage>, NotifyError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(|e| NotifyError::Delivery(e.to_string())))
            .collect()
    }
}

impl EmailSink for OutboxMailer {
    fn send_limit_alert(
        &self,
        application_id: &str,
        usage_minutes: f64,
        profile_name: &str,
    ) -> Result<(), NotifyError> {
        let message = LimitAlertMessage {
            subject: format!("⚠️ Time Limit Exceeded - {application_id}"),
            application_id: application_id.to_string(),
            usage_minutes,
            profile_name: profile_name.to_string(),
            device: self.device.clone(),
            created_at: Utc::now(),
        };
        let line =
            serde_json::to_string(&message).map_err(|e| NotifyError::Delivery(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| NotifyError::Delivery(e.to_string()))?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        writeln!(file, "{line}").map_err(|e| NotifyError::Delivery(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbox_appends_messages() {
        let dir = tempfile::tempdir().unwrap();
        let mailer = OutboxMailer::new(dir.path().join("outbox").join("mail.jsonl"));

        mailer
            .send_limit_alert("chrome.exe", 1.0, "Kids Profile")
            .unwrap();
        mailer
            .send_limit_alert("whatsapp.exe", 2.5, "Kids Profile")
            .unwrap();

        let pending = mailer.pending().unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].application_id, "chrome.exe");
        assert_eq!(pending[1].usage_minutes, 2.5);
        assert!(pending[0].subject.contains("chrome.exe"));
    }

    #[test]
    fn test_console_notifier_never_fails() {
        assert!(ConsoleNotifier.notify("title", "message").is_ok());
    }
}

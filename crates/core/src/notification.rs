//! User-facing notifications for job outcomes.
//!
//! Notifications are fire-and-forget: the producer never waits for the
//! user to acknowledge them, and the presenter hides each one after
//! [`Notification::dismiss_after`].

use std::time::Duration;

use serde::Serialize;

use crate::types::Timestamp;

/// How long a notification stays visible.
pub const DEFAULT_DISMISS_AFTER: Duration = Duration::from_secs(4);

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A single message to show the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    #[serde(serialize_with = "serialize_millis")]
    pub dismiss_after: Duration,
    pub created_at: Timestamp,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            dismiss_after: DEFAULT_DISMISS_AFTER,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    /// Error notification for a failed operation, e.g.
    /// `"Upload failed: file too large"`.
    pub fn failure(operation: &str, error: &dyn std::fmt::Display) -> Self {
        Self::error(format!("{operation} failed: {error}"))
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

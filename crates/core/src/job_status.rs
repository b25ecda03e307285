//! Job status vocabulary and the status payload returned by the job
//! status endpoints.
//!
//! Both the courseware and the voice-replacement endpoints report the
//! same payload shape. The status string set is small but open: values
//! the client does not recognise are kept verbatim in
//! [`JobStatus::Other`] rather than rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_UPLOADING: &str = "uploading";
pub const STATUS_PROCESSING: &str = "processing";
pub const STATUS_ANALYZING: &str = "analyzing";
/// Voice replacement: speech recognition finished, transcript available.
pub const STATUS_ANALYZED: &str = "analyzed";
pub const STATUS_SYNTHESIZING: &str = "synthesizing";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_FAILED: &str = "failed";

/// Status of a server-side job as reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Pending,
    Uploading,
    Processing,
    Analyzing,
    Analyzed,
    Synthesizing,
    Completed,
    Failed,
    /// A status string this client does not know about.
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => STATUS_PENDING,
            Self::Uploading => STATUS_UPLOADING,
            Self::Processing => STATUS_PROCESSING,
            Self::Analyzing => STATUS_ANALYZING,
            Self::Analyzed => STATUS_ANALYZED,
            Self::Synthesizing => STATUS_SYNTHESIZING,
            Self::Completed => STATUS_COMPLETED,
            Self::Failed => STATUS_FAILED,
            Self::Other(s) => s,
        }
    }

    /// Whether this value is one of the statuses the client knows.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            STATUS_PENDING => Self::Pending,
            STATUS_UPLOADING => Self::Uploading,
            STATUS_PROCESSING => Self::Processing,
            STATUS_ANALYZING => Self::Analyzing,
            STATUS_ANALYZED => Self::Analyzed,
            STATUS_SYNTHESIZING => Self::Synthesizing,
            STATUS_COMPLETED => Self::Completed,
            STATUS_FAILED => Self::Failed,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for JobStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `GET /api/{courseware|voice-replace}/status/{task_id}`.
///
/// Unknown fields are ignored. `original_filename` and `process_date`
/// are only meaningful for courseware jobs; `text` carries the
/// recognised transcript once a voice-replacement job is `analyzed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Percentage 0-100. Not validated; the server is authoritative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl StatusPayload {
    /// Payload with only a status set.
    pub fn with_status(status: impl Into<JobStatus>) -> Self {
        Self {
            status: status.into(),
            message: None,
            progress: None,
            original_filename: None,
            process_date: None,
            text: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_statuses_parse() {
        assert_eq!(JobStatus::from("completed"), JobStatus::Completed);
        assert_eq!(JobStatus::from("analyzed"), JobStatus::Analyzed);
        assert_eq!(JobStatus::from("failed"), JobStatus::Failed);
        assert_eq!(JobStatus::from("synthesizing"), JobStatus::Synthesizing);
    }

    #[test]
    fn unknown_status_is_preserved() {
        let status = JobStatus::from("complete");
        assert_eq!(status, JobStatus::Other("complete".into()));
        assert!(!status.is_recognized());
        assert_eq!(status.as_str(), "complete");
    }

    #[test]
    fn status_match_is_case_sensitive() {
        assert_eq!(JobStatus::from("Completed"), JobStatus::Other("Completed".into()));
    }

    #[test]
    fn payload_parses_minimal_body() {
        let payload: StatusPayload = serde_json::from_str(r#"{"status":"processing"}"#).unwrap();
        assert_eq!(payload.status, JobStatus::Processing);
        assert!(payload.message.is_none());
        assert!(payload.progress.is_none());
    }

    #[test]
    fn payload_parses_full_courseware_body() {
        let payload: StatusPayload = serde_json::from_str(
            r#"{
                "status": "completed",
                "message": "done",
                "progress": 100,
                "original_filename": "lesson1",
                "process_date": "20240315",
                "output_file": "/srv/out.mp4"
            }"#,
        )
        .unwrap();
        assert_eq!(payload.status, JobStatus::Completed);
        assert_eq!(payload.progress, Some(100));
        assert_eq!(payload.original_filename.as_deref(), Some("lesson1"));
        assert_eq!(payload.process_date.as_deref(), Some("20240315"));
    }

    #[test]
    fn payload_without_status_is_rejected() {
        let result: Result<StatusPayload, _> = serde_json::from_str(r#"{"progress": 5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn payload_serializes_status_as_string() {
        let json = serde_json::to_value(StatusPayload::with_status("analyzed")).unwrap();
        assert_eq!(json, serde_json::json!({"status": "analyzed"}));
    }
}

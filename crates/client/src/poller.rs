//! Status polling loop for long-running server jobs.
//!
//! [`poll_job`] queries a job's status at a fixed interval until the
//! job reaches a terminal status, the attempt ceiling is hit, too many
//! consecutive status requests fail, or the caller's
//! [`CancellationToken`] fires. Intermediate progress goes to a
//! [`ProgressSink`].
//!
//! Each call is one independent session with its own counters. Nothing
//! is shared between sessions except the sink they report to.

use aivoice_core::job_status::{JobStatus, StatusPayload};
use aivoice_core::poll_config::PollConfig;
use aivoice_core::types::TaskId;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::api::ApiError;
use crate::sink::{ProgressSink, ProgressTracker};

/// Message used when the server reports `failed` without one.
pub const DEFAULT_FAILURE_MESSAGE: &str = "processing failed";

/// Anything that can report the current status of a job.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, task_id: &TaskId) -> Result<StatusPayload, ApiError>;
}

/// Ways a polling session can end without success.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// The server reported the job as failed.
    #[error("Job failed: {message}")]
    JobFailed { message: String },

    /// The attempt ceiling was reached while the job was still running.
    #[error("Job did not finish after {attempts} status checks")]
    PollingTimedOut { attempts: u32 },

    /// Too many status requests in a row failed.
    #[error("Status checks failed {errors} times in a row: {last_error}")]
    TransportExhausted {
        errors: u32,
        #[source]
        last_error: ApiError,
    },

    /// The caller cancelled the session.
    #[error("Polling cancelled")]
    Cancelled,
}

/// Poll a job until it reaches one of `config.terminal_success`.
///
/// The first status check is issued immediately; later checks wait
/// `config.poll_interval`. Every check, successful or not, counts toward
/// `config.max_attempts`. A `max_consecutive_errors` of zero is treated
/// as one.
pub async fn poll_job<S>(
    source: &S,
    task_id: &TaskId,
    config: &PollConfig,
    sink: &dyn ProgressSink,
    cancel: &CancellationToken,
) -> Result<StatusPayload, PollError>
where
    S: StatusSource + ?Sized,
{
    let max_errors = config.max_consecutive_errors.max(1);
    let mut tracker = ProgressTracker::new();
    let mut attempts = 0u32;
    let mut consecutive_errors = 0u32;

    loop {
        if cancel.is_cancelled() {
            tracing::info!(task_id = %task_id, attempts, "Polling cancelled");
            return Err(PollError::Cancelled);
        }

        attempts += 1;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(task_id = %task_id, attempts, "Polling cancelled mid-request");
                return Err(PollError::Cancelled);
            }
            result = source.fetch_status(task_id) => result,
        };

        match result {
            Ok(payload) => {
                consecutive_errors = 0;

                if let Some(update) = tracker.observe(task_id, &payload) {
                    sink.report(&update);
                }

                tracing::debug!(
                    task_id = %task_id,
                    attempt = attempts,
                    status = %payload.status,
                    progress = payload.progress,
                    "Job status",
                );

                if config.is_terminal_success(&payload.status) {
                    tracing::info!(
                        task_id = %task_id,
                        attempts,
                        status = %payload.status,
                        "Job reached terminal status",
                    );
                    return Ok(payload);
                }

                if payload.status == JobStatus::Failed {
                    let message = payload
                        .message
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
                    tracing::warn!(task_id = %task_id, attempts, reason = %message, "Job failed");
                    return Err(PollError::JobFailed { message });
                }

                if !payload.status.is_recognized() {
                    tracing::warn!(
                        task_id = %task_id,
                        status = %payload.status,
                        "Unrecognized job status, continuing to poll",
                    );
                }
            }
            Err(e) => {
                consecutive_errors += 1;
                tracing::warn!(
                    task_id = %task_id,
                    attempt = attempts,
                    consecutive_errors,
                    error = %e,
                    "Status check failed",
                );

                if consecutive_errors >= max_errors {
                    tracing::error!(
                        task_id = %task_id,
                        errors = consecutive_errors,
                        "Giving up after repeated status check failures",
                    );
                    return Err(PollError::TransportExhausted {
                        errors: consecutive_errors,
                        last_error: e,
                    });
                }
            }
        }

        if let Some(max) = config.max_attempts {
            if attempts >= max {
                tracing::warn!(task_id = %task_id, attempts, "Polling timed out");
                return Err(PollError::PollingTimedOut { attempts });
            }
        }

        // Wait before the next check, respecting cancellation.
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(task_id = %task_id, attempts, "Polling cancelled");
                return Err(PollError::Cancelled);
            }
            _ = tokio::time::sleep(config.poll_interval) => {}
        }
    }
}

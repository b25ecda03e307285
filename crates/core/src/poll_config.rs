//! Polling parameters for the job poller and the two job kinds that use
//! it.

use std::time::Duration;

use crate::job_status::JobStatus;

/// Courseware jobs are checked every 3 seconds.
pub const COURSEWARE_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Voice-replacement jobs are checked every 5 seconds.
pub const VOICE_REPLACE_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// 240 checks at 5 s, roughly 20 minutes.
pub const VOICE_REPLACE_MAX_ATTEMPTS: u32 = 240;

/// Consecutive failed status requests tolerated before giving up.
pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 5;

/// Parameters for one polling session.
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    /// Delay between two status checks.
    pub poll_interval: Duration,
    /// Status checks allowed before timing out. `None` polls until a
    /// terminal status.
    pub max_attempts: Option<u32>,
    /// Consecutive transport or parse failures allowed. A successful
    /// check resets the count.
    pub max_consecutive_errors: u32,
    /// Statuses that end the session successfully.
    pub terminal_success: Vec<JobStatus>,
}

impl PollConfig {
    /// Courseware processing: 3 s interval, no attempt ceiling, resolves
    /// on `completed`.
    pub fn courseware() -> Self {
        Self {
            poll_interval: COURSEWARE_POLL_INTERVAL,
            max_attempts: None,
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
            terminal_success: vec![JobStatus::Completed],
        }
    }

    /// Video voice replacement: 5 s interval, 240 attempts, resolves on
    /// either `analyzed` or `completed`.
    pub fn voice_replace() -> Self {
        Self {
            poll_interval: VOICE_REPLACE_POLL_INTERVAL,
            max_attempts: Some(VOICE_REPLACE_MAX_ATTEMPTS),
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
            terminal_success: vec![JobStatus::Analyzed, JobStatus::Completed],
        }
    }

    pub fn with_max_consecutive_errors(mut self, max: u32) -> Self {
        self.max_consecutive_errors = max;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max: Option<u32>) -> Self {
        self.max_attempts = max;
        self
    }

    pub fn is_terminal_success(&self, status: &JobStatus) -> bool {
        self.terminal_success.contains(status)
    }
}

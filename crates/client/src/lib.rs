//! HTTP client and job poller for the aivoice service.
//!
//! Provides typed wrappers over the job endpoints, a cancellable status
//! polling loop, progress and notification seams, and the courseware and
//! voice-replacement workflows built on them.

pub mod api;
pub mod config;
pub mod notify;
pub mod poller;
pub mod sink;
pub mod workflow;

pub use api::{ApiClient, ApiError, FileUpload, JobKind};
pub use config::{ClientConfig, ConfigError};
pub use poller::{poll_job, PollError, StatusSource};
pub use sink::{ProgressSink, ProgressUpdate};
pub use workflow::{CoursewareWorkflow, VoiceReplaceSession, VoiceReplaceWorkflow, WorkflowError};

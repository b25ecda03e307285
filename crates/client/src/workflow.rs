//! End-to-end job workflows built on the API client and the poller.
//!
//! [`CoursewareWorkflow`] covers submit, poll, and download for
//! courseware narration. [`VoiceReplaceWorkflow`] covers the multi-phase
//! voice replacement (upload, analyze, synthesize, download); each phase
//! is a separate call and state between phases lives in a caller-owned
//! [`VoiceReplaceSession`].
//!
//! Every public operation reports its outcome to the workflow's
//! [`Notifier`].

use std::sync::{Arc, Mutex};

use aivoice_core::error::CoreError;
use aivoice_core::job_status::{JobStatus, StatusPayload};
use aivoice_core::naming::{courseware_filename, voice_replace_filename, VoiceReplaceArtifact};
use aivoice_core::notification::Notification;
use aivoice_core::params::{CoursewareParams, SynthesisParams};
use aivoice_core::poll_config::PollConfig;
use aivoice_core::types::TaskId;
use aivoice_core::upload::{validate_courseware, validate_video, validate_voice_id};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiClient, ApiError, FileUpload, JobKind};
use crate::notify::Notifier;
use crate::poller::{poll_job, PollError, StatusSource};
use crate::sink::ProgressSink;

/// Errors surfaced by workflow operations.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Invalid(#[from] CoreError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Poll(#[from] PollError),

    /// A phase finished in a terminal status other than the one it
    /// waits for.
    #[error("Expected job status '{expected}', got '{actual}': {message}")]
    UnexpectedStatus {
        expected: JobStatus,
        actual: JobStatus,
        message: String,
    },

    /// Subtitles were requested for download but synthesis ran without them.
    #[error("Subtitles were not requested for this job")]
    SubtitlesNotRequested,
}

/// A downloaded artifact with the filename it should be saved under.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Forward the result of `operation` to `notifier` and hand it back.
fn report<T>(
    notifier: &dyn Notifier,
    operation: &str,
    success: impl FnOnce(&T) -> String,
    result: Result<T, WorkflowError>,
) -> Result<T, WorkflowError> {
    match &result {
        Ok(value) => notifier.notify(Notification::success(success(value))),
        Err(e) => notifier.notify(Notification::failure(operation, e)),
    }
    result
}

// ---------------------------------------------------------------------------
// Courseware
// ---------------------------------------------------------------------------

/// Result metadata collected while polling a courseware job.
#[derive(Debug, Default, Clone, PartialEq)]
struct ResultMetadata {
    original_filename: Option<String>,
    process_date: Option<String>,
}

/// Wraps a [`StatusSource`] and keeps the latest non-empty result
/// metadata seen in any payload, since the server may report it before
/// the terminal status.
struct MetadataRecorder<'a, S: ?Sized> {
    inner: &'a S,
    seen: Mutex<ResultMetadata>,
}

impl<'a, S: StatusSource + ?Sized> MetadataRecorder<'a, S> {
    fn new(inner: &'a S) -> Self {
        Self {
            inner,
            seen: Mutex::new(ResultMetadata::default()),
        }
    }

    fn into_metadata(self) -> ResultMetadata {
        self.seen.into_inner().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl<S: StatusSource + ?Sized> StatusSource for MetadataRecorder<'_, S> {
    async fn fetch_status(&self, task_id: &TaskId) -> Result<StatusPayload, ApiError> {
        let payload = self.inner.fetch_status(task_id).await?;

        let mut seen = self.seen.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(name) = payload.original_filename.as_ref().filter(|s| !s.is_empty()) {
            seen.original_filename = Some(name.clone());
        }
        if let Some(date) = payload.process_date.as_ref().filter(|s| !s.is_empty()) {
            seen.process_date = Some(date.clone());
        }
        drop(seen);

        Ok(payload)
    }
}

/// A finished courseware job.
#[derive(Debug, Clone)]
pub struct CoursewareOutcome {
    pub task_id: TaskId,
    /// Terminal payload with accumulated result metadata merged in.
    pub payload: StatusPayload,
    /// Name the artifact should be saved under.
    pub download_filename: String,
}

/// Courseware narration: upload a deck or document, wait, download.
pub struct CoursewareWorkflow {
    api: Arc<ApiClient>,
    notifier: Arc<dyn Notifier>,
    config: PollConfig,
}

impl CoursewareWorkflow {
    pub fn new(api: Arc<ApiClient>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            config: PollConfig::courseware(),
        }
    }

    pub fn with_config(mut self, config: PollConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate and submit `upload`, then poll until it completes.
    pub async fn run(
        &self,
        upload: FileUpload,
        params: &CoursewareParams,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<CoursewareOutcome, WorkflowError> {
        let result = self.run_inner(upload, params, sink, cancel).await;
        report(
            self.notifier.as_ref(),
            "Courseware processing",
            |_| "Courseware processed successfully".to_string(),
            result,
        )
    }

    async fn run_inner(
        &self,
        upload: FileUpload,
        params: &CoursewareParams,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<CoursewareOutcome, WorkflowError> {
        validate_courseware(&upload.filename, upload.size())?;
        validate_voice_id(&params.voice_id)?;

        let source_filename = upload.filename.clone();
        tracing::info!(
            filename = %source_filename,
            size = upload.size(),
            voice_id = %params.voice_id,
            is_preset = params.is_preset,
            "Submitting courseware",
        );

        let task_id = self.api.submit_courseware(upload, params).await?;
        tracing::info!(task_id = %task_id, "Courseware job accepted");

        let endpoint = self.api.status_source(JobKind::Courseware);
        let recorder = MetadataRecorder::new(&endpoint);
        let mut payload = poll_job(&recorder, &task_id, &self.config, sink, cancel).await?;
        let metadata = recorder.into_metadata();

        if metadata.original_filename.is_some() {
            payload.original_filename = metadata.original_filename;
        }
        if metadata.process_date.is_some() {
            payload.process_date = metadata.process_date;
        }

        let download_filename = courseware_filename(
            &source_filename,
            payload.original_filename.as_deref(),
            payload.process_date.as_deref(),
        );

        Ok(CoursewareOutcome {
            task_id,
            payload,
            download_filename,
        })
    }

    /// Download the artifact of a finished job.
    pub async fn download(&self, outcome: &CoursewareOutcome) -> Result<Artifact, WorkflowError> {
        let result = self
            .api
            .download_courseware(&outcome.task_id)
            .await
            .map(|bytes| Artifact {
                filename: outcome.download_filename.clone(),
                bytes,
            })
            .map_err(WorkflowError::from);

        report(
            self.notifier.as_ref(),
            "Download",
            |a: &Artifact| format!("Downloaded {}", a.filename),
            result,
        )
    }
}

// ---------------------------------------------------------------------------
// Voice replacement
// ---------------------------------------------------------------------------

/// Caller-owned state of a voice-replacement job across its phases.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceReplaceSession {
    pub task_id: TaskId,
    /// Name of the uploaded video, used for download filenames.
    pub source_filename: String,
    /// Transcript recognised during analysis.
    pub transcript: Option<String>,
    /// Whether synthesis was asked to produce subtitles.
    pub subtitles_requested: bool,
}

/// Video voice replacement: upload, analyze, synthesize, download.
pub struct VoiceReplaceWorkflow {
    api: Arc<ApiClient>,
    notifier: Arc<dyn Notifier>,
    config: PollConfig,
}

impl VoiceReplaceWorkflow {
    pub fn new(api: Arc<ApiClient>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            config: PollConfig::voice_replace(),
        }
    }

    pub fn with_config(mut self, config: PollConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate and upload a video. Starts a new session.
    pub async fn upload(&self, upload: FileUpload) -> Result<VoiceReplaceSession, WorkflowError> {
        let result = self.upload_inner(upload).await;
        report(
            self.notifier.as_ref(),
            "Upload",
            |_| "Video uploaded".to_string(),
            result,
        )
    }

    async fn upload_inner(&self, upload: FileUpload) -> Result<VoiceReplaceSession, WorkflowError> {
        validate_video(&upload.filename, upload.size())?;
        let source_filename = upload.filename.clone();
        tracing::info!(filename = %source_filename, size = upload.size(), "Uploading video");

        let task_id = self.api.upload_video(upload).await?;
        tracing::info!(task_id = %task_id, "Video accepted");

        Ok(VoiceReplaceSession {
            task_id,
            source_filename,
            transcript: None,
            subtitles_requested: false,
        })
    }

    /// Trigger speech recognition and wait for `analyzed`. Stores the
    /// transcript on the session.
    pub async fn analyze(
        &self,
        session: &mut VoiceReplaceSession,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<StatusPayload, WorkflowError> {
        let result = self.analyze_inner(session, sink, cancel).await;
        report(
            self.notifier.as_ref(),
            "Analysis",
            |_| "Audio analysis complete".to_string(),
            result,
        )
    }

    async fn analyze_inner(
        &self,
        session: &mut VoiceReplaceSession,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<StatusPayload, WorkflowError> {
        self.api.start_analysis(&session.task_id).await?;
        let payload = self
            .await_phase(&session.task_id, JobStatus::Analyzed, sink, cancel)
            .await?;
        session.transcript = payload.text.clone();
        Ok(payload)
    }

    /// Trigger synthesis with the chosen voice and wait for `completed`.
    pub async fn synthesize(
        &self,
        session: &mut VoiceReplaceSession,
        params: &SynthesisParams,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<StatusPayload, WorkflowError> {
        let result = self.synthesize_inner(session, params, sink, cancel).await;
        report(
            self.notifier.as_ref(),
            "Synthesis",
            |_| "Voice replacement complete".to_string(),
            result,
        )
    }

    async fn synthesize_inner(
        &self,
        session: &mut VoiceReplaceSession,
        params: &SynthesisParams,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<StatusPayload, WorkflowError> {
        validate_voice_id(&params.voice_id)?;
        self.api.start_synthesis(&session.task_id, params).await?;
        session.subtitles_requested = params.add_subtitles;
        self.await_phase(&session.task_id, JobStatus::Completed, sink, cancel)
            .await
    }

    /// Download the re-voiced video or its subtitles.
    pub async fn download(
        &self,
        session: &VoiceReplaceSession,
        artifact: VoiceReplaceArtifact,
    ) -> Result<Artifact, WorkflowError> {
        let result = self.download_inner(session, artifact).await;
        report(
            self.notifier.as_ref(),
            "Download",
            |a: &Artifact| format!("Downloaded {}", a.filename),
            result,
        )
    }

    async fn download_inner(
        &self,
        session: &VoiceReplaceSession,
        artifact: VoiceReplaceArtifact,
    ) -> Result<Artifact, WorkflowError> {
        if artifact == VoiceReplaceArtifact::Subtitles && !session.subtitles_requested {
            return Err(WorkflowError::SubtitlesNotRequested);
        }
        let bytes = self
            .api
            .download_voice_replace(&session.task_id, artifact)
            .await?;
        Ok(Artifact {
            filename: voice_replace_filename(Some(&session.source_filename), artifact),
            bytes,
        })
    }

    /// Run one polling session and require it to end in `expected`.
    async fn await_phase(
        &self,
        task_id: &TaskId,
        expected: JobStatus,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<StatusPayload, WorkflowError> {
        let endpoint = self.api.status_source(JobKind::VoiceReplace);
        let payload = poll_job(&endpoint, task_id, &self.config, sink, cancel).await?;

        if payload.status != expected {
            return Err(WorkflowError::UnexpectedStatus {
                expected,
                actual: payload.status.clone(),
                message: payload.message.unwrap_or_else(|| "unknown error".into()),
            });
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    struct Script(Mutex<VecDeque<StatusPayload>>);

    #[async_trait]
    impl StatusSource for Script {
        async fn fetch_status(&self, _task_id: &TaskId) -> Result<StatusPayload, ApiError> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .ok_or(ApiError::Status { status: 404 })
        }
    }

    #[tokio::test]
    async fn recorder_keeps_latest_non_empty_metadata() {
        let script = Script(Mutex::new(
            vec![
                StatusPayload {
                    original_filename: Some("deck".into()),
                    process_date: Some("20240101".into()),
                    ..StatusPayload::with_status("processing")
                },
                StatusPayload {
                    original_filename: Some(String::new()),
                    ..StatusPayload::with_status("processing")
                },
                StatusPayload {
                    process_date: Some("20240102".into()),
                    ..StatusPayload::with_status("completed")
                },
            ]
            .into(),
        ));
        let recorder = MetadataRecorder::new(&script);
        let task = TaskId::new("t").unwrap();

        for _ in 0..3 {
            recorder.fetch_status(&task).await.unwrap();
        }

        let metadata = recorder.into_metadata();
        assert_eq!(metadata.original_filename.as_deref(), Some("deck"));
        assert_eq!(metadata.process_date.as_deref(), Some("20240102"));
    }

    #[tokio::test]
    async fn recorder_passes_errors_through() {
        let script = Script(Mutex::new(VecDeque::new()));
        let recorder = MetadataRecorder::new(&script);
        let err = recorder
            .fetch_status(&TaskId::new("t").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 404 }));
        assert_eq!(recorder.into_metadata(), ResultMetadata::default());
    }

    #[test]
    fn unexpected_status_message() {
        let err = WorkflowError::UnexpectedStatus {
            expected: JobStatus::Completed,
            actual: JobStatus::Analyzed,
            message: "音频分析完成".into(),
        };
        assert_eq!(
            err.to_string(),
            "Expected job status 'completed', got 'analyzed': 音频分析完成"
        );
    }
}

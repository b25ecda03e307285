//! REST API client for the voice service job endpoints.
//!
//! Wraps voice listing, job submission, phase triggers, status queries,
//! and artifact downloads for both courseware processing and video voice
//! replacement using [`reqwest`]. Every request carries the bearer
//! credential from [`ClientConfig`].
//!
//! Transfers are bounded by a connect timeout and an idle read timeout,
//! never by a total deadline, so a slow 100 MiB upload or download
//! succeeds while bytes keep moving. Status checks are small and get a
//! total deadline on top.

use std::path::Path;
use std::time::Duration;

use aivoice_core::job_status::StatusPayload;
use aivoice_core::naming::VoiceReplaceArtifact;
use aivoice_core::params::{clamp_transition_time, CoursewareParams, SynthesisParams};
use aivoice_core::types::TaskId;
use aivoice_core::voice::{Voice, VoiceCatalog, VoiceKind};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::config::{ClientConfig, CONNECT_TIMEOUT};
use crate::poller::StatusSource;

/// Which family of job endpoints a task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Courseware,
    VoiceReplace,
}

impl JobKind {
    /// Path segment under `/api`.
    pub fn path_prefix(&self) -> &'static str {
        match self {
            Self::Courseware => "courseware",
            Self::VoiceReplace => "voice-replace",
        }
    }
}

/// A file read into memory for a multipart upload.
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Name sent in the multipart `filename` attribute.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Read a file from disk, using its final path component as the
    /// upload filename.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { filename, bytes })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn into_part(self) -> Part {
        Part::bytes(self.bytes).file_name(self.filename)
    }
}

/// Response returned by submission endpoints after a job is accepted.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Server-assigned identifier for the job.
    pub task_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Echo of the uploaded filename (voice replacement only).
    #[serde(default)]
    pub filename: Option<String>,
}

/// Errors from the REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A submission or phase trigger was refused by the server.
    #[error("Submission rejected ({status}): {detail}")]
    SubmissionRejected {
        /// HTTP status code.
        status: u16,
        /// Server-supplied `detail`, or a generic message.
        detail: String,
    },

    /// A status query returned a non-2xx code.
    #[error("Status request failed with HTTP {status}")]
    Status { status: u16 },

    /// The status body was not a valid status payload.
    #[error("Malformed status payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// An artifact download returned a non-2xx code.
    #[error("Download failed with HTTP {status}")]
    RetrievalFailed { status: u16 },

    /// A submission succeeded but the body carried no usable task id.
    #[error("Server accepted the job but returned no task id")]
    MissingTaskId,

    /// A voice list request returned a non-2xx code.
    #[error("Loading {kind} voices failed ({status}): {detail}")]
    VoiceListFailed {
        kind: VoiceKind,
        status: u16,
        detail: String,
    },

    /// The requested voice is in neither of the user's voice lists.
    #[error("Unknown voice id '{voice_id}'")]
    UnknownVoice { voice_id: String },
}

/// HTTP client for the voice service job endpoints.
pub struct ApiClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
    /// Total deadline applied to status checks only.
    status_timeout: Option<Duration>,
}

impl ApiClient {
    /// Build a client with its own connection pool. `request_timeout`
    /// is the idle read timeout of every request and the total deadline
    /// of a status check.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(config.request_timeout)
            .build()?;
        let mut api = Self::with_client(client, config.api_url.clone(), config.token.clone());
        api.status_timeout = Some(config.request_timeout);
        Ok(api)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String, token: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            status_timeout: None,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// List one of the user's voice lists.
    ///
    /// Sends `GET /api/voices?type={preset|custom}`.
    pub async fn list_voices(&self, kind: VoiceKind) -> Result<Vec<Voice>, ApiError> {
        let response = self
            .authorized(self.client.get(self.url("/api/voices")))
            .query(&[("type", kind.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::VoiceListFailed {
                kind,
                status: status.as_u16(),
                detail: extract_detail(&body).unwrap_or_else(|| "failed to load voices".into()),
            });
        }

        Ok(response.json::<Vec<Voice>>().await?)
    }

    /// Load the preset and custom lists concurrently.
    pub async fn voice_catalog(&self) -> Result<VoiceCatalog, ApiError> {
        let (preset, custom) = tokio::try_join!(
            self.list_voices(VoiceKind::Preset),
            self.list_voices(VoiceKind::Custom),
        )?;
        tracing::debug!(preset = preset.len(), custom = custom.len(), "Voice lists loaded");
        Ok(VoiceCatalog { preset, custom })
    }

    /// Find `voice_id` in the user's voice lists. The returned voice's
    /// `is_preset` tells which list it belongs to.
    pub async fn resolve_voice(&self, voice_id: &str) -> Result<Voice, ApiError> {
        self.voice_catalog()
            .await?
            .find(voice_id)
            .ok_or_else(|| ApiError::UnknownVoice {
                voice_id: voice_id.to_string(),
            })
    }

    /// Submit a courseware file for narration.
    ///
    /// Sends `POST /api/courseware/process` with the file in the
    /// `courseware` field. Returns the server-assigned task id.
    pub async fn submit_courseware(
        &self,
        upload: FileUpload,
        params: &CoursewareParams,
    ) -> Result<TaskId, ApiError> {
        let form = Form::new()
            .part("courseware", upload.into_part())
            .text("voice_id", params.voice_id.clone())
            .text("is_preset", params.is_preset.to_string())
            .text("animation_mode", params.animation_mode.as_str())
            .text(
                "transition_time",
                clamp_transition_time(params.transition_time).to_string(),
            );

        let response = self
            .authorized(self.client.post(self.url("/api/courseware/process")))
            .multipart(form)
            .send()
            .await?;

        let body: SubmitResponse =
            Self::parse_submission(response, "courseware processing failed").await?;
        Self::task_id_from(body)
    }

    /// Upload a video for voice replacement.
    ///
    /// Sends `POST /api/voice-replace/upload` with the file in the `file`
    /// field. The job then waits for [`start_analysis`](Self::start_analysis).
    pub async fn upload_video(&self, upload: FileUpload) -> Result<TaskId, ApiError> {
        let form = Form::new().part("file", upload.into_part());

        let response = self
            .authorized(self.client.post(self.url("/api/voice-replace/upload")))
            .multipart(form)
            .send()
            .await?;

        let body: SubmitResponse = Self::parse_submission(response, "upload failed").await?;
        Self::task_id_from(body)
    }

    /// Start speech recognition on an uploaded video.
    ///
    /// Sends `POST /api/voice-replace/analyze/{task_id}`. The job moves
    /// to `analyzing` and later `analyzed`.
    pub async fn start_analysis(&self, task_id: &TaskId) -> Result<(), ApiError> {
        let response = self
            .authorized(
                self.client
                    .post(self.url(&format!("/api/voice-replace/analyze/{task_id}"))),
            )
            .send()
            .await?;

        Self::ensure_submitted(response, "analysis failed").await?;
        Ok(())
    }

    /// Start synthesis of the replacement audio for an analyzed video.
    ///
    /// Sends `POST /api/voice-replace/synthesize/{task_id}`. The job
    /// moves to `synthesizing` and later `completed`.
    pub async fn start_synthesis(
        &self,
        task_id: &TaskId,
        params: &SynthesisParams,
    ) -> Result<(), ApiError> {
        let form = Form::new()
            .text("voice_id", params.voice_id.clone())
            .text("is_preset", params.is_preset.to_string())
            .text("add_subtitles", params.add_subtitles.to_string());

        let response = self
            .authorized(
                self.client
                    .post(self.url(&format!("/api/voice-replace/synthesize/{task_id}"))),
            )
            .multipart(form)
            .send()
            .await?;

        Self::ensure_submitted(response, "synthesis failed").await?;
        Ok(())
    }

    /// Query the current status of a job.
    ///
    /// Sends `GET /api/{kind}/status/{task_id}`.
    pub async fn status(&self, kind: JobKind, task_id: &TaskId) -> Result<StatusPayload, ApiError> {
        let url = self.url(&format!("/api/{}/status/{task_id}", kind.path_prefix()));
        let mut request = self.authorized(self.client.get(url));
        if let Some(timeout) = self.status_timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn courseware_status(&self, task_id: &TaskId) -> Result<StatusPayload, ApiError> {
        self.status(JobKind::Courseware, task_id).await
    }

    pub async fn voice_replace_status(&self, task_id: &TaskId) -> Result<StatusPayload, ApiError> {
        self.status(JobKind::VoiceReplace, task_id).await
    }

    /// A [`StatusSource`] bound to one job kind, for use with the poller.
    pub fn status_source(&self, kind: JobKind) -> StatusEndpoint<'_> {
        StatusEndpoint { api: self, kind }
    }

    /// Download the artifact of a completed courseware job.
    ///
    /// Sends `GET /api/courseware/download/{task_id}`.
    pub async fn download_courseware(&self, task_id: &TaskId) -> Result<Vec<u8>, ApiError> {
        self.download(&format!("/api/courseware/download/{task_id}"))
            .await
    }

    /// Download an artifact of a completed voice-replacement job.
    ///
    /// Sends `GET /api/voice-replace/download/{task_id}` for the video or
    /// `GET /api/voice-replace/download-subtitles/{task_id}` for the SRT.
    pub async fn download_voice_replace(
        &self,
        task_id: &TaskId,
        artifact: VoiceReplaceArtifact,
    ) -> Result<Vec<u8>, ApiError> {
        let path = match artifact {
            VoiceReplaceArtifact::Video => format!("/api/voice-replace/download/{task_id}"),
            VoiceReplaceArtifact::Subtitles => {
                format!("/api/voice-replace/download-subtitles/{task_id}")
            }
        };
        self.download(&path).await
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(&self.token)
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.authorized(self.client.get(self.url(path))).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::RetrievalFailed {
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Ensure a submission response has a success status code. On
    /// failure the JSON `detail` field is surfaced when it is a string,
    /// otherwise `fallback`.
    async fn ensure_submitted(
        response: reqwest::Response,
        fallback: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::SubmissionRejected {
                status: status.as_u16(),
                detail: extract_detail(&body).unwrap_or_else(|| fallback.to_string()),
            });
        }
        Ok(response)
    }

    async fn parse_submission<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_submitted(response, fallback).await?;
        Ok(response.json::<T>().await?)
    }

    fn task_id_from(body: SubmitResponse) -> Result<TaskId, ApiError> {
        body.task_id
            .and_then(|id| TaskId::new(id).ok())
            .ok_or(ApiError::MissingTaskId)
    }
}

/// Pull a string `detail` out of an error body such as
/// `{"detail": "voice not found"}`.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("detail")?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Status endpoint of one job kind.
pub struct StatusEndpoint<'a> {
    api: &'a ApiClient,
    kind: JobKind,
}

#[async_trait]
impl StatusSource for StatusEndpoint<'_> {
    async fn fetch_status(&self, task_id: &TaskId) -> Result<StatusPayload, ApiError> {
        self.api.status(self.kind, task_id).await
    }
}

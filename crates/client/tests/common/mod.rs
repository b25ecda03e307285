//! In-process fake of the voice service API for integration tests.
//!
//! Binds an axum router to `127.0.0.1:0` and replays scripted status
//! responses, recording what the client sent.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use aivoice_client::ApiClient;

pub const TEST_TOKEN: &str = "test-token";

/// One scripted HTTP reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(u16, Value),
    Raw(u16, String),
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self::Json(200, body)
    }

    pub fn status(status: &str, progress: i64) -> Self {
        Self::ok(json!({"status": status, "progress": progress}))
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Json(code, body) => (code_of(code), Json(body)).into_response(),
            Reply::Raw(code, body) => (code_of(code), body).into_response(),
        }
    }
}

fn code_of(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// A request the fake received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub authorization: Option<String>,
    /// Multipart fields as `(name, value)`; file fields record the filename.
    pub fields: Vec<(String, String)>,
}

impl Recorded {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Chunked artifact body: `chunks` pieces of `chunk_size` bytes, each
/// sent after `gap`.
#[derive(Debug, Clone, Copy)]
pub struct SlowBody {
    pub chunks: u32,
    pub chunk_size: usize,
    pub gap: Duration,
}

#[derive(Default)]
pub struct FakeState {
    pub statuses: Mutex<VecDeque<Reply>>,
    pub submit_reply: Mutex<Option<Reply>>,
    pub download_reply: Mutex<Option<Reply>>,
    pub slow_downloads: Mutex<Option<SlowBody>>,
    pub voices: Mutex<HashMap<String, Reply>>,
    pub status_calls: AtomicU32,
    pub requests: Mutex<Vec<Recorded>>,
}

impl FakeState {
    pub fn script(&self, replies: impl IntoIterator<Item = Reply>) {
        self.statuses.lock().unwrap().extend(replies);
    }

    pub fn reject_submissions(&self, reply: Reply) {
        *self.submit_reply.lock().unwrap() = Some(reply);
    }

    pub fn fail_downloads(&self, reply: Reply) {
        *self.download_reply.lock().unwrap() = Some(reply);
    }

    pub fn stream_downloads(&self, body: SlowBody) {
        *self.slow_downloads.lock().unwrap() = Some(body);
    }

    /// Replace the reply of `GET /api/voices?type={kind}`.
    pub fn voices(&self, kind: &str, reply: Reply) {
        self.voices.lock().unwrap().insert(kind.to_string(), reply);
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn requests_to(&self, prefix: &str) -> Vec<Recorded> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn record(&self, path: String, headers: &HeaderMap, fields: Vec<(String, String)>) {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.requests.lock().unwrap().push(Recorded {
            path,
            authorization,
            fields,
        });
    }
}

pub struct FakeApi {
    pub base_url: String,
    pub state: Arc<FakeState>,
}

impl FakeApi {
    pub fn client(&self) -> ApiClient {
        ApiClient::with_client(
            reqwest::Client::new(),
            self.base_url.clone(),
            TEST_TOKEN.to_string(),
        )
    }
}

/// Start the fake API on an ephemeral port.
pub async fn spawn_fake_api() -> FakeApi {
    let state = Arc::new(FakeState::default());
    state.voices(
        "preset",
        Reply::ok(json!([
            {"id": 1, "name": "中文女", "is_preset": true, "user_id": 1},
            {"id": 2, "name": "中文男", "is_preset": true, "user_id": 1}
        ])),
    );
    state.voices(
        "custom",
        Reply::ok(json!([
            {"id": 7, "name": "my voice", "is_preset": false, "user_id": 5,
             "transcript": "希望你以后能够做的比我还好呦。"}
        ])),
    );

    let app = Router::new()
        .route("/api/voices", get(voices))
        .route("/api/courseware/process", post(submit_courseware))
        .route("/api/courseware/status/{task_id}", get(status))
        .route("/api/courseware/download/{task_id}", get(download))
        .route("/api/voice-replace/upload", post(upload_video))
        .route("/api/voice-replace/analyze/{task_id}", post(trigger))
        .route("/api/voice-replace/synthesize/{task_id}", post(synthesize))
        .route("/api/voice-replace/status/{task_id}", get(status))
        .route("/api/voice-replace/download/{task_id}", get(download))
        .route(
            "/api/voice-replace/download-subtitles/{task_id}",
            get(download_subtitles),
        )
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake api");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake api server");
    });

    FakeApi {
        base_url: format!("http://{addr}"),
        state,
    }
}

async fn read_fields(mut multipart: Multipart) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.expect("field bytes");
        let value = file_name.unwrap_or_else(|| String::from_utf8_lossy(&data).into_owned());
        fields.push((name, value));
    }
    fields
}

async fn submit_courseware(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Reply {
    let fields = read_fields(multipart).await;
    state.record("/api/courseware/process".into(), &headers, fields);

    state
        .submit_reply
        .lock()
        .unwrap()
        .clone()
        .unwrap_or_else(|| Reply::ok(json!({"message": "课件处理任务已提交", "task_id": "cw-1"})))
}

async fn upload_video(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Reply {
    let fields = read_fields(multipart).await;
    let filename = fields
        .iter()
        .find(|(n, _)| n == "file")
        .map(|(_, v)| v.clone())
        .unwrap_or_default();
    state.record("/api/voice-replace/upload".into(), &headers, fields);

    state.submit_reply.lock().unwrap().clone().unwrap_or_else(|| {
        Reply::ok(json!({"task_id": "vr-1", "message": "文件已上传，开始处理", "filename": filename}))
    })
}

async fn trigger(
    State(state): State<Arc<FakeState>>,
    Path(task_id): Path<String>,
    headers: HeaderMap,
) -> Reply {
    state.record(format!("/api/voice-replace/analyze/{task_id}"), &headers, Vec::new());
    state
        .submit_reply
        .lock()
        .unwrap()
        .clone()
        .unwrap_or_else(|| Reply::ok(json!({"message": "开始分析音频", "task_id": task_id})))
}

async fn synthesize(
    State(state): State<Arc<FakeState>>,
    Path(task_id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Reply {
    let fields = read_fields(multipart).await;
    state.record(format!("/api/voice-replace/synthesize/{task_id}"), &headers, fields);
    state
        .submit_reply
        .lock()
        .unwrap()
        .clone()
        .unwrap_or_else(|| Reply::ok(json!({"message": "开始合成音频", "task_id": task_id})))
}

async fn status(
    State(state): State<Arc<FakeState>>,
    Path(task_id): Path<String>,
    headers: HeaderMap,
) -> Reply {
    state.status_calls.fetch_add(1, Ordering::SeqCst);
    state.record(format!("status/{task_id}"), &headers, Vec::new());
    state
        .statuses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Reply::Json(404, json!({"detail": "任务不存在"})))
}

async fn voices(
    State(state): State<Arc<FakeState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Reply {
    let kind = query.get("type").cloned().unwrap_or_default();
    state.record(format!("/api/voices?type={kind}"), &headers, Vec::new());
    state
        .voices
        .lock()
        .unwrap()
        .get(&kind)
        .cloned()
        .unwrap_or_else(|| Reply::ok(json!([])))
}

/// Serve a download. Recorded under the full request path; the body is
/// `ARTIFACT:{task_id}` unless a failure or slow stream is configured.
async fn download(
    State(state): State<Arc<FakeState>>,
    Path(task_id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    serve_download(&state, uri, &headers, format!("ARTIFACT:{task_id}"))
}

async fn download_subtitles(
    State(state): State<Arc<FakeState>>,
    Path(task_id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    serve_download(
        &state,
        uri,
        &headers,
        format!("1\n00:00:00,000 --> 00:00:02,000\nSRT:{task_id}\n"),
    )
}

fn serve_download(state: &FakeState, uri: Uri, headers: &HeaderMap, body: String) -> Response {
    state.record(uri.path().to_string(), headers, Vec::new());

    if let Some(reply) = state.download_reply.lock().unwrap().clone() {
        return reply.into_response();
    }

    match *state.slow_downloads.lock().unwrap() {
        Some(slow) => {
            let chunks = futures::stream::unfold(0u32, move |sent| async move {
                if sent >= slow.chunks {
                    return None;
                }
                tokio::time::sleep(slow.gap).await;
                Some((Ok::<_, std::io::Error>(vec![b'x'; slow.chunk_size]), sent + 1))
            });
            Body::from_stream(chunks).into_response()
        }
        None => body.into_response(),
    }
}

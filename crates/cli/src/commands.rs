//! Subcommand implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use aivoice_client::notify::TracingNotifier;
use aivoice_client::sink::TracingSink;
use aivoice_client::workflow::Artifact;
use aivoice_client::{
    poll_job, ApiClient, ClientConfig, CoursewareWorkflow, FileUpload, JobKind,
    VoiceReplaceWorkflow,
};
use aivoice_core::naming::VoiceReplaceArtifact;
use aivoice_core::params::{
    clamp_transition_time, AnimationMode, CoursewareParams, SynthesisParams,
};
use aivoice_core::poll_config::PollConfig;
use aivoice_core::types::TaskId;
use aivoice_core::voice::{Voice, VoiceCatalog, VoiceKind};
use anyhow::Context;
use tokio_util::sync::CancellationToken;

/// Shared state for every subcommand.
pub struct App {
    pub config: ClientConfig,
    pub api: Arc<ApiClient>,
    pub cancel: CancellationToken,
}

impl App {
    pub fn new(config: ClientConfig, cancel: CancellationToken) -> anyhow::Result<Self> {
        let api = ApiClient::new(&config).context("failed to build HTTP client")?;
        Ok(Self {
            config,
            api: Arc::new(api),
            cancel,
        })
    }

    fn poll_config(&self, base: PollConfig) -> PollConfig {
        base.with_max_consecutive_errors(self.config.max_consecutive_errors)
    }
}

pub struct CoursewareArgs {
    pub file: PathBuf,
    pub voice_id: String,
    pub animation_mode: AnimationMode,
    pub transition_time: f64,
    pub out_dir: PathBuf,
}

pub async fn courseware(app: &App, args: CoursewareArgs) -> anyhow::Result<()> {
    let upload = read_upload(&args.file).await?;
    let voice = resolve_voice(app, &args.voice_id).await?;

    let params = CoursewareParams {
        voice_id: voice.voice_id(),
        is_preset: voice.is_preset,
        animation_mode: args.animation_mode,
        transition_time: clamp_transition_time(args.transition_time),
    };

    let workflow = CoursewareWorkflow::new(Arc::clone(&app.api), Arc::new(TracingNotifier))
        .with_config(app.poll_config(PollConfig::courseware()));

    let outcome = workflow
        .run(upload, &params, &TracingSink, &app.cancel)
        .await?;
    tracing::info!(
        task_id = %outcome.task_id,
        filename = %outcome.download_filename,
        "Courseware job finished",
    );

    let artifact = workflow.download(&outcome).await?;
    let path = save_artifact(&args.out_dir, &artifact).await?;
    println!("{}", path.display());
    Ok(())
}

pub struct VoiceReplaceArgs {
    pub file: PathBuf,
    pub voice_id: String,
    pub subtitles: bool,
    pub out_dir: PathBuf,
}

pub async fn voice_replace(app: &App, args: VoiceReplaceArgs) -> anyhow::Result<()> {
    let upload = read_upload(&args.file).await?;
    let voice = resolve_voice(app, &args.voice_id).await?;

    let workflow = VoiceReplaceWorkflow::new(Arc::clone(&app.api), Arc::new(TracingNotifier))
        .with_config(app.poll_config(PollConfig::voice_replace()));

    let mut session = workflow.upload(upload).await?;
    tracing::info!(task_id = %session.task_id, "Video uploaded");

    workflow
        .analyze(&mut session, &TracingSink, &app.cancel)
        .await?;
    if let Some(text) = session.transcript.as_deref() {
        tracing::info!(task_id = %session.task_id, transcript = text, "Speech recognised");
    }

    let params = SynthesisParams {
        voice_id: voice.voice_id(),
        is_preset: voice.is_preset,
        add_subtitles: args.subtitles,
    };
    workflow
        .synthesize(&mut session, &params, &TracingSink, &app.cancel)
        .await?;

    let mut wanted = vec![VoiceReplaceArtifact::Video];
    if session.subtitles_requested {
        wanted.push(VoiceReplaceArtifact::Subtitles);
    }
    for kind in wanted {
        let artifact = workflow.download(&session, kind).await?;
        let path = save_artifact(&args.out_dir, &artifact).await?;
        println!("{}", path.display());
    }
    Ok(())
}

/// Follow an existing job until it reaches a terminal status, then print
/// the final payload as JSON.
pub async fn status(app: &App, kind: JobKind, task_id: String) -> anyhow::Result<()> {
    let task_id = TaskId::new(task_id)?;
    let config = app.poll_config(match kind {
        JobKind::Courseware => PollConfig::courseware(),
        JobKind::VoiceReplace => PollConfig::voice_replace(),
    });

    let payload = poll_job(
        &app.api.status_source(kind),
        &task_id,
        &config,
        &TracingSink,
        &app.cancel,
    )
    .await?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

/// Print the account's voices, one per line or as JSON.
pub async fn voices(app: &App, kind: Option<VoiceKind>, json: bool) -> anyhow::Result<()> {
    let catalog = match kind {
        None => app.api.voice_catalog().await?,
        Some(VoiceKind::Preset) => VoiceCatalog {
            preset: app.api.list_voices(VoiceKind::Preset).await?,
            ..VoiceCatalog::default()
        },
        Some(VoiceKind::Custom) => VoiceCatalog {
            custom: app.api.list_voices(VoiceKind::Custom).await?,
            ..VoiceCatalog::default()
        },
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
    } else {
        print!("{}", voice_table(&catalog));
    }
    Ok(())
}

/// Tab-separated `id  kind  name` rows, presets first.
fn voice_table(catalog: &VoiceCatalog) -> String {
    let preset = catalog.preset.iter().map(|v| (v, VoiceKind::Preset));
    let custom = catalog.custom.iter().map(|v| (v, VoiceKind::Custom));
    preset
        .chain(custom)
        .map(|(voice, kind)| format!("{}\t{kind}\t{}\n", voice.id, voice.name))
        .collect()
}

/// Look the voice up so the submission carries the right `is_preset`.
async fn resolve_voice(app: &App, voice_id: &str) -> anyhow::Result<Voice> {
    let voice = app
        .api
        .resolve_voice(voice_id)
        .await
        .context("run `aivoice voices` to see the available ids")?;
    tracing::info!(voice_id = %voice.id, name = %voice.name, is_preset = voice.is_preset, "Voice selected");
    Ok(voice)
}

async fn read_upload(path: &Path) -> anyhow::Result<FileUpload> {
    FileUpload::from_path(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

/// Write `artifact` into `dir`, creating the directory if needed.
async fn save_artifact(dir: &Path, artifact: &Artifact) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let path = dir.join(&artifact.filename);
    tokio::fs::write(&path, &artifact.bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), bytes = artifact.bytes.len(), "Artifact saved");
    Ok(path)
}

//! `aivoice` -- command-line client for the voice synthesis service.
//!
//! Submits courseware narration and video voice-replacement jobs, polls
//! them to completion and saves the results.  Ctrl-C stops polling.
//! `aivoice voices` lists the voice ids the other commands accept.
//!
//! # Environment variables
//!
//! | Variable                         | Required | Default                 | Description                         |
//! |----------------------------------|----------|-------------------------|-------------------------------------|
//! | `AIVOICE_API_URL`                | no       | `http://localhost:8000` | Base URL of the service             |
//! | `AIVOICE_TOKEN`                  | yes      | --                      | Bearer token                        |
//! | `AIVOICE_REQUEST_TIMEOUT_SECS`   | no       | `60`                    | Idle read timeout; status deadline  |
//! | `AIVOICE_MAX_CONSECUTIVE_ERRORS` | no       | `5`                     | Status errors tolerated in a row    |
//! | `LOG_FORMAT`                     | no       | --                      | `json` for JSON log lines           |
//! | `RUST_LOG`                       | no       | `aivoice_cli=info,aivoice_client=info` | Log filter           |

mod cli;
mod commands;

use std::process::ExitCode;

use aivoice_client::ClientConfig;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command};
use commands::{App, CoursewareArgs, VoiceReplaceArgs};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(api_url = %config.api_url, "Starting aivoice");

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping");
                cancel.cancel();
            }
        }
    });

    match run(cli, config, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = format!("{e:#}"), "Command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: ClientConfig, cancel: CancellationToken) -> anyhow::Result<()> {
    let app = App::new(config, cancel)?;

    match cli.command {
        Command::Courseware {
            file,
            voice_id,
            animation_mode,
            transition_time,
            out_dir,
        } => {
            commands::courseware(
                &app,
                CoursewareArgs {
                    file,
                    voice_id,
                    animation_mode,
                    transition_time,
                    out_dir,
                },
            )
            .await
        }
        Command::VoiceReplace {
            file,
            voice_id,
            no_subtitles,
            out_dir,
        } => {
            commands::voice_replace(
                &app,
                VoiceReplaceArgs {
                    file,
                    voice_id,
                    subtitles: !no_subtitles,
                    out_dir,
                },
            )
            .await
        }
        Command::Status { kind, task_id } => commands::status(&app, kind.into(), task_id).await,
        Command::Voices { kind, json } => commands::voices(&app, kind.map(Into::into), json).await,
    }
}

/// Logs go to stderr so stdout carries only command output.
fn init_tracing() {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aivoice_cli=info,aivoice_client=info".into()),
        )
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

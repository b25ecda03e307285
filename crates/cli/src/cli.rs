//! Command-line argument definitions.

use std::path::PathBuf;

use aivoice_client::JobKind;
use aivoice_core::params::{AnimationMode, DEFAULT_TRANSITION_SECS};
use aivoice_core::voice::VoiceKind;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "aivoice")]
#[command(about = "Submit voice synthesis jobs and wait for their results", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Narrate a slide deck or Word document and download the result
    Courseware {
        /// Courseware file (.ppt, .pptx, .doc, .docx)
        file: PathBuf,

        /// Voice to narrate with (see `aivoice voices`)
        #[arg(long)]
        voice_id: String,

        /// Slide animation style (dynamic, static)
        #[arg(long, default_value = "dynamic")]
        animation_mode: AnimationMode,

        /// Slide transition length in seconds
        #[arg(long, default_value_t = DEFAULT_TRANSITION_SECS)]
        transition_time: f64,

        /// Directory the artifact is written to
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Replace the voice in a video and download the result
    VoiceReplace {
        /// Video file (.mp4, .avi, .mov, .mkv, .webm)
        file: PathBuf,

        /// Voice to synthesize with (see `aivoice voices`)
        #[arg(long)]
        voice_id: String,

        /// Skip subtitle generation
        #[arg(long)]
        no_subtitles: bool,

        /// Directory the artifacts are written to
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Follow a submitted job until it finishes and print its final status as JSON
    Status {
        /// Kind of job
        kind: KindArg,

        /// Task id returned at submission
        task_id: String,
    },

    /// List the preset and cloned voices available to this account
    Voices {
        /// Only list one kind of voice
        #[arg(long)]
        kind: Option<VoiceKindArg>,

        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Courseware,
    VoiceReplace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VoiceKindArg {
    Preset,
    Custom,
}

impl From<VoiceKindArg> for VoiceKind {
    fn from(kind: VoiceKindArg) -> Self {
        match kind {
            VoiceKindArg::Preset => VoiceKind::Preset,
            VoiceKindArg::Custom => VoiceKind::Custom,
        }
    }
}

impl From<KindArg> for JobKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Courseware => JobKind::Courseware,
            KindArg::VoiceReplace => JobKind::VoiceReplace,
        }
    }
}

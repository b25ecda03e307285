//! Form parameters sent alongside job submissions.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Default slide transition length in seconds.
pub const DEFAULT_TRANSITION_SECS: f64 = 0.5;
/// Transitions shorter than this fall back to the default.
pub const MIN_TRANSITION_SECS: f64 = 0.1;
/// Transitions longer than this are capped.
pub const MAX_TRANSITION_SECS: f64 = 3.0;

/// How slides are animated in the generated courseware video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationMode {
    #[default]
    Dynamic,
    Static,
}

impl AnimationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dynamic => "dynamic",
            Self::Static => "static",
        }
    }
}

impl FromStr for AnimationMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dynamic" => Ok(Self::Dynamic),
            "static" => Ok(Self::Static),
            other => Err(CoreError::Validation(format!(
                "animation mode must be 'dynamic' or 'static', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for AnimationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalise a transition time the same way the server does: values
/// below 0.1 s become 0.5 s, values above 3 s are capped.
pub fn clamp_transition_time(secs: f64) -> f64 {
    if secs.is_nan() || secs < MIN_TRANSITION_SECS {
        DEFAULT_TRANSITION_SECS
    } else if secs > MAX_TRANSITION_SECS {
        MAX_TRANSITION_SECS
    } else {
        secs
    }
}

/// Parameters for `POST /api/courseware/process`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoursewareParams {
    pub voice_id: String,
    /// Whether `voice_id` refers to a built-in preset voice rather than
    /// a user-uploaded sample.
    pub is_preset: bool,
    pub animation_mode: AnimationMode,
    pub transition_time: f64,
}

impl CoursewareParams {
    pub fn new(voice_id: impl Into<String>) -> Self {
        Self {
            voice_id: voice_id.into(),
            is_preset: false,
            animation_mode: AnimationMode::default(),
            transition_time: DEFAULT_TRANSITION_SECS,
        }
    }
}

/// Parameters for `POST /api/voice-replace/synthesize/{task_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisParams {
    pub voice_id: String,
    pub is_preset: bool,
    /// Burn subtitles into the output and make the `.srt` downloadable.
    pub add_subtitles: bool,
}

impl SynthesisParams {
    pub fn new(voice_id: impl Into<String>) -> Self {
        Self {
            voice_id: voice_id.into(),
            is_preset: false,
            add_subtitles: true,
        }
    }
}

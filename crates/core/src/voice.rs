//! Voices available for synthesis.
//!
//! The service keeps two lists per user: built-in preset voices and the
//! user's own cloned voices. Submissions need both the voice id and
//! which list it came from (`is_preset`), so callers resolve a voice
//! through a [`VoiceCatalog`] rather than guessing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Which voice list to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceKind {
    Preset,
    Custom,
}

impl VoiceKind {
    /// Value of the `type` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preset => "preset",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for VoiceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preset" => Ok(Self::Preset),
            "custom" => Ok(Self::Custom),
            other => Err(CoreError::Validation(format!(
                "voice kind must be 'preset' or 'custom', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for VoiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of `GET /api/voices?type=...`. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub is_preset: bool,
    /// Prompt text recorded with a cloned voice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

impl Voice {
    /// The id as sent in the `voice_id` form field.
    pub fn voice_id(&self) -> String {
        self.id.to_string()
    }
}

/// Both voice lists of the current user.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VoiceCatalog {
    pub preset: Vec<Voice>,
    pub custom: Vec<Voice>,
}

impl VoiceCatalog {
    /// Look up a voice by the id a user typed. Presets win on a clash.
    ///
    /// The returned voice's `is_preset` reflects the list it was found
    /// in, whatever the server put in the field.
    pub fn find(&self, voice_id: &str) -> Option<Voice> {
        let voice_id = voice_id.trim();
        let lookup = |list: &[Voice], is_preset: bool| {
            list.iter()
                .find(|v| v.voice_id() == voice_id)
                .map(|v| Voice {
                    is_preset,
                    ..v.clone()
                })
        };
        lookup(&self.preset, true).or_else(|| lookup(&self.custom, false))
    }

    pub fn is_empty(&self) -> bool {
        self.preset.is_empty() && self.custom.is_empty()
    }
}

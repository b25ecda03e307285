//! Download filename conventions.
//!
//! The result endpoints do not send a usable filename, so the client
//! builds one from the job's source file and the metadata reported by
//! the status endpoint.

/// Prefix for courseware narration audio (document sources).
pub const COURSEWARE_AUDIO_PREFIX: &str = "课件音频";

/// Prefix for courseware narrated video (slide-deck sources).
pub const COURSEWARE_VIDEO_PREFIX: &str = "课件视频";

/// Fallback stem when the voice-replacement source filename is unknown.
pub const DEFAULT_VIDEO_STEM: &str = "video";

/// Artifact produced by a completed voice-replacement job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceReplaceArtifact {
    /// The re-voiced video.
    Video,
    /// SRT subtitles generated from the transcript.
    Subtitles,
}

/// Extension of the courseware artifact for a given source file.
///
/// Word documents are narrated to audio only; everything else (slide
/// decks) becomes a video.
pub fn courseware_extension(source_filename: &str) -> &'static str {
    let lower = source_filename.to_lowercase();
    if lower.ends_with(".doc") || lower.ends_with(".docx") {
        "wav"
    } else {
        "mp4"
    }
}

/// Download filename for a courseware artifact.
///
/// Convention: `{prefix}_{original_filename}_{process_date}.{ext}` where
/// `prefix`/`ext` are `课件音频`/`wav` for `.doc`/`.docx` sources and
/// `课件视频`/`mp4` otherwise. Missing metadata renders as empty.
///
/// # Examples
///
/// ```
/// use aivoice_core::naming::courseware_filename;
///
/// assert_eq!(
///     courseware_filename("Lesson.PPTX", Some("Lesson"), Some("20240315")),
///     "课件视频_Lesson_20240315.mp4",
/// );
/// assert_eq!(
///     courseware_filename("notes.docx", Some("notes"), Some("20240315")),
///     "课件音频_notes_20240315.wav",
/// );
/// ```
pub fn courseware_filename(
    source_filename: &str,
    original_filename: Option<&str>,
    process_date: Option<&str>,
) -> String {
    let ext = courseware_extension(source_filename);
    let prefix = if ext == "wav" {
        COURSEWARE_AUDIO_PREFIX
    } else {
        COURSEWARE_VIDEO_PREFIX
    };

    format!(
        "{prefix}_{}_{}.{ext}",
        original_filename.unwrap_or_default(),
        process_date.unwrap_or_default(),
    )
}

/// Download filename for a voice-replacement artifact.
///
/// The source filename is used verbatim, including its own extension:
/// `clip.mp4` yields `clip.mp4_replaced.mp4` and `clip.mp4_subtitles.srt`.
/// An absent or empty source falls back to `video`.
pub fn voice_replace_filename(source_filename: Option<&str>, artifact: VoiceReplaceArtifact) -> String {
    let stem = source_filename
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_VIDEO_STEM);

    match artifact {
        VoiceReplaceArtifact::Video => format!("{stem}_replaced.mp4"),
        VoiceReplaceArtifact::Subtitles => format!("{stem}_subtitles.srt"),
    }
}

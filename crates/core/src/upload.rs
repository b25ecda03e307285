//! Client-side checks run on a file before it is uploaded.
//!
//! The server repeats the extension checks, but rejecting early avoids
//! pushing up to 100 MiB over the wire just to get a 400 back.

use crate::error::CoreError;

const MIB: u64 = 1024 * 1024;

/// Accepted courseware source extensions.
pub const COURSEWARE_EXTENSIONS: &[&str] = &["ppt", "pptx", "doc", "docx"];

/// Courseware files smaller than 0.5 MiB are rejected.
pub const COURSEWARE_MIN_BYTES: u64 = MIB / 2;

/// Courseware files larger than 20 MiB are rejected.
pub const COURSEWARE_MAX_BYTES: u64 = 20 * MIB;

/// Accepted video extensions for voice replacement.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm"];

/// Videos larger than 100 MiB are rejected.
pub const VIDEO_MAX_BYTES: u64 = 100 * MIB;

/// Lowercased extension of `filename`, if it has one.
pub fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

fn check_extension(filename: &str, allowed: &[&str]) -> Result<(), CoreError> {
    match extension_of(filename) {
        Some(ext) if allowed.contains(&ext.as_str()) => Ok(()),
        _ => Err(CoreError::UnsupportedFileType {
            filename: filename.to_string(),
            allowed: allowed.join(", "),
        }),
    }
}

fn check_size(size: u64, min: u64, max: u64) -> Result<(), CoreError> {
    if size < min || size > max {
        return Err(CoreError::FileSize { size, min, max });
    }
    Ok(())
}

/// Validate a courseware source file (PPT/PPTX/DOC/DOCX, 0.5-20 MiB).
pub fn validate_courseware(filename: &str, size: u64) -> Result<(), CoreError> {
    check_extension(filename, COURSEWARE_EXTENSIONS)?;
    check_size(size, COURSEWARE_MIN_BYTES, COURSEWARE_MAX_BYTES)
}

/// Validate a video for voice replacement (MP4/AVI/MOV/MKV/WEBM, up to 100 MiB).
pub fn validate_video(filename: &str, size: u64) -> Result<(), CoreError> {
    check_extension(filename, VIDEO_EXTENSIONS)?;
    check_size(size, 0, VIDEO_MAX_BYTES)
}

/// Validate a voice identifier selected for synthesis.
pub fn validate_voice_id(voice_id: &str) -> Result<(), CoreError> {
    if voice_id.trim().is_empty() {
        return Err(CoreError::Validation("a voice must be selected".into()));
    }
    Ok(())
}

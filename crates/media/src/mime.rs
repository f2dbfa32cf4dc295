//! Filename and MIME based video detection.

/// Container extensions accepted as video when no stronger evidence exists.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mkv", "mov", "flv", "wmv", "webm", "m4v", "3gp",
];

/// Extension appended to filenames the receiving client would not sniff as video.
pub const FALLBACK_EXTENSION: &str = "mp4";

/// Lower-cased extension of `filename`, if it has one.
pub fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Whether the filename ends in one of [`VIDEO_EXTENSIONS`].
pub fn has_video_extension(filename: &str) -> bool {
    extension(filename).is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether a declared MIME type names a video container.
pub fn is_video_mime(mime_type: &str) -> bool {
    mime_type
        .trim()
        .to_ascii_lowercase()
        .strip_prefix("video/")
        .is_some_and(|subtype| !subtype.is_empty())
}

/// Append `.mp4` when the filename lacks a recognized video extension.
pub fn normalize_video_filename(filename: &str) -> String {
    if has_video_extension(filename) {
        filename.to_string()
    } else {
        format!("{filename}.{FALLBACK_EXTENSION}")
    }
}

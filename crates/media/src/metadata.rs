//! Video classification and upload attributes.
//!
//! [`classify`] is a pure function of the inbound event's declared
//! attributes. It never touches the network or disk, so it runs before any
//! staging resources are allocated.

use streamify_common::types::{AttachmentKind, InboundFile};

use crate::mime;

/// Filename used when the sender's client declared none.
pub const DEFAULT_FILENAME: &str = "video";

/// What made the extractor decide the file is a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evidence {
    /// Explicit video attribute block, or a native video attachment.
    Attributes,
    /// Declared `video/*` MIME type.
    MimeType,
    /// Filename extension on the allow-list.
    Extension,
}

/// Result of inspecting an inbound file.
///
/// Numeric fields are `0` when the sender declared nothing; defaults are
/// applied later by [`VideoMetadata::for_upload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub is_video: bool,
    pub evidence: Option<Evidence>,
    pub filename: String,
    pub duration_secs: u32,
    pub width: u32,
    pub height: u32,
}

/// Classify an inbound file as video or not.
///
/// Priority: explicit video attributes, then a `video/*` MIME hint, then the
/// filename extension. Anything else is rejected.
pub fn classify(file: &InboundFile) -> Classification {
    let filename = file
        .declared_filename
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_FILENAME)
        .to_string();

    let attrs = file.video.unwrap_or_default();

    let evidence = if file.video.is_some() || file.kind == AttachmentKind::Video {
        Some(Evidence::Attributes)
    } else if file.mime_type.as_deref().is_some_and(mime::is_video_mime) {
        Some(Evidence::MimeType)
    } else if file
        .declared_filename
        .as_deref()
        .is_some_and(mime::has_video_extension)
    {
        Some(Evidence::Extension)
    } else {
        None
    };

    Classification {
        is_video: evidence.is_some(),
        evidence,
        filename,
        duration_secs: attrs.duration_secs,
        width: attrs.width,
        height: attrs.height,
    }
}

/// Attributes attached to the re-uploaded video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoMetadata {
    pub duration_secs: u32,
    pub width: u32,
    pub height: u32,
    pub supports_streaming: bool,
}

impl VideoMetadata {
    pub const DEFAULT_WIDTH: u32 = 1280;
    pub const DEFAULT_HEIGHT: u32 = 720;

    /// Build upload attributes, substituting defaults for missing dimensions.
    pub fn for_upload(classification: &Classification) -> Self {
        let or_default = |value: u32, default: u32| if value == 0 { default } else { value };
        Self {
            duration_secs: classification.duration_secs,
            width: or_default(classification.width, Self::DEFAULT_WIDTH),
            height: or_default(classification.height, Self::DEFAULT_HEIGHT),
            supports_streaming: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        rstest::rstest,
        streamify_common::types::{FileOrigin, FileRef, VideoAttributes},
    };

    fn document(filename: Option<&str>, mime_type: Option<&str>) -> InboundFile {
        InboundFile {
            origin: FileOrigin {
                user_id: 7,
                chat_id: 7,
                message_id: 100,
            },
            kind: AttachmentKind::Document,
            file: FileRef {
                id: "doc-file".into(),
                size_bytes: 1024,
            },
            declared_filename: filename.map(String::from),
            mime_type: mime_type.map(String::from),
            video: None,
            thumbnail: None,
            is_already_streamable: false,
        }
    }

    #[test]
    fn mkv_document_without_attributes_is_video() {
        let c = classify(&document(Some("movie.mkv"), None));
        assert!(c.is_video);
        assert_eq!(c.evidence, Some(Evidence::Extension));
        assert_eq!(c.filename, "movie.mkv");
        assert_eq!((c.duration_secs, c.width, c.height), (0, 0, 0));
    }

    #[test]
    fn txt_document_is_rejected() {
        let c = classify(&document(Some("notes.txt"), Some("text/plain")));
        assert!(!c.is_video);
        assert_eq!(c.evidence, None);
    }

    #[rstest]
    #[case(Some("clip.bin"), Some("video/mp4"), Some(Evidence::MimeType))]
    #[case(Some("clip.MOV"), Some("application/octet-stream"), Some(Evidence::Extension))]
    #[case(None, None, None)]
    #[case(Some("clip"), None, None)]
    fn document_evidence(
        #[case] filename: Option<&str>,
        #[case] mime_type: Option<&str>,
        #[case] expected: Option<Evidence>,
    ) {
        assert_eq!(classify(&document(filename, mime_type)).evidence, expected);
    }

    #[test]
    fn attribute_block_wins_over_extension() {
        let mut file = document(Some("notes.txt"), None);
        file.video = Some(VideoAttributes {
            duration_secs: 12,
            width: 640,
            height: 360,
        });
        let c = classify(&file);
        assert_eq!(c.evidence, Some(Evidence::Attributes));
        assert_eq!((c.duration_secs, c.width, c.height), (12, 640, 360));
    }

    #[test]
    fn missing_filename_falls_back() {
        let mut file = document(None, None);
        file.kind = AttachmentKind::Video;
        let c = classify(&file);
        assert!(c.is_video);
        assert_eq!(c.filename, DEFAULT_FILENAME);
    }

    #[test]
    fn upload_metadata_applies_defaults() {
        let c = classify(&document(Some("movie.mkv"), None));
        let meta = VideoMetadata::for_upload(&c);
        assert_eq!(meta, VideoMetadata {
            duration_secs: 0,
            width: 1280,
            height: 720,
            supports_streaming: true,
        });
    }

    #[test]
    fn upload_metadata_keeps_declared_values() {
        let mut file = document(Some("movie.mkv"), None);
        file.video = Some(VideoAttributes {
            duration_secs: 90,
            width: 1920,
            height: 1080,
        });
        let meta = VideoMetadata::for_upload(&classify(&file));
        assert_eq!((meta.duration_secs, meta.width, meta.height), (90, 1920, 1080));
        assert!(meta.supports_streaming);
    }
}

//! Normalized inbound event types.
//!
//! Channel adapters decode their native message shapes into these structs
//! before any relay logic runs, so the rest of the workspace never inspects
//! raw transport payloads.

use serde::{Deserialize, Serialize};

/// Who sent a file, where, and in which message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileOrigin {
    pub user_id: u64,
    pub chat_id: i64,
    pub message_id: i32,
}

/// How the attachment arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    /// Generic file upload; the client offers it as a download.
    Document,
    /// Native video message.
    Video,
}

/// Opaque handle the transport uses to fetch a remote file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub id: String,
    pub size_bytes: u64,
}

/// Explicit video attribute block attached by the sender's client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoAttributes {
    pub duration_secs: u32,
    pub width: u32,
    pub height: u32,
}

/// Immutable snapshot of the event that triggered a relay job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundFile {
    pub origin: FileOrigin,
    pub kind: AttachmentKind,
    pub file: FileRef,
    pub declared_filename: Option<String>,
    pub mime_type: Option<String>,
    pub video: Option<VideoAttributes>,
    pub thumbnail: Option<FileRef>,
    /// Already delivered as a native streamable video rather than a document.
    pub is_already_streamable: bool,
}

impl InboundFile {
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.file.size_bytes
    }
}

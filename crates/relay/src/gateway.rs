use std::path::Path;

use {async_trait::async_trait, streamify_common::types::FileRef, streamify_media::VideoMetadata};

use crate::Result;

/// A message the gateway sent and may later edit or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub message_id: i32,
}

/// Everything needed to send a staged file back as a streamable video.
#[derive(Debug, Clone, Copy)]
pub struct VideoUpload<'a> {
    pub chat_id: i64,
    /// Message the video replies to.
    pub reply_to: i32,
    pub path: &'a Path,
    pub filename: &'a str,
    pub metadata: VideoMetadata,
    pub thumbnail: Option<&'a Path>,
    pub caption: Option<&'a str>,
}

/// Network capability the relay drives. Implementations own the client,
/// credentials, and any wire-level details.
#[async_trait]
pub trait TransportGateway: Send + Sync {
    /// Materialize a remote file at `path`, creating or truncating it.
    async fn download_to_path(&self, file: &FileRef, path: &Path) -> Result<()>;

    /// Upload a staged file as a video message.
    async fn send_video(&self, upload: VideoUpload<'_>) -> Result<SentMessage>;

    /// Replace the text of a message sent earlier.
    async fn edit_message(&self, message: &SentMessage, text: &str) -> Result<()>;

    async fn delete_message(&self, message: &SentMessage) -> Result<()>;

    /// Send a text reply to an inbound message.
    async fn respond(&self, chat_id: i64, reply_to: i32, text: &str) -> Result<SentMessage>;
}

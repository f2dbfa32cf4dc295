use std::path::Path;

use {
    async_trait::async_trait,
    streamify_common::types::FileRef,
    streamify_relay::{Error as RelayError, Result, SentMessage, TransportGateway, VideoUpload},
    teloxide::{
        ApiError, RequestError,
        net::Download,
        payloads::{SendMessageSetters, SendVideoSetters},
        prelude::*,
        types::{ChatId, InputFile, MessageId, ReplyParameters},
    },
    tokio::io::AsyncWriteExt,
    tracing::debug,
};

use crate::config::{TRANSFER_CLIENT_TIMEOUT, TelegramConfig};

/// [`TransportGateway`] backed by the Telegram Bot API.
///
/// Requests are issued once. Rate-limit replies surface as transport
/// failures like any other API error.
#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub fn new(config: &TelegramConfig) -> crate::Result<Self> {
        Ok(Self {
            bot: config.build_bot(TRANSFER_CLIENT_TIMEOUT)?,
        })
    }

    pub fn from_bot(bot: Bot) -> Self {
        Self { bot }
    }
}

fn reply_params(reply_to: i32) -> ReplyParameters {
    ReplyParameters::new(MessageId(reply_to)).allow_sending_without_reply()
}

fn sent(message: &Message) -> SentMessage {
    SentMessage {
        chat_id: message.chat.id.0,
        message_id: message.id.0,
    }
}

fn is_message_not_modified_error(error: &RequestError) -> bool {
    matches!(error, RequestError::Api(ApiError::MessageNotModified))
}

#[async_trait]
impl TransportGateway for TelegramGateway {
    async fn download_to_path(&self, file: &FileRef, path: &Path) -> Result<()> {
        let remote = self
            .bot
            .get_file(file.id.as_str())
            .await
            .map_err(|e| RelayError::transport("get file", e))?;

        let mut dst = tokio::fs::File::create(path).await?;
        self.bot
            .download_file(&remote.path, &mut dst)
            .await
            .map_err(|e| RelayError::transport("download file", e))?;
        dst.flush().await?;

        debug!(
            file_id = %file.id,
            path = %path.display(),
            size_bytes = file.size_bytes,
            "telegram file downloaded"
        );
        Ok(())
    }

    async fn send_video(&self, upload: VideoUpload<'_>) -> Result<SentMessage> {
        let input = InputFile::file(upload.path).file_name(upload.filename.to_string());
        let mut request = self
            .bot
            .send_video(ChatId(upload.chat_id), input)
            .duration(upload.metadata.duration_secs)
            .width(upload.metadata.width)
            .height(upload.metadata.height)
            .supports_streaming(upload.metadata.supports_streaming)
            .reply_parameters(reply_params(upload.reply_to));
        if let Some(thumbnail) = upload.thumbnail {
            request = request.thumbnail(InputFile::file(thumbnail));
        }
        if let Some(caption) = upload.caption {
            request = request.caption(caption);
        }

        let message = request
            .await
            .map_err(|e| RelayError::transport("send video", e))?;
        Ok(sent(&message))
    }

    async fn edit_message(&self, message: &SentMessage, text: &str) -> Result<()> {
        match self
            .bot
            .edit_message_text(
                ChatId(message.chat_id),
                MessageId(message.message_id),
                text,
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_message_not_modified_error(&e) => Ok(()),
            Err(e) => Err(RelayError::transport("edit message", e)),
        }
    }

    async fn delete_message(&self, message: &SentMessage) -> Result<()> {
        self.bot
            .delete_message(ChatId(message.chat_id), MessageId(message.message_id))
            .await
            .map_err(|e| RelayError::transport("delete message", e))?;
        Ok(())
    }

    async fn respond(&self, chat_id: i64, reply_to: i32, text: &str) -> Result<SentMessage> {
        let message = self
            .bot
            .send_message(ChatId(chat_id), text)
            .reply_parameters(reply_params(reply_to))
            .await
            .map_err(|e| RelayError::transport("send message", e))?;
        Ok(sent(&message))
    }
}

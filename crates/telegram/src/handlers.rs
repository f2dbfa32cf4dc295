use std::sync::Arc;

use {
    streamify_common::types::{AttachmentKind, FileOrigin, FileRef, InboundFile, VideoAttributes},
    streamify_relay::{JobController, JobResult},
    teloxide::{
        payloads::SendMessageSetters,
        prelude::*,
        types::{BotCommand, FileMeta, MediaKind, MessageKind, ReplyParameters},
    },
    tokio::task::JoinHandle,
    tracing::debug,
};

use crate::error::Result;

pub const START_MSG: &str = "Hello! Send me a video file.";

/// Slash commands the bot answers with static text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
}

impl Command {
    /// Parse `/start`, `/help`, and their `@botname` forms.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split_once('@').map_or(name, |(name, _)| name);
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            _ => None,
        }
    }

    /// Entries registered with `setMyCommands` for client autocomplete.
    pub fn bot_commands() -> Vec<BotCommand> {
        vec![
            BotCommand::new("start", "Say hello"),
            BotCommand::new("help", "How to get a streamable video"),
        ]
    }
}

/// Routes inbound messages to the command surface or the relay.
pub struct UpdateHandler {
    controller: Arc<JobController>,
    help_text: String,
}

impl UpdateHandler {
    pub fn new(controller: Arc<JobController>, max_file_bytes: u64) -> Self {
        Self {
            controller,
            help_text: help_text(max_file_bytes),
        }
    }

    /// Handle one message. Relay jobs run on their own task so other
    /// senders are never blocked; the handle is returned for callers that
    /// want the outcome.
    pub async fn handle_message(
        &self,
        bot: &Bot,
        msg: Message,
    ) -> Result<Option<JoinHandle<JobResult>>> {
        if let Some(command) = extract_text(&msg).and_then(Command::parse) {
            debug!(chat_id = msg.chat.id.0, ?command, "telegram command");
            let text = match command {
                Command::Start => START_MSG,
                Command::Help => self.help_text.as_str(),
            };
            bot.send_message(msg.chat.id, text)
                .reply_parameters(ReplyParameters::new(msg.id).allow_sending_without_reply())
                .await?;
            return Ok(None);
        }

        let Some(file) = decode_inbound(&msg) else {
            debug!(
                chat_id = msg.chat.id.0,
                "ignoring message without a document or video"
            );
            return Ok(None);
        };

        let controller = Arc::clone(&self.controller);
        Ok(Some(tokio::spawn(
            async move { controller.handle(file).await },
        )))
    }
}

fn help_text(max_file_bytes: u64) -> String {
    format!(
        "You can send me video files in document format up to {}, and I will give them back in \
         streamable format. Videos that are already streamable are left as they are.",
        format_limit(max_file_bytes)
    )
}

fn format_limit(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    const GIB: u64 = 1024 * MIB;
    if bytes >= GIB && bytes.is_multiple_of(GIB) {
        format!("{} GB", bytes / GIB)
    } else if bytes >= MIB {
        format!("{} MB", bytes / MIB)
    } else {
        format!("{bytes} bytes")
    }
}

/// Text of a plain text message.
fn extract_text(msg: &Message) -> Option<&str> {
    match &msg.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Text(t) => Some(t.text.as_str()),
            _ => None,
        },
        _ => None,
    }
}

fn file_ref(meta: &FileMeta) -> FileRef {
    FileRef {
        id: meta.id.clone(),
        size_bytes: u64::from(meta.size),
    }
}

/// Decode a document or native video attachment into a relay event.
///
/// Native videos carry their attribute block and are already playable in
/// clients. Documents carry only what the sender's client declared.
pub fn decode_inbound(msg: &Message) -> Option<InboundFile> {
    let MessageKind::Common(common) = &msg.kind else {
        return None;
    };
    let sender = msg.from.as_ref()?;
    let origin = FileOrigin {
        user_id: sender.id.0,
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
    };

    match &common.media_kind {
        MediaKind::Document(d) => {
            let doc = &d.document;
            Some(InboundFile {
                origin,
                kind: AttachmentKind::Document,
                file: file_ref(&doc.file),
                declared_filename: doc.file_name.clone(),
                mime_type: doc.mime_type.as_ref().map(ToString::to_string),
                video: None,
                thumbnail: doc.thumbnail.as_ref().map(|t| file_ref(&t.file)),
                is_already_streamable: false,
            })
        },
        MediaKind::Video(v) => {
            let video = &v.video;
            Some(InboundFile {
                origin,
                kind: AttachmentKind::Video,
                file: file_ref(&video.file),
                declared_filename: video.file_name.clone(),
                mime_type: video.mime_type.as_ref().map(ToString::to_string),
                video: Some(VideoAttributes {
                    duration_secs: video.duration.seconds(),
                    width: video.width,
                    height: video.height,
                }),
                thumbnail: video.thumbnail.as_ref().map(|t| file_ref(&t.file)),
                is_already_streamable: true,
            })
        },
        _ => None,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::outbound::{
            TelegramGateway,
            tests::{MockServer, MockTelegramApi, SendMessageRequest, TelegramApiMethod},
        },
        rstest::rstest,
        serde_json::{Value, json},
        streamify_media::StagingStore,
        streamify_relay::{RelaySettings, TransportGateway},
    };

    fn message(media: Value) -> Message {
        let mut value = json!({
            "message_id": 9,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": {
                "id": 1001,
                "is_bot": false,
                "first_name": "Alice",
                "username": "alice"
            }
        });
        for (key, field) in media.as_object().unwrap() {
            value[key] = field.clone();
        }
        serde_json::from_value(value).expect("deserialize message")
    }

    fn document_message() -> Message {
        message(json!({
            "document": {
                "file_id": "doc-file",
                "file_unique_id": "doc-unique",
                "file_name": "movie.mkv",
                "mime_type": "video/x-matroska",
                "file_size": 2048,
                "thumbnail": {
                    "file_id": "thumb-file",
                    "file_unique_id": "thumb-unique",
                    "width": 320,
                    "height": 180,
                    "file_size": 512
                }
            }
        }))
    }

    #[rstest]
    #[case("/start", Some(Command::Start))]
    #[case("/help", Some(Command::Help))]
    #[case("/HELP extra words", Some(Command::Help))]
    #[case("/start@streamify_bot", Some(Command::Start))]
    #[case("/stop", None)]
    #[case("help", None)]
    #[case("", None)]
    fn parses_commands(#[case] text: &str, #[case] expected: Option<Command>) {
        assert_eq!(Command::parse(text), expected);
    }

    #[rstest]
    #[case(2 * 1024 * 1024 * 1024, "2 GB")]
    #[case(20 * 1024 * 1024, "20 MB")]
    #[case(1536, "1536 bytes")]
    fn formats_size_limit(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(format_limit(bytes), expected);
    }

    #[test]
    fn document_decodes_declared_attributes() {
        let file = decode_inbound(&document_message()).unwrap();
        assert_eq!(file.origin, FileOrigin {
            user_id: 1001,
            chat_id: 42,
            message_id: 9,
        });
        assert_eq!(file.kind, AttachmentKind::Document);
        assert_eq!(file.file, FileRef {
            id: "doc-file".into(),
            size_bytes: 2048,
        });
        assert_eq!(file.declared_filename.as_deref(), Some("movie.mkv"));
        assert_eq!(file.mime_type.as_deref(), Some("video/x-matroska"));
        assert_eq!(file.video, None);
        assert_eq!(file.thumbnail.unwrap().id, "thumb-file");
        assert!(!file.is_already_streamable);
    }

    #[test]
    fn native_video_is_already_streamable() {
        let msg = message(json!({
            "video": {
                "file_id": "video-file",
                "file_unique_id": "video-unique",
                "width": 1920,
                "height": 1080,
                "duration": 31,
                "mime_type": "video/mp4",
                "file_size": 4096
            }
        }));
        let file = decode_inbound(&msg).unwrap();
        assert_eq!(file.kind, AttachmentKind::Video);
        assert_eq!(file.video, Some(VideoAttributes {
            duration_secs: 31,
            width: 1920,
            height: 1080,
        }));
        assert!(file.is_already_streamable);
        assert!(file.thumbnail.is_none());
    }

    #[test]
    fn other_messages_are_not_decoded() {
        let text = message(json!({ "text": "hello" }));
        assert!(decode_inbound(&text).is_none());

        let photo = message(json!({
            "photo": [{
                "file_id": "photo-file",
                "file_unique_id": "photo-unique",
                "width": 90,
                "height": 90,
                "file_size": 100
            }]
        }));
        assert!(decode_inbound(&photo).is_none());
    }

    fn handler(mock: &MockServer, root: &std::path::Path) -> UpdateHandler {
        let gateway = TelegramGateway::from_bot(mock.bot.clone());
        let controller = Arc::new(JobController::new(
            Arc::new(gateway) as Arc<dyn TransportGateway>,
            StagingStore::new(root),
            RelaySettings {
                caption: None,
                max_file_bytes: 20 * 1024 * 1024,
            },
        ));
        UpdateHandler::new(controller, 20 * 1024 * 1024)
    }

    #[tokio::test]
    async fn start_and_help_reply_with_static_text() {
        let mock = MockServer::start(MockTelegramApi::default()).await;
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(&mock, dir.path());

        for text in ["/start", "/help"] {
            let job = handler
                .handle_message(&mock.bot, message(json!({ "text": text })))
                .await
                .unwrap();
            assert!(job.is_none());
        }

        let replies: Vec<SendMessageRequest> = mock
            .api
            .bodies(&TelegramApiMethod::SendMessage)
            .iter()
            .map(|b| serde_json::from_str(b).unwrap())
            .collect();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].text, START_MSG);
        assert!(replies[1].text.contains("up to 20 MB"));
        assert!(replies.iter().all(|r| r.chat_id == 42));

        mock.stop().await;
    }

    #[tokio::test]
    async fn plain_text_is_ignored() {
        let mock = MockServer::start(MockTelegramApi::default()).await;
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(&mock, dir.path());

        let job = handler
            .handle_message(&mock.bot, message(json!({ "text": "what is this" })))
            .await
            .unwrap();

        assert!(job.is_none());
        assert!(mock.api.requests().is_empty());
        mock.stop().await;
    }

    #[tokio::test]
    async fn document_is_relayed_as_streamable_video() {
        let mock = MockServer::start(MockTelegramApi::default()).await;
        let dir = tempfile::tempdir().unwrap();
        let handler = handler(&mock, dir.path());

        let job = handler
            .handle_message(&mock.bot, document_message())
            .await
            .unwrap()
            .expect("document should start a relay job");
        assert_eq!(job.await.unwrap(), JobResult::Delivered);

        let uploads = mock.api.bodies(&TelegramApiMethod::SendVideo);
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].contains("movie.mkv"));
        assert!(uploads[0].contains("supports_streaming"));
        // Media and thumbnail were both fetched.
        assert_eq!(mock.api.bodies(&TelegramApiMethod::FileDownload).len(), 2);
        assert_eq!(mock.api.bodies(&TelegramApiMethod::DeleteMessage).len(), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        mock.stop().await;
    }
}

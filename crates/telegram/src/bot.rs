use std::{sync::Arc, time::Duration};

use {
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, UpdateKind},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::{
    config::{POLL_CLIENT_TIMEOUT, TelegramConfig},
    error::Result,
    handlers::{Command, UpdateHandler},
};

/// Pause after a failed poll before trying again.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Connect the bot and start long polling.
///
/// Spawns a background task that processes updates until the returned
/// `CancellationToken` is cancelled. The task cancels the token itself when
/// another instance takes over the same bot token.
pub async fn start_polling(
    config: &TelegramConfig,
    handler: Arc<UpdateHandler>,
) -> Result<CancellationToken> {
    let bot = config.build_bot(POLL_CLIENT_TIMEOUT)?;

    // Verify credentials and get bot username.
    let me = bot.get_me().await?;
    let bot_username = me.username.clone();

    // Delete any existing webhook so long polling works.
    bot.delete_webhook().send().await?;

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("failed to register bot commands: {e}");
    }

    info!(
        username = ?bot_username,
        api_id = config.api_id,
        self_hosted = config.api_url.is_some(),
        "telegram bot connected (webhook cleared)"
    );

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        info!("starting telegram polling loop");
        let mut offset: i32 = 0;

        loop {
            let request = bot
                .get_updates()
                .offset(offset)
                .timeout(30)
                .allowed_updates(vec![AllowedUpdate::Message]);

            let result = tokio::select! {
                () = cancel_clone.cancelled() => {
                    info!("telegram polling stopped");
                    break;
                },
                result = request.send() => result,
            };

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) => {
                                debug!(
                                    chat_id = msg.chat.id.0,
                                    message_id = msg.id.0,
                                    "received telegram message"
                                );
                                if let Err(e) = handler.handle_message(&bot, msg).await {
                                    error!(error = %e, "error handling telegram message");
                                }
                            },
                            other => {
                                debug!("ignoring non-message update: {other:?}");
                            },
                        }
                    }
                },
                Err(e) => {
                    // Another instance is polling with the same token.
                    if matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) {
                        warn!(
                            "telegram polling disabled: another instance is already running with this token"
                        );
                        cancel_clone.cancel();
                        break;
                    }

                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::select! {
                        () = cancel_clone.cancelled() => break,
                        () = tokio::time::sleep(POLL_ERROR_BACKOFF) => {},
                    }
                },
            }
        }
    });

    Ok(cancel)
}

use std::time::Duration;

use {
    secrecy::{ExposeSecret, Secret},
    streamify_config::ValidCredentials,
    teloxide::Bot,
};

use crate::error::{Error, Result};

/// Client timeout for long polling. Must outlive the 30s `getUpdates` wait.
pub const POLL_CLIENT_TIMEOUT: Duration = Duration::from_secs(45);

/// Client timeout for file transfers, which can run far longer than a poll.
pub const TRANSFER_CLIENT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Connection settings for the Bot API, built once at startup.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Client id registered with the self-hosted Bot API server.
    pub api_id: i64,
    pub bot_token: Secret<String>,
    /// Bot API base URL; `None` means the public `api.telegram.org`.
    pub api_url: Option<reqwest::Url>,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_id", &self.api_id)
            .field("bot_token", &"[REDACTED]")
            .field("api_url", &self.api_url.as_ref().map(reqwest::Url::as_str))
            .finish()
    }
}

impl TelegramConfig {
    pub fn from_credentials(credentials: &ValidCredentials) -> Result<Self> {
        let api_url = credentials
            .api_url
            .as_deref()
            .map(parse_api_url)
            .transpose()?;
        Ok(Self {
            api_id: credentials.api_id,
            bot_token: credentials.bot_token.clone(),
            api_url,
        })
    }

    /// Build a bot whose HTTP client gives up after `timeout`.
    pub fn build_bot(&self, timeout: Duration) -> Result<Bot> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(timeout)
            .build()?;
        let bot = Bot::with_client(self.bot_token.expose_secret(), client);
        Ok(match &self.api_url {
            Some(url) => bot.set_api_url(url.clone()),
            None => bot,
        })
    }
}

// teloxide joins method paths onto the base, so it needs a trailing slash.
fn parse_api_url(raw: &str) -> Result<reqwest::Url> {
    let raw = raw.trim();
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    reqwest::Url::parse(&normalized).map_err(|e| Error::external("invalid telegram.api_url", e))
}

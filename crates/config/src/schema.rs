//! Config schema types (credentials, staging area, relay behavior).
use std::path::PathBuf;

use {
    secrecy::Secret,
    serde::{Deserialize, Serialize},
};

/// Largest file the public Bot API lets a bot download (20 MB).
pub const PUBLIC_API_MAX_FILE_BYTES: u64 = 20 * 1024 * 1024;

/// Largest file a self-hosted Bot API server handles (2 GiB).
pub const SELF_HOSTED_MAX_FILE_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StreamifyConfig {
    pub telegram: Credentials,
    pub staging: StagingConfig,
    pub relay: RelayConfig,
}

/// Messaging service credentials. All three values are required at startup.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Client id registered with the messaging service.
    pub api_id: Option<String>,

    /// Client secret paired with `api_id`.
    pub api_hash: Option<Secret<String>>,

    /// Bot token from @BotFather.
    pub bot_token: Option<Secret<String>>,

    /// Base URL of a self-hosted Bot API server. When unset the public
    /// endpoint is used.
    pub api_url: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_id", &self.api_id)
            .field("api_hash", &self.api_hash.as_ref().map(|_| "[REDACTED]"))
            .field("bot_token", &self.bot_token.as_ref().map(|_| "[REDACTED]"))
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Local staging area for in-flight downloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Staging root. Defaults to `<data_dir>/staging`.
    pub dir: Option<PathBuf>,
}

impl StagingConfig {
    /// Resolve the staging root, falling back to the data directory.
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| crate::loader::data_dir().join("staging"))
    }
}

impl StreamifyConfig {
    /// Size limit for inbound files given the configured Bot API endpoint.
    pub fn max_file_bytes(&self) -> u64 {
        self.relay
            .effective_max_file_bytes(self.telegram.api_url.as_deref())
    }
}

/// Relay job behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RelayConfig {
    /// Caption attached to re-uploaded videos. No caption when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    /// Files larger than this are rejected before download. When unset the
    /// limit follows the Bot API endpoint in use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_file_bytes: Option<u64>,
}

impl RelayConfig {
    /// Explicit limit if set, otherwise the download limit of the endpoint:
    /// 20 MB for the public Bot API, 2 GiB for a self-hosted server.
    pub fn effective_max_file_bytes(&self, api_url: Option<&str>) -> u64 {
        if let Some(limit) = self.max_file_bytes {
            return limit;
        }
        let self_hosted = api_url.is_some_and(|url| !url.trim().is_empty());
        if self_hosted {
            SELF_HOSTED_MAX_FILE_BYTES
        } else {
            PUBLIC_API_MAX_FILE_BYTES
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::ExposeSecret};

    #[test]
    fn default_relay_config() {
        let cfg = RelayConfig::default();
        assert_eq!(cfg.caption, None);
        assert_eq!(cfg.max_file_bytes, None);
    }

    #[test]
    fn public_api_defaults_to_download_limit() {
        let cfg = StreamifyConfig::default();
        assert_eq!(cfg.telegram.api_url, None);
        assert_eq!(cfg.max_file_bytes(), PUBLIC_API_MAX_FILE_BYTES);

        let relay = RelayConfig::default();
        assert_eq!(
            relay.effective_max_file_bytes(Some("  ")),
            PUBLIC_API_MAX_FILE_BYTES
        );
    }

    #[test]
    fn self_hosted_api_raises_default_limit() {
        let mut cfg = StreamifyConfig::default();
        cfg.telegram.api_url = Some("http://localhost:8081".into());
        assert_eq!(cfg.max_file_bytes(), SELF_HOSTED_MAX_FILE_BYTES);
    }

    #[test]
    fn explicit_limit_wins_over_endpoint_default() {
        let relay = RelayConfig {
            caption: None,
            max_file_bytes: Some(1024),
        };
        assert_eq!(relay.effective_max_file_bytes(None), 1024);
        assert_eq!(
            relay.effective_max_file_bytes(Some("http://localhost:8081")),
            1024
        );
    }

    #[test]
    fn deserialize_from_toml() {
        let raw = r#"
            [telegram]
            api_id = "12345"
            api_hash = "abcdef"
            bot_token = "123:ABC"

            [staging]
            dir = "/tmp/streamify-staging"

            [relay]
            caption = "via streamify"
        "#;
        let cfg: StreamifyConfig = toml::from_str(raw).unwrap();
        assert_eq!(cfg.telegram.api_id.as_deref(), Some("12345"));
        assert_eq!(
            cfg.telegram.bot_token.as_ref().map(|t| t.expose_secret().as_str()),
            Some("123:ABC")
        );
        assert_eq!(
            cfg.staging.resolved_dir(),
            PathBuf::from("/tmp/streamify-staging")
        );
        assert_eq!(cfg.relay.caption.as_deref(), Some("via streamify"));
        // defaults for unspecified fields
        assert_eq!(cfg.relay.max_file_bytes, None);
        assert_eq!(cfg.max_file_bytes(), PUBLIC_API_MAX_FILE_BYTES);
    }

    #[test]
    fn debug_redacts_secrets() {
        let creds = Credentials {
            api_id: Some("1".into()),
            api_hash: Some(Secret::new("hash-value".into())),
            bot_token: Some(Secret::new("token-value".into())),
            api_url: None,
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hash-value"));
        assert!(!rendered.contains("token-value"));
        assert!(rendered.contains("[REDACTED]"));
    }
}

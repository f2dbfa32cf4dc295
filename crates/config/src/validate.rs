//! Startup validation.
//!
//! Missing credentials are fatal at process start, never per job, so the
//! rest of the workspace receives non-optional values.

use secrecy::{ExposeSecret, Secret};

use crate::{
    error::{Error, Result},
    schema::{Credentials, StreamifyConfig},
};

/// Credentials with every required value present.
#[derive(Clone)]
pub struct ValidCredentials {
    pub api_id: i64,
    pub api_hash: Secret<String>,
    pub bot_token: Secret<String>,
    pub api_url: Option<String>,
}

impl std::fmt::Debug for ValidCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidCredentials")
            .field("api_id", &self.api_id)
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

/// Check the loaded config and extract the credentials the transport needs.
pub fn validate(config: &StreamifyConfig) -> Result<ValidCredentials> {
    if config.relay.max_file_bytes == Some(0) {
        return Err(Error::Invalid {
            key: "relay.max_file_bytes",
            message: "must be greater than zero".into(),
        });
    }
    validate_credentials(&config.telegram)
}

fn validate_credentials(creds: &Credentials) -> Result<ValidCredentials> {
    let api_id = creds
        .api_id
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(Error::MissingCredential("telegram.api_id"))?;
    let api_id = api_id.parse::<i64>().map_err(|e| Error::Invalid {
        key: "telegram.api_id",
        message: e.to_string(),
    })?;

    let api_hash = required_secret(creds.api_hash.as_ref(), "telegram.api_hash")?;
    let bot_token = required_secret(creds.bot_token.as_ref(), "telegram.bot_token")?;

    Ok(ValidCredentials {
        api_id,
        api_hash,
        bot_token,
        api_url: creds.api_url.clone(),
    })
}

fn required_secret(value: Option<&Secret<String>>, key: &'static str) -> Result<Secret<String>> {
    value
        .filter(|s| !s.expose_secret().trim().is_empty())
        .cloned()
        .ok_or(Error::MissingCredential(key))
}

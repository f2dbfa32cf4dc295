use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported config format: .{0}")]
    UnsupportedFormat(String),

    #[error("missing required credential `{0}` (set it in the config file or the environment)")]
    MissingCredential(&'static str),

    #[error("invalid config value for `{key}`: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("{message}")]
    Message { message: String },
}

impl streamify_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

streamify_common::impl_context!();

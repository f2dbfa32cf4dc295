use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The messaging service or the network failed a download, upload, or edit.
    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Local file handling failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    #[must_use]
    pub fn transport(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error came from the transport rather than local state.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

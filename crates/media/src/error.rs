use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Filesystem operation on the staging area failed.
    #[error("{op} {}: {source}", .path.display())]
    Staging {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    #[must_use]
    pub fn staging(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Staging {
            op,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Longest label kept in a staging filename, leaving room for the id prefix.
const MAX_LABEL_LEN: usize = 120;

/// What a staged file holds. Each kind gets its own name prefix so two
/// artifacts of one job never share a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Media,
    Thumbnail,
}

impl ArtifactKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Media => "m",
            Self::Thumbnail => "t",
        }
    }
}

/// Ephemeral file area for in-flight jobs.
///
/// Paths are a pure function of `(user_id, message_id, kind, label)`, so jobs
/// from different senders never collide and a re-run for the same message
/// reuses the same name.
#[derive(Debug, Clone)]
pub struct StagingStore {
    root: PathBuf,
}

impl StagingStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Deterministic staging path for one artifact of one job.
    pub fn path(&self, user_id: u64, message_id: i32, kind: ArtifactKind, label: &str) -> PathBuf {
        self.root.join(format!(
            "{user_id}_{message_id}_{}_{}",
            kind.prefix(),
            sanitize_label(label)
        ))
    }

    /// Create the staging root if it does not exist.
    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| Error::staging("create", &self.root, e))
    }

    /// Best-effort removal. Never fails; an already absent file is fine.
    pub async fn remove(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "removed staging file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove staging file"),
        }
    }
}

/// Reduce a caller-supplied label to one safe path component.
fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // Keep the tail so the extension survives truncation. Dots are trimmed
    // after cutting so the kept tail never starts a hidden name.
    let skip = cleaned.len().saturating_sub(MAX_LABEL_LEN);
    let tail = cleaned[skip..].trim_start_matches('.');

    if tail.is_empty() {
        return "file".to_string();
    }
    tail.to_string()
}

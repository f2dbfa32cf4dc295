//! Startup sweep of the staging root.
//!
//! Anything left in the staging root when the process starts belongs to a
//! job that never finished, so every entry is deleted.

use tracing::{info, warn};

use crate::{
    error::{Error, Result},
    store::StagingStore,
};

impl StagingStore {
    /// Create the staging root if needed and delete every entry in it.
    ///
    /// Returns how many entries were removed. Entries that cannot be removed
    /// are logged and skipped; only failing to create or list the root is an
    /// error.
    pub async fn sweep_on_startup(&self) -> Result<usize> {
        self.ensure_root().await?;

        let mut entries = tokio::fs::read_dir(self.root())
            .await
            .map_err(|e| Error::staging("list", self.root(), e))?;

        let mut removed = 0usize;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(root = %self.root().display(), error = %e, "staging sweep stopped early");
                    break;
                },
            };
            let path = entry.path();
            let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
            let result = if is_dir {
                tokio::fs::remove_dir_all(&path).await
            } else {
                tokio::fs::remove_file(&path).await
            };
            match result {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "failed to sweep staging entry"),
            }
        }

        info!(root = %self.root().display(), removed, "staging root swept");
        Ok(removed)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use crate::store::{ArtifactKind, StagingStore};

    #[tokio::test]
    async fn sweep_removes_every_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = StagingStore::new(dir.path());
        for i in 0..5 {
            tokio::fs::write(store.path(i, 1, ArtifactKind::Media, "left.mp4"), b"stale")
                .await
                .unwrap();
        }
        tokio::fs::create_dir(dir.path().join("nested")).await.unwrap();
        tokio::fs::write(dir.path().join("nested/thumb.jpg"), b"x")
            .await
            .unwrap();

        let removed = store.sweep_on_startup().await.unwrap();

        assert_eq!(removed, 6);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn sweep_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = StagingStore::new(dir.path().join("staging"));

        assert_eq!(store.sweep_on_startup().await.unwrap(), 0);
        assert!(store.root().is_dir());
    }
}

//! Job-scoped ownership of staged files.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use {
    streamify_media::{ArtifactKind, StagingStore},
    tracing::warn,
    uuid::Uuid,
};

/// Identifier of one relay job, used to tag its artifacts and log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A local file created for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingArtifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
    pub owner: JobId,
}

/// Owns every artifact a job creates and deletes them when the job ends.
///
/// [`JobStaging::release`] is the normal path. If the job unwinds before
/// reaching it, `Drop` removes whatever is still registered.
#[derive(Debug)]
pub struct JobStaging {
    job_id: JobId,
    store: StagingStore,
    artifacts: Vec<StagingArtifact>,
}

impl JobStaging {
    pub fn new(job_id: JobId, store: StagingStore) -> Self {
        Self {
            job_id,
            store,
            artifacts: Vec::with_capacity(2),
        }
    }

    /// Claim `path` for this job before anything is written to it, so a
    /// partially written file is still cleaned up.
    pub fn register(&mut self, kind: ArtifactKind, path: PathBuf) -> PathBuf {
        self.artifacts.push(StagingArtifact {
            path: path.clone(),
            kind,
            owner: self.job_id,
        });
        path
    }

    pub fn artifacts(&self) -> &[StagingArtifact] {
        &self.artifacts
    }

    /// Delete every registered artifact. Never fails.
    pub async fn release(&mut self) {
        for artifact in std::mem::take(&mut self.artifacts) {
            self.store.remove(&artifact.path).await;
        }
    }
}

impl Drop for JobStaging {
    fn drop(&mut self) {
        for artifact in self.artifacts.drain(..) {
            remove_now(&artifact.path, self.job_id);
        }
    }
}

fn remove_now(path: &Path, job_id: JobId) {
    if let Err(e) = std::fs::remove_file(path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(%job_id, path = %path.display(), error = %e, "failed to remove staging file");
    }
}

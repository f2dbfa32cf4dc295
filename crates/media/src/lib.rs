//! Media helpers: video detection, upload metadata, and the local staging area.

pub mod cleanup;
pub mod error;
pub mod metadata;
pub mod mime;
pub mod store;

pub use {
    error::{Error, Result},
    metadata::{Classification, Evidence, VideoMetadata, classify},
    store::{ArtifactKind, StagingStore},
};

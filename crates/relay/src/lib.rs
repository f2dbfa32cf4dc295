//! Per-user relay job lifecycle.
//!
//! [`JobController`] admits at most one job per sender, drives the
//! classify, download, and upload stages through a [`TransportGateway`], and
//! removes every staged file on every exit path.

pub mod admission;
pub mod error;
pub mod gateway;
pub mod job;
pub mod staging;

pub use {
    admission::{AdmissionPermit, AdmissionSet},
    error::{Error, Result},
    gateway::{SentMessage, TransportGateway, VideoUpload},
    job::{FailureKind, JobController, JobFailure, JobResult, RejectReason, RelaySettings},
    staging::{JobId, JobStaging, StagingArtifact},
    streamify_media::ArtifactKind,
};

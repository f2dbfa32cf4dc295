//! The relay job controller.
//!
//! A job moves through fixed stages: classify, stage naming, download, the
//! already-streamable short-circuit, optional thumbnail, filename
//! normalization, and upload. Any stage error short-circuits to cleanup and a
//! single report message. The admission permit and the job's staging guard
//! are both scoped to [`JobController::handle`], so every exit path releases
//! them. A panic inside a stage is caught and reported as an internal failure.

use std::{any::Any, panic::AssertUnwindSafe, path::PathBuf, sync::Arc};

use {
    futures::FutureExt,
    streamify_common::types::{FileRef, InboundFile},
    streamify_media::{
        ArtifactKind, Classification, StagingStore, VideoMetadata, classify, mime,
    },
    tracing::{debug, error, info, warn},
};

use crate::{
    Error, Result,
    admission::AdmissionSet,
    gateway::{SentMessage, TransportGateway, VideoUpload},
    staging::{JobId, JobStaging},
};

pub(crate) const BUSY_MSG: &str =
    "You already have a video in progress. Please wait until it finishes before sending another.";
pub(crate) const NOT_A_VIDEO_MSG: &str = "This file doesn't look like a video. Send a video file \
     (mp4, mkv, mov, avi, webm, ...) and I'll make it streamable.";
pub(crate) const TOO_LARGE_MSG: &str = "This file is too large for me to process.";
pub(crate) const ALREADY_STREAMABLE_MSG: &str =
    "This video is already streamable, there is nothing to convert.";
pub(crate) const INTERNAL_FAILURE_MSG: &str =
    "Something went wrong while processing your video. Please send it again.";

/// Suffix for the thumbnail artifact label.
const THUMBNAIL_LABEL_SUFFIX: &str = ".thumb.jpg";

/// Why a job was turned away without running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The sender already has a job in flight.
    Busy,
    NotAVideo,
    TooLarge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Download or upload failed at the messaging service or network.
    Transport,
    /// Anything else; reported to the user generically.
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&Error> for JobFailure {
    fn from(error: &Error) -> Self {
        let kind = if error.is_transport() {
            FailureKind::Transport
        } else {
            FailureKind::Internal
        };
        Self {
            kind,
            message: error.to_string(),
        }
    }
}

/// Terminal outcome of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    Delivered,
    AlreadyStreamable,
    Rejected(RejectReason),
    Failed(JobFailure),
}

impl JobResult {
    /// Text shown to the sender, or `None` when the uploaded video speaks for itself.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Delivered => None,
            Self::AlreadyStreamable => Some(ALREADY_STREAMABLE_MSG.into()),
            Self::Rejected(RejectReason::Busy) => Some(BUSY_MSG.into()),
            Self::Rejected(RejectReason::NotAVideo) => Some(NOT_A_VIDEO_MSG.into()),
            Self::Rejected(RejectReason::TooLarge) => Some(TOO_LARGE_MSG.into()),
            Self::Failed(JobFailure {
                kind: FailureKind::Transport,
                message,
            }) => Some(format!("Failed to process your video: {message}")),
            Self::Failed(JobFailure {
                kind: FailureKind::Internal,
                ..
            }) => Some(INTERNAL_FAILURE_MSG.into()),
        }
    }
}

/// Phases shown in the single status message of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPhase {
    Processing,
    Downloading,
    Uploading,
}

impl StatusPhase {
    pub fn text(self) -> &'static str {
        match self {
            Self::Processing => "Processing your video...",
            Self::Downloading => "Downloading...",
            Self::Uploading => "Uploading as a streamable video...",
        }
    }
}

/// Tunables for the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    pub caption: Option<String>,
    pub max_file_bytes: u64,
}

/// Drives relay jobs and owns the per-user admission set.
pub struct JobController {
    gateway: Arc<dyn TransportGateway>,
    store: StagingStore,
    admission: AdmissionSet,
    settings: RelaySettings,
}

impl JobController {
    pub fn new(
        gateway: Arc<dyn TransportGateway>,
        store: StagingStore,
        settings: RelaySettings,
    ) -> Self {
        Self {
            gateway,
            store,
            admission: AdmissionSet::new(),
            settings,
        }
    }

    pub fn admission(&self) -> &AdmissionSet {
        &self.admission
    }

    /// Run one job for an inbound file event and report its outcome.
    pub async fn handle(&self, file: InboundFile) -> JobResult {
        let origin = file.origin;
        let Some(_permit) = self.admission.try_admit(origin.user_id) else {
            info!(
                user_id = origin.user_id,
                message_id = origin.message_id,
                "rejecting job: sender already has one in flight"
            );
            let result = JobResult::Rejected(RejectReason::Busy);
            self.report(&file, None, &result).await;
            return result;
        };

        let job_id = JobId::new();
        info!(
            %job_id,
            user_id = origin.user_id,
            chat_id = origin.chat_id,
            message_id = origin.message_id,
            size_bytes = file.size_bytes(),
            "relay job admitted"
        );

        let mut staging = JobStaging::new(job_id, self.store.clone());
        let mut status = None;
        let run = AssertUnwindSafe(self.run(&file, &mut staging, &mut status)).catch_unwind();
        let result = match run.await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(%job_id, user_id = origin.user_id, error = %e, "relay job failed");
                JobResult::Failed(JobFailure::from(&e))
            },
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(%job_id, user_id = origin.user_id, panic = %message, "relay job panicked");
                JobResult::Failed(JobFailure {
                    kind: FailureKind::Internal,
                    message,
                })
            },
        };

        staging.release().await;
        self.report(&file, status, &result).await;

        info!(%job_id, user_id = origin.user_id, outcome = ?result, "relay job finished");
        result
    }

    async fn run(
        &self,
        file: &InboundFile,
        staging: &mut JobStaging,
        status: &mut Option<SentMessage>,
    ) -> Result<JobResult> {
        let origin = file.origin;

        let classification = classify(file);
        debug!(
            user_id = origin.user_id,
            evidence = ?classification.evidence,
            filename = %classification.filename,
            "classified inbound file"
        );
        if !classification.is_video {
            return Ok(JobResult::Rejected(RejectReason::NotAVideo));
        }
        if file.size_bytes() > self.settings.max_file_bytes {
            return Ok(JobResult::Rejected(RejectReason::TooLarge));
        }

        *status = self.open_status(file).await;

        let media_path = staging.register(
            ArtifactKind::Media,
            self.store.path(
                origin.user_id,
                origin.message_id,
                ArtifactKind::Media,
                &classification.filename,
            ),
        );

        self.set_phase(status.as_ref(), StatusPhase::Downloading)
            .await;
        self.gateway
            .download_to_path(&file.file, &media_path)
            .await?;
        debug!(path = %media_path.display(), "media downloaded");

        if file.is_already_streamable {
            return Ok(JobResult::AlreadyStreamable);
        }

        let thumbnail = match &file.thumbnail {
            Some(thumb) => {
                self.fetch_thumbnail(thumb, file, &classification, staging)
                    .await
            },
            None => None,
        };

        let filename = mime::normalize_video_filename(&classification.filename);

        self.set_phase(status.as_ref(), StatusPhase::Uploading)
            .await;
        let sent = self
            .gateway
            .send_video(VideoUpload {
                chat_id: origin.chat_id,
                reply_to: origin.message_id,
                path: &media_path,
                filename: &filename,
                metadata: VideoMetadata::for_upload(&classification),
                thumbnail: thumbnail.as_deref(),
                caption: self.settings.caption.as_deref(),
            })
            .await?;
        debug!(message_id = sent.message_id, "streamable video uploaded");

        Ok(JobResult::Delivered)
    }

    /// Thumbnail failures degrade to "no thumbnail".
    async fn fetch_thumbnail(
        &self,
        thumb: &FileRef,
        file: &InboundFile,
        classification: &Classification,
        staging: &mut JobStaging,
    ) -> Option<PathBuf> {
        let label = format!("{}{THUMBNAIL_LABEL_SUFFIX}", classification.filename);
        let path = staging.register(
            ArtifactKind::Thumbnail,
            self.store.path(
                file.origin.user_id,
                file.origin.message_id,
                ArtifactKind::Thumbnail,
                &label,
            ),
        );
        match self.gateway.download_to_path(thumb, &path).await {
            Ok(()) => Some(path),
            Err(e) => {
                warn!(
                    user_id = file.origin.user_id,
                    error = %e,
                    "thumbnail download failed, continuing without one"
                );
                None
            },
        }
    }

    async fn open_status(&self, file: &InboundFile) -> Option<SentMessage> {
        let origin = file.origin;
        match self
            .gateway
            .respond(
                origin.chat_id,
                origin.message_id,
                StatusPhase::Processing.text(),
            )
            .await
        {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(user_id = origin.user_id, error = %e, "failed to send status message");
                None
            },
        }
    }

    async fn set_phase(&self, status: Option<&SentMessage>, phase: StatusPhase) {
        let Some(message) = status else {
            return;
        };
        if let Err(e) = self.gateway.edit_message(message, phase.text()).await {
            warn!(?phase, error = %e, "failed to update status message");
        }
    }

    /// Deliver the single terminal message for a job.
    ///
    /// Delivered jobs drop the status message; everything else turns it into
    /// the outcome text, or replies directly when there is none.
    async fn report(&self, file: &InboundFile, status: Option<SentMessage>, result: &JobResult) {
        let origin = file.origin;
        let reported = match (result.user_message(), status) {
            (None, Some(message)) => self.gateway.delete_message(&message).await,
            (None, None) => Ok(()),
            (Some(text), Some(message)) => self.gateway.edit_message(&message, &text).await,
            (Some(text), None) => self
                .gateway
                .respond(origin.chat_id, origin.message_id, &text)
                .await
                .map(|_| ()),
        };
        if let Err(e) = reported {
            warn!(user_id = origin.user_id, error = %e, "failed to report job outcome");
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

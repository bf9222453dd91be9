//! Pipeline state machine and its status-channel projection.
//!
//! Uploading → Converting → UploadingImage → Persisting → Scoring → Parsing →
//! Finalizing → Done, or Failed(stage, failure) from any stage.
//!
//! Status strings are for display only. Consumers may match the `"Error: "`
//! prefix to tell failure from progress; nothing else should be inferred from them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub const ERROR_PREFIX: &str = "Error: ";
pub const COMPLETION_STATUS: &str = "Analysis complete, redirecting...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Uploading,
    Converting,
    UploadingImage,
    Persisting,
    Scoring,
    Parsing,
    Finalizing,
    Done,
}

impl PipelineStage {
    pub fn status_text(self) -> &'static str {
        match self {
            PipelineStage::Uploading => "Uploading the file...",
            PipelineStage::Converting => "Converting to image...",
            PipelineStage::UploadingImage => "Uploading the image...",
            PipelineStage::Persisting => "Preparing data...",
            PipelineStage::Scoring => "Analyzing...",
            PipelineStage::Parsing => "Reading feedback...",
            PipelineStage::Finalizing => "Saving feedback...",
            PipelineStage::Done => COMPLETION_STATUS,
        }
    }
}

/// Why a run stopped. The display text is the user-facing reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineFailure {
    #[error("Failed to upload file")]
    Upload,

    #[error("Failed to convert PDF to image")]
    Conversion,

    #[error("Failed to upload image")]
    ImageUpload,

    #[error("Failed to save resume data")]
    Persist,

    #[error("Failed to analyze resume")]
    Analysis,

    #[error("Failed to parse analysis result")]
    Parse,
}

impl PipelineFailure {
    pub fn status_text(self) -> String {
        format!("{ERROR_PREFIX}{self}")
    }
}

/// One message on the status channel.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub stage: PipelineStage,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl StatusUpdate {
    pub fn new(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.message.starts_with(ERROR_PREFIX)
    }
}

/// Terminal state of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Done {
        id: Uuid,
    },
    Failed {
        stage: PipelineStage,
        failure: PipelineFailure,
        /// Set once a pending record exists, i.e. for failures from Scoring onwards.
        record_id: Option<Uuid>,
    },
}

impl PipelineOutcome {
    /// Where the caller should navigate after a successful run.
    pub fn redirect_path(&self) -> Option<String> {
        match self {
            PipelineOutcome::Done { id } => Some(format!("/resume/{id}")),
            PipelineOutcome::Failed { .. } => None,
        }
    }

    pub fn record_id(&self) -> Option<Uuid> {
        match self {
            PipelineOutcome::Done { id } => Some(*id),
            PipelineOutcome::Failed { record_id, .. } => *record_id,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, PipelineOutcome::Done { .. })
    }
}

//! Résumé analysis pipeline: turns an uploaded file into a persisted, scored record.
//!
//! Flow: upload document → rasterize → upload image → save pending record →
//!       AI scoring → parse → save scored record → done.
//!
//! Every stage waits for the previous side effect to be confirmed. The AI call
//! only ever runs against a record that is already persisted. Nothing is retried
//! and nothing is compensated: a rasterization failure leaves the uploaded
//! document in the content store, and a scoring failure leaves a pending record.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::analysis::feedback::{parse_feedback, response_text, FeedbackBackend};
use crate::analysis::prompts::prepare_instructions;
use crate::analysis::rasterize::Rasterizer;
use crate::analysis::stage::{PipelineFailure, PipelineOutcome, PipelineStage, StatusUpdate};
use crate::models::resume::{Feedback, ResumeRecord};
use crate::records::RecordStore;
use crate::storage::{ContentStore, UploadFile};

/// One submission from the upload form.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub file: UploadFile,
}

#[derive(Clone)]
pub struct AnalysisPipeline {
    content: Arc<dyn ContentStore>,
    records: RecordStore,
    rasterizer: Arc<dyn Rasterizer>,
    feedback: Arc<dyn FeedbackBackend>,
}

/// Tracks the current stage and mirrors every transition onto the status channel.
struct Progress<'a> {
    status: &'a mpsc::UnboundedSender<StatusUpdate>,
    stage: PipelineStage,
}

impl<'a> Progress<'a> {
    fn new(status: &'a mpsc::UnboundedSender<StatusUpdate>) -> Self {
        Self {
            status,
            stage: PipelineStage::Uploading,
        }
    }

    fn enter(&mut self, stage: PipelineStage) {
        self.stage = stage;
        info!("Pipeline stage: {stage:?}");
        self.emit(stage.status_text().to_string());
    }

    fn fail(&self, failure: PipelineFailure, record_id: Option<Uuid>) -> PipelineOutcome {
        error!("Pipeline failed at {:?}: {failure}", self.stage);
        self.emit(failure.status_text());
        PipelineOutcome::Failed {
            stage: self.stage,
            failure,
            record_id,
        }
    }

    fn emit(&self, message: String) {
        // A closed receiver only means nobody is watching.
        let _ = self.status.send(StatusUpdate::new(self.stage, message));
    }
}

impl AnalysisPipeline {
    pub fn new(
        content: Arc<dyn ContentStore>,
        records: RecordStore,
        rasterizer: Arc<dyn Rasterizer>,
        feedback: Arc<dyn FeedbackBackend>,
    ) -> Self {
        Self {
            content,
            records,
            rasterizer,
            feedback,
        }
    }

    /// Runs one submission to completion, streaming status updates into `status`.
    pub async fn run(
        &self,
        request: AnalyzeRequest,
        status: &mpsc::UnboundedSender<StatusUpdate>,
    ) -> PipelineOutcome {
        let mut progress = Progress::new(status);
        let AnalyzeRequest {
            company_name,
            job_title,
            job_description,
            file,
        } = request;

        // Stage 1: upload the original document
        progress.enter(PipelineStage::Uploading);
        let uploaded_file = match self.content.upload(&file).await {
            Ok(blob) => blob,
            Err(e) => {
                error!("Document upload failed: {e}");
                return progress.fail(PipelineFailure::Upload, None);
            }
        };

        // Stage 2: render the preview image
        progress.enter(PipelineStage::Converting);
        let image = match self.rasterizer.convert(&file).await {
            Ok(image) => image,
            Err(e) => {
                warn!(
                    "Rasterization failed ({e}); {} stays in the content store",
                    uploaded_file.path
                );
                return progress.fail(PipelineFailure::Conversion, None);
            }
        };

        // Stage 3: upload the preview image
        progress.enter(PipelineStage::UploadingImage);
        let uploaded_image = match self.content.upload(&image).await {
            Ok(blob) => blob,
            Err(e) => {
                warn!(
                    "Image upload failed ({e}); {} stays in the content store",
                    uploaded_file.path
                );
                return progress.fail(PipelineFailure::ImageUpload, None);
            }
        };

        // Stage 4: persist the pending record, first point it becomes visible
        progress.enter(PipelineStage::Persisting);
        let mut record = ResumeRecord::pending(
            Uuid::new_v4(),
            uploaded_file.path,
            uploaded_image.path,
            company_name,
            job_title,
            job_description,
        );
        if let Err(e) = self.records.save(&record).await {
            error!("Saving pending record {} failed: {e}", record.id);
            return progress.fail(PipelineFailure::Persist, None);
        }

        // Stage 5: AI scoring
        progress.enter(PipelineStage::Scoring);
        let instructions = prepare_instructions(&record.job_title, &record.job_description);
        let response = match self.feedback.feedback(&record.resume_ref, &instructions).await {
            Ok(response) => response,
            Err(e) => {
                error!("Scoring record {} failed: {e}", record.id);
                return progress.fail(PipelineFailure::Analysis, Some(record.id));
            }
        };
        let Some(text) = response_text(&response) else {
            error!("Scoring record {} returned no text", record.id);
            return progress.fail(PipelineFailure::Analysis, Some(record.id));
        };

        // Stage 6: extract & parse
        progress.enter(PipelineStage::Parsing);
        let result = match parse_feedback(text) {
            Ok(result) => result,
            Err(e) => {
                warn!("Unreadable feedback for record {}: {e}", record.id);
                record.feedback = Feedback::ParseError(text.to_string());
                if let Err(e) = self.records.save(&record).await {
                    error!("Recording parse error on {} failed: {e}", record.id);
                }
                return progress.fail(PipelineFailure::Parse, Some(record.id));
            }
        };

        // Stage 7: overwrite the same key with the scored record
        progress.enter(PipelineStage::Finalizing);
        info!(
            "Record {} scored {}/100",
            record.id, result.overall_score
        );
        record.feedback = Feedback::Scored(result);
        if let Err(e) = self.records.save(&record).await {
            error!("Saving scored record {} failed: {e}", record.id);
            return progress.fail(PipelineFailure::Persist, Some(record.id));
        }

        progress.enter(PipelineStage::Done);
        PipelineOutcome::Done { id: record.id }
    }

    /// Runs the pipeline and returns the outcome together with every status update, in order.
    pub async fn run_collecting(
        &self,
        request: AnalyzeRequest,
    ) -> (PipelineOutcome, Vec<StatusUpdate>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let outcome = self.run(request, &tx).await;
        drop(tx);

        let mut trail = Vec::new();
        while let Some(update) = rx.recv().await {
            trail.push(update);
        }
        (outcome, trail)
    }
}

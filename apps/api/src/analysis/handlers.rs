//! Axum route handler for submitting a résumé for analysis.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use bytes::Bytes;
use futures::{stream, Stream, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::analysis::pipeline::AnalyzeRequest;
use crate::analysis::stage::{PipelineOutcome, StatusUpdate};
use crate::errors::AppError;
use crate::state::AppState;
use crate::storage::UploadFile;

const PDF_CONTENT_TYPE: &str = "application/pdf";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Raw multipart fields as received, before validation.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub job_description: Option<String>,
    pub file_name: Option<String>,
    pub file_content_type: Option<String>,
    pub file_data: Option<Bytes>,
}

/// How a run ended, as reported to the client.
#[derive(Debug, Serialize)]
pub struct OutcomeSummary {
    /// Present once a record exists, including runs that failed after persisting it.
    pub id: Option<Uuid>,
    pub outcome: PipelineOutcome,
    pub redirect_to: Option<String>,
}

impl OutcomeSummary {
    fn new(outcome: PipelineOutcome) -> Self {
        if let PipelineOutcome::Failed { stage, failure, .. } = &outcome {
            warn!("Analysis request failed at {stage:?}: {failure}");
        }
        Self {
            id: outcome.record_id(),
            redirect_to: outcome.redirect_path(),
            outcome,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub summary: OutcomeSummary,
    pub status_trail: Vec<StatusUpdate>,
}

/// SSE event names on the streaming route.
const STATUS_EVENT: &str = "status";
const FAILURE_EVENT: &str = "failure";
const OUTCOME_EVENT: &str = "outcome";

fn status_event(update: StatusUpdate) -> Result<Event, axum::Error> {
    let name = if update.is_error() {
        FAILURE_EVENT
    } else {
        STATUS_EVENT
    };
    Event::default().event(name).json_data(update)
}

impl UploadForm {
    /// Applies the upload form's rules: all text fields required, one non-empty PDF
    /// no larger than `max_bytes`.
    pub fn validate(self, max_bytes: usize) -> Result<AnalyzeRequest, AppError> {
        let company_name = required_text(self.company_name, "company_name")?;
        let job_title = required_text(self.job_title, "job_title")?;
        let job_description = required_text(self.job_description, "job_description")?;

        let data = self
            .file_data
            .ok_or_else(|| AppError::Validation("file is required".to_string()))?;
        if data.is_empty() {
            return Err(AppError::Validation("file is empty".to_string()));
        }
        if data.len() > max_bytes {
            return Err(AppError::Validation(format!(
                "file exceeds the {} MB limit",
                max_bytes / (1024 * 1024)
            )));
        }

        let name = self
            .file_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "resume.pdf".to_string());
        let is_pdf = self.file_content_type.as_deref() == Some(PDF_CONTENT_TYPE)
            || name.to_ascii_lowercase().ends_with(".pdf");
        if !is_pdf {
            return Err(AppError::Validation(
                "Only PDF files are supported".to_string(),
            ));
        }

        Ok(AnalyzeRequest {
            company_name,
            job_title,
            job_description,
            file: UploadFile::new(name, PDF_CONTENT_TYPE, data),
        })
    }
}

fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let malformed = |e: axum::extract::multipart::MultipartError| {
            AppError::Validation(format!("Could not read field {name}: {e}"))
        };
        match name.as_str() {
            "company_name" => form.company_name = Some(field.text().await.map_err(malformed)?),
            "job_title" => form.job_title = Some(field.text().await.map_err(malformed)?),
            "job_description" => {
                form.job_description = Some(field.text().await.map_err(malformed)?)
            }
            "file" => {
                form.file_name = field.file_name().map(str::to_string);
                form.file_content_type = field.content_type().map(str::to_string);
                form.file_data = Some(field.bytes().await.map_err(malformed)?);
            }
            _ => {}
        }
    }
    Ok(form)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

async fn read_request(
    state: &AppState,
    multipart: Multipart,
) -> Result<AnalyzeRequest, AppError> {
    let request = read_form(multipart)
        .await?
        .validate(state.config.max_upload_bytes)?;
    info!(
        "Analyzing {} ({} bytes) for {} at {}",
        request.file.name,
        request.file.data.len(),
        request.job_title,
        request.company_name
    );
    Ok(request)
}

/// POST /api/v1/resumes
///
/// Runs the full analysis pipeline for one upload. 201 with the redirect target on
/// success; 422 with the failing stage when the pipeline stops early. Both bodies
/// carry the ordered status trail.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<AnalyzeResponse>), AppError> {
    let request = read_request(&state, multipart).await?;

    let (outcome, status_trail) = state.pipeline.run_collecting(request).await;
    let status = if outcome.is_done() {
        StatusCode::CREATED
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };

    Ok((
        status,
        Json(AnalyzeResponse {
            summary: OutcomeSummary::new(outcome),
            status_trail,
        }),
    ))
}

/// POST /api/v1/resumes/stream
///
/// Same pipeline, reported live: one `status` event per update as it happens (a
/// `failure` event for the error update), then a single `outcome` event carrying the
/// [`OutcomeSummary`]. The run is detached from the connection, so a client that goes
/// away does not cancel it.
pub async fn handle_analyze_stream(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>> + Send + 'static>, AppError> {
    let request = read_request(&state, multipart).await?;

    let (tx, rx) = mpsc::unbounded_channel();
    let pipeline = state.pipeline.clone();
    // The sender lives inside the task, so the status stream ends with the run.
    let run = tokio::spawn(async move { pipeline.run(request, &tx).await });

    let updates = UnboundedReceiverStream::new(rx).map(status_event);
    let outcome = stream::once(async move {
        match run.await {
            Ok(outcome) => Event::default()
                .event(OUTCOME_EVENT)
                .json_data(OutcomeSummary::new(outcome)),
            Err(e) => {
                error!("Analysis task did not complete: {e}");
                Err(axum::Error::new(e))
            }
        }
    });

    Ok(Sse::new(updates.chain(outcome)).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: usize = 1024 * 1024;

    fn valid_form() -> UploadForm {
        UploadForm {
            company_name: Some("Acme".to_string()),
            job_title: Some("Engineer".to_string()),
            job_description: Some("Build things".to_string()),
            file_name: Some("cv.pdf".to_string()),
            file_content_type: Some(PDF_CONTENT_TYPE.to_string()),
            file_data: Some(Bytes::from_static(b"%PDF-1.7")),
        }
    }

    fn validation_message(form: UploadForm) -> String {
        match form.validate(20 * MB) {
            Err(AppError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_form_becomes_request() {
        let request = valid_form().validate(20 * MB).unwrap();
        assert_eq!(request.company_name, "Acme");
        assert_eq!(request.file.name, "cv.pdf");
        assert_eq!(request.file.content_type, PDF_CONTENT_TYPE);
    }

    #[test]
    fn test_text_fields_are_trimmed() {
        let form = UploadForm {
            job_title: Some("  Engineer \n".to_string()),
            ..valid_form()
        };
        assert_eq!(form.validate(20 * MB).unwrap().job_title, "Engineer");
    }

    #[test]
    fn test_blank_fields_are_rejected() {
        let form = UploadForm {
            job_description: Some("   ".to_string()),
            ..valid_form()
        };
        assert_eq!(validation_message(form), "job_description is required");

        let form = UploadForm {
            company_name: None,
            ..valid_form()
        };
        assert_eq!(validation_message(form), "company_name is required");
    }

    #[test]
    fn test_missing_or_empty_file_is_rejected() {
        let form = UploadForm {
            file_data: None,
            ..valid_form()
        };
        assert_eq!(validation_message(form), "file is required");

        let form = UploadForm {
            file_data: Some(Bytes::new()),
            ..valid_form()
        };
        assert_eq!(validation_message(form), "file is empty");
    }

    #[test]
    fn test_oversized_file_is_rejected() {
        let form = UploadForm {
            file_data: Some(Bytes::from(vec![0u8; MB + 1])),
            ..valid_form()
        };
        assert!(matches!(form.validate(MB), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_non_pdf_is_rejected() {
        let form = UploadForm {
            file_name: Some("cv.docx".to_string()),
            file_content_type: Some("application/octet-stream".to_string()),
            ..valid_form()
        };
        assert_eq!(validation_message(form), "Only PDF files are supported");
    }

    #[test]
    fn test_pdf_detected_by_extension_when_content_type_is_generic() {
        let form = UploadForm {
            file_name: Some("CV.PDF".to_string()),
            file_content_type: Some("application/octet-stream".to_string()),
            ..valid_form()
        };
        assert!(form.validate(20 * MB).is_ok());
    }
}

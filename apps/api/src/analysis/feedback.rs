//! AI scoring backend and reading of its answer.
//!
//! The backend is a single remote call. Turning its answer into an
//! [`AnalysisResult`] is a separate, pure step so malformed answers can be
//! recorded instead of crashing the run.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::analysis::prompts::{analysis_system, document_prompt};
use crate::llm_client::{strip_json_fences, LlmClient, LlmError, LlmResponse};
use crate::models::resume::AnalysisResult;
use crate::storage::ContentStore;

#[async_trait]
pub trait FeedbackBackend: Send + Sync {
    /// Scores the document stored at `document_ref` against `instructions`.
    async fn feedback(
        &self,
        document_ref: &str,
        instructions: &str,
    ) -> Result<LlmResponse, LlmError>;
}

/// Production backend: reads the résumé PDF from the content store and sends it to
/// Claude as a document alongside the instructions.
pub struct LlmFeedbackBackend {
    llm: LlmClient,
    content: Arc<dyn ContentStore>,
}

impl LlmFeedbackBackend {
    pub fn new(llm: LlmClient, content: Arc<dyn ContentStore>) -> Self {
        Self { llm, content }
    }
}

#[async_trait]
impl FeedbackBackend for LlmFeedbackBackend {
    async fn feedback(
        &self,
        document_ref: &str,
        instructions: &str,
    ) -> Result<LlmResponse, LlmError> {
        let document = self
            .content
            .read(document_ref)
            .await
            .map_err(|e| LlmError::Document(e.to_string()))?;
        if document.is_empty() {
            return Err(LlmError::Document(format!("{document_ref} is empty")));
        }
        debug!("Sending {} bytes of PDF from {document_ref}", document.len());

        self.llm
            .call_with_pdf(&document, &document_prompt(instructions), &analysis_system())
            .await
    }
}

#[derive(Debug, Error)]
pub enum FeedbackParseError {
    #[error("Feedback is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Feedback is out of range: {0}")]
    OutOfRange(String),
}

/// The textual payload of a response, or `None` when the model said nothing usable.
pub fn response_text(response: &LlmResponse) -> Option<&str> {
    response.text().filter(|t| !t.trim().is_empty())
}

/// Parses the model's JSON answer (code fences tolerated) and checks score ranges.
pub fn parse_feedback(text: &str) -> Result<AnalysisResult, FeedbackParseError> {
    let result: AnalysisResult = serde_json::from_str(strip_json_fences(text))?;
    result.validate().map_err(FeedbackParseError::OutOfRange)?;
    Ok(result)
}

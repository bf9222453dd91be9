//! Scripted stand-ins for the rasterizer and the AI backend.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;

use crate::analysis::feedback::FeedbackBackend;
use crate::analysis::rasterize::{RasterizeError, Rasterizer};
use crate::llm_client::{LlmError, LlmResponse};
use crate::storage::UploadFile;

pub struct FakeRasterizer {
    pub fail: bool,
}

#[async_trait]
impl Rasterizer for FakeRasterizer {
    async fn convert(&self, file: &UploadFile) -> Result<UploadFile, RasterizeError> {
        if self.fail {
            return Err(RasterizeError::EmptyOutput);
        }
        Ok(UploadFile::new(
            format!("{}.png", file.name),
            "image/png",
            Bytes::from_static(b"\x89PNG"),
        ))
    }
}

/// Replies with a fixed text payload, or fails. Records the calls it received.
pub struct ScriptedBackend {
    reply: Option<String>,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedBackend {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl FeedbackBackend for ScriptedBackend {
    async fn feedback(
        &self,
        document_ref: &str,
        instructions: &str,
    ) -> Result<LlmResponse, LlmError> {
        self.calls
            .lock()
            .await
            .push((document_ref.to_string(), instructions.to_string()));
        match &self.reply {
            Some(text) => Ok(serde_json::from_value(serde_json::json!({
                "content": [{"type": "text", "text": text}]
            }))
            .unwrap()),
            None => Err(LlmError::Api {
                status: 400,
                message: "bad request".to_string(),
            }),
        }
    }
}

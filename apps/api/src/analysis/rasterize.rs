//! PDF → preview image conversion.
//!
//! Production uses poppler's `pdftoppm` on the first page. The document is staged
//! in a temp dir that is removed when the conversion returns.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::storage::UploadFile;

#[derive(Debug, Error)]
pub enum RasterizeError {
    #[error("I/O error during conversion: {0}")]
    Io(#[from] std::io::Error),

    #[error("{program} exited with {status}: {stderr}")]
    Tool {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("Conversion produced an empty image")]
    EmptyOutput,
}

#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Renders the first page of `file` as a PNG.
    async fn convert(&self, file: &UploadFile) -> Result<UploadFile, RasterizeError>;
}

pub struct PdftoppmRasterizer {
    program: String,
    dpi: u32,
}

impl PdftoppmRasterizer {
    pub fn new(program: impl Into<String>, dpi: u32) -> Self {
        Self {
            program: program.into(),
            dpi,
        }
    }
}

#[async_trait]
impl Rasterizer for PdftoppmRasterizer {
    async fn convert(&self, file: &UploadFile) -> Result<UploadFile, RasterizeError> {
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("input.pdf");
        let output_root = workdir.path().join("page");
        tokio::fs::write(&input, &file.data).await?;

        let output = Command::new(&self.program)
            .args(["-png", "-singlefile", "-f", "1", "-l", "1", "-r"])
            .arg(self.dpi.to_string())
            .arg(&input)
            .arg(&output_root)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(RasterizeError::Tool {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // -singlefile writes exactly `<root>.png`
        let image = tokio::fs::read(output_root.with_extension("png")).await?;
        if image.is_empty() {
            return Err(RasterizeError::EmptyOutput);
        }
        debug!("Rasterized {} into {} bytes of PNG", file.name, image.len());

        Ok(UploadFile::new(
            preview_file_name(&file.name),
            "image/png",
            Bytes::from(image),
        ))
    }
}

/// `cv.PDF` → `cv.png`; names without a PDF extension just gain `.png`.
pub fn preview_file_name(document_name: &str) -> String {
    let stem = match document_name.len().checked_sub(4) {
        Some(split)
            if document_name.is_char_boundary(split)
                && document_name[split..].eq_ignore_ascii_case(".pdf") =>
        {
            &document_name[..split]
        }
        _ => document_name,
    };
    format!("{stem}.png")
}

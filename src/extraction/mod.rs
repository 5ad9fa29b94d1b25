//! Text extraction from uploaded PDF bytes.
//!
//! Extraction runs in two stages. The primary path parses the PDF with `lopdf` page by page.
//! When the normalized result is shorter than the configured threshold (typical for scanned
//! documents), an optional OCR engine rasterizes the pages and recognizes their text; its output
//! wins only when strictly longer than the primary text.

mod ocr;
mod pdf;

pub use ocr::{OcrEngine, OcrError, TesseractOcr};

use crate::config::Config;
use crate::error::ErrorCode;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while validating uploads or extracting their text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Upload was rejected before parsing (name, extension, size).
    #[error("Invalid upload: {0}")]
    InvalidFile(String),
    /// The PDF could not be parsed or produced no usable text.
    #[error("Failed to parse PDF: {0}")]
    ParseFailed(String),
}

impl ExtractionError {
    /// Wire-level code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidFile(_) => ErrorCode::InvalidFile,
            Self::ParseFailed(_) => ErrorCode::PdfParseFailed,
        }
    }
}

/// Capability interface for turning uploaded bytes into normalized plain text.
#[async_trait]
pub trait TextExtractionBackend: Send + Sync {
    /// Validate the upload and return its normalized text.
    async fn extract_text(
        &self,
        bytes: &[u8],
        filename: Option<&str>,
        max_size_bytes: usize,
    ) -> Result<String, ExtractionError>;
}

/// Production extractor: `lopdf` primary path with an optional OCR fallback.
pub struct PdfTextExtractor {
    ocr: Option<Box<dyn OcrEngine>>,
    ocr_min_text_length: usize,
}

impl PdfTextExtractor {
    /// Build an extractor with an explicit (possibly absent) OCR engine.
    pub fn new(ocr: Option<Box<dyn OcrEngine>>, ocr_min_text_length: usize) -> Self {
        Self {
            ocr,
            ocr_min_text_length,
        }
    }

    /// Build an extractor from configuration, probing for OCR tooling when enabled.
    pub fn from_config(config: &Config) -> Self {
        let ocr = if config.ocr_enabled {
            match TesseractOcr::detect(&config.ocr_languages, config.ocr_dpi) {
                Some(engine) => {
                    tracing::info!(
                        languages = %config.ocr_languages,
                        dpi = config.ocr_dpi,
                        "OCR fallback enabled"
                    );
                    Some(Box::new(engine) as Box<dyn OcrEngine>)
                }
                None => {
                    tracing::warn!("OCR enabled but pdftoppm/tesseract not found on PATH; skipping");
                    None
                }
            }
        } else {
            None
        };
        Self::new(ocr, config.ocr_min_text_length)
    }

    async fn ocr_text(&self, bytes: &[u8]) -> String {
        let Some(engine) = self.ocr.as_ref() else {
            return String::new();
        };
        match engine.recognize(bytes).await {
            Ok(text) => normalize_whitespace(&text),
            Err(error) => {
                tracing::warn!(error = %error, "OCR fallback failed; keeping primary text");
                String::new()
            }
        }
    }
}

#[async_trait]
impl TextExtractionBackend for PdfTextExtractor {
    async fn extract_text(
        &self,
        bytes: &[u8],
        filename: Option<&str>,
        max_size_bytes: usize,
    ) -> Result<String, ExtractionError> {
        validate_upload(bytes, filename, max_size_bytes)?;

        let owned = bytes.to_vec();
        let primary = tokio::task::spawn_blocking(move || pdf::extract_pages(&owned))
            .await
            .map_err(|error| ExtractionError::ParseFailed(format!("parser task failed: {error}")))??;
        let primary = normalize_whitespace(&primary);
        let primary_len = primary.chars().count();

        let text = if primary_len < self.ocr_min_text_length {
            let ocr = self.ocr_text(bytes).await;
            let ocr_len = ocr.chars().count();
            tracing::debug!(primary_len, ocr_len, "Primary text below OCR threshold");
            if ocr_len > primary_len { ocr } else { primary }
        } else {
            primary
        };

        if text.is_empty() {
            return Err(ExtractionError::ParseFailed(
                "no text recovered from document".into(),
            ));
        }
        Ok(text)
    }
}

/// Reject uploads that are unnamed, not `.pdf`, empty, or larger than `max_size_bytes`.
pub fn validate_upload(
    bytes: &[u8],
    filename: Option<&str>,
    max_size_bytes: usize,
) -> Result<(), ExtractionError> {
    let Some(name) = filename.map(str::trim).filter(|name| !name.is_empty()) else {
        return Err(ExtractionError::InvalidFile("missing filename".into()));
    };
    if !name.to_lowercase().ends_with(".pdf") {
        return Err(ExtractionError::InvalidFile(format!(
            "'{name}' is not a .pdf file"
        )));
    }
    if bytes.is_empty() {
        return Err(ExtractionError::InvalidFile("empty upload".into()));
    }
    if bytes.len() > max_size_bytes {
        return Err(ExtractionError::InvalidFile(format!(
            "upload is {} bytes, limit is {max_size_bytes}",
            bytes.len()
        )));
    }
    Ok(())
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

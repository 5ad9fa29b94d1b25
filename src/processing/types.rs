//! Core data types and error definitions for the ingestion pipeline.

use crate::error::ErrorCode;
use crate::extraction::ExtractionError;
use crate::gemini::GeminiError;
use crate::store::{Document, DocumentStatus, StoreError};
use serde::Serialize;
use thiserror::Error;

/// Errors produced while splitting text into chunk windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChunkingError {
    /// Window size was zero or negative.
    #[error("INVALID_CHUNK_SIZE")]
    InvalidChunkSize,
    /// Overlap was negative or not smaller than the window size.
    #[error("INVALID_CHUNK_OVERLAP")]
    InvalidChunkOverlap,
}

/// Errors emitted by a single file's pipeline run.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Upload validation or text extraction failed.
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    /// Chunking parameters were rejected.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// Embedding or summarization request failed upstream.
    #[error("Gemini request failed: {0}")]
    Gemini(#[from] GeminiError),
    /// Document store rejected a read or write.
    #[error("Document store failed: {0}")]
    Store(#[from] StoreError),
}

impl ProcessingError {
    /// Normalize the failure to its wire-level code; anything unrecognized is `DB_ERROR`.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Extraction(error) => error.code(),
            Self::Gemini(error) => error.code(),
            Self::Chunking(_) | Self::Store(_) => ErrorCode::DbError,
        }
    }
}

/// Errors that reject a whole batch before any file is processed.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Batch was empty or exceeded the configured maximum.
    #[error("batch must contain between 1 and {max} files, got {actual}")]
    InvalidBatchSize {
        /// Configured maximum number of files.
        max: usize,
        /// Number of files submitted.
        actual: usize,
    },
}

impl BatchError {
    /// Wire-level code for this failure.
    pub fn code(&self) -> ErrorCode {
        ErrorCode::InvalidFile
    }
}

/// One uploaded file awaiting processing.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied filename, if any.
    pub filename: Option<String>,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Convenience constructor for named uploads.
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: Some(filename.into()),
            bytes: bytes.into(),
        }
    }
}

/// Outcome of processing one file within a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItemResult {
    /// Persisted document id; absent when no document row was created.
    pub document_id: Option<i64>,
    /// Filename as submitted (empty when missing).
    pub filename: String,
    /// Terminal status of the file.
    pub status: DocumentStatus,
    /// `SUCCESS` or the error code.
    pub message: String,
}

/// Aggregated response for a processed batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResponse {
    /// Number of files submitted.
    pub batch_total: usize,
    /// One entry per submitted file, in submission order.
    pub results: Vec<BatchItemResult>,
}

/// Errors raised by the read endpoints.
#[derive(Debug, Error)]
pub enum ReadError {
    /// No document has the requested identifier.
    #[error("NOT_FOUND")]
    NotFound,
    /// Document exists but has no summary yet.
    #[error("NOT_READY")]
    NotReady,
    /// Document store rejected the read.
    #[error("Document store failed: {0}")]
    Store(#[from] StoreError),
}

impl ReadError {
    /// Wire-level code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound => ErrorCode::NotFound,
            Self::NotReady => ErrorCode::NotReady,
            Self::Store(_) => ErrorCode::DbError,
        }
    }
}

/// Full detail of one stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryDetail {
    /// Stored document record.
    pub document: Document,
    /// Number of persisted chunks.
    pub chunk_count: i64,
}

/// Plain-text attachment for a summarized document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryDownload {
    /// Attachment filename, `summary_<id>.txt`.
    pub filename: String,
    /// Attachment body.
    pub body: String,
}

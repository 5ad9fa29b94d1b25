//! Persisted records and store errors.

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use time::OffsetDateTime;

/// Errors returned by document store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database driver reported a failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Embedding vector could not be encoded or decoded as JSON.
    #[error("Embedding serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A stored row held a value outside the known domain.
    #[error("Corrupt row: {0}")]
    CorruptRow(String),
    /// A state transition targeted a document that is missing or no longer pending.
    #[error("Document {0} is missing or not pending")]
    NotPending(i64),
}

/// Processing state of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentStatus {
    /// Created, pipeline still running.
    Pending,
    /// Title, summary, and chunks persisted.
    Completed,
    /// Pipeline failed; `error_message` holds the code.
    Failed,
}

impl DocumentStatus {
    /// Stored representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            other => Err(StoreError::CorruptRow(format!("unknown status '{other}'"))),
        }
    }
}

/// One uploaded file's processing record.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Identifier assigned on creation.
    pub id: i64,
    /// Filename as uploaded.
    pub original_filename: String,
    /// Normalized extracted text.
    pub original_text: String,
    /// Generated title, set on completion.
    pub summary_title: Option<String>,
    /// Generated summary, set on completion.
    pub summary_text: Option<String>,
    /// Current processing state.
    pub status: DocumentStatus,
    /// Error code, present only when failed.
    pub error_message: Option<String>,
    /// Creation timestamp (UTC).
    pub created_at: OffsetDateTime,
    /// Last state change (UTC).
    pub updated_at: OffsetDateTime,
}

/// Summary row used by the listing endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentListItem {
    /// Document identifier.
    pub id: i64,
    /// Generated title, if completed.
    pub title: Option<String>,
    /// Filename as uploaded.
    pub filename: String,
    /// Current processing state.
    pub status: DocumentStatus,
    /// Creation timestamp (UTC).
    pub created_at: OffsetDateTime,
}

/// Chunk ready to be written alongside its document's completion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChunk {
    /// 0-based position within the document.
    pub chunk_index: i64,
    /// Window text.
    pub chunk_text: String,
    /// Embedding vector for the window.
    pub embedding: Vec<f32>,
}

/// Persisted chunk of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChunk {
    /// Chunk identifier.
    pub id: i64,
    /// Owning document.
    pub document_id: i64,
    /// 0-based position within the document.
    pub chunk_index: i64,
    /// Window text.
    pub chunk_text: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// Creation timestamp (UTC).
    pub created_at: OffsetDateTime,
}

//! Wire-level error codes shared by the pipeline and the HTTP surface.

use serde::Serialize;
use std::fmt;

/// Short string codes surfaced to API consumers and stored on FAILED documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed, oversized, or wrong-type upload, or a batch-size violation.
    InvalidFile,
    /// Extraction produced no usable text.
    PdfParseFailed,
    /// Any upstream model failure: auth, network, malformed response, empty fields.
    GeminiFailed,
    /// Persistence or otherwise unrecognized failure.
    DbError,
    /// Requested document does not exist.
    NotFound,
    /// Requested document has no summary yet.
    NotReady,
}

impl ErrorCode {
    /// Wire representation of the code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidFile => "INVALID_FILE",
            Self::PdfParseFailed => "PDF_PARSE_FAILED",
            Self::GeminiFailed => "GEMINI_FAILED",
            Self::DbError => "DB_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::NotReady => "NOT_READY",
        }
    }

    /// Parse a stored code back into its variant.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "INVALID_FILE" => Some(Self::InvalidFile),
            "PDF_PARSE_FAILED" => Some(Self::PdfParseFailed),
            "GEMINI_FAILED" => Some(Self::GeminiFailed),
            "DB_ERROR" => Some(Self::DbError),
            "NOT_FOUND" => Some(Self::NotFound),
            "NOT_READY" => Some(Self::NotReady),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

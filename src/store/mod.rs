//! Relational persistence for documents and their chunks.

mod sqlite;
mod types;

pub use sqlite::SqliteDocumentStore;
pub use types::{
    Document, DocumentChunk, DocumentListItem, DocumentStatus, NewChunk, StoreError,
};

use crate::error::ErrorCode;
use async_trait::async_trait;

/// Narrow persistence interface used by the pipeline and the read endpoints.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a PENDING document and return its identifier.
    async fn create_pending(&self, filename: &str, text: &str) -> Result<i64, StoreError>;

    /// Atomically persist all chunks and flip the document to COMPLETED.
    async fn complete(
        &self,
        document_id: i64,
        title: &str,
        summary: &str,
        chunks: &[NewChunk],
    ) -> Result<(), StoreError>;

    /// Remove any chunks of the document and flip it to FAILED with `code`.
    async fn mark_failed(&self, document_id: i64, code: ErrorCode) -> Result<(), StoreError>;

    /// List documents newest first.
    async fn list_documents(&self) -> Result<Vec<DocumentListItem>, StoreError>;

    /// Fetch one document.
    async fn get_document(&self, document_id: i64) -> Result<Option<Document>, StoreError>;

    /// Fetch a document's chunks in index order.
    async fn list_chunks(&self, document_id: i64) -> Result<Vec<DocumentChunk>, StoreError>;

    /// Count a document's chunks.
    async fn count_chunks(&self, document_id: i64) -> Result<i64, StoreError>;
}

//! SQLite-backed [`DocumentStore`] built on `sqlx`.

use super::DocumentStore;
use super::types::{
    Document, DocumentChunk, DocumentListItem, DocumentStatus, NewChunk, StoreError,
};
use crate::error::ErrorCode;
use async_trait::async_trait;
use sqlx::FromRow;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use time::OffsetDateTime;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        original_filename TEXT NOT NULL,
        original_text TEXT NOT NULL,
        summary_title TEXT,
        summary_text TEXT,
        status TEXT NOT NULL DEFAULT 'PENDING',
        error_message TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS document_chunks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
        chunk_index INTEGER NOT NULL,
        chunk_text TEXT NOT NULL,
        embedding_json TEXT NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE (document_id, chunk_index)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_document_chunks_document_id ON document_chunks (document_id)",
];

/// Document store persisting to SQLite.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

#[derive(FromRow)]
struct DocumentRow {
    id: i64,
    original_filename: String,
    original_text: String,
    summary_title: Option<String>,
    summary_text: Option<String>,
    status: String,
    error_message: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<DocumentRow> for Document {
    type Error = StoreError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            original_filename: row.original_filename,
            original_text: row.original_text,
            summary_title: row.summary_title,
            summary_text: row.summary_text,
            status: row.status.parse()?,
            error_message: row.error_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ListRow {
    id: i64,
    summary_title: Option<String>,
    original_filename: String,
    status: String,
    created_at: OffsetDateTime,
}

#[derive(FromRow)]
struct ChunkRow {
    id: i64,
    document_id: i64,
    chunk_index: i64,
    chunk_text: String,
    embedding_json: String,
    created_at: OffsetDateTime,
}

impl SqliteDocumentStore {
    /// Connect to `database_url` and ensure the schema exists.
    ///
    /// In-memory databases are limited to one connection so every query sees the same data.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        tracing::debug!(max_connections, "Document store ready");
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn create_pending(&self, filename: &str, text: &str) -> Result<i64, StoreError> {
        let now = OffsetDateTime::now_utc();
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO documents (original_filename, original_text, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(filename)
        .bind(text)
        .bind(DocumentStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        tracing::debug!(document_id = id, filename, "Created pending document");
        Ok(id)
    }

    async fn complete(
        &self,
        document_id: i64,
        title: &str,
        summary: &str,
        chunks: &[NewChunk],
    ) -> Result<(), StoreError> {
        let now = OffsetDateTime::now_utc();
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE documents
            SET summary_title = ?, summary_text = ?, status = ?, error_message = NULL, updated_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(title)
        .bind(summary)
        .bind(DocumentStatus::Completed.as_str())
        .bind(now)
        .bind(document_id)
        .bind(DocumentStatus::Pending.as_str())
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotPending(document_id));
        }

        for chunk in chunks {
            let embedding_json = serde_json::to_string(&chunk.embedding)?;
            sqlx::query(
                r#"
                INSERT INTO document_chunks (document_id, chunk_index, chunk_text, embedding_json, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(document_id)
            .bind(chunk.chunk_index)
            .bind(&chunk.chunk_text)
            .bind(embedding_json)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn mark_failed(&self, document_id: i64, code: ErrorCode) -> Result<(), StoreError> {
        let now = OffsetDateTime::now_utc();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM document_chunks WHERE document_id = ?")
            .bind(document_id)
            .execute(&mut *tx)
            .await?;
        let updated = sqlx::query(
            r#"
            UPDATE documents
            SET status = ?, error_message = ?, updated_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(DocumentStatus::Failed.as_str())
        .bind(code.as_str())
        .bind(now)
        .bind(document_id)
        .bind(DocumentStatus::Pending.as_str())
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotPending(document_id));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_documents(&self) -> Result<Vec<DocumentListItem>, StoreError> {
        let rows = sqlx::query_as::<_, ListRow>(
            r#"
            SELECT id, summary_title, original_filename, status, created_at
            FROM documents
            ORDER BY julianday(created_at) DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<DocumentListItem, StoreError> {
                Ok(DocumentListItem {
                    id: row.id,
                    title: row.summary_title,
                    filename: row.original_filename,
                    status: row.status.parse()?,
                    created_at: row.created_at,
                })
            })
            .collect()
    }

    async fn get_document(&self, document_id: i64) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, original_filename, original_text, summary_title, summary_text,
                   status, error_message, created_at, updated_at
            FROM documents
            WHERE id = ?
            "#,
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Document::try_from).transpose()
    }

    async fn list_chunks(&self, document_id: i64) -> Result<Vec<DocumentChunk>, StoreError> {
        let rows = sqlx::query_as::<_, ChunkRow>(
            r#"
            SELECT id, document_id, chunk_index, chunk_text, embedding_json, created_at
            FROM document_chunks
            WHERE document_id = ?
            ORDER BY chunk_index
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<DocumentChunk, StoreError> {
                Ok(DocumentChunk {
                    id: row.id,
                    document_id: row.document_id,
                    chunk_index: row.chunk_index,
                    chunk_text: row.chunk_text,
                    embedding: serde_json::from_str(&row.embedding_json)?,
                    created_at: row.created_at,
                })
            })
            .collect()
    }

    async fn count_chunks(&self, document_id: i64) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM document_chunks WHERE document_id = ?",
        )
        .bind(document_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SqliteDocumentStore {
        SqliteDocumentStore::connect("sqlite::memory:")
            .await
            .expect("in-memory store")
    }

    fn chunk(index: i64, text: &str) -> NewChunk {
        NewChunk {
            chunk_index: index,
            chunk_text: text.into(),
            embedding: vec![index as f32, 0.5],
        }
    }

    #[tokio::test]
    async fn complete_persists_summary_and_chunks() {
        let store = memory_store().await;
        let id = store.create_pending("a.pdf", "full text").await.unwrap();

        let pending = store.get_document(id).await.unwrap().expect("document");
        assert_eq!(pending.status, DocumentStatus::Pending);
        assert!(pending.summary_title.is_none());

        store
            .complete(id, "Title", "Summary", &[chunk(0, "first"), chunk(1, "second")])
            .await
            .unwrap();

        let document = store.get_document(id).await.unwrap().expect("document");
        assert_eq!(document.status, DocumentStatus::Completed);
        assert_eq!(document.summary_title.as_deref(), Some("Title"));
        assert_eq!(document.summary_text.as_deref(), Some("Summary"));
        assert_eq!(document.original_text, "full text");
        assert!(document.error_message.is_none());

        let chunks = store.list_chunks(id).await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[1].chunk_text, "second");
        assert_eq!(chunks[1].embedding, vec![1.0, 0.5]);
        assert_eq!(store.count_chunks(id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn duplicate_chunk_index_rolls_back_completion() {
        let store = memory_store().await;
        let id = store.create_pending("a.pdf", "text").await.unwrap();

        let result = store
            .complete(id, "Title", "Summary", &[chunk(0, "a"), chunk(0, "b")])
            .await;
        assert!(matches!(result, Err(StoreError::Database(_))));

        let document = store.get_document(id).await.unwrap().expect("document");
        assert_eq!(document.status, DocumentStatus::Pending);
        assert_eq!(store.count_chunks(id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn mark_failed_records_code_and_is_terminal() {
        let store = memory_store().await;
        let id = store.create_pending("a.pdf", "text").await.unwrap();

        store.mark_failed(id, ErrorCode::GeminiFailed).await.unwrap();
        let document = store.get_document(id).await.unwrap().expect("document");
        assert_eq!(document.status, DocumentStatus::Failed);
        assert_eq!(document.error_message.as_deref(), Some("GEMINI_FAILED"));

        let again = store.complete(id, "t", "s", &[]).await;
        assert!(matches!(again, Err(StoreError::NotPending(found)) if found == id));
    }

    #[tokio::test]
    async fn list_documents_is_newest_first() {
        let store = memory_store().await;
        let first = store.create_pending("first.pdf", "1").await.unwrap();
        let second = store.create_pending("second.pdf", "2").await.unwrap();
        store.complete(second, "Second", "S", &[]).await.unwrap();

        let listed = store.list_documents().await.unwrap();
        let ids: Vec<i64> = listed.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![second, first]);
        assert_eq!(listed[0].title.as_deref(), Some("Second"));
        assert_eq!(listed[1].status, DocumentStatus::Pending);
    }

    #[tokio::test]
    async fn missing_document_reads_as_none() {
        let store = memory_store().await;
        assert!(store.get_document(42).await.unwrap().is_none());
        assert!(store.list_chunks(42).await.unwrap().is_empty());
    }
}

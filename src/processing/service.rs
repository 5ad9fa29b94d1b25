//! Processing service sequencing extraction, chunking, embedding, summarization, and storage.

use crate::{
    config::Config,
    embedding::{EmbeddingBackend, GeminiEmbeddingClient},
    extraction::{PdfTextExtractor, TextExtractionBackend},
    gemini::{GeminiClient, GeminiError},
    metrics::{IngestMetrics, MetricsSnapshot},
    processing::{
        chunking::split,
        types::{
            BatchError, BatchItemResult, BatchResponse, ProcessingError, ReadError,
            SummaryDetail, SummaryDownload, UploadedFile,
        },
    },
    store::{DocumentListItem, DocumentStatus, DocumentStore, NewChunk, SqliteDocumentStore},
    summarization::{GeminiSummarizationClient, SummarizationBackend},
};
use async_trait::async_trait;
use std::sync::Arc;

const SUCCESS_MESSAGE: &str = "SUCCESS";

/// Limits applied to every batch.
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    /// Maximum number of files per batch.
    pub max_upload_files: usize,
    /// Maximum size of one upload in bytes.
    pub max_file_size_bytes: usize,
    /// Chunk window size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive windows in characters.
    pub chunk_overlap: usize,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_upload_files: config.max_upload_files,
            max_file_size_bytes: config.max_file_size_bytes(),
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }
}

/// Coordinates the ingestion pipeline and the read path over stored documents.
///
/// Every collaborator sits behind a capability trait so the HTTP surface, the CLI, and tests
/// share one orchestrator. Construct once near process start and share through an `Arc`.
pub struct ProcessingService {
    extractor: Box<dyn TextExtractionBackend>,
    embedder: Box<dyn EmbeddingBackend>,
    summarizer: Box<dyn SummarizationBackend>,
    store: Arc<dyn DocumentStore>,
    metrics: Arc<IngestMetrics>,
    settings: PipelineSettings,
}

/// Abstraction over the processing service used by external surfaces (HTTP, CLI).
#[async_trait]
pub trait ProcessingApi: Send + Sync {
    /// Process every file of a batch independently, in submission order.
    async fn process_batch(&self, files: Vec<UploadedFile>) -> Result<BatchResponse, BatchError>;

    /// List stored documents, newest first.
    async fn list_summaries(&self) -> Result<Vec<DocumentListItem>, ReadError>;

    /// Fetch one document's full detail.
    async fn get_summary(&self, document_id: i64) -> Result<SummaryDetail, ReadError>;

    /// Render a document's summary as a plain-text attachment.
    async fn download_summary(&self, document_id: i64) -> Result<SummaryDownload, ReadError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl ProcessingService {
    /// Build the production service: Gemini clients, SQLite store, and PDF extractor.
    pub async fn new(config: &Config) -> Result<Self, ProcessingError> {
        tracing::info!("Initializing Gemini clients");
        let gemini = GeminiClient::from_config(config)?;
        let embedder = GeminiEmbeddingClient::new(gemini.clone(), config);
        let summarizer = GeminiSummarizationClient::new(gemini, config);
        if config.gemini_api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY is not set; every document will fail with GEMINI_FAILED");
        }

        tracing::info!("Connecting document store");
        let store = SqliteDocumentStore::connect(&config.database_url).await?;

        Ok(Self::with_backends(
            Box::new(PdfTextExtractor::from_config(config)),
            Box::new(embedder),
            Box::new(summarizer),
            Arc::new(store),
            PipelineSettings::from(config),
        ))
    }

    /// Assemble a service from explicit collaborators.
    pub fn with_backends(
        extractor: Box<dyn TextExtractionBackend>,
        embedder: Box<dyn EmbeddingBackend>,
        summarizer: Box<dyn SummarizationBackend>,
        store: Arc<dyn DocumentStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            extractor,
            embedder,
            summarizer,
            store,
            metrics: Arc::new(IngestMetrics::new()),
            settings,
        }
    }

    /// Process a batch of uploads; rejects empty or oversized batches up front.
    pub async fn process_batch(
        &self,
        files: Vec<UploadedFile>,
    ) -> Result<BatchResponse, BatchError> {
        let max = self.settings.max_upload_files;
        if files.is_empty() || files.len() > max {
            tracing::warn!(files = files.len(), max, "Rejected batch size");
            return Err(BatchError::InvalidBatchSize {
                max,
                actual: files.len(),
            });
        }

        tracing::info!(files = files.len(), "Processing batch");
        let mut results = Vec::with_capacity(files.len());
        for (index, file) in files.iter().enumerate() {
            let result = self.process_file(index, file).await;
            results.push(result);
        }

        let completed = results
            .iter()
            .filter(|result| result.status == DocumentStatus::Completed)
            .count();
        tracing::info!(
            batch_total = files.len(),
            completed,
            failed = files.len() - completed,
            "Batch finished"
        );

        Ok(BatchResponse {
            batch_total: files.len(),
            results,
        })
    }

    /// Run one file through the pipeline, converting any failure into a FAILED entry.
    async fn process_file(&self, index: usize, file: &UploadedFile) -> BatchItemResult {
        let filename = file.filename.clone().unwrap_or_default();
        let mut document_id = None;

        match self.run_pipeline(file, &mut document_id).await {
            Ok(chunk_count) => {
                self.metrics.record_completed(chunk_count as u64);
                tracing::info!(
                    index,
                    filename = %filename,
                    document_id,
                    chunks = chunk_count,
                    "Document completed"
                );
                BatchItemResult {
                    document_id,
                    filename,
                    status: DocumentStatus::Completed,
                    message: SUCCESS_MESSAGE.to_string(),
                }
            }
            Err(error) => {
                let code = error.code();
                tracing::warn!(
                    index,
                    filename = %filename,
                    document_id,
                    code = %code,
                    error = %error,
                    "Document failed"
                );
                if let Some(id) = document_id {
                    if let Err(store_error) = self.store.mark_failed(id, code).await {
                        tracing::error!(
                            document_id = id,
                            error = %store_error,
                            "Failed to record document failure"
                        );
                    }
                }
                self.metrics.record_failed();
                BatchItemResult {
                    document_id,
                    filename,
                    status: DocumentStatus::Failed,
                    message: code.to_string(),
                }
            }
        }
    }

    async fn run_pipeline(
        &self,
        file: &UploadedFile,
        document_id: &mut Option<i64>,
    ) -> Result<usize, ProcessingError> {
        let text = self
            .extractor
            .extract_text(
                &file.bytes,
                file.filename.as_deref(),
                self.settings.max_file_size_bytes,
            )
            .await?;

        let filename = file.filename.as_deref().unwrap_or_default();
        let id = self.store.create_pending(filename, &text).await?;
        *document_id = Some(id);

        let chunks = split(
            &text,
            self.settings.chunk_size as i64,
            self.settings.chunk_overlap as i64,
        )?;
        tracing::debug!(document_id = id, chunks = chunks.len(), "Split document");

        let vectors = self.embedder.embed_many(&chunks).await?;
        if vectors.len() != chunks.len() {
            return Err(GeminiError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            ))
            .into());
        }

        let summary = self.summarizer.summarize(&text).await?;

        let new_chunks: Vec<NewChunk> = chunks
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(index, (chunk_text, embedding))| NewChunk {
                chunk_index: index as i64,
                chunk_text,
                embedding,
            })
            .collect();
        self.store
            .complete(id, &summary.title, &summary.summary, &new_chunks)
            .await?;
        Ok(new_chunks.len())
    }

    /// List stored documents, newest first.
    pub async fn list_summaries(&self) -> Result<Vec<DocumentListItem>, ReadError> {
        Ok(self.store.list_documents().await?)
    }

    /// Fetch one document with its chunk count.
    pub async fn get_summary(&self, document_id: i64) -> Result<SummaryDetail, ReadError> {
        let document = self
            .store
            .get_document(document_id)
            .await?
            .ok_or(ReadError::NotFound)?;
        let chunk_count = self.store.count_chunks(document_id).await?;
        Ok(SummaryDetail {
            document,
            chunk_count,
        })
    }

    /// Render `summary_<id>.txt` for a document that has a summary.
    pub async fn download_summary(&self, document_id: i64) -> Result<SummaryDownload, ReadError> {
        let document = self
            .store
            .get_document(document_id)
            .await?
            .ok_or(ReadError::NotFound)?;
        let summary = document
            .summary_text
            .as_deref()
            .map(str::trim)
            .filter(|summary| !summary.is_empty())
            .ok_or(ReadError::NotReady)?;
        let title = document.summary_title.as_deref().unwrap_or_default();

        Ok(SummaryDownload {
            filename: format!("summary_{document_id}.txt"),
            body: format!("제목: {title}\n\n요약:\n{summary}"),
        })
    }

    /// Return the current ingestion metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl ProcessingApi for ProcessingService {
    async fn process_batch(&self, files: Vec<UploadedFile>) -> Result<BatchResponse, BatchError> {
        ProcessingService::process_batch(self, files).await
    }

    async fn list_summaries(&self) -> Result<Vec<DocumentListItem>, ReadError> {
        ProcessingService::list_summaries(self).await
    }

    async fn get_summary(&self, document_id: i64) -> Result<SummaryDetail, ReadError> {
        ProcessingService::get_summary(self, document_id).await
    }

    async fn download_summary(&self, document_id: i64) -> Result<SummaryDownload, ReadError> {
        ProcessingService::download_summary(self, document_id).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        ProcessingService::metrics_snapshot(self)
    }
}

//! HTTP surface for the PDF summary service.
//!
//! All routes live under `/api`:
//!
//! - `POST /api/summarize/batch` – multipart upload (repeated `files` field). Always `200` with one
//!   result per file unless the batch itself is empty or too large (`400 INVALID_FILE`).
//! - `GET /api/summaries` – stored documents, newest first.
//! - `GET /api/summaries/:id` – full detail of one document (`404 NOT_FOUND`).
//! - `GET /api/summaries/:id/download` – `summary_<id>.txt` attachment (`404 NOT_FOUND`,
//!   `409 NOT_READY`).
//! - `GET /api/metrics` – ingestion counters.
//!
//! Errors are returned as `{"detail": "<CODE>"}`.

use crate::error::ErrorCode;
use crate::metrics::MetricsSnapshot;
use crate::processing::{
    BatchError, BatchResponse, ProcessingApi, ReadError, SummaryDetail, UploadedFile,
};
use crate::store::DocumentStatus;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Build the HTTP router; `body_limit` caps the size of a whole multipart request in bytes.
pub fn create_router<S>(service: Arc<S>, body_limit: usize) -> Router
where
    S: ProcessingApi + 'static,
{
    let api = Router::new()
        .route("/summarize/batch", post(summarize_batch::<S>))
        .route("/summaries", get(list_summaries::<S>))
        .route("/summaries/:id", get(get_summary::<S>))
        .route("/summaries/:id/download", get(download_summary::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(service);
    Router::new().nest("/api", api)
}

/// Process an uploaded batch of PDFs.
async fn summarize_batch<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<Json<BatchResponse>, AppError>
where
    S: ProcessingApi,
{
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|error| {
        tracing::warn!(error = %error, "Malformed multipart request");
        AppError::from_code(ErrorCode::InvalidFile)
    })? {
        if !matches!(field.name(), Some("files" | "file")) {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(|error| {
            tracing::warn!(error = %error, "Failed to read multipart field");
            AppError::from_code(ErrorCode::InvalidFile)
        })?;
        files.push(UploadedFile {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    let response = service.process_batch(files).await?;
    Ok(Json(response))
}

/// Entry of `GET /api/summaries`.
#[derive(Serialize)]
struct SummaryListEntry {
    id: i64,
    title: Option<String>,
    filename: String,
    status: DocumentStatus,
    created_at: String,
}

async fn list_summaries<S>(
    State(service): State<Arc<S>>,
) -> Result<Json<Vec<SummaryListEntry>>, AppError>
where
    S: ProcessingApi,
{
    let items = service.list_summaries().await?;
    Ok(Json(
        items
            .into_iter()
            .map(|item| SummaryListEntry {
                id: item.id,
                title: item.title,
                filename: item.filename,
                status: item.status,
                created_at: format_timestamp(item.created_at),
            })
            .collect(),
    ))
}

/// Body of `GET /api/summaries/:id`.
#[derive(Serialize)]
struct SummaryDetailResponse {
    id: i64,
    filename: String,
    title: Option<String>,
    summary: Option<String>,
    status: DocumentStatus,
    error_message: Option<String>,
    chunk_count: i64,
    created_at: String,
    updated_at: String,
}

impl From<SummaryDetail> for SummaryDetailResponse {
    fn from(detail: SummaryDetail) -> Self {
        let document = detail.document;
        Self {
            id: document.id,
            filename: document.original_filename,
            title: document.summary_title,
            summary: document.summary_text,
            status: document.status,
            error_message: document.error_message,
            chunk_count: detail.chunk_count,
            created_at: format_timestamp(document.created_at),
            updated_at: format_timestamp(document.updated_at),
        }
    }
}

async fn get_summary<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<i64>,
) -> Result<Json<SummaryDetailResponse>, AppError>
where
    S: ProcessingApi,
{
    let detail = service.get_summary(id).await?;
    Ok(Json(detail.into()))
}

async fn download_summary<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<i64>,
) -> Result<Response, AppError>
where
    S: ProcessingApi,
{
    let download = service.download_summary(id).await?;
    let disposition = format!("attachment; filename=\"{}\"", download.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.body,
    )
        .into_response())
}

async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: ProcessingApi,
{
    Json(service.metrics_snapshot())
}

fn format_timestamp(timestamp: OffsetDateTime) -> String {
    timestamp
        .format(&Rfc3339)
        .unwrap_or_else(|_| timestamp.to_string())
}

struct AppError {
    status: StatusCode,
    code: ErrorCode,
}

impl AppError {
    fn from_code(code: ErrorCode) -> Self {
        let status = match code {
            ErrorCode::InvalidFile | ErrorCode::PdfParseFailed => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::NotReady => StatusCode::CONFLICT,
            ErrorCode::GeminiFailed => StatusCode::BAD_GATEWAY,
            ErrorCode::DbError => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, code }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.code }))).into_response()
    }
}

impl From<BatchError> for AppError {
    fn from(inner: BatchError) -> Self {
        tracing::warn!(error = %inner, "Batch rejected");
        Self::from_code(inner.code())
    }
}

impl From<ReadError> for AppError {
    fn from(inner: ReadError) -> Self {
        if let ReadError::Store(error) = &inner {
            tracing::error!(error = %error, "Document store read failed");
        }
        Self::from_code(inner.code())
    }
}

#[cfg(test)]
mod tests {
    use super::create_router;
    use crate::metrics::MetricsSnapshot;
    use crate::processing::{
        BatchError, BatchItemResult, BatchResponse, ProcessingApi, ReadError, SummaryDetail,
        SummaryDownload, UploadedFile,
    };
    use crate::store::{Document, DocumentListItem, DocumentStatus};
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
        response::Response,
    };
    use std::sync::Arc;
    use time::OffsetDateTime;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    const BOUNDARY: &str = "pdf-summary-boundary";

    #[derive(Default)]
    struct StubProcessingService {
        uploads: Mutex<Vec<UploadedFile>>,
    }

    fn document(id: i64, summary: Option<&str>) -> Document {
        Document {
            id,
            original_filename: "report.pdf".into(),
            original_text: "body".into(),
            summary_title: summary.map(|_| "Title".to_string()),
            summary_text: summary.map(str::to_string),
            status: if summary.is_some() {
                DocumentStatus::Completed
            } else {
                DocumentStatus::Pending
            },
            error_message: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[async_trait]
    impl ProcessingApi for StubProcessingService {
        async fn process_batch(
            &self,
            files: Vec<UploadedFile>,
        ) -> Result<BatchResponse, BatchError> {
            if files.is_empty() {
                return Err(BatchError::InvalidBatchSize { max: 10, actual: 0 });
            }
            let results = files
                .iter()
                .enumerate()
                .map(|(index, file)| BatchItemResult {
                    document_id: Some(index as i64 + 1),
                    filename: file.filename.clone().unwrap_or_default(),
                    status: DocumentStatus::Completed,
                    message: "SUCCESS".into(),
                })
                .collect();
            let total = files.len();
            self.uploads.lock().await.extend(files);
            Ok(BatchResponse {
                batch_total: total,
                results,
            })
        }

        async fn list_summaries(&self) -> Result<Vec<DocumentListItem>, ReadError> {
            Ok(vec![DocumentListItem {
                id: 1,
                title: Some("Title".into()),
                filename: "report.pdf".into(),
                status: DocumentStatus::Completed,
                created_at: OffsetDateTime::UNIX_EPOCH,
            }])
        }

        async fn get_summary(&self, document_id: i64) -> Result<SummaryDetail, ReadError> {
            match document_id {
                1 => Ok(SummaryDetail {
                    document: document(1, Some("Summary")),
                    chunk_count: 3,
                }),
                _ => Err(ReadError::NotFound),
            }
        }

        async fn download_summary(
            &self,
            document_id: i64,
        ) -> Result<SummaryDownload, ReadError> {
            match document_id {
                1 => Ok(SummaryDownload {
                    filename: "summary_1.txt".into(),
                    body: "제목: Title\n\n요약:\nSummary".into(),
                }),
                2 => Err(ReadError::NotReady),
                _ => Err(ReadError::NotFound),
            }
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                documents_completed: 4,
                documents_failed: 1,
                chunks_indexed: 12,
            }
        }
    }

    fn multipart_body(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, bytes) in files {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\n\
                     Content-Type: application/pdf\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn send(
        service: Arc<StubProcessingService>,
        request: Request<Body>,
    ) -> (StatusCode, Response) {
        let response = create_router(service, 1024 * 1024)
            .oneshot(request)
            .await
            .expect("router response");
        (response.status(), response)
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    #[tokio::test]
    async fn batch_route_forwards_files_in_order() {
        let service = Arc::new(StubProcessingService::default());
        let body = multipart_body(&[("a.pdf", b"%PDF-a"), ("b.pdf", b"%PDF-b")]);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/summarize/batch")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request");

        let (status, response) = send(service.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["batch_total"], 2);
        assert_eq!(json["results"][0]["filename"], "a.pdf");
        assert_eq!(json["results"][1]["status"], "COMPLETED");
        assert_eq!(json["results"][1]["document_id"], 2);

        let uploads = service.uploads.lock().await;
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].bytes, b"%PDF-a");
        assert_eq!(uploads[1].filename.as_deref(), Some("b.pdf"));
    }

    #[tokio::test]
    async fn empty_batch_is_bad_request() {
        let service = Arc::new(StubProcessingService::default());
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/summarize/batch")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(&[])))
            .expect("request");

        let (status, response) = send(service, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["detail"], "INVALID_FILE");
    }

    #[tokio::test]
    async fn list_and_detail_routes_render_documents() {
        let service = Arc::new(StubProcessingService::default());

        let (status, response) = send(service.clone(), get("/api/summaries")).await;
        assert_eq!(status, StatusCode::OK);
        let list = json_body(response).await;
        assert_eq!(list[0]["id"], 1);
        assert_eq!(list[0]["title"], "Title");
        assert_eq!(list[0]["created_at"], "1970-01-01T00:00:00Z");

        let (status, response) = send(service.clone(), get("/api/summaries/1")).await;
        assert_eq!(status, StatusCode::OK);
        let detail = json_body(response).await;
        assert_eq!(detail["summary"], "Summary");
        assert_eq!(detail["chunk_count"], 3);
        assert_eq!(detail["status"], "COMPLETED");

        let (status, response) = send(service, get("/api/summaries/7")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["detail"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn download_route_returns_attachment() {
        let service = Arc::new(StubProcessingService::default());
        let (status, response) = send(service.clone(), get("/api/summaries/1/download")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"summary_1.txt\""
        );
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert_eq!(
            String::from_utf8(bytes.to_vec()).expect("utf8"),
            "제목: Title\n\n요약:\nSummary"
        );

        let (status, response) = send(service.clone(), get("/api/summaries/2/download")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json_body(response).await["detail"], "NOT_READY");

        let (status, _) = send(service, get("/api/summaries/3/download")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_route_exposes_counters() {
        let service = Arc::new(StubProcessingService::default());
        let (status, response) = send(service, get("/api/metrics")).await;
        assert_eq!(status, StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["documents_completed"], 4);
        assert_eq!(json["chunks_indexed"], 12);
    }
}

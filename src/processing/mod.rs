//! Document ingestion pipeline: chunking and batch orchestration.

pub mod chunking;
mod service;
pub mod types;

pub use service::{PipelineSettings, ProcessingApi, ProcessingService};
pub use types::{
    BatchError, BatchItemResult, BatchResponse, ChunkingError, ProcessingError, ReadError,
    SummaryDetail, SummaryDownload, UploadedFile,
};

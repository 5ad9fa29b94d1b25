use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion outcomes since startup.
#[derive(Default)]
pub struct IngestMetrics {
    documents_completed: AtomicU64,
    documents_failed: AtomicU64,
    chunks_indexed: AtomicU64,
}

impl IngestMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed document and the number of chunks persisted for it.
    pub fn record_completed(&self, chunk_count: u64) {
        self.documents_completed.fetch_add(1, Ordering::Relaxed);
        self.chunks_indexed.fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Record a file whose pipeline ended in failure.
    pub fn record_failed(&self) {
        self.documents_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_completed: self.documents_completed.load(Ordering::Relaxed),
            documents_failed: self.documents_failed.load(Ordering::Relaxed),
            chunks_indexed: self.chunks_indexed.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of ingestion counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Files processed to a COMPLETED document.
    pub documents_completed: u64,
    /// Files whose processing failed at any stage.
    pub documents_failed: u64,
    /// Total chunks persisted across completed documents.
    pub chunks_indexed: u64,
}

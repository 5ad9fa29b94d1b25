#![deny(missing_docs)]

//! Core library for the PDF summary service.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Embedding backend abstraction and the Gemini adapter.
pub mod embedding;
/// Wire-level error codes.
pub mod error;
/// PDF text extraction with OCR fallback.
pub mod extraction;
/// Gemini REST transport.
pub mod gemini;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// Document ingestion pipeline.
pub mod processing;
/// Document and chunk persistence.
pub mod store;
/// Title/summary generation backend and the Gemini adapter.
pub mod summarization;

use crate::config::Config;
use crate::gemini::{GeminiClient, GeminiError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Produce an embedding vector for a single chunk of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, GeminiError>;

    /// Embed every chunk in order, one request per chunk.
    ///
    /// The first failure aborts the remaining chunks and fails the whole call.
    async fn embed_many(&self, chunks: &[String]) -> Result<Vec<Vec<f32>>, GeminiError> {
        let mut vectors = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            let vector = self.embed(chunk).await.inspect_err(|error| {
                tracing::warn!(chunk_index = index, error = %error, "Chunk embedding failed");
            })?;
            vectors.push(vector);
        }
        Ok(vectors)
    }
}

/// Embedding client calling Gemini's `embedContent` operation.
pub struct GeminiEmbeddingClient {
    gemini: GeminiClient,
    model: String,
}

impl GeminiEmbeddingClient {
    /// Construct a client for the configured embedding model.
    pub fn new(gemini: GeminiClient, config: &Config) -> Self {
        Self {
            gemini,
            model: config.gemini_model_embedding.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: Option<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[async_trait]
impl EmbeddingBackend for GeminiEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, GeminiError> {
        if text.trim().is_empty() {
            return Err(GeminiError::EmptyInput);
        }

        let payload = json!({ "content": { "parts": [{ "text": text }] } });
        let response = self
            .gemini
            .post_model(&self.model, "embedContent", &payload)
            .await?;

        let body: EmbedContentResponse = serde_json::from_value(response).map_err(|error| {
            GeminiError::InvalidResponse(format!("unexpected embedContent payload: {error}"))
        })?;
        let values = body.embedding.map(|embedding| embedding.values).unwrap_or_default();
        if values.is_empty() {
            return Err(GeminiError::InvalidResponse(
                "embedding.values missing or empty".into(),
            ));
        }

        tracing::trace!(model = %self.model, dimension = values.len(), "Embedded chunk");
        Ok(values)
    }
}

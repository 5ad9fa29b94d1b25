use std::{env, sync::Once};

use pdf_summary::{
    config::{self, Config},
    embedding::{EmbeddingBackend, GeminiEmbeddingClient},
    gemini::GeminiClient,
    summarization::{GeminiSummarizationClient, SummarizationBackend},
};

static INIT: Once = Once::new();

fn set_default_env(key: &str, value: &str) {
    let needs_value = env::var(key).map(|v| v.trim().is_empty()).unwrap_or(true);
    if needs_value {
        // SAFETY: Tests run serially via Once and we intentionally mutate process env.
        unsafe {
            env::set_var(key, value);
        }
    }
}

fn live_config() -> &'static Config {
    INIT.call_once(|| {
        set_default_env("DATABASE_URL", "sqlite::memory:");
        set_default_env("OCR_ENABLED", "false");
    });
    config::init_config().expect("configuration must be valid")
}

fn gemini(config: &Config) -> GeminiClient {
    assert!(
        config.gemini_api_key.is_some(),
        "GEMINI_API_KEY must be set for live tests"
    );
    GeminiClient::from_config(config).expect("gemini client")
}

#[tokio::test]
#[ignore = "Requires a live Gemini API key"]
async fn live_gemini_embedding_roundtrip() {
    let config = live_config();
    let client = GeminiEmbeddingClient::new(gemini(config), config);
    let vectors = client
        .embed_many(&["pdf-summary live embedding".to_string()])
        .await
        .expect("failed to request embeddings from Gemini");
    assert_eq!(vectors.len(), 1, "expected embedding per input chunk");
    assert!(!vectors[0].is_empty(), "embedding must not be empty");
}

#[tokio::test]
#[ignore = "Requires a live Gemini API key"]
async fn live_gemini_summary_returns_title_and_summary() {
    let config = live_config();
    let client = GeminiSummarizationClient::new(gemini(config), config);
    let summary = client
        .summarize(
            "The quarterly report shows revenue growth of 12 percent, driven by new \
             subscription customers and lower churn.",
        )
        .await
        .expect("failed to summarize with Gemini");
    assert!(!summary.title.trim().is_empty());
    assert!(!summary.summary.trim().is_empty());
}

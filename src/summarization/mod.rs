//! Title and summary generation via Gemini's `generateContent` operation.
//!
//! The prompt asks the model for a bare JSON object with `title` and `summary` keys. Models
//! frequently wrap that object in a fenced code block anyway, so the fence is stripped before
//! parsing. Document text longer than the configured budget is truncated silently.

use crate::config::Config;
use crate::gemini::{GeminiClient, GeminiError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

const SUMMARIZE_PROMPT: &str = "다음 문서를 읽고 한국어로 제목과 요약을 작성하세요.\n\
반드시 아래 형식의 JSON 객체 하나만 출력하고, 다른 설명이나 문장은 추가하지 마세요.\n\
{\"title\": \"문서를 대표하는 한 줄 제목\", \"summary\": \"핵심 내용을 정리한 요약문\"}\n\n\
문서:\n";

/// Structured result of summarizing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Generated document title.
    pub title: String,
    /// Generated summary text.
    pub summary: String,
}

/// Interface implemented by document summarization providers.
#[async_trait]
pub trait SummarizationBackend: Send + Sync {
    /// Generate a title and summary for the full document text.
    async fn summarize(&self, text: &str) -> Result<DocumentSummary, GeminiError>;
}

/// Summarization client backed by Gemini `generateContent`.
pub struct GeminiSummarizationClient {
    gemini: GeminiClient,
    model: String,
    max_chars: usize,
}

impl GeminiSummarizationClient {
    /// Construct a client for the configured summary model and input budget.
    pub fn new(gemini: GeminiClient, config: &Config) -> Self {
        Self {
            gemini,
            model: config.gemini_model_summary.clone(),
            max_chars: config.summary_max_chars,
        }
    }
}

#[async_trait]
impl SummarizationBackend for GeminiSummarizationClient {
    async fn summarize(&self, text: &str) -> Result<DocumentSummary, GeminiError> {
        if text.trim().is_empty() {
            return Err(GeminiError::EmptyInput);
        }

        let input = truncate_chars(text, self.max_chars);
        if input.len() < text.len() {
            tracing::debug!(max_chars = self.max_chars, "Truncated document text for summarization");
        }

        let payload = json!({
            "contents": [{ "parts": [{ "text": build_prompt(input) }] }],
            "generationConfig": { "temperature": 0.2 },
        });
        let response = self
            .gemini
            .post_model(&self.model, "generateContent", &payload)
            .await?;

        let raw = response
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                GeminiError::InvalidResponse("candidates[0].content.parts[0].text missing".into())
            })?;

        parse_summary(raw)
    }
}

fn build_prompt(text: &str) -> String {
    let mut prompt = String::with_capacity(SUMMARIZE_PROMPT.len() + text.len());
    prompt.push_str(SUMMARIZE_PROMPT);
    prompt.push_str(text);
    prompt
}

/// Return at most `max_chars` leading characters of `text`.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Remove a surrounding Markdown code fence (with optional info string) if present.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches("json"),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[derive(Debug, Deserialize)]
struct RawSummary {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

fn parse_summary(raw: &str) -> Result<DocumentSummary, GeminiError> {
    let value: Value = serde_json::from_str(strip_code_fence(raw)).map_err(|error| {
        GeminiError::InvalidResponse(format!("summary is not valid JSON: {error}"))
    })?;
    if !value.is_object() {
        return Err(GeminiError::InvalidResponse(
            "summary JSON is not an object".into(),
        ));
    }
    let parsed: RawSummary = serde_json::from_value(value).map_err(|error| {
        GeminiError::InvalidResponse(format!("summary fields have unexpected types: {error}"))
    })?;

    let title = parsed.title.unwrap_or_default().trim().to_string();
    let summary = parsed.summary.unwrap_or_default().trim().to_string();
    if title.is_empty() || summary.is_empty() {
        return Err(GeminiError::InvalidResponse(
            "title or summary is empty".into(),
        ));
    }
    Ok(DocumentSummary { title, summary })
}

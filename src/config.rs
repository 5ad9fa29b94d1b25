use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_SUMMARY_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
const DEFAULT_DATABASE_URL: &str = "sqlite://pdf_summary.db?mode=rwc";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the PDF summary service.
///
/// Loaded once at process start and handed to each component constructor by reference.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Credential for the Gemini REST API. Upstream calls fail when absent.
    pub gemini_api_key: Option<String>,
    /// Base URL of the Gemini REST API (`.../v1beta`).
    pub gemini_base_url: String,
    /// Model used for `generateContent` summarization requests.
    pub gemini_model_summary: String,
    /// Model used for `embedContent` requests.
    pub gemini_model_embedding: String,
    /// Per-call network timeout for Gemini requests, in seconds.
    pub gemini_timeout_secs: u64,
    /// Connection string for the document store.
    pub database_url: String,
    /// Maximum number of files accepted in one batch.
    pub max_upload_files: usize,
    /// Maximum accepted size of a single upload, in megabytes.
    pub max_file_size_mb: usize,
    /// Chunk window size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunk windows in characters.
    pub chunk_overlap: usize,
    /// Whether the OCR fallback may run for scanned PDFs.
    pub ocr_enabled: bool,
    /// Tesseract language set, e.g. `kor+eng`.
    pub ocr_languages: String,
    /// Rasterization resolution used before OCR.
    pub ocr_dpi: u32,
    /// Primary-path text shorter than this (in characters) triggers OCR.
    pub ocr_min_text_length: usize,
    /// Maximum characters of document text sent to the summarizer.
    pub summary_max_chars: usize,
    /// HTTP server port.
    pub server_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            gemini_model_summary: DEFAULT_SUMMARY_MODEL.to_string(),
            gemini_model_embedding: DEFAULT_EMBEDDING_MODEL.to_string(),
            gemini_timeout_secs: 60,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_upload_files: 10,
            max_file_size_mb: 20,
            chunk_size: 1200,
            chunk_overlap: 200,
            ocr_enabled: true,
            ocr_languages: "kor+eng".to_string(),
            ocr_dpi: 200,
            ocr_min_text_length: 300,
            summary_max_chars: 40_000,
            server_port: 8000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            gemini_api_key: load_env_optional("GEMINI_API_KEY"),
            gemini_base_url: load_env_optional("GEMINI_BASE_URL")
                .unwrap_or(defaults.gemini_base_url),
            gemini_model_summary: load_env_optional("GEMINI_MODEL_SUMMARY")
                .unwrap_or(defaults.gemini_model_summary),
            gemini_model_embedding: load_env_optional("GEMINI_MODEL_EMBEDDING")
                .unwrap_or(defaults.gemini_model_embedding),
            gemini_timeout_secs: load_env_parsed("GEMINI_TIMEOUT_SECS")?
                .unwrap_or(defaults.gemini_timeout_secs),
            database_url: load_env_optional("DATABASE_URL").unwrap_or(defaults.database_url),
            max_upload_files: load_env_parsed("MAX_UPLOAD_FILES")?
                .unwrap_or(defaults.max_upload_files),
            max_file_size_mb: load_env_parsed("MAX_FILE_SIZE_MB")?
                .unwrap_or(defaults.max_file_size_mb),
            chunk_size: load_env_parsed("CHUNK_SIZE")?.unwrap_or(defaults.chunk_size),
            chunk_overlap: load_env_parsed("CHUNK_OVERLAP")?.unwrap_or(defaults.chunk_overlap),
            ocr_enabled: load_env_optional("OCR_ENABLED")
                .map(|value| {
                    parse_flag(&value).ok_or_else(|| ConfigError::InvalidValue("OCR_ENABLED".into()))
                })
                .transpose()?
                .unwrap_or(defaults.ocr_enabled),
            ocr_languages: load_env_optional("OCR_LANGUAGES").unwrap_or(defaults.ocr_languages),
            ocr_dpi: load_env_parsed("OCR_DPI")?.unwrap_or(defaults.ocr_dpi),
            ocr_min_text_length: load_env_parsed("OCR_MIN_TEXT_LENGTH")?
                .unwrap_or(defaults.ocr_min_text_length),
            summary_max_chars: load_env_parsed("SUMMARY_MAX_CHARS")?
                .unwrap_or(defaults.summary_max_chars),
            server_port: load_env_parsed("SERVER_PORT")?.unwrap_or(defaults.server_port),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject combinations that would make the pipeline fail for every document.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidValue("CHUNK_SIZE".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::InvalidValue("CHUNK_OVERLAP".into()));
        }
        if self.max_upload_files == 0 {
            return Err(ConfigError::InvalidValue("MAX_UPLOAD_FILES".into()));
        }
        if self.ocr_dpi == 0 {
            return Err(ConfigError::InvalidValue("OCR_DPI".into()));
        }
        Ok(())
    }

    /// Maximum accepted upload size in bytes.
    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_parsed<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        gemini_base_url = %config.gemini_base_url,
        summary_model = %config.gemini_model_summary,
        embedding_model = %config.gemini_model_embedding,
        has_api_key = config.gemini_api_key.is_some(),
        database_url = %config.database_url,
        chunk_size = config.chunk_size,
        chunk_overlap = config.chunk_overlap,
        ocr_enabled = config.ocr_enabled,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}

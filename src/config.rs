use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::embeddings::EmbeddingProvider;
use crate::llm::LlmProvider;

/// Environment variable holding the Google Gemini API key
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";
/// Environment variable holding the Pinecone API key
pub const PINECONE_API_KEY_ENV: &str = "PINECONE_API_KEY";

/// How the HTTP endpoints behave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceMode {
    /// Fixed responses, request bodies are ignored
    Stub,
    /// Endpoints drive ingestion and question answering
    Live,
}

impl Default for ServiceMode {
    fn default() -> Self {
        Self::Stub
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors: bool,
    #[serde(default)]
    pub mode: ServiceMode,
    /// Timeout applied to every outbound API request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors: false,
            mode: ServiceMode::default(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub backtrace: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            backtrace: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    /// `gemini`, `openai` or `ollama`
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Texts per embedding request
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,
}

fn default_embedding_provider() -> String {
    "gemini".to_string()
}

fn default_embedding_model() -> String {
    "models/embedding-001".to_string()
}

pub(crate) fn default_dimension() -> usize {
    768
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

pub(crate) fn default_embedding_batch_size() -> usize {
    100
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dimension: default_dimension(),
            endpoint: default_gemini_endpoint(),
            api_key: None,
            batch_size: default_embedding_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// `gemini` or `ollama`
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<usize>,
}

fn default_llm_provider() -> String {
    "gemini".to_string()
}

fn default_llm_model() -> String {
    "gemini-2.0-flash".to_string()
}

pub(crate) fn default_temperature() -> f32 {
    0.9
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            endpoint: default_gemini_endpoint(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PineconeConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_control_endpoint")]
    pub control_endpoint: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_cloud")]
    pub cloud: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_metric")]
    pub metric: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default = "default_upsert_batch_size")]
    pub upsert_batch_size: usize,
    /// How long to wait for a freshly created index to become ready
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,
}

fn default_control_endpoint() -> String {
    "https://api.pinecone.io".to_string()
}

fn default_api_version() -> String {
    "2024-07".to_string()
}

fn default_cloud() -> String {
    "aws".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_metric() -> String {
    "cosine".to_string()
}

pub(crate) fn default_upsert_batch_size() -> usize {
    32
}

fn default_ready_timeout_secs() -> u64 {
    60
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            control_endpoint: default_control_endpoint(),
            api_version: default_api_version(),
            cloud: default_cloud(),
            region: default_region(),
            metric: default_metric(),
            namespace: String::new(),
            upsert_batch_size: default_upsert_batch_size(),
            ready_timeout_secs: default_ready_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

pub(crate) fn default_chunk_size() -> usize {
    500
}

pub(crate) fn default_chunk_overlap() -> usize {
    20
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

pub(crate) fn default_top_k() -> usize {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub pinecone: PineconeConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default config file path, then apply
    /// API keys from the environment.
    ///
    /// Falls back to built-in defaults when neither `config.toml` nor
    /// `config.example.toml` exists.
    pub fn load() -> crate::Result<Self> {
        let mut config = if Path::new("config.toml").exists() {
            Self::from_file("config.toml")?
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Fill API keys from `GOOGLE_API_KEY` and `PINECONE_API_KEY`.
    ///
    /// A `.env` file in the working directory is honoured. The Google key only
    /// applies to providers that talk to Gemini.
    pub fn apply_env_overrides(&mut self) {
        dotenv::dotenv().ok();
        self.apply_api_keys(
            std::env::var(GOOGLE_API_KEY_ENV).ok(),
            std::env::var(PINECONE_API_KEY_ENV).ok(),
        );
    }

    /// Set API keys, ignoring empty values. The Google key goes to each
    /// provider that resolves to Gemini, whatever its spelling in the config.
    pub fn apply_api_keys(&mut self, google: Option<String>, pinecone: Option<String>) {
        if let Some(key) = google.filter(|k| !k.is_empty()) {
            if EmbeddingProvider::parse(&self.embeddings.provider).ok()
                == Some(EmbeddingProvider::Gemini)
            {
                self.embeddings.api_key = Some(key.clone());
            }
            if LlmProvider::parse(&self.llm.provider).ok() == Some(LlmProvider::Gemini) {
                self.llm.api_key = Some(key);
            }
        }

        if let Some(key) = pinecone.filter(|k| !k.is_empty()) {
            self.pinecone.api_key = Some(key);
        }
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.chunking.chunk_size <= self.chunking.chunk_overlap {
            return Err(crate::TeachRagError::Config(format!(
                "chunk_size ({}) must be greater than chunk_overlap ({})",
                self.chunking.chunk_size, self.chunking.chunk_overlap
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(crate::TeachRagError::Config(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        if self.embeddings.dimension == 0 {
            return Err(crate::TeachRagError::Config(
                "embeddings.dimension must be at least 1".to_string(),
            ));
        }
        if self.embeddings.batch_size == 0 || self.pinecone.upsert_batch_size == 0 {
            return Err(crate::TeachRagError::Config(
                "batch sizes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Get outbound request timeout
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get embedding dimension
    pub fn embedding_dimension(&self) -> usize {
        self.embeddings.dimension
    }

    /// Get embedding model name
    pub fn embedding_model(&self) -> &str {
        &self.embeddings.model
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        &self.llm.model
    }

    /// Check whether endpoints run the live pipeline
    pub fn is_live(&self) -> bool {
        self.server.mode == ServiceMode::Live
    }

    /// Copy of the configuration with API keys masked, for display
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.embeddings.api_key = copy.embeddings.api_key.as_deref().map(mask_secret);
        copy.llm.api_key = copy.llm.api_key.as_deref().map(mask_secret);
        copy.pinecone.api_key = copy.pinecone.api_key.as_deref().map(mask_secret);
        copy
    }
}

fn mask_secret(secret: &str) -> String {
    let tail: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("****{tail}")
    }
}

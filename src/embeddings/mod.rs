//! Embeddings generation module
//!
//! Provides the embedder handle used for both chunk ingestion and query
//! retrieval. Providers:
//! - Google Gemini (`models/embedding-001`, 768 dimensions, the default)
//! - `OpenAI` embeddings API
//! - Ollama (local models)
//!
//! # Examples
//!
//! ```rust,no_run
//! use teachrag::embeddings::EmbeddingService;
//! use teachrag::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = EmbeddingService::new(&config)?;
//!
//!     let embedding = service.embed_query("What is osmosis?").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod generator;
pub mod text_preprocessing;

use std::time::Duration;

pub use client::EmbeddingClient;
pub use client::EmbeddingProvider;
pub use client::EmbeddingTask;
pub use generator::EmbeddingService;
pub use text_preprocessing::prepare_for_embedding;

use crate::errors::Result;

/// Configuration for embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub batch_size: usize,
    pub timeout: Duration,
}

impl EmbeddingConfig {
    pub fn from_app_config(config: &crate::config::AppConfig) -> Result<Self> {
        Ok(Self {
            provider: EmbeddingProvider::parse(&config.embeddings.provider)?,
            model: config.embedding_model().to_string(),
            dimension: config.embedding_dimension(),
            endpoint: config.embeddings.endpoint.clone(),
            api_key: config.embeddings.api_key.clone(),
            batch_size: config.embeddings.batch_size.max(1),
            timeout: config.request_timeout(),
        })
    }
}

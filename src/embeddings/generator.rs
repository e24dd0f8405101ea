//! Embedding generation service with batching and dimension checks

use std::sync::Arc;

use tracing::debug;

use super::client::EmbeddingClient;
use super::client::EmbeddingProvider;
use super::client::EmbeddingTask;
use super::prepare_for_embedding;
use super::EmbeddingConfig;
use crate::errors::Result;
use crate::errors::TeachRagError;

/// The embedder handle shared by ingestion and retrieval
pub struct EmbeddingService {
    client: Arc<EmbeddingClient>,
    config: EmbeddingConfig,
}

impl EmbeddingService {
    /// Create a new embedding service from application configuration
    ///
    /// # Errors
    /// - Unknown provider name
    /// - HTTP client build errors
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        let embedding_config = EmbeddingConfig::from_app_config(config)?;
        Self::from_config(embedding_config)
    }

    /// Create from custom config
    pub fn from_config(config: EmbeddingConfig) -> Result<Self> {
        let client = EmbeddingClient::new(
            config.provider,
            config.model.clone(),
            config.endpoint.clone(),
            config.api_key.clone(),
            config.timeout,
        )?;

        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    /// Embed a search query
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let processed = prepare_for_embedding(text).ok_or_else(|| {
            TeachRagError::InvalidInput("Query contains no text to embed".to_string())
        })?;

        let embedding = self.client.generate(&processed, EmbeddingTask::Query).await?;
        self.check_dimension(&embedding)?;
        Ok(embedding)
    }

    /// Embed document texts, preserving order.
    ///
    /// # Errors
    /// - A text has no content after cleanup (cosine indexes reject zero vectors)
    /// - API request failures or dimension mismatches
    pub async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let processed_texts = texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                prepare_for_embedding(text).ok_or_else(|| {
                    TeachRagError::InvalidInput(format!("Text {i} contains nothing to embed"))
                })
            })
            .collect::<Result<Vec<String>>>()?;

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in processed_texts.chunks(self.config.batch_size) {
            debug!("Embedding batch of {} texts", batch.len());
            let batch_embeddings = self
                .client
                .generate_batch(
                    batch.iter().map(String::as_str).collect(),
                    EmbeddingTask::Document,
                )
                .await?;
            for embedding in &batch_embeddings {
                self.check_dimension(embedding)?;
            }
            embeddings.extend(batch_embeddings);
        }

        Ok(embeddings)
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() == self.config.dimension {
            Ok(())
        } else {
            Err(TeachRagError::Embedding(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.config.dimension,
                embedding.len()
            )))
        }
    }

    /// Get the embedding dimension
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Get the model name
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Get the provider
    #[must_use]
    pub const fn provider(&self) -> EmbeddingProvider {
        self.config.provider
    }
}

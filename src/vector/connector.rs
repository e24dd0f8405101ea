//! Per-user index provisioning, chunk upload and retriever construction

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use tracing::debug;
use tracing::info;
use uuid::Uuid;

use super::pinecone::IndexDescription;
use super::IndexSpec;
use super::PineconeClient;
use super::PineconeIndex;
use super::VectorRecord;
use crate::config::PineconeConfig;
use crate::documents::Chunk;
use crate::embeddings::EmbeddingService;
use crate::errors::Result;
use crate::errors::TeachRagError;
use crate::rag::Retriever;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Connects one user to their index
pub struct PineconeConnector {
    client: Arc<PineconeClient>,
    spec: IndexSpec,
    namespace: String,
    upsert_batch_size: usize,
    ready_timeout: Duration,
}

impl PineconeConnector {
    pub fn new(
        client: Arc<PineconeClient>,
        user_id: &str,
        dimension: usize,
        config: &PineconeConfig,
    ) -> Self {
        Self {
            client,
            spec: IndexSpec::for_user(user_id, dimension, config),
            namespace: config.namespace.clone(),
            upsert_batch_size: config.upsert_batch_size.max(1),
            ready_timeout: Duration::from_secs(config.ready_timeout_secs),
        }
    }

    #[must_use]
    pub fn index_name(&self) -> &str {
        &self.spec.name
    }

    /// Create the user's index if it is not listed yet, and wait for it to be
    /// ready. Safe to call repeatedly.
    ///
    /// # Errors
    /// - Control-plane request failures
    /// - Index not ready within the configured timeout
    pub async fn ensure_index(&self) -> Result<PineconeIndex> {
        let existing = self.client.list_indexes().await?;
        let found = existing.into_iter().find(|idx| idx.name == self.spec.name);

        let description = match found {
            Some(desc) if desc.status.ready && !desc.host.is_empty() => desc,
            Some(_) => self.wait_until_ready().await?,
            None => {
                info!("Index {} not found, creating it", self.spec.name);
                self.client.create_index(&self.spec).await?;
                self.wait_until_ready().await?
            }
        };

        Ok(self.bind(&description))
    }

    /// Bind to an index that must already exist
    ///
    /// # Errors
    /// - Index does not exist
    pub async fn open_index(&self) -> Result<PineconeIndex> {
        let description = self.client.describe_index(&self.spec.name).await?;
        if description.host.is_empty() {
            return Err(TeachRagError::VectorStore(format!(
                "Index '{}' has no host yet",
                self.spec.name
            )));
        }
        Ok(self.bind(&description))
    }

    /// Embed `chunks` and write them to the user's index.
    ///
    /// Every call writes fresh ids, so uploading the same chunks twice stores
    /// them twice. Blank chunks are skipped since a cosine index rejects
    /// all-zero vectors. Returns the number of vectors written.
    pub async fn upload(&self, chunks: &[Chunk], embedder: &EmbeddingService) -> Result<usize> {
        let index = self.ensure_index().await?;
        let chunks: Vec<&Chunk> = chunks.iter().filter(|c| !c.is_blank()).collect();
        if chunks.is_empty() {
            debug!("Nothing to upload to {}", index.name());
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_documents(&texts).await?;

        let records: Vec<VectorRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, values)| VectorRecord {
                id: Uuid::new_v4().to_string(),
                values,
                metadata: chunk.metadata(),
            })
            .collect();

        let mut written = 0;
        for batch in records.chunks(self.upsert_batch_size) {
            written += index.upsert(batch).await?;
        }

        info!("Uploaded {} vectors to {}", written, index.name());
        Ok(written)
    }

    /// Similarity retriever over the user's existing index
    pub async fn get_retriever(
        &self,
        embedder: Arc<EmbeddingService>,
        top_k: usize,
    ) -> Result<Retriever> {
        let index = self.open_index().await?;
        Ok(Retriever::new(index, embedder, top_k))
    }

    fn bind(&self, description: &IndexDescription) -> PineconeIndex {
        PineconeIndex::new(
            self.client.clone(),
            description.name.clone(),
            &description.host,
            self.namespace.clone(),
        )
    }

    async fn wait_until_ready(&self) -> Result<IndexDescription> {
        let deadline = Instant::now() + self.ready_timeout;
        loop {
            let description = self.client.describe_index(&self.spec.name).await?;
            if description.status.ready && !description.host.is_empty() {
                return Ok(description);
            }
            if Instant::now() >= deadline {
                return Err(TeachRagError::VectorStore(format!(
                    "Index '{}' not ready after {:?} (state: {})",
                    self.spec.name, self.ready_timeout, description.status.state
                )));
            }
            debug!(
                "Waiting for index {} (state: {})",
                self.spec.name, description.status.state
            );
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }
}

//! Complete RAG pipeline: Chunk -> Embed -> Index, then Retrieve -> Prompt -> Generate

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use tracing::info;

use crate::config::AppConfig;
use crate::config::PineconeConfig;
use crate::documents::Chunker;
use crate::documents::Document;
use crate::embeddings::EmbeddingService;
use crate::errors::Result;
use crate::errors::TeachRagError;
use crate::llm::ChatPromptTemplate;
use crate::llm::LlmService;
use crate::rag::prompts::teacher_prompt;
use crate::rag::prompts::CONTEXT_VARIABLE;
use crate::rag::prompts::INPUT_VARIABLE;
use crate::rag::ContextAssembler;
use crate::rag::RetrievedChunk;
use crate::vector::validate_user_id;
use crate::vector::PineconeClient;
use crate::vector::PineconeConnector;

/// Complete RAG service
pub struct RagService {
    pinecone: Arc<PineconeClient>,
    pinecone_config: PineconeConfig,
    embedder: Arc<EmbeddingService>,
    llm: LlmService,
    chunker: Chunker,
    prompt: ChatPromptTemplate,
    context_assembler: ContextAssembler,
    top_k: usize,
}

/// Outcome of indexing a user's documents
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub index_name: String,
    pub documents: usize,
    pub chunks: usize,
    pub vectors: usize,
}

/// Answer together with the question and the context it was grounded on
#[derive(Debug, Clone, Serialize)]
pub struct RagResponse {
    pub input: String,
    pub context: Vec<RetrievedChunk>,
    pub answer: String,
}

impl RagService {
    /// Create a new RAG service
    ///
    /// # Errors
    /// - Missing Pinecone or provider API keys
    /// - Unknown embedding or LLM provider
    /// - Invalid chunking configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let pinecone = Arc::new(PineconeClient::new(&config.pinecone, config.request_timeout())?);
        let embedder = Arc::new(EmbeddingService::new(config)?);
        let llm = LlmService::new(config)?;
        info!(
            "RAG service using embeddings {:?}/{} and LLM {:?}/{}",
            embedder.provider(),
            embedder.model(),
            llm.provider(),
            llm.model()
        );
        Self::from_services(pinecone, embedder, llm, config)
    }

    /// Create from existing services
    pub fn from_services(
        pinecone: Arc<PineconeClient>,
        embedder: Arc<EmbeddingService>,
        llm: LlmService,
        config: &AppConfig,
    ) -> Result<Self> {
        Ok(Self {
            pinecone,
            pinecone_config: config.pinecone.clone(),
            embedder,
            llm,
            chunker: Chunker::from_config(&config.chunking)?,
            prompt: teacher_prompt(),
            context_assembler: ContextAssembler::default(),
            top_k: config.retrieval.top_k,
        })
    }

    /// Connector for `user_id`'s index
    ///
    /// # Errors
    /// - `user_id` cannot form a valid index name
    pub fn connector(&self, user_id: &str) -> Result<PineconeConnector> {
        validate_user_id(user_id)?;
        Ok(PineconeConnector::new(
            self.pinecone.clone(),
            user_id,
            self.embedder.dimension(),
            &self.pinecone_config,
        ))
    }

    /// Chunk, embed and upload `documents` into the user's index, creating
    /// the index on first use
    ///
    /// # Errors
    /// - Invalid `user_id`
    /// - Index provisioning, embedding or upsert failures
    pub async fn ingest(&self, user_id: &str, documents: &[Document]) -> Result<IngestReport> {
        let connector = self.connector(user_id)?;
        info!(
            "Ingesting {} documents for user {} into {}",
            documents.len(),
            user_id,
            connector.index_name()
        );

        let chunks = self.chunker.split_documents(documents);
        let vectors = connector.upload(&chunks, &self.embedder).await?;

        Ok(IngestReport {
            index_name: connector.index_name().to_string(),
            documents: documents.len(),
            chunks: chunks.len(),
            vectors,
        })
    }

    /// Answer `question` from the user's indexed documents.
    /// Each call is independent; no conversation memory is kept.
    ///
    /// # Errors
    /// - Invalid `user_id` or empty question
    /// - Index missing, retrieval or LLM failures
    pub async fn answer(&self, user_id: &str, question: &str) -> Result<RagResponse> {
        if question.trim().is_empty() {
            return Err(TeachRagError::InvalidInput(
                "question must not be empty".to_string(),
            ));
        }
        let connector = self.connector(user_id)?;
        info!("Processing RAG query for user {}: {}", user_id, question);

        // Step 1: Retrieve relevant chunks
        let retriever = connector
            .get_retriever(self.embedder.clone(), self.top_k)
            .await?;
        let context = retriever.retrieve(question).await?;
        debug!("Retrieved {} chunks", context.len());

        // Step 2: Fill the prompt
        let mut values = HashMap::new();
        values.insert(
            CONTEXT_VARIABLE.to_string(),
            self.context_assembler.assemble(&context),
        );
        values.insert(INPUT_VARIABLE.to_string(), question.to_string());
        let messages = self.prompt.format_messages(&values)?;

        // Step 3: Generate
        let answer = self.llm.chat(&messages).await?;
        info!("RAG query completed for user {}", user_id);

        Ok(RagResponse {
            input: question.to_string(),
            context,
            answer,
        })
    }

    #[must_use]
    pub const fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    #[must_use]
    pub fn embedder(&self) -> &EmbeddingService {
        &self.embedder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> RagService {
        let mut config = AppConfig::default();
        config.pinecone.api_key = Some("pc-test".to_string());
        config.embeddings.api_key = Some("g-test".to_string());
        config.llm.api_key = Some("g-test".to_string());
        RagService::new(&config).unwrap()
    }

    #[test]
    fn test_new_requires_pinecone_key() {
        let result = RagService::new(&AppConfig::default());
        assert!(matches!(result, Err(TeachRagError::Config(_))));
    }

    #[test]
    fn test_connector_uses_index_name() {
        let connector = service().connector("42").unwrap();
        assert_eq!(connector.index_name(), "teacher-user-42");
    }

    #[test]
    fn test_connector_rejects_bad_user() {
        assert!(matches!(
            service().connector("Not Valid"),
            Err(TeachRagError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_question_rejected_before_network() {
        let result = service().answer("42", "   ").await;
        assert!(matches!(result, Err(TeachRagError::InvalidInput(_))));
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn test_pipeline_futures_are_send() {
        let s = service();
        let documents = vec![Document::new("Cells divide.", "cells.pdf", 0)];
        let ingest = s.ingest("42", &documents);
        assert_send(&ingest);
        let answer = s.answer("42", "What do cells do?");
        assert_send(&answer);
    }

    #[test]
    fn test_defaults_wired_from_config() {
        let s = service();
        assert_eq!(s.chunker().chunk_size(), 500);
        assert_eq!(s.chunker().overlap(), 20);
        assert_eq!(s.embedder().dimension(), 768);
        assert_eq!(s.top_k, 3);
    }
}

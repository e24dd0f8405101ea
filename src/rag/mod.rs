//! RAG (Retrieval-Augmented Generation) module
//!
//! This module provides end-to-end RAG over a user's uploaded documents:
//! - Chunking and uploading documents into the user's vector index
//! - Similarity retrieval of the top-k chunks for a question
//! - Context assembly and the tutoring prompt
//! - LLM-based answer generation
//!
//! # Examples
//!
//! ```rust,no_run
//! use teachrag::config::AppConfig;
//! use teachrag::documents::DirectoryLoader;
//! use teachrag::rag::RagService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = RagService::new(&config)?;
//!
//!     let documents = DirectoryLoader::new("./lessons").load().await?;
//!     service.ingest("42", &documents).await?;
//!
//!     let response = service.answer("42", "What is photosynthesis?").await?;
//!     println!("Answer: {}", response.answer);
//!     println!("Sources: {} chunks", response.context.len());
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod pipeline;
pub mod prompts;
pub mod retriever;

pub use context::ContextAssembler;
pub use pipeline::IngestReport;
pub use pipeline::RagResponse;
pub use pipeline::RagService;
pub use retriever::Retriever;
use serde::Deserialize;
use serde::Serialize;

/// A chunk returned by similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub text: String,
    pub source: String,
    pub page: Option<usize>,
    /// Similarity under the index metric (cosine by default)
    pub score: f32,
}

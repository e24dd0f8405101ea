//! Documents module
//!
//! Loading PDFs into per-page [`Document`]s and splitting them into
//! overlapping [`Chunk`]s ready for embedding.
//!
//! # Examples
//!
//! ```rust,no_run
//! use teachrag::documents::{Chunker, DirectoryLoader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let documents = DirectoryLoader::new("./lessons").load().await?;
//!     let chunks = Chunker::default().split_documents(&documents);
//!     println!("{} pages -> {} chunks", documents.len(), chunks.len());
//!     Ok(())
//! }
//! ```

pub mod chunker;
pub mod loader;

use std::collections::BTreeMap;

pub use chunker::Chunker;
pub use loader::DirectoryLoader;
pub use loader::OnlinePdfLoader;
use serde::Deserialize;
use serde::Serialize;

/// A loaded page of text with its source metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    /// File path or URL the text came from
    pub source: String,
    /// 0-based page index within the source
    pub page: usize,
}

impl Document {
    pub fn new(text: impl Into<String>, source: impl Into<String>, page: usize) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            page,
        }
    }
}

/// A bounded slice of a [`Document`], the unit of embedding and retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source: String,
    pub page: usize,
    /// Character offset of the chunk within its document
    pub start_index: usize,
}

impl Chunk {
    /// Metadata stored next to the vector in the index
    #[must_use]
    pub fn metadata(&self) -> BTreeMap<String, serde_json::Value> {
        let mut meta = BTreeMap::new();
        meta.insert("text".to_string(), self.text.clone().into());
        meta.insert("source".to_string(), self.source.clone().into());
        meta.insert("page".to_string(), self.page.into());
        meta.insert("start_index".to_string(), self.start_index.into());
        meta
    }

    /// Nothing but whitespace or control characters, so nothing to embed
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.chars().all(|c| c.is_whitespace() || c.is_control())
    }

    /// Number of characters in the chunk
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

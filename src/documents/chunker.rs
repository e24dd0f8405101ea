//! Overlapping fixed-size text splitting

use tracing::debug;

use super::Chunk;
use super::Document;
use crate::config::ChunkingConfig;
use crate::errors::Result;
use crate::errors::TeachRagError;

/// Preferred break points, strongest first
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Splits documents into overlapping windows of at most `chunk_size` chars.
///
/// Consecutive chunks of one document always share exactly `overlap`
/// characters: each chunk starts `overlap` characters before the previous one
/// ended. A window ends on the last paragraph, line or word break inside it
/// when that still leaves more than `overlap` characters; otherwise it is cut
/// at `chunk_size`.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: crate::config::default_chunk_size(),
            overlap: crate::config::default_chunk_overlap(),
        }
    }
}

impl Chunker {
    /// Create a chunker
    ///
    /// # Errors
    /// - `chunk_size` not greater than `overlap`
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size <= overlap {
            return Err(TeachRagError::Config(format!(
                "chunk_size ({chunk_size}) must be greater than overlap ({overlap})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[must_use]
    pub const fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split every document, keeping document order and each document's metadata.
    /// Blank chunks (e.g. from image-only pages) are dropped.
    #[must_use]
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.text)
                    .into_iter()
                    .map(|(start_index, text)| Chunk {
                        text,
                        source: doc.source.clone(),
                        page: doc.page,
                        start_index,
                    })
            })
            .filter(|chunk| !chunk.is_blank())
            .collect();

        debug!(
            "Split {} documents into {} chunks (size {}, overlap {})",
            documents.len(),
            chunks.len(),
            self.chunk_size,
            self.overlap
        );
        chunks
    }

    /// Split raw text into `(start_char_index, chunk_text)` pairs
    #[must_use]
    pub fn split_text(&self, text: &str) -> Vec<(usize, String)> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let mut chunks = Vec::new();
        if len == 0 {
            return chunks;
        }

        let mut start = 0;
        loop {
            if len - start <= self.chunk_size {
                chunks.push((start, chars[start..].iter().collect()));
                break;
            }

            let hard_end = start + self.chunk_size;
            let end = self.find_break(&chars, start, hard_end).unwrap_or(hard_end);
            chunks.push((start, chars[start..end].iter().collect()));

            // end > start + overlap, so this always advances
            start = end - self.overlap;
        }

        chunks
    }

    /// Last separator end inside `(start + overlap, hard_end]`
    fn find_break(&self, chars: &[char], start: usize, hard_end: usize) -> Option<usize> {
        let min_end = start + self.overlap + 1;

        for separator in SEPARATORS {
            let sep: Vec<char> = separator.chars().collect();
            if hard_end < sep.len() {
                continue;
            }

            let found = (min_end.saturating_sub(sep.len())..=hard_end - sep.len())
                .rev()
                .find(|&pos| pos >= start && chars[pos..pos + sep.len()] == sep[..]);

            if let Some(pos) = found {
                let end = pos + sep.len();
                if end >= min_end {
                    return Some(end);
                }
            }
        }

        None
    }
}

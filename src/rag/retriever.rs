//! Similarity retrieval over one user's index

use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use crate::embeddings::EmbeddingService;
use crate::errors::Result;
use crate::rag::RetrievedChunk;
use crate::vector::PineconeIndex;
use crate::vector::QueryMatch;

/// Returns the `top_k` chunks most similar to a query ("similarity" search)
pub struct Retriever {
    index: PineconeIndex,
    embedder: Arc<EmbeddingService>,
    top_k: usize,
}

impl Retriever {
    /// Create a new retriever
    pub fn new(index: PineconeIndex, embedder: Arc<EmbeddingService>, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k: top_k.max(1),
        }
    }

    #[must_use]
    pub const fn top_k(&self) -> usize {
        self.top_k
    }

    /// Embed the query and fetch the nearest chunks, best first
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedChunk>> {
        debug!("Retrieving top {} chunks from {}", self.top_k, self.index.name());

        let query_embedding = self.embedder.embed_query(query).await?;
        let matches = self.index.query(&query_embedding, self.top_k).await?;

        let mut results: Vec<RetrievedChunk> = matches
            .into_iter()
            .filter_map(|m| {
                let id = m.id.clone();
                let chunk = into_retrieved(m);
                if chunk.is_none() {
                    warn!("Match {} has no text metadata, skipping", id);
                }
                chunk
            })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(results)
    }
}

fn into_retrieved(m: QueryMatch) -> Option<RetrievedChunk> {
    let text = m.metadata.get("text")?.as_str()?.to_string();
    let source = m
        .metadata
        .get("source")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let page = m
        .metadata
        .get("page")
        .and_then(serde_json::Value::as_u64)
        .and_then(|p| usize::try_from(p).ok());

    Some(RetrievedChunk {
        id: m.id,
        text,
        source,
        page,
        score: m.score,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;

    fn query_match(metadata: serde_json::Value) -> QueryMatch {
        let metadata: BTreeMap<String, serde_json::Value> =
            serde_json::from_value(metadata).unwrap();
        QueryMatch {
            id: "vec-1".to_string(),
            score: 0.87,
            metadata,
        }
    }

    #[test]
    fn test_into_retrieved_full_metadata() {
        let chunk = into_retrieved(query_match(json!({
            "text": "Mitochondria produce ATP.",
            "source": "/lessons/biology.pdf",
            "page": 3,
            "start_index": 480
        })))
        .unwrap();

        assert_eq!(chunk.text, "Mitochondria produce ATP.");
        assert_eq!(chunk.source, "/lessons/biology.pdf");
        assert_eq!(chunk.page, Some(3));
        assert!((chunk.score - 0.87).abs() < f32::EPSILON);
    }

    #[test]
    fn test_into_retrieved_without_text() {
        assert!(into_retrieved(query_match(json!({"source": "a.pdf"}))).is_none());
    }

    #[test]
    fn test_into_retrieved_minimal() {
        let chunk = into_retrieved(query_match(json!({"text": "only text"}))).unwrap();
        assert!(chunk.source.is_empty());
        assert_eq!(chunk.page, None);
    }
}

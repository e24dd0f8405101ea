//! Per-user vector index management on Pinecone
//!
//! Every user gets one serverless index whose name is derived from the user
//! identifier by [`index_name`]. Indexes are created lazily and never deleted
//! here.

pub mod connector;
pub mod pinecone;

pub use connector::PineconeConnector;
pub use pinecone::PineconeClient;
pub use pinecone::PineconeIndex;
pub use pinecone::QueryMatch;
pub use pinecone::VectorRecord;

use crate::config::PineconeConfig;
use crate::errors::Result;
use crate::errors::TeachRagError;

/// Prefix shared by all per-user index names
pub const INDEX_NAME_PREFIX: &str = "teacher-user-";

/// Name of the index that holds `user_id`'s documents
#[must_use]
pub fn index_name(user_id: &str) -> String {
    format!("{INDEX_NAME_PREFIX}{user_id}")
}

/// Longest index name Pinecone accepts
pub const MAX_INDEX_NAME_LEN: usize = 45;

/// Check that `user_id` yields a legal Pinecone index name: lowercase ASCII
/// letters, digits and hyphens, at most [`MAX_INDEX_NAME_LEN`] in total.
pub fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.is_empty() {
        return Err(TeachRagError::InvalidInput("user_id must not be empty".to_string()));
    }
    if !user_id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(TeachRagError::InvalidInput(format!(
            "user_id '{user_id}' may only contain lowercase letters, digits and '-'"
        )));
    }
    if index_name(user_id).len() > MAX_INDEX_NAME_LEN {
        return Err(TeachRagError::InvalidInput(format!(
            "user_id '{user_id}' is too long for an index name"
        )));
    }
    Ok(())
}

/// Everything needed to create an index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: String,
    pub cloud: String,
    pub region: String,
}

impl IndexSpec {
    #[must_use]
    pub fn for_user(user_id: &str, dimension: usize, config: &PineconeConfig) -> Self {
        Self {
            name: index_name(user_id),
            dimension,
            metric: config.metric.clone(),
            cloud: config.cloud.clone(),
            region: config.region.clone(),
        }
    }
}

//! Pinecone REST client (control plane and data plane)

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use super::IndexSpec;
use crate::config::PineconeConfig;
use crate::errors::Result;
use crate::errors::TeachRagError;

/// Index description as returned by the control plane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDescription {
    pub name: String,
    #[serde(default)]
    pub dimension: Option<usize>,
    #[serde(default)]
    pub metric: Option<String>,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub status: IndexStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexDescription>,
}

#[derive(Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: &'a str,
    spec: ServerlessSpec<'a>,
}

#[derive(Serialize)]
struct ServerlessSpec<'a> {
    serverless: CloudRegion<'a>,
}

#[derive(Serialize)]
struct CloudRegion<'a> {
    cloud: &'a str,
    region: &'a str,
}

/// One vector with its metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
    namespace: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    namespace: &'a str,
    include_metadata: bool,
    include_values: bool,
}

/// A similarity search hit
#[derive(Debug, Clone, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

/// Pinecone control-plane client
pub struct PineconeClient {
    client: Client,
    api_key: String,
    control_endpoint: String,
    api_version: String,
}

impl PineconeClient {
    /// Create a client
    ///
    /// # Errors
    /// - API key missing from configuration and environment
    /// - HTTP client build errors
    pub fn new(config: &PineconeConfig, timeout: Duration) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| TeachRagError::Config("Pinecone API key not provided".to_string()))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TeachRagError::Http(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            control_endpoint: config.control_endpoint.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", &self.api_version)
    }

    /// List all indexes in the project
    pub async fn list_indexes(&self) -> Result<Vec<IndexDescription>> {
        let url = format!("{}/indexes", self.control_endpoint);
        let response = self.request(reqwest::Method::GET, &url).send().await?;
        let list: IndexList = parse_response(response, "list indexes").await?;
        Ok(list.indexes)
    }

    /// Create a serverless index; an index that already exists is not an error
    pub async fn create_index(&self, spec: &IndexSpec) -> Result<()> {
        let url = format!("{}/indexes", self.control_endpoint);
        let request = CreateIndexRequest {
            name: &spec.name,
            dimension: spec.dimension,
            metric: &spec.metric,
            spec: ServerlessSpec {
                serverless: CloudRegion {
                    cloud: &spec.cloud,
                    region: &spec.region,
                },
            },
        };

        let response = self
            .request(reqwest::Method::POST, &url)
            .json(&request)
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            debug!("Index {} already exists", spec.name);
            return Ok(());
        }
        ensure_success(response, "create index").await?;
        info!(
            "Created index {} (dimension {}, metric {}, {}/{})",
            spec.name, spec.dimension, spec.metric, spec.cloud, spec.region
        );
        Ok(())
    }

    /// Describe one index
    pub async fn describe_index(&self, name: &str) -> Result<IndexDescription> {
        let url = format!("{}/indexes/{}", self.control_endpoint, name);
        let response = self.request(reqwest::Method::GET, &url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(TeachRagError::VectorStore(format!(
                "Index '{name}' does not exist"
            )));
        }
        parse_response(response, "describe index").await
    }
}

/// Data-plane handle bound to one index host
#[derive(Clone)]
pub struct PineconeIndex {
    client: Arc<PineconeClient>,
    name: String,
    base_url: String,
    namespace: String,
}

impl PineconeIndex {
    pub fn new(
        client: Arc<PineconeClient>,
        name: impl Into<String>,
        host: &str,
        namespace: impl Into<String>,
    ) -> Self {
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", host.trim_end_matches('/'))
        };

        Self {
            client,
            name: name.into(),
            base_url,
            namespace: namespace.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Write vectors, returning how many the service acknowledged
    pub async fn upsert(&self, vectors: &[VectorRecord]) -> Result<usize> {
        let url = format!("{}/vectors/upsert", self.base_url);
        let request = UpsertRequest {
            vectors,
            namespace: &self.namespace,
        };

        let response = self
            .client
            .request(reqwest::Method::POST, &url)
            .json(&request)
            .send()
            .await?;

        let result: UpsertResponse = parse_response(response, "upsert").await?;
        Ok(result.upserted_count)
    }

    /// Nearest neighbours of `vector` by the index metric
    pub async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>> {
        let url = format!("{}/query", self.base_url);
        let request = QueryRequest {
            vector,
            top_k,
            namespace: &self.namespace,
            include_metadata: true,
            include_values: false,
        };

        let response = self
            .client
            .request(reqwest::Method::POST, &url)
            .json(&request)
            .send()
            .await?;

        let result: QueryResponse = parse_response(response, "query").await?;
        Ok(result.matches)
    }
}

async fn ensure_success(response: reqwest::Response, operation: &str) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(TeachRagError::VectorStore(format!(
        "Pinecone {operation} failed ({status}): {error_text}"
    )))
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    operation: &str,
) -> Result<T> {
    let response = ensure_success(response, operation).await?;
    response.json().await.map_err(|e| {
        TeachRagError::VectorStore(format!("Failed to parse Pinecone {operation} response: {e}"))
    })
}

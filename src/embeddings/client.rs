//! Embedding API clients for various providers

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::errors::Result;
use crate::errors::TeachRagError;

/// Supported embedding providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// Google Gemini `embedContent` API
    Gemini,
    /// `OpenAI` embeddings API
    OpenAI,
    /// Ollama local embeddings
    Ollama,
}

impl EmbeddingProvider {
    /// Parse a provider name from configuration
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            other => Err(TeachRagError::Config(format!(
                "Unknown embedding provider '{other}'"
            ))),
        }
    }
}

/// What the embedded text will be used for; Gemini tunes vectors per task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingTask {
    Document,
    Query,
}

impl EmbeddingTask {
    const fn gemini_task_type(self) -> &'static str {
        match self {
            Self::Document => "RETRIEVAL_DOCUMENT",
            Self::Query => "RETRIEVAL_QUERY",
        }
    }
}

/// Client for generating embeddings from various providers
pub struct EmbeddingClient {
    provider: EmbeddingProvider,
    model: String,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

// ---- Gemini wire types ----

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiEmbedRequest<'a> {
    model: &'a str,
    content: GeminiContent<'a>,
    task_type: &'static str,
}

#[derive(Serialize)]
struct GeminiBatchRequest<'a> {
    requests: Vec<GeminiEmbedRequest<'a>>,
}

#[derive(Deserialize)]
struct GeminiEmbedding {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct GeminiEmbedResponse {
    embedding: GeminiEmbedding,
}

#[derive(Deserialize)]
struct GeminiBatchResponse {
    #[serde(default)]
    embeddings: Vec<GeminiEmbedding>,
}

impl EmbeddingClient {
    /// Create a new embedding client
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(
        provider: EmbeddingProvider,
        model: String,
        endpoint: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TeachRagError::Http(e.to_string()))?;

        Ok(Self {
            provider,
            model,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    #[must_use]
    pub const fn provider(&self) -> EmbeddingProvider {
        self.provider
    }

    /// Generate embedding for a single text
    ///
    /// # Errors
    /// - API request failures (network errors, timeouts, authentication failures)
    /// - Invalid API responses (malformed JSON, missing embedding)
    pub async fn generate(&self, text: &str, task: EmbeddingTask) -> Result<Vec<f32>> {
        match self.provider {
            EmbeddingProvider::Gemini => self.generate_gemini(text, task).await,
            EmbeddingProvider::OpenAI => {
                let mut batch = self.generate_batch_openai(vec![text]).await?;
                batch
                    .pop()
                    .ok_or_else(|| TeachRagError::Embedding("No embedding in response".to_string()))
            }
            EmbeddingProvider::Ollama => self.generate_ollama(text).await,
        }
    }

    /// Generate embeddings for multiple texts in one round trip where the
    /// provider allows it
    ///
    /// # Errors
    /// - API request failures (network errors, timeouts, authentication failures)
    /// - Response count differs from request count
    pub async fn generate_batch(
        &self,
        texts: Vec<&str>,
        task: EmbeddingTask,
    ) -> Result<Vec<Vec<f32>>> {
        let expected = texts.len();
        let embeddings = match self.provider {
            EmbeddingProvider::Gemini => self.generate_batch_gemini(texts, task).await?,
            EmbeddingProvider::OpenAI => self.generate_batch_openai(texts).await?,
            EmbeddingProvider::Ollama => {
                // Ollama has no batch endpoint
                let mut embeddings = Vec::with_capacity(texts.len());
                for text in texts {
                    embeddings.push(self.generate_ollama(text).await?);
                }
                embeddings
            }
        };

        if embeddings.len() != expected {
            return Err(TeachRagError::Embedding(format!(
                "Expected {expected} embeddings, got {}",
                embeddings.len()
            )));
        }
        Ok(embeddings)
    }

    fn gemini_model(&self) -> String {
        if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }

    fn gemini_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| TeachRagError::Config("Gemini API key not provided".to_string()))
    }

    /// Generate embedding using Gemini `embedContent`
    async fn generate_gemini(&self, text: &str, task: EmbeddingTask) -> Result<Vec<f32>> {
        let api_key = self.gemini_key()?;
        let model = self.gemini_model();
        let url = format!("{}/{}:embedContent", self.endpoint, model);
        debug!("Calling Gemini embeddings API: {}", url);

        let request = GeminiEmbedRequest {
            model: &model,
            content: GeminiContent {
                parts: vec![GeminiPart { text }],
            },
            task_type: task.gemini_task_type(),
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let result: GeminiEmbedResponse = parse_response(response, "Gemini").await?;
        Ok(result.embedding.values)
    }

    /// Generate embeddings using Gemini `batchEmbedContents`
    async fn generate_batch_gemini(
        &self,
        texts: Vec<&str>,
        task: EmbeddingTask,
    ) -> Result<Vec<Vec<f32>>> {
        let api_key = self.gemini_key()?;
        let model = self.gemini_model();
        let url = format!("{}/{}:batchEmbedContents", self.endpoint, model);
        debug!("Calling Gemini batch embeddings API: {} items", texts.len());

        let request = GeminiBatchRequest {
            requests: texts
                .into_iter()
                .map(|text| GeminiEmbedRequest {
                    model: &model,
                    content: GeminiContent {
                        parts: vec![GeminiPart { text }],
                    },
                    task_type: task.gemini_task_type(),
                })
                .collect(),
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let result: GeminiBatchResponse = parse_response(response, "Gemini").await?;
        Ok(result.embeddings.into_iter().map(|e| e.values).collect())
    }

    /// Generate embeddings in batch using `OpenAI` API
    async fn generate_batch_openai(&self, texts: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| TeachRagError::Config("OpenAI API key not provided".to_string()))?;

        #[derive(Serialize)]
        struct OpenAIBatchRequest<'a> {
            input: Vec<&'a str>,
            model: &'a str,
        }

        #[derive(Deserialize)]
        struct OpenAIResponse {
            data: Vec<EmbeddingData>,
        }

        #[derive(Deserialize)]
        struct EmbeddingData {
            embedding: Vec<f32>,
        }

        let url = format!("{}/embeddings", self.endpoint);
        debug!("Calling OpenAI batch embeddings API: {} items", texts.len());

        let request = OpenAIBatchRequest {
            input: texts,
            model: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await?;

        let result: OpenAIResponse = parse_response(response, "OpenAI").await?;
        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }

    /// Generate embedding using Ollama API
    async fn generate_ollama(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct OllamaRequest<'a> {
            model: &'a str,
            prompt: &'a str,
        }

        #[derive(Deserialize)]
        struct OllamaResponse {
            embedding: Vec<f32>,
        }

        let url = format!("{}/api/embeddings", self.endpoint);
        debug!("Calling Ollama embeddings API: {}", url);

        let request = OllamaRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self.client.post(&url).json(&request).send().await?;

        let result: OllamaResponse = parse_response(response, "Ollama").await?;
        Ok(result.embedding)
    }
}

/// Turn a provider response into `T`, surfacing status and body on failure
async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    provider: &str,
) -> Result<T> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(TeachRagError::Embedding(format!(
            "{provider} API error ({status}): {error_text}"
        )));
    }

    response
        .json()
        .await
        .map_err(|e| TeachRagError::Embedding(format!("Failed to parse response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(provider: EmbeddingProvider, model: &str) -> EmbeddingClient {
        EmbeddingClient::new(
            provider,
            model.to_string(),
            "http://localhost:1/v1beta/".to_string(),
            None,
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_provider() {
        assert_eq!(EmbeddingProvider::parse("gemini").unwrap(), EmbeddingProvider::Gemini);
        assert_eq!(EmbeddingProvider::parse("Google").unwrap(), EmbeddingProvider::Gemini);
        assert_eq!(EmbeddingProvider::parse("OPENAI").unwrap(), EmbeddingProvider::OpenAI);
        assert_eq!(EmbeddingProvider::parse("ollama").unwrap(), EmbeddingProvider::Ollama);
        assert!(EmbeddingProvider::parse("cohere").is_err());
    }

    #[test]
    fn test_gemini_model_prefix() {
        assert_eq!(
            client(EmbeddingProvider::Gemini, "embedding-001").gemini_model(),
            "models/embedding-001"
        );
        assert_eq!(
            client(EmbeddingProvider::Gemini, "models/text-embedding-004").gemini_model(),
            "models/text-embedding-004"
        );
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let c = client(EmbeddingProvider::Gemini, "embedding-001");
        assert_eq!(c.endpoint, "http://localhost:1/v1beta");
    }

    #[test]
    fn test_gemini_request_shape() {
        let request = GeminiEmbedRequest {
            model: "models/embedding-001",
            content: GeminiContent {
                parts: vec![GeminiPart { text: "cells" }],
            },
            task_type: EmbeddingTask::Query.gemini_task_type(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["taskType"], "RETRIEVAL_QUERY");
        assert_eq!(json["content"]["parts"][0]["text"], "cells");
    }

    #[tokio::test]
    async fn test_missing_gemini_key() {
        let c = client(EmbeddingProvider::Gemini, "embedding-001");
        let result = c.generate("hello", EmbeddingTask::Query).await;
        assert!(matches!(result, Err(TeachRagError::Config(_))));
    }

    #[tokio::test]
    #[ignore = "Requires GOOGLE_API_KEY"]
    async fn test_gemini_embedding_live() {
        let c = EmbeddingClient::new(
            EmbeddingProvider::Gemini,
            "models/embedding-001".to_string(),
            "https://generativelanguage.googleapis.com/v1beta".to_string(),
            std::env::var("GOOGLE_API_KEY").ok(),
            Duration::from_secs(30),
        )
        .unwrap();

        let embedding = c.generate("Hello, world!", EmbeddingTask::Query).await.unwrap();
        assert_eq!(embedding.len(), 768);
    }
}

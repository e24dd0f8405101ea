//! Chat completion clients

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use super::ChatMessage;
use super::ChatRole;
use crate::config::AppConfig;
use crate::errors::Result;
use crate::errors::TeachRagError;

/// Supported chat providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// Google Gemini `generateContent`
    Gemini,
    /// Ollama `/api/chat`
    Ollama,
}

impl LlmProvider {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            other => Err(TeachRagError::Config(format!("Unknown LLM provider '{other}'"))),
        }
    }
}

// ---- Gemini wire types ----

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

/// LLM service for chat completion
#[derive(Clone)]
pub struct LlmService {
    provider: LlmProvider,
    model: String,
    endpoint: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: Option<usize>,
    client: Client,
}

impl LlmService {
    /// Create a new LLM service
    ///
    /// # Errors
    /// - Unknown provider name
    /// - HTTP client build errors
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TeachRagError::Http(e.to_string()))?;

        Ok(Self {
            provider: LlmProvider::parse(&config.llm.provider)?,
            model: config.llm.model.clone(),
            endpoint: config.llm.endpoint.trim_end_matches('/').to_string(),
            api_key: config.llm.api_key.clone(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            client,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub const fn provider(&self) -> LlmProvider {
        self.provider
    }

    /// Run one chat completion and return the reply text
    ///
    /// # Errors
    /// - API request failures (network errors, timeouts, authentication failures)
    /// - Empty or blocked responses
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        info!(
            "Calling {:?} model {} with {} messages",
            self.provider,
            self.model,
            messages.len()
        );
        match self.provider {
            LlmProvider::Gemini => self.chat_gemini(messages).await,
            LlmProvider::Ollama => self.chat_ollama(messages).await,
        }
    }

    fn gemini_model_path(&self) -> String {
        if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }

    async fn chat_gemini(&self, messages: &[ChatMessage]) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TeachRagError::Config("Gemini API key not provided".to_string()))?;

        let request = build_gemini_request(messages, self.temperature, self.max_tokens);
        let url = format!("{}/{}:generateContent", self.endpoint, self.gemini_model_path());
        debug!("Calling Gemini generateContent: {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let result: GenerateContentResponse = parse_response(response, "Gemini").await?;
        extract_gemini_text(result)
    }

    async fn chat_ollama(&self, messages: &[ChatMessage]) -> Result<String> {
        #[derive(Serialize)]
        struct OllamaOptions {
            temperature: f32,
            #[serde(skip_serializing_if = "Option::is_none")]
            num_predict: Option<usize>,
        }

        #[derive(Serialize)]
        struct OllamaChatRequest<'a> {
            model: &'a str,
            messages: &'a [ChatMessage],
            stream: bool,
            options: OllamaOptions,
        }

        #[derive(Deserialize)]
        struct OllamaChatResponse {
            message: OllamaMessage,
        }

        #[derive(Deserialize)]
        struct OllamaMessage {
            content: String,
        }

        let url = format!("{}/api/chat", self.endpoint);
        debug!("Calling Ollama chat API: {}", url);

        let request = OllamaChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let result: OllamaChatResponse = parse_response(response, "Ollama").await?;
        Ok(result.message.content)
    }
}

/// System messages become the system instruction; the rest are turns
fn build_gemini_request(
    messages: &[ChatMessage],
    temperature: f32,
    max_tokens: Option<usize>,
) -> GenerateContentRequest {
    let system_parts: Vec<GeminiPart> = messages
        .iter()
        .filter(|m| m.role == ChatRole::System)
        .map(|m| GeminiPart {
            text: m.content.clone(),
        })
        .collect();

    let contents = messages
        .iter()
        .filter(|m| m.role != ChatRole::System)
        .map(|m| GeminiContent {
            role: Some(
                match m.role {
                    ChatRole::Assistant => "model",
                    _ => "user",
                }
                .to_string(),
            ),
            parts: vec![GeminiPart {
                text: m.content.clone(),
            }],
        })
        .collect();

    GenerateContentRequest {
        system_instruction: if system_parts.is_empty() {
            None
        } else {
            Some(GeminiContent {
                role: None,
                parts: system_parts,
            })
        },
        contents,
        generation_config: GenerationConfig {
            temperature,
            max_output_tokens: max_tokens,
        },
    }
}

fn extract_gemini_text(response: GenerateContentResponse) -> Result<String> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let feedback = response
            .prompt_feedback
            .map(|f| f.to_string())
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(TeachRagError::Llm(format!("Gemini returned no answer: {feedback}")));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(TeachRagError::Llm(format!(
            "Gemini returned an empty answer (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }
    Ok(text)
}

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
        return Err(TeachRagError::Llm(format!(
            "{provider} API error ({status}): {error_text}"
        )));
    }

    response
        .json()
        .await
        .map_err(|e| TeachRagError::Llm(format!("Failed to parse response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider() {
        assert_eq!(LlmProvider::parse("Gemini").unwrap(), LlmProvider::Gemini);
        assert_eq!(LlmProvider::parse("ollama").unwrap(), LlmProvider::Ollama);
        assert!(LlmProvider::parse("gpt").is_err());
    }

    #[test]
    fn test_gemini_request_splits_system() {
        let messages = vec![
            ChatMessage::system("You are a teacher."),
            ChatMessage::user("What is a cell?"),
        ];
        let request = build_gemini_request(&messages, 0.9, None);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json["systemInstruction"]["parts"][0]["text"],
            "You are a teacher."
        );
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"].as_array().unwrap().len(), 1);
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "What is a cell?");
        assert!(json["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"role": "model", "parts": [{"text": "Cells "}, {"text": "divide."}]}, "finishReason": "STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(extract_gemini_text(response).unwrap(), "Cells divide.");
    }

    #[test]
    fn test_extract_text_blocked_prompt() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        let err = extract_gemini_text(response).unwrap_err();
        assert!(matches!(err, TeachRagError::Llm(_)));
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_model_path() {
        let service = LlmService::new(&AppConfig::default()).unwrap();
        assert_eq!(service.gemini_model_path(), "models/gemini-2.0-flash");
    }
}

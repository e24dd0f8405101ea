//! API request and response types

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use crate::errors::TeachRagError;

/// Fixed message returned by `POST /initialize`
pub const INITIALIZED_MESSAGE: &str = "RAG instance has been created successfully";
/// Fixed answer returned by `POST /invoke` in stub mode
pub const STUB_ANSWER: &str = "Response from the Google Gemini";

/// Index documents for a user; at least one source is required
#[derive(Debug, Deserialize)]
pub struct InitializeRequest {
    pub user_id: String,
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Ask a question against a user's documents
#[derive(Debug, Deserialize)]
pub struct InvokeRequest {
    pub user_id: String,
    pub question: String,
}

/// `POST /initialize` response
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InitializeResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<usize>,
}

impl InitializeResponse {
    pub fn created(chunks: Option<usize>) -> Self {
        Self {
            message: INITIALIZED_MESSAGE.to_string(),
            chunks,
        }
    }
}

/// `POST /invoke` response
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvokeResponse {
    pub answer: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub mode: String,
}

/// Error body `{"error": "..."}` with a status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<TeachRagError> for ApiError {
    fn from(err: TeachRagError) -> Self {
        let status = match &err {
            TeachRagError::InvalidInput(_) | TeachRagError::Document(_) => StatusCode::BAD_REQUEST,
            e if e.is_upstream() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (TeachRagError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (TeachRagError::Document("x".into()), StatusCode::BAD_REQUEST),
            (TeachRagError::Llm("x".into()), StatusCode::BAD_GATEWAY),
            (TeachRagError::VectorStore("x".into()), StatusCode::BAD_GATEWAY),
            (TeachRagError::Http("x".into()), StatusCode::BAD_GATEWAY),
            (TeachRagError::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_stub_initialize_has_no_chunk_count() {
        let json = serde_json::to_value(InitializeResponse::created(None)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"message": "RAG instance has been created successfully"})
        );
    }

    #[test]
    fn test_live_initialize_reports_chunks() {
        let json = serde_json::to_value(InitializeResponse::created(Some(7))).unwrap();
        assert_eq!(json["chunks"], 7);
    }

    #[test]
    fn test_initialize_request_optional_sources() {
        let req: InitializeRequest = serde_json::from_str(r#"{"user_id": "42"}"#).unwrap();
        assert_eq!(req.user_id, "42");
        assert!(req.directory.is_none());
        assert!(req.url.is_none());
    }
}

/// API request handlers
use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::api::types::HealthResponse;
use crate::config::AppConfig;
use crate::config::ServiceMode;
use crate::rag::RagService;

pub mod rag;

pub use rag::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Present only in live mode
    pub rag_service: Option<Arc<RagService>>,
    pub http_client: reqwest::Client,
}

impl AppState {
    /// State for stub mode; no external clients are built
    pub fn stub(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            rag_service: None,
            http_client: reqwest::Client::new(),
        }
    }

    /// State for live mode
    pub fn live(config: AppConfig, rag_service: Arc<RagService>) -> crate::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            config: Arc::new(config),
            rag_service: Some(rag_service),
            http_client,
        })
    }

    pub fn mode(&self) -> ServiceMode {
        if self.rag_service.is_some() {
            ServiceMode::Live
        } else {
            ServiceMode::Stub
        }
    }
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let mode = match state.mode() {
        ServiceMode::Stub => "stub",
        ServiceMode::Live => "live",
    };
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        mode: mode.to_string(),
    })
}

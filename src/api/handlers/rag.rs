/// RAG-related API handlers
use std::path::Path;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::error;
use tracing::info;

use super::AppState;
use crate::api::types::*;
use crate::documents::DirectoryLoader;
use crate::documents::Document;
use crate::documents::OnlinePdfLoader;
use crate::rag::RagService;

/// Stub initialize: the request body is never read
pub async fn initialize_stub() -> Json<InitializeResponse> {
    info!("POST /initialize (stub)");
    Json(InitializeResponse::created(None))
}

/// Stub invoke: the request body is never read
pub async fn invoke_stub() -> Json<InvokeResponse> {
    info!("POST /invoke (stub)");
    Json(InvokeResponse {
        answer: STUB_ANSWER.to_string(),
    })
}

/// Load the requested PDFs and index them for the user
pub async fn initialize(
    State(state): State<AppState>,
    payload: Result<Json<InitializeRequest>, JsonRejection>,
) -> Result<Json<InitializeResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    info!("POST /initialize for user {}", req.user_id);
    let rag_service = rag_service(&state)?;

    let documents = load_documents(&state, &req).await?;
    match rag_service.ingest(&req.user_id, &documents).await {
        Ok(report) => {
            info!(
                "Indexed {} chunks from {} pages into {}",
                report.chunks, report.documents, report.index_name
            );
            Ok(Json(InitializeResponse::created(Some(report.chunks))))
        }
        Err(e) => {
            error!("Error ingesting documents for {}: {}", req.user_id, e);
            Err(e.into())
        }
    }
}

/// Answer a question from the user's index
pub async fn invoke(
    State(state): State<AppState>,
    payload: Result<Json<InvokeRequest>, JsonRejection>,
) -> Result<Json<InvokeResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    info!("POST /invoke for user {}: {}", req.user_id, req.question);
    let rag_service = rag_service(&state)?;

    match rag_service.answer(&req.user_id, &req.question).await {
        Ok(response) => Ok(Json(InvokeResponse {
            answer: response.answer,
        })),
        Err(e) => {
            error!("Error processing RAG query: {}", e);
            Err(e.into())
        }
    }
}

fn rag_service(state: &AppState) -> Result<Arc<RagService>, ApiError> {
    state.rag_service.clone().ok_or_else(|| {
        ApiError::from(crate::TeachRagError::Config(
            "RAG service is not configured".to_string(),
        ))
    })
}

async fn load_documents(
    state: &AppState,
    req: &InitializeRequest,
) -> Result<Vec<Document>, ApiError> {
    if req.directory.is_none() && req.url.is_none() {
        return Err(ApiError::bad_request(
            "either 'directory' or 'url' is required",
        ));
    }

    let mut documents = Vec::new();
    if let Some(dir) = &req.directory {
        if !Path::new(dir).is_dir() {
            return Err(ApiError::bad_request(format!(
                "'{dir}' is not a directory"
            )));
        }
        documents.extend(DirectoryLoader::new(dir).load().await?);
    }
    if let Some(url) = &req.url {
        let loader = OnlinePdfLoader::new(url, state.http_client.clone())?;
        documents.extend(loader.load().await?);
    }
    Ok(documents)
}

//! HTTP server implementation

use std::sync::Arc;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::config::ServiceMode;
use crate::rag::RagService;
use crate::Result;

/// Build application state for the configured mode
///
/// # Errors
/// - Live mode without the required API keys
pub fn build_state(config: &AppConfig) -> Result<AppState> {
    match config.server.mode {
        ServiceMode::Stub => Ok(AppState::stub(config.clone())),
        ServiceMode::Live => {
            let rag_service = Arc::new(RagService::new(config)?);
            AppState::live(config.clone(), rag_service)
        }
    }
}

/// Router with tracing, compression and optional CORS layers
pub fn build_app(state: AppState, enable_cors: bool) -> Router {
    let mut app = routes::api_routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if enable_cors {
        info!("✅ CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Start the API server
pub async fn serve_api(config: &AppConfig) -> Result<()> {
    info!("🚀 Starting teachrag API server...");

    let state = build_state(config)?;
    match state.mode() {
        ServiceMode::Stub => info!("💡 Stub mode - endpoints return fixed responses"),
        ServiceMode::Live => info!(
            "🧠 Live mode - embeddings: {}, llm: {}",
            config.embedding_model(),
            config.llm_model()
        ),
    }

    let app = build_app(state, config.server.cors);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 API server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET  /health      - Health check");
    info!("  POST /initialize  - Index documents for a user");
    info!("  POST /invoke      - Ask a question");

    axum::serve(listener, app).await?;

    Ok(())
}

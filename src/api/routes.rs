//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers::AppState;
use super::handlers::{
    self,
};
use crate::config::ServiceMode;

/// Create the API router for the state's mode
pub fn api_routes(state: AppState) -> Router {
    let router = Router::new().route("/health", get(handlers::health));

    let router = match state.mode() {
        ServiceMode::Stub => router
            .route("/initialize", post(handlers::initialize_stub))
            .route("/invoke", post(handlers::invoke_stub)),
        ServiceMode::Live => router
            .route("/initialize", post(handlers::initialize))
            .route("/invoke", post(handlers::invoke)),
    };

    router.with_state(state)
}

//! blockbeats-gateway library - pinning upload proxy
//!
//! Accepts multipart uploads from the marketplace front-end, validates the
//! file type, and forwards the payload to the pinning service. The publisher
//! is an injected capability so tests run against an in-memory double.

use axum::Router;
use blockbeats_licensing::ContentPublisher;
use std::sync::Arc;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Pinning capability (live Pinata client in production)
    pub publisher: Arc<dyn ContentPublisher>,
}

impl AppState {
    /// Create new application state
    pub fn new(publisher: Arc<dyn ContentPublisher>) -> Self {
        Self { publisher }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::post;
    use tower_http::trace::TraceLayer;

    Router::new()
        .route("/api/upload", post(api::upload::handle_upload))
        .merge(api::health::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

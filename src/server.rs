//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Query, State},
    http::{
        header::{ACCEPT, CONNECTION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    response::Response,
    routing::{get, post},
    Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::api;
use crate::error::ApiError;
use crate::models::ServerConfig;
use crate::services::Transcoder;

/// Room for multipart boundaries and part headers on top of the file limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub transcoder: Arc<Transcoder>,
}

/// Create application state from a loaded configuration.
pub fn create_app_state(config: ServerConfig) -> AppState {
    let transcoder = Arc::new(Transcoder::with_png_effort(config.png_effort));
    AppState {
        config: Arc::new(config),
        transcoder,
    }
}

/// Build the API router with all endpoints and middleware.
///
/// This is the core router used by both production and tests.
/// It includes the `Connection: close` header to prevent connection
/// accumulation from ESP32 clients.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state
        .config
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let cors = cors_layer(&state.config.cors_origin);

    Router::new()
        .route(
            "/optimize",
            post(handle_optimize).layer(DefaultBodyLimit::max(body_limit)),
        )
        // Health check
        .route("/health", get(api::handle_health))
        // Add state and tracing
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Disable keep-alive: ESP32 HTTPClient defaults to keep-alive but never
        // reuses connections, causing orphaned connections to accumulate.
        .layer(SetResponseHeaderLayer::overriding(
            CONNECTION,
            HeaderValue::from_static("close"),
        ))
}

/// CORS for the panel's web UI, which is served from the device on the LAN.
fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT])
        .expose_headers([api::X_WIDTH, api::X_HEIGHT, api::X_FORMAT]);

    if origin == "*" {
        return layer.allow_origin(Any);
    }

    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(e) => {
            tracing::warn!(%e, origin, "Invalid CORS origin, allowing any origin");
            layer.allow_origin(Any)
        }
    }
}

// Wrapper handler to extract state components for the underlying API handler

async fn handle_optimize(
    State(state): State<AppState>,
    query: Query<HashMap<String, String>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    api::handle_optimize(
        State(state.transcoder),
        State(state.config),
        query,
        multipart,
    )
    .await
}

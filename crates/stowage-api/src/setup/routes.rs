//! Route configuration and setup

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use stowage_core::Config;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// API base path prefix
const API_PREFIX: &str = "/api/v0";

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router {
    let cors = setup_cors(config);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            &format!("{API_PREFIX}/uploads/sign"),
            post(handlers::sign_upload::sign_upload),
        )
        .route(
            &format!("{API_PREFIX}/files/claim"),
            post(handlers::claim::claim_file),
        )
        .route(
            &format!("{API_PREFIX}/files/{{container_name}}/{{file_name}}"),
            get(handlers::fetch_file::fetch_file),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> CorsLayer {
    if config.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    }
}

use axum::{extract::DefaultBodyLimit, Router};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tower_http::compression::{predicate::SizeAbove, CompressionLayer};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod cache;
pub mod cache_key;
pub mod cache_ttl;
pub mod db;
pub mod models;
pub mod state;

use api::create_api_router;
use state::AppState;

pub fn create_app_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .merge(create_api_router())
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // JSON bodies only, 1MB is plenty
        .layer(
            CompressionLayer::new()
                .gzip(true)
                .deflate(true)
                .compress_when(SizeAbove::new(1024)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

/// CORS for the dashboard frontend.
fn cors_layer() -> tower_http::cors::CorsLayer {
    use axum::http::Method;
    use tower_http::cors::CorsLayer;

    let frontend_origin: axum::http::HeaderValue = env::var("FRONTEND_ORIGIN")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .parse()
        .expect("invalid FRONTEND_ORIGIN");

    CorsLayer::new()
        .allow_origin([frontend_origin])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

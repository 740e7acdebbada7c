pub mod common;
pub mod invoices;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::db;
use crate::state::AppState;

/// Assemble all API routes.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .merge(invoices::create_invoice_router())
}

/// Liveness probe with a database round-trip.
async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let database = db::check_health(&state.db_pool).await;
    Json(json!({
        "status": if database { "ok" } else { "degraded" },
        "database": database,
    }))
}

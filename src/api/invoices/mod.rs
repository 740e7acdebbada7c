// Invoice API module
// CRUD endpoints plus the cached filtered search and count.

pub mod handlers;
pub mod models;
pub mod repository;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::state::AppState;
use handlers::{
    create_invoice, delete_invoice, get_filtered_invoices, get_invoice_by_id, get_invoice_pages,
    update_invoice,
};

/// Create the invoice router
pub fn create_invoice_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/invoice/filtered", get(get_filtered_invoices))
        .route("/invoice/pages", get(get_invoice_pages))
        .route("/invoice", post(create_invoice))
        .route(
            "/invoice/:id",
            get(get_invoice_by_id)
                .put(update_invoice)
                .delete(delete_invoice),
        )
}

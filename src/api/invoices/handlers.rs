use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::api::common::{request_id_from, ApiError, ApiResponse};
use crate::api::invoices::models::{
    CreateInvoiceRequest, CreatedInvoiceResponse, FilteredInvoicesParams, InvoiceCountParams,
    InvoiceCountResponse, MutationResponse, UpdateInvoiceRequest,
};
use crate::api::invoices::repository::{self, WriteOutcome};
use crate::cache_key;
use crate::cache_ttl;
use crate::models::invoice::{Invoice, InvoiceSearchRow};
use crate::state::AppState;

fn db_error(e: sqlx::Error) -> ApiError {
    ApiError::database_error(&format!("Query execution failed: {}", e))
}

fn validation_failed(e: validator::ValidationErrors) -> ApiError {
    ApiError::validation_error(&e.to_string())
}

// ============================================================================
// READ HANDLERS (cache-aside)
// ============================================================================

/// GET /invoice/filtered?query=&page=&perPage=
///
/// Serves the filtered invoice page through the result cache; on a miss the
/// database is queried and the page is cached under the
/// `filtered_invoices` namespace.
pub async fn get_filtered_invoices(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<FilteredInvoicesParams>,
) -> Result<Json<ApiResponse<Vec<InvoiceSearchRow>>>, ApiError> {
    let request_id = request_id_from(&headers);
    let start_time = Instant::now();

    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(6).clamp(1, 100);
    let term = params.query;

    let cache_key = cache_key::filtered_invoices(&term, page, per_page);
    let ttl = cache_ttl::get_filtered_invoices_ttl();
    let pool = state.db_pool.clone();

    let (invoices, cached) = state
        .invoice_cache
        .read_through(cache_key::FILTERED_INVOICES_NS, &cache_key, ttl, || async {
            repository::fetch_filtered(&pool, &term, page, per_page).await
        })
        .await
        .map_err(db_error)?;

    let execution_time = start_time.elapsed().as_millis() as u64;
    info!(
        "Filtered invoices retrieved: {} records in {}ms (cached: {})",
        invoices.len(),
        execution_time,
        cached
    );

    Ok(Json(ApiResponse::success(
        invoices,
        request_id,
        Some(execution_time),
        cached,
    )))
}

/// GET /invoice/pages?query=
///
/// Total row count for the same filter predicate as /invoice/filtered,
/// cached in the same namespace so mutations purge both together.
pub async fn get_invoice_pages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<InvoiceCountParams>,
) -> Result<Json<ApiResponse<InvoiceCountResponse>>, ApiError> {
    let request_id = request_id_from(&headers);
    let start_time = Instant::now();

    let term = params.query;
    let cache_key = cache_key::invoice_count(&term);
    let ttl = cache_ttl::get_filtered_invoices_ttl();
    let pool = state.db_pool.clone();

    let (total_count, cached) = state
        .invoice_cache
        .read_through(cache_key::FILTERED_INVOICES_NS, &cache_key, ttl, || async {
            repository::count_filtered(&pool, &term).await
        })
        .await
        .map_err(db_error)?;

    let execution_time = start_time.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(
        InvoiceCountResponse { total_count },
        request_id,
        Some(execution_time),
        cached,
    )))
}

/// GET /invoice/:id
pub async fn get_invoice_by_id(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Invoice>>, ApiError> {
    let request_id = request_id_from(&headers);
    let start_time = Instant::now();

    let invoice = repository::fetch_by_id(&state.db_pool, id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| ApiError::not_found("Invoice"))?;

    let execution_time = start_time.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(
        invoice,
        request_id,
        Some(execution_time),
        false,
    )))
}

// ============================================================================
// MUTATION HANDLERS (write + namespace invalidation)
// ============================================================================

/// POST /invoice
pub async fn create_invoice(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<Json<ApiResponse<CreatedInvoiceResponse>>, ApiError> {
    let request_id = request_id_from(&headers);
    let start_time = Instant::now();

    request.validate().map_err(validation_failed)?;

    let id = repository::create(&state.db_pool, &request)
        .await
        .map_err(db_error)?;

    // Purge stale search results before answering, so a client that creates
    // and immediately searches never sees the pre-mutation pages.
    state
        .invoice_cache
        .invalidate_namespace(cache_key::FILTERED_INVOICES_NS)
        .await;

    let execution_time = start_time.elapsed().as_millis() as u64;
    info!("Invoice {} created in {}ms", id, execution_time);

    Ok(Json(ApiResponse::success(
        CreatedInvoiceResponse {
            message: "Invoice created successfully.".to_string(),
            id,
        },
        request_id,
        Some(execution_time),
        false,
    )))
}

/// PUT /invoice/:id
pub async fn update_invoice(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateInvoiceRequest>,
) -> Result<Json<ApiResponse<MutationResponse>>, ApiError> {
    let request_id = request_id_from(&headers);
    let start_time = Instant::now();

    request.validate().map_err(validation_failed)?;

    match repository::update(&state.db_pool, id, &request)
        .await
        .map_err(db_error)?
    {
        WriteOutcome::NotFound => Err(ApiError::not_found("Invoice")),
        WriteOutcome::Applied => {
            state
                .invoice_cache
                .invalidate_namespace(cache_key::FILTERED_INVOICES_NS)
                .await;

            let execution_time = start_time.elapsed().as_millis() as u64;
            info!("Invoice {} updated in {}ms", id, execution_time);

            Ok(Json(ApiResponse::success(
                MutationResponse {
                    message: "Invoice updated successfully.".to_string(),
                },
                request_id,
                Some(execution_time),
                false,
            )))
        }
    }
}

/// DELETE /invoice/:id
pub async fn delete_invoice(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MutationResponse>>, ApiError> {
    let request_id = request_id_from(&headers);
    let start_time = Instant::now();

    match repository::delete(&state.db_pool, id)
        .await
        .map_err(db_error)?
    {
        WriteOutcome::NotFound => Err(ApiError::not_found("Invoice")),
        WriteOutcome::Applied => {
            state
                .invoice_cache
                .invalidate_namespace(cache_key::FILTERED_INVOICES_NS)
                .await;

            let execution_time = start_time.elapsed().as_millis() as u64;
            info!("Invoice {} deleted in {}ms", id, execution_time);

            Ok(Json(ApiResponse::success(
                MutationResponse {
                    message: "Invoice deleted successfully.".to_string(),
                },
                request_id,
                Some(execution_time),
                false,
            )))
        }
    }
}

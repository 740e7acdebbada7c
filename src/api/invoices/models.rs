use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

// ============================================================================
// REQUEST MODELS
// ============================================================================

fn validate_status(status: &str) -> Result<(), ValidationError> {
    if status == "pending" || status == "paid" {
        return Ok(());
    }
    let mut validation_error = ValidationError::new("status");
    validation_error.message = Some("Status must be 'pending' or 'paid'.".into());
    Err(validation_error)
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    pub customer_id: Uuid,

    #[validate(range(min = 1, message = "Amount must be greater than 0."))]
    pub amount: i64,

    #[validate(custom(function = "validate_status"))]
    pub status: String,

    /// Defaults to today's date (UTC) when omitted.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateInvoiceRequest {
    pub customer_id: Uuid,

    #[validate(range(min = 1, message = "Amount must be greater than 0."))]
    pub amount: i64,

    #[validate(custom(function = "validate_status"))]
    pub status: String,
}

/// Query string for `GET /invoice/filtered`.
#[derive(Debug, Deserialize)]
pub struct FilteredInvoicesParams {
    #[serde(default)]
    pub query: String,
    pub page: Option<u32>,
    #[serde(rename = "perPage")]
    pub per_page: Option<u32>,
}

/// Query string for `GET /invoice/pages`.
#[derive(Debug, Deserialize)]
pub struct InvoiceCountParams {
    #[serde(default)]
    pub query: String,
}

// ============================================================================
// RESPONSE MODELS
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CreatedInvoiceResponse {
    pub message: String,
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct InvoiceCountResponse {
    pub total_count: i64,
}

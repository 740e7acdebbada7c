use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::api::invoices::models::{CreateInvoiceRequest, UpdateInvoiceRequest};
use crate::models::invoice::{Invoice, InvoiceSearchRow};

/// Outcome of a row-targeted write. "No rows affected" is a distinct,
/// expected case, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    NotFound,
}

// ============================================================================
// FILTERED SEARCH
// ============================================================================

// Both read queries share this predicate so the reported page count always
// agrees with the pages themselves.
const FILTER_PREDICATE: &str = r#"
    c.name ILIKE $1
    OR c.email ILIKE $1
    OR i.amount::text LIKE $1
    OR to_char(i.date, 'YYYY-MM-DD') LIKE $1
    OR i.status ILIKE $1
"#;

pub async fn fetch_filtered(
    pool: &PgPool,
    term: &str,
    page: u32,
    per_page: u32,
) -> Result<Vec<InvoiceSearchRow>, sqlx::Error> {
    let keyword = format!("%{}%", term);
    let offset = ((page.max(1) - 1) * per_page) as i64;
    let limit = per_page as i64;

    let query = format!(
        r#"
        SELECT
            i.id,
            i.amount,
            i.date,
            i.status,
            c.name,
            c.email,
            c.image_url
        FROM invoices i
        INNER JOIN customers c ON i.customer_id = c.id
        WHERE {}
        ORDER BY i.date DESC
        OFFSET $2 LIMIT $3
        "#,
        FILTER_PREDICATE
    );

    sqlx::query_as::<_, InvoiceSearchRow>(&query)
        .bind(&keyword)
        .bind(offset)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            error!("Error fetching filtered invoices: {}", e);
            e
        })
}

pub async fn count_filtered(pool: &PgPool, term: &str) -> Result<i64, sqlx::Error> {
    let keyword = format!("%{}%", term);

    let query = format!(
        r#"
        SELECT COUNT(*)
        FROM invoices i
        INNER JOIN customers c ON i.customer_id = c.id
        WHERE {}
        "#,
        FILTER_PREDICATE
    );

    sqlx::query_scalar::<_, i64>(&query)
        .bind(&keyword)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            error!("Error counting filtered invoices: {}", e);
            e
        })
}

// ============================================================================
// SINGLE RECORD
// ============================================================================

pub async fn fetch_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Invoice>, sqlx::Error> {
    let query = r#"
        SELECT id, customer_id, amount, status, date
        FROM invoices
        WHERE id = $1
    "#;

    sqlx::query_as::<_, Invoice>(query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            error!("Error fetching invoice {}: {}", id, e);
            e
        })
}

// ============================================================================
// MUTATIONS
// ============================================================================

pub async fn create(pool: &PgPool, request: &CreateInvoiceRequest) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    let date = request.date.unwrap_or_else(|| Utc::now().date_naive());

    let query = r#"
        INSERT INTO invoices (id, customer_id, amount, status, date)
        VALUES ($1, $2, $3, $4, $5)
    "#;

    sqlx::query(query)
        .bind(id)
        .bind(request.customer_id)
        .bind(Decimal::from(request.amount))
        .bind(&request.status)
        .bind(date)
        .execute(pool)
        .await
        .map_err(|e| {
            error!("Error creating invoice: {}", e);
            e
        })?;

    Ok(id)
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    request: &UpdateInvoiceRequest,
) -> Result<WriteOutcome, sqlx::Error> {
    let query = r#"
        UPDATE invoices
        SET customer_id = $1,
            amount = $2,
            status = $3
        WHERE id = $4
    "#;

    let result = sqlx::query(query)
        .bind(request.customer_id)
        .bind(Decimal::from(request.amount))
        .bind(&request.status)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| {
            error!("Error updating invoice {}: {}", id, e);
            e
        })?;

    if result.rows_affected() == 0 {
        Ok(WriteOutcome::NotFound)
    } else {
        Ok(WriteOutcome::Applied)
    }
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<WriteOutcome, sqlx::Error> {
    let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| {
            error!("Error deleting invoice {}: {}", id, e);
            e
        })?;

    if result.rows_affected() == 0 {
        Ok(WriteOutcome::NotFound)
    } else {
        Ok(WriteOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    // These tests require a seeded test database; they document the
    // repository contract until one is wired into CI.

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_filtered_search_matches_count() {
        // fetch_filtered and count_filtered must agree for any term,
        // since they share FILTER_PREDICATE.
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_update_missing_row_reports_not_found() {
        // update() against a random Uuid must return WriteOutcome::NotFound,
        // not an error.
    }
}

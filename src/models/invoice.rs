use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An invoice row as stored, linked to a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub amount: Decimal,
    pub status: String,
    pub date: NaiveDate,
}

/// Projection returned by the filtered search: invoice fields joined with
/// the owning customer. This is the payload type stored in the result
/// cache, so it must round-trip exactly through serde_json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct InvoiceSearchRow {
    pub id: Uuid,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub status: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_row_round_trips_through_json() {
        let row = InvoiceSearchRow {
            id: Uuid::new_v4(),
            amount: Decimal::new(10700, 2),
            date: NaiveDate::from_ymd_opt(2025, 5, 15).unwrap(),
            status: "paid".to_string(),
            name: "Alice Johnson".to_string(),
            email: "alice@example.com".to_string(),
            image_url: "/customers/alice.png".to_string(),
        };

        let payload = serde_json::to_string(&row).unwrap();
        let back: InvoiceSearchRow = serde_json::from_str(&payload).unwrap();
        assert_eq!(back, row);
    }
}

//! Payment entity - One clearing event recorded against an expense.
//!
//! Payments are append-only history; the client never edits or deletes them.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payment history record from `GET /api/expenses/{id}/payments`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Unique identifier for the payment
    pub id: i64,
    /// Amount cleared by this payment
    pub amount: Decimal,
    /// Name of the member who paid
    #[serde(default)]
    pub cleared_by: Option<String>,
    /// When the payment was recorded
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
}

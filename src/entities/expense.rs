//! Expense entity - A household expense assigned to one member.
//!
//! Clearing state (`cleared_amount`, `cleared`, and the `last_cleared_*` trail) is maintained by
//! the server. The client only reads it, so [`Expense::remaining`] and
//! [`Expense::is_consistent`] exist for display and sanity checks.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Expense as returned by `GET /api/expenses`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// Unique identifier for the expense
    pub id: i64,
    /// Member the expense is assigned to
    #[serde(default)]
    pub member_id: Option<i64>,
    /// Display name of that member
    #[serde(default)]
    pub member_name: Option<String>,
    /// What the money was spent on
    pub description: String,
    /// Full amount of the expense
    pub amount: Decimal,
    /// Day the expense happened
    pub date: NaiveDate,
    /// Sum of all payments recorded so far
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub cleared_amount: Decimal,
    /// True once `cleared_amount` reaches `amount`
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub cleared: bool,
    /// Who completed the clearing
    #[serde(default)]
    pub cleared_by: Option<String>,
    /// When the expense was fully cleared
    #[serde(default)]
    pub cleared_at: Option<NaiveDateTime>,
    /// Amount of the most recent payment
    #[serde(default)]
    pub last_cleared_amount: Option<Decimal>,
    /// Who made the most recent payment
    #[serde(default)]
    pub last_cleared_by: Option<String>,
    /// When the most recent payment was made
    #[serde(default)]
    pub last_cleared_at: Option<NaiveDateTime>,
}

impl Expense {
    /// Amount still outstanding.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        self.amount - self.cleared_amount
    }

    /// Checks `0 <= cleared_amount <= amount` and `cleared <=> cleared_amount == amount`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let in_range = self.cleared_amount >= Decimal::ZERO && self.cleared_amount <= self.amount;
        in_range && (self.cleared == (self.cleared_amount == self.amount))
    }
}

/// Body of `POST /api/expenses` and `PUT /api/expenses/{id}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDraft {
    /// Member the expense is assigned to
    pub member_id: i64,
    /// What the money was spent on
    pub description: String,
    /// Full amount of the expense
    pub amount: Decimal,
    /// Serialized as `YYYY-MM-DD`
    pub date: NaiveDate,
}

/// Query parameters of `PUT /api/expenses/clear/{id}`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentDraft {
    /// Member making the payment
    pub member_id: i64,
    /// Amount being paid
    pub amount: Decimal,
}

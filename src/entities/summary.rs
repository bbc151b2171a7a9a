//! Per-member balance summary.
//!
//! The server answers `GET /api/expenses/summary` with an object keyed by member name.
//! [`flatten_summary`] turns it into rows ordered by name.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregates for one member as sent by the server
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceTotals {
    /// Sum of all expenses assigned to the member
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub total: Decimal,
    /// Sum already cleared
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub cleared: Decimal,
    /// Still outstanding
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub remaining: Decimal,
}

/// Raw summary payload keyed by member name
pub type SummaryPayload = BTreeMap<String, BalanceTotals>;

/// One row of the member balance table
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemberBalance {
    /// Member name
    pub name: String,
    /// Sum of all expenses assigned to the member
    pub total: Decimal,
    /// Sum already cleared
    pub cleared: Decimal,
    /// Still outstanding
    pub remaining: Decimal,
}

/// Converts the keyed payload into display rows.
#[must_use]
pub fn flatten_summary(payload: SummaryPayload) -> Vec<MemberBalance> {
    payload
        .into_iter()
        .map(|(name, totals)| MemberBalance {
            name,
            total: totals.total,
            cleared: totals.cleared,
            remaining: totals.remaining,
        })
        .collect()
}

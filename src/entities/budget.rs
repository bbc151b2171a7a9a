//! Budget entities - Household budget snapshot and per-member allocations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Snapshot of the current budget month from `GET /api/budget/status`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BudgetStatus {
    /// Total household budget for the month
    #[serde(deserialize_with = "super::null_as_default")]
    pub total_budget: Decimal,
    /// Amount already spent against the budget
    #[serde(deserialize_with = "super::null_as_default")]
    pub utilized_budget: Decimal,
    /// What is left
    #[serde(deserialize_with = "super::null_as_default")]
    pub remaining_budget: Decimal,
    /// Budget month label, e.g. `"May 2024"`
    #[serde(deserialize_with = "super::null_as_default")]
    pub month_year: String,
}

impl BudgetStatus {
    /// Utilization as a percentage of the total budget, 0 when no budget is set.
    #[must_use]
    pub fn utilization_percent(&self) -> Decimal {
        if self.total_budget.is_zero() {
            return Decimal::ZERO;
        }
        (self.utilized_budget / self.total_budget * Decimal::ONE_HUNDRED).round_dp(1)
    }
}

/// Per-member budget row from `GET /api/budget/members`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberBudget {
    /// Member this budget belongs to
    pub member_id: i64,
    /// Member display name
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub member_name: String,
    /// Monthly allocation for the member
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub monthly_budget: Decimal,
    /// Spent this month
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub utilized_budget: Decimal,
    /// Left this month
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub remaining_budget: Decimal,
}

/// Body of `POST /api/budget/members/{id}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberBudgetUpdate {
    /// New monthly allocation
    pub monthly_budget: Decimal,
}

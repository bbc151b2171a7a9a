//! Budget operations - monthly snapshot, per-member allocations, and month maintenance.

use crate::{
    entities::{BudgetStatus, MemberBudget, MemberBudgetUpdate},
    errors::{Error, Result},
    http::{ApiClient, Transport},
};
use rust_decimal::Decimal;
use tracing::{info, instrument};

const BUDGET_PATH: &str = "/api/budget";

/// Retrieves the current month's snapshot. Missing fields default to zero.
pub async fn budget_status<T: Transport>(api: &ApiClient<T>) -> Result<BudgetStatus> {
    let status: Option<BudgetStatus> = api.get_json(&format!("{BUDGET_PATH}/status")).await?;
    Ok(status.unwrap_or_default())
}

/// Retrieves every member's budget row.
pub async fn member_budgets<T: Transport>(api: &ApiClient<T>) -> Result<Vec<MemberBudget>> {
    let budgets: Option<Vec<MemberBudget>> =
        api.get_json(&format!("{BUDGET_PATH}/members")).await?;
    Ok(budgets.unwrap_or_default())
}

/// Sets a member's monthly budget.
///
/// # Errors
/// [`Error::Validation`] for a negative amount.
#[instrument(skip(api))]
pub async fn update_member_budget<T: Transport>(
    api: &ApiClient<T>,
    member_id: i64,
    monthly_budget: Decimal,
) -> Result<()> {
    if monthly_budget < Decimal::ZERO {
        return Err(Error::Validation {
            message: "Monthly budget cannot be negative".to_string(),
        });
    }
    api.post(
        &format!("{BUDGET_PATH}/members/{member_id}"),
        &MemberBudgetUpdate { monthly_budget },
    )
    .await?;
    info!("Budget for member {member_id} set to {monthly_budget}");
    Ok(())
}

/// Starts a new budget month.
#[instrument(skip(api))]
pub async fn initialize_month<T: Transport>(api: &ApiClient<T>) -> Result<()> {
    api.post_empty(&format!("{BUDGET_PATH}/initialize")).await?;
    info!("New budget month initialized");
    Ok(())
}

/// Asks the server to recompute utilization from the recorded expenses.
#[instrument(skip(api))]
pub async fn recalculate<T: Transport>(api: &ApiClient<T>) -> Result<()> {
    api.post_empty(&format!("{BUDGET_PATH}/recalculate")).await?;
    info!("Budget recalculated");
    Ok(())
}

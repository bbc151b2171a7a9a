//! Dashboard - budget snapshot, member balances, and the most recent expenses.

use super::{FAILED_TO_INITIALIZE, Notifications, Query, apply};
use crate::{
    core::{budget, expenses},
    entities::{BudgetStatus, Expense, MemberBalance},
    errors::Result,
    http::{ApiClient, Transport},
    session::{ActiveSession, Bootstrap},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{instrument, warn};

/// How many expenses the dashboard lists.
pub const RECENT_EXPENSES: usize = 5;

/// Totals computed locally from the expense list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpenseTotals {
    /// Sum of all amounts
    pub total: Decimal,
    /// Sum of cleared amounts
    pub cleared: Decimal,
    /// `total - cleared`
    pub remaining: Decimal,
    /// Number of expenses
    pub count: usize,
}

impl ExpenseTotals {
    /// Sums `expenses`.
    #[must_use]
    pub fn from_expenses(expenses: &[Expense]) -> Self {
        let total: Decimal = expenses.iter().map(|e| e.amount).sum();
        let cleared: Decimal = expenses.iter().map(|e| e.cleared_amount).sum();
        Self {
            total,
            cleared,
            remaining: total - cleared,
            count: expenses.len(),
        }
    }
}

/// The last `limit` expenses of the list, newest first.
///
/// The server lists expenses in insertion order, so the tail is the most recent.
#[must_use]
pub fn most_recent(expenses: &[Expense], limit: usize) -> Vec<Expense> {
    expenses.iter().rev().take(limit).cloned().collect()
}

/// State of the dashboard.
#[derive(Debug)]
pub struct Dashboard<'a, T> {
    api: &'a ApiClient<T>,
    /// Session the dashboard was mounted with
    pub session: Option<ActiveSession>,
    /// Expenses from the last successful read
    pub expenses: Vec<Expense>,
    /// Balances from the last successful read
    pub balances: Vec<MemberBalance>,
    /// Budget snapshot from the last successful read
    pub budget: BudgetStatus,
    /// Notices produced so far
    pub notices: Notifications,
    /// Set once the session is gone and the user must log in again
    pub needs_login: bool,
}

impl<'a, T: Transport> Dashboard<'a, T> {
    /// Creates an empty dashboard over `api`.
    pub fn new(api: &'a ApiClient<T>) -> Self {
        Self {
            api,
            session: None,
            expenses: Vec::new(),
            balances: Vec::new(),
            budget: BudgetStatus::default(),
            notices: Notifications::default(),
            needs_login: false,
        }
    }

    /// Validates the session and loads the three reads concurrently.
    ///
    /// # Errors
    /// Only storage failures; a bad session yields [`Bootstrap::RedirectToLogin`].
    #[instrument(skip(self))]
    pub async fn mount(&mut self, now: DateTime<Utc>) -> Result<Bootstrap> {
        let verdict = self.api.session().bootstrap(now)?;
        if let Bootstrap::RedirectToLogin(reason) = &verdict {
            warn!("Redirecting to login: {reason:?}");
            self.needs_login = true;
            return Ok(verdict);
        }
        if let Bootstrap::Ready(active) = &verdict {
            self.session = Some(active.clone());
        }

        if self.load().await > 0 {
            self.notices.error(FAILED_TO_INITIALIZE);
        }
        Ok(verdict)
    }

    /// Re-reads everything. Returns how many reads failed.
    pub async fn load(&mut self) -> usize {
        let api = self.api;
        let (expense_list, balances, status) = tokio::join!(
            expenses::list_expenses(api),
            expenses::member_summary(api),
            budget::budget_status(api),
        );

        let failures = [
            apply(&mut self.expenses, Some(expense_list), Query::Expenses, &mut self.notices),
            apply(&mut self.balances, Some(balances), Query::Summary, &mut self.notices),
            apply(&mut self.budget, Some(status), Query::BudgetStatus, &mut self.notices),
        ];
        let failed: Vec<_> = failures.into_iter().flatten().collect();
        if failed.iter().any(crate::errors::Error::requires_login) {
            self.needs_login = true;
        }
        failed.len()
    }

    /// Totals over the loaded expenses.
    #[must_use]
    pub fn totals(&self) -> ExpenseTotals {
        ExpenseTotals::from_expenses(&self.expenses)
    }

    /// The most recent expenses, newest first.
    #[must_use]
    pub fn recent(&self) -> Vec<Expense> {
        most_recent(&self.expenses, RECENT_EXPENSES)
    }
}

//! Member budget page - per-member allocations and month maintenance.

use super::{Dialog, FAILED_TO_INITIALIZE, Mutation, Notifications, Outcome, Query, apply, submit};
use crate::{
    core::budget,
    entities::{BudgetStatus, MemberBudget},
    errors::Result,
    http::{ApiClient, Transport},
    session::{ActiveSession, Bootstrap, Role},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::future::Future;
use tracing::{instrument, warn};

/// State of the member budget page.
#[derive(Debug)]
pub struct MemberBudgetPage<'a, T> {
    api: &'a ApiClient<T>,
    session: Option<ActiveSession>,
    /// Member budgets from the last successful read
    pub budgets: Vec<MemberBudget>,
    /// Budget snapshot from the last successful read
    pub status: BudgetStatus,
    /// Edit budget dialog
    pub edit_dialog: Dialog,
    /// Notices produced so far
    pub notices: Notifications,
    /// Set once the session is gone and the user must log in again
    pub needs_login: bool,
}

impl<'a, T: Transport> MemberBudgetPage<'a, T> {
    /// Creates an empty page over `api`.
    pub fn new(api: &'a ApiClient<T>) -> Self {
        Self {
            api,
            session: None,
            budgets: Vec::new(),
            status: BudgetStatus::default(),
            edit_dialog: Dialog::default(),
            notices: Notifications::default(),
            needs_login: false,
        }
    }

    fn role(&self) -> Role {
        self.session.as_ref().map_or(Role::User, |s| s.role)
    }

    /// Validates the session and loads the page.
    ///
    /// # Errors
    /// Only storage failures; a bad session yields [`Bootstrap::RedirectToLogin`].
    #[instrument(skip(self))]
    pub async fn mount(&mut self, now: DateTime<Utc>) -> Result<Bootstrap> {
        let verdict = self.api.session().bootstrap(now)?;
        match &verdict {
            Bootstrap::Ready(active) => {
                self.session = Some(active.clone());
                if self
                    .refresh(&[Query::MemberBudgets, Query::BudgetStatus])
                    .await
                    > 0
                {
                    self.notices.error(FAILED_TO_INITIALIZE);
                }
            }
            Bootstrap::RedirectToLogin(reason) => {
                warn!("Redirecting to login: {reason:?}");
                self.needs_login = true;
            }
        }
        Ok(verdict)
    }

    /// Re-reads `queries` concurrently. Returns how many failed.
    pub async fn refresh(&mut self, queries: &[Query]) -> usize {
        let api = self.api;
        let (budgets, status) = tokio::join!(
            super::when(
                queries.contains(&Query::MemberBudgets),
                budget::member_budgets(api)
            ),
            super::when(
                queries.contains(&Query::BudgetStatus),
                budget::budget_status(api)
            ),
        );

        let failures = [
            apply(&mut self.budgets, budgets, Query::MemberBudgets, &mut self.notices),
            apply(&mut self.status, status, Query::BudgetStatus, &mut self.notices),
        ];
        let failed: Vec<_> = failures.into_iter().flatten().collect();
        if failed.iter().any(crate::errors::Error::requires_login) {
            self.needs_login = true;
        }
        failed.len()
    }

    async fn run<F>(&mut self, mutation: Mutation, in_dialog: bool, operation: F) -> Outcome
    where
        F: Future<Output = Result<()>>,
    {
        let role = self.role();
        let dialog = in_dialog.then_some(&mut self.edit_dialog);
        let outcome = submit(role, mutation, dialog, &mut self.notices, operation).await;
        if outcome.requires_login() {
            self.needs_login = true;
        }
        if outcome.succeeded() {
            self.refresh(mutation.affects()).await;
        }
        outcome
    }

    /// Budget row for one member.
    #[must_use]
    pub fn budget_for(&self, member_id: i64) -> Option<&MemberBudget> {
        self.budgets.iter().find(|b| b.member_id == member_id)
    }

    /// Submits the edit dialog for one member.
    pub async fn set_budget(&mut self, member_id: i64, monthly_budget: Decimal) -> Outcome {
        let api = self.api;
        self.run(
            Mutation::EditMemberBudget,
            true,
            budget::update_member_budget(api, member_id, monthly_budget),
        )
        .await
    }

    /// Starts a new budget month.
    pub async fn initialize_month(&mut self) -> Outcome {
        let api = self.api;
        self.run(Mutation::InitializeBudget, false, budget::initialize_month(api))
            .await
    }

    /// Recomputes utilization.
    pub async fn recalculate(&mut self) -> Outcome {
        let api = self.api;
        self.run(Mutation::RecalculateBudget, false, budget::recalculate(api))
            .await
    }
}

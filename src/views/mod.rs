//! View layer - data-fetch coordinators and dialog flows behind each screen.
//!
//! Every screen owns its state and a [`Notifications`] list. Reads run concurrently and fail
//! independently. Every successful [`Mutation`] is followed, strictly after its success, by a
//! re-read of exactly the [`Query`] set it affects.

/// Budget overview, member balances, and recent expenses
pub mod dashboard;
/// Expense board with dialogs and payment history
pub mod expenses;
/// Login, registration, and password reset flow
pub mod login;
/// Member budget page
pub mod member_budget;

use crate::{
    errors::{Error, Result},
    session::{Action, Role},
};
use std::future::Future;
use tracing::{error, info, warn};

/// Notice shown after the first read of a screen fails.
pub const FAILED_TO_INITIALIZE: &str = "Failed to initialize data";

/// Severity of a notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// Operation succeeded
    Success,
    /// Operation failed
    Error,
}

/// Transient message for the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Severity
    pub level: Level,
    /// Text
    pub text: String,
}

/// Ordered list of notices a screen produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Notifications {
    notices: Vec<Notice>,
}

impl Notifications {
    /// Adds a success notice.
    pub fn success(&mut self, text: impl Into<String>) {
        let text = text.into();
        info!("{text}");
        self.notices.push(Notice {
            level: Level::Success,
            text,
        });
    }

    /// Adds an error notice.
    pub fn error(&mut self, text: impl Into<String>) {
        let text = text.into();
        error!("{text}");
        self.notices.push(Notice {
            level: Level::Error,
            text,
        });
    }

    /// All notices so far.
    #[must_use]
    pub fn all(&self) -> &[Notice] {
        &self.notices
    }

    /// Texts of error notices, oldest first.
    #[must_use]
    pub fn errors(&self) -> Vec<&str> {
        self.texts(Level::Error)
    }

    /// Texts of success notices, oldest first.
    #[must_use]
    pub fn successes(&self) -> Vec<&str> {
        self.texts(Level::Success)
    }

    fn texts(&self, level: Level) -> Vec<&str> {
        self.notices
            .iter()
            .filter(|n| n.level == level)
            .map(|n| n.text.as_str())
            .collect()
    }

    /// Removes and returns every notice.
    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

/// Reads a screen can refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Query {
    /// `GET /api/expenses`
    Expenses,
    /// `GET /api/members`
    Members,
    /// `GET /api/expenses/summary`
    Summary,
    /// `GET /api/budget/status`
    BudgetStatus,
    /// `GET /api/budget/members`
    MemberBudgets,
}

impl Query {
    /// Notice shown when this read fails and the server gives no message.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Expenses => "Failed to fetch expenses",
            Self::Members => "Failed to fetch members",
            Self::Summary => "Failed to fetch summary",
            Self::BudgetStatus | Self::MemberBudgets => "Failed to fetch budget data",
        }
    }
}

/// Writes a screen can issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mutation {
    /// Create an expense
    AddExpense,
    /// Edit an expense
    UpdateExpense,
    /// Delete an expense
    DeleteExpense,
    /// Record a payment against an expense
    RecordPayment,
    /// Create a member
    AddMember,
    /// Change a member's monthly budget
    EditMemberBudget,
    /// Start a new budget month
    InitializeBudget,
    /// Recompute utilization
    RecalculateBudget,
}

impl Mutation {
    /// Reads whose data this write can change.
    #[must_use]
    pub const fn affects(self) -> &'static [Query] {
        match self {
            Self::AddExpense | Self::UpdateExpense | Self::DeleteExpense | Self::RecordPayment => {
                &[Query::Expenses, Query::Summary]
            }
            Self::AddMember => &[Query::Members],
            Self::EditMemberBudget | Self::InitializeBudget | Self::RecalculateBudget => {
                &[Query::MemberBudgets, Query::BudgetStatus]
            }
        }
    }

    /// Role-gated action this write corresponds to.
    #[must_use]
    pub const fn action(self) -> Action {
        match self {
            Self::AddExpense => Action::AddExpense,
            Self::UpdateExpense => Action::EditExpense,
            Self::DeleteExpense => Action::DeleteExpense,
            Self::RecordPayment => Action::RecordPayment,
            Self::AddMember => Action::AddMember,
            Self::EditMemberBudget => Action::EditBudget,
            Self::InitializeBudget => Action::InitializeBudget,
            Self::RecalculateBudget => Action::RecalculateBudget,
        }
    }

    /// Notice shown on success.
    #[must_use]
    pub const fn success_message(self) -> &'static str {
        match self {
            Self::AddExpense => "Expense added successfully!",
            Self::UpdateExpense => "Expense updated successfully!",
            Self::DeleteExpense => "Expense deleted successfully!",
            Self::RecordPayment => "Payment recorded successfully!",
            Self::AddMember => "Member added successfully!",
            Self::EditMemberBudget => "Budget updated successfully",
            Self::InitializeBudget => "New month budget initialized successfully",
            Self::RecalculateBudget => "Budget recalculated successfully",
        }
    }

    /// Notice shown on failure when the server gives no message.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::AddExpense => "Failed to add expense",
            Self::UpdateExpense => "Failed to update expense",
            Self::DeleteExpense => "Failed to delete expense",
            Self::RecordPayment => "Failed to clear expense",
            Self::AddMember => "Failed to add member",
            Self::EditMemberBudget => "Failed to update budget",
            Self::InitializeBudget => "Failed to initialize budget",
            Self::RecalculateBudget => "Failed to recalculate budget",
        }
    }
}

/// Submission phase of a dialog.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for input
    #[default]
    Idle,
    /// Request in flight; further submits are ignored
    Submitting,
}

/// Open/closed state plus submission phase of one dialog.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dialog {
    /// Whether the dialog is shown
    pub open: bool,
    /// Submission phase
    pub phase: Phase,
}

impl Dialog {
    /// Shows the dialog.
    pub fn open(&mut self) {
        self.open = true;
        self.phase = Phase::Idle;
    }

    /// Hides the dialog.
    pub fn close(&mut self) {
        self.open = false;
        self.phase = Phase::Idle;
    }

    /// Moves to [`Phase::Submitting`]; false when a submission is already in flight.
    pub fn begin_submit(&mut self) -> bool {
        if self.phase == Phase::Submitting {
            return false;
        }
        self.open = true;
        self.phase = Phase::Submitting;
        true
    }

    /// Ends a submission: closes on success, stays open on failure.
    pub fn finish_submit(&mut self, succeeded: bool) {
        self.phase = Phase::Idle;
        if succeeded {
            self.open = false;
        }
    }
}

/// Result of a mutation handler.
#[derive(Debug)]
pub enum Outcome {
    /// The write succeeded and its reads were refreshed
    Succeeded,
    /// The write was refused or failed; a notice was added
    Failed(Error),
    /// A submission was already in flight
    Skipped,
}

impl Outcome {
    /// True for [`Outcome::Succeeded`].
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// True when the failure means the session is gone.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Failed(e) if e.requires_login())
    }
}

/// Runs one write through the role gate and the dialog state machine.
///
/// The caller refreshes `mutation.affects()` when this returns [`Outcome::Succeeded`]; nothing
/// is refreshed after a failure.
pub(crate) async fn submit<F>(
    role: Role,
    mutation: Mutation,
    mut dialog: Option<&mut Dialog>,
    notices: &mut Notifications,
    operation: F,
) -> Outcome
where
    F: Future<Output = Result<()>>,
{
    let action = mutation.action();
    if !role.permits(action) {
        warn!("{role} may not {}", action.label());
        let denied = Error::PermissionDenied {
            action: action.label().to_string(),
        };
        notices.error(denied.user_message(mutation.failure_message()));
        return Outcome::Failed(denied);
    }

    if let Some(dialog) = dialog.as_deref_mut() {
        if !dialog.begin_submit() {
            return Outcome::Skipped;
        }
    }

    let result = operation.await;
    if let Some(dialog) = dialog {
        dialog.finish_submit(result.is_ok());
    }

    match result {
        Ok(()) => {
            notices.success(mutation.success_message());
            Outcome::Succeeded
        }
        Err(e) => {
            notices.error(e.user_message(mutation.failure_message()));
            Outcome::Failed(e)
        }
    }
}

/// Stores a read's result in `slot`, or reports the failure and leaves `slot` alone.
///
/// Returns the error so callers can decide about login redirects.
pub(crate) fn apply<T>(
    slot: &mut T,
    result: Option<Result<T>>,
    query: Query,
    notices: &mut Notifications,
) -> Option<Error> {
    match result? {
        Ok(value) => {
            *slot = value;
            None
        }
        Err(e) => {
            notices.error(e.user_message(query.failure_message()));
            Some(e)
        }
    }
}

/// Awaits `future` only when `wanted`; an unwanted read sends no request.
pub(crate) async fn when<F: Future>(wanted: bool, future: F) -> Option<F::Output> {
    if wanted { Some(future.await) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expense_mutations_refetch_list_and_summary_only() {
        for mutation in [
            Mutation::AddExpense,
            Mutation::UpdateExpense,
            Mutation::DeleteExpense,
            Mutation::RecordPayment,
        ] {
            assert_eq!(mutation.affects(), &[Query::Expenses, Query::Summary]);
            assert!(!mutation.affects().contains(&Query::Members));
        }
    }

    #[test]
    fn test_other_refetch_sets() {
        assert_eq!(Mutation::AddMember.affects(), &[Query::Members]);
        for mutation in [
            Mutation::EditMemberBudget,
            Mutation::InitializeBudget,
            Mutation::RecalculateBudget,
        ] {
            assert!(mutation.affects().contains(&Query::BudgetStatus));
            assert!(mutation.affects().contains(&Query::MemberBudgets));
        }
    }

    #[test]
    fn test_dialog_state_machine() {
        let mut dialog = Dialog::default();
        dialog.open();
        assert!(dialog.begin_submit());
        assert!(!dialog.begin_submit());

        dialog.finish_submit(false);
        assert!(dialog.open);
        assert_eq!(dialog.phase, Phase::Idle);

        assert!(dialog.begin_submit());
        dialog.finish_submit(true);
        assert!(!dialog.open);
    }

    #[test]
    fn test_apply_keeps_previous_state_on_failure() {
        let mut notices = Notifications::default();
        let mut slot = vec![1, 2];

        let err = apply(
            &mut slot,
            Some(Err(Error::Api {
                status: 500,
                message: None,
            })),
            Query::Members,
            &mut notices,
        );
        assert!(err.is_some());
        assert_eq!(slot, vec![1, 2]);
        assert_eq!(notices.errors(), vec!["Failed to fetch members"]);

        assert!(apply(&mut slot, Some(Ok(vec![3])), Query::Members, &mut notices).is_none());
        assert_eq!(slot, vec![3]);
        assert!(apply(&mut slot, None, Query::Members, &mut notices).is_none());
        assert_eq!(slot, vec![3]);
    }

    #[tokio::test]
    async fn test_submit_denied_for_user_role() {
        let mut notices = Notifications::default();
        let mut dialog = Dialog::default();
        dialog.open();

        let outcome = submit(
            Role::User,
            Mutation::DeleteExpense,
            Some(&mut dialog),
            &mut notices,
            async { Ok(()) },
        )
        .await;

        assert!(matches!(outcome, Outcome::Failed(Error::PermissionDenied { .. })));
        assert_eq!(notices.errors(), vec!["Permission denied"]);
        assert_eq!(dialog.phase, Phase::Idle);
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_dialog_open() {
        let mut notices = Notifications::default();
        let mut dialog = Dialog::default();
        dialog.open();

        let outcome = submit(
            Role::Admin,
            Mutation::AddExpense,
            Some(&mut dialog),
            &mut notices,
            async {
                Err(Error::Api {
                    status: 500,
                    message: None,
                })
            },
        )
        .await;

        assert!(!outcome.succeeded());
        assert!(dialog.open);
        assert_eq!(notices.errors(), vec!["Failed to add expense"]);
    }

    #[tokio::test]
    async fn test_submit_success_closes_dialog() {
        let mut notices = Notifications::default();
        let mut dialog = Dialog::default();
        dialog.open();

        let outcome = submit(
            Role::User,
            Mutation::RecordPayment,
            Some(&mut dialog),
            &mut notices,
            async { Ok(()) },
        )
        .await;

        assert!(outcome.succeeded());
        assert!(!dialog.open);
        assert_eq!(notices.successes(), vec!["Payment recorded successfully!"]);
    }
}

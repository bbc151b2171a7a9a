//! Expense board - expenses, members, and balances with the add/edit/pay/member dialogs.

use super::{
    Dialog, FAILED_TO_INITIALIZE, Mutation, Notifications, Outcome, Query, apply, submit, when,
};
use crate::{
    core::{expenses, members},
    entities::{Expense, ExpenseDraft, Member, MemberBalance, Payment, PaymentDraft},
    errors::{Error, Result},
    http::{ApiClient, Transport},
    session::{Action, ActiveSession, Bootstrap, Role},
};
use chrono::{DateTime, Utc};
use std::future::Future;
use tracing::{info, instrument, warn};

/// Reads the board issues on mount.
pub const BOARD_QUERIES: [Query; 3] = [Query::Expenses, Query::Members, Query::Summary];

/// Payment history currently shown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentHistory {
    /// Expense the payments belong to
    pub expense_id: i64,
    /// Payments, as returned by the server
    pub payments: Vec<Payment>,
}

/// Dialogs on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoardDialog {
    /// Add or edit an expense
    Expense,
    /// Add a member
    Member,
    /// Record a payment
    Payment,
}

/// State of the expense board.
#[derive(Debug)]
pub struct ExpenseBoard<'a, T> {
    api: &'a ApiClient<T>,
    session: Option<ActiveSession>,
    /// Expenses from the last successful read
    pub expenses: Vec<Expense>,
    /// Members from the last successful read
    pub members: Vec<Member>,
    /// Balances from the last successful read
    pub summary: Vec<MemberBalance>,
    /// Open payment history, if any
    pub payments: Option<PaymentHistory>,
    /// Add/edit expense dialog
    pub expense_dialog: Dialog,
    /// Add member dialog
    pub member_dialog: Dialog,
    /// Record payment dialog
    pub payment_dialog: Dialog,
    /// Notices produced so far
    pub notices: Notifications,
    /// Set once the session is gone and the user must log in again
    pub needs_login: bool,
}

impl<'a, T: Transport> ExpenseBoard<'a, T> {
    /// Creates an empty board over `api`.
    pub fn new(api: &'a ApiClient<T>) -> Self {
        Self {
            api,
            session: None,
            expenses: Vec::new(),
            members: Vec::new(),
            summary: Vec::new(),
            payments: None,
            expense_dialog: Dialog::default(),
            member_dialog: Dialog::default(),
            payment_dialog: Dialog::default(),
            notices: Notifications::default(),
            needs_login: false,
        }
    }

    /// Role used for gating; [`Role::User`] until mounted.
    #[must_use]
    pub fn role(&self) -> Role {
        self.session.as_ref().map_or(Role::User, |s| s.role)
    }

    /// Session the board was mounted with.
    #[must_use]
    pub const fn session(&self) -> Option<&ActiveSession> {
        self.session.as_ref()
    }

    /// Whether the current role may perform `action`; used to hide controls.
    #[must_use]
    pub fn can(&self, action: Action) -> bool {
        self.role().permits(action)
    }

    /// Validates the session and loads everything the board shows.
    ///
    /// # Errors
    /// Only storage failures; a bad session yields [`Bootstrap::RedirectToLogin`].
    #[instrument(skip(self))]
    pub async fn mount(&mut self, now: DateTime<Utc>) -> Result<Bootstrap> {
        let verdict = self.api.session().bootstrap(now)?;
        match &verdict {
            Bootstrap::Ready(active) => {
                info!("Expense board mounted as {}", active.role);
                self.session = Some(active.clone());
                if self.refresh(&BOARD_QUERIES).await > 0 {
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
        let (expense_list, member_list, summary) = tokio::join!(
            when(
                queries.contains(&Query::Expenses),
                expenses::list_expenses(api)
            ),
            when(
                queries.contains(&Query::Members),
                members::list_members(api)
            ),
            when(
                queries.contains(&Query::Summary),
                expenses::member_summary(api)
            ),
        );

        let failures = [
            apply(&mut self.expenses, expense_list, Query::Expenses, &mut self.notices),
            apply(&mut self.members, member_list, Query::Members, &mut self.notices),
            apply(&mut self.summary, summary, Query::Summary, &mut self.notices),
        ];
        self.note_failures(failures.iter().flatten())
    }

    fn note_failures<'e>(&mut self, errors: impl Iterator<Item = &'e Error>) -> usize {
        let mut count = 0;
        for e in errors {
            count += 1;
            if e.requires_login() {
                self.needs_login = true;
            }
        }
        count
    }

    /// Shows a dialog.
    pub fn open(&mut self, dialog: BoardDialog) {
        self.dialog_mut(dialog).open();
    }

    fn dialog_mut(&mut self, dialog: BoardDialog) -> &mut Dialog {
        match dialog {
            BoardDialog::Expense => &mut self.expense_dialog,
            BoardDialog::Member => &mut self.member_dialog,
            BoardDialog::Payment => &mut self.payment_dialog,
        }
    }

    async fn run<F>(&mut self, mutation: Mutation, dialog: Option<BoardDialog>, operation: F) -> Outcome
    where
        F: Future<Output = Result<()>>,
    {
        let role = self.role();
        let outcome = match dialog {
            Some(kind) => {
                let dialog = match kind {
                    BoardDialog::Expense => &mut self.expense_dialog,
                    BoardDialog::Member => &mut self.member_dialog,
                    BoardDialog::Payment => &mut self.payment_dialog,
                };
                submit(role, mutation, Some(dialog), &mut self.notices, operation).await
            }
            None => submit(role, mutation, None, &mut self.notices, operation).await,
        };

        if outcome.requires_login() {
            self.needs_login = true;
        }
        if outcome.succeeded() {
            self.refresh(mutation.affects()).await;
        }
        outcome
    }

    /// Submits the add-expense dialog.
    pub async fn add_expense(&mut self, draft: &ExpenseDraft) -> Outcome {
        let api = self.api;
        self.run(
            Mutation::AddExpense,
            Some(BoardDialog::Expense),
            expenses::create_expense(api, draft),
        )
        .await
    }

    /// Submits the edit-expense dialog.
    pub async fn update_expense(&mut self, expense_id: i64, draft: &ExpenseDraft) -> Outcome {
        let api = self.api;
        self.run(
            Mutation::UpdateExpense,
            Some(BoardDialog::Expense),
            expenses::update_expense(api, expense_id, draft),
        )
        .await
    }

    /// Deletes an expense.
    pub async fn delete_expense(&mut self, expense_id: i64) -> Outcome {
        let api = self.api;
        self.run(
            Mutation::DeleteExpense,
            None,
            expenses::delete_expense(api, expense_id),
        )
        .await
    }

    /// Submits the record-payment dialog.
    pub async fn record_payment(&mut self, expense_id: i64, payment: &PaymentDraft) -> Outcome {
        let api = self.api;
        self.run(
            Mutation::RecordPayment,
            Some(BoardDialog::Payment),
            expenses::record_payment(api, expense_id, payment),
        )
        .await
    }

    /// Submits the add-member dialog.
    pub async fn add_member(&mut self, name: &str) -> Outcome {
        let api = self.api;
        self.run(
            Mutation::AddMember,
            Some(BoardDialog::Member),
            members::create_member(api, name),
        )
        .await
    }

    /// Loads and shows the payment history of one expense.
    pub async fn show_payments(&mut self, expense_id: i64) -> bool {
        match expenses::payment_history(self.api, expense_id).await {
            Ok(payments) => {
                self.payments = Some(PaymentHistory {
                    expense_id,
                    payments,
                });
                true
            }
            Err(e) => {
                self.notices
                    .error(e.user_message("Failed to fetch payment history"));
                if e.requires_login() {
                    self.needs_login = true;
                }
                false
            }
        }
    }

    /// Expense by id from the last read.
    #[must_use]
    pub fn expense(&self, expense_id: i64) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id == expense_id)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::http::Method;
    use crate::session::LoginReason;
    use crate::test_utils::{admin_token, init_test_tracing, make_token, mock_client, user_token};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::{Value, json};

    fn expense_json(cleared_amount: i64) -> Value {
        json!({
            "id": 7,
            "memberId": 3,
            "memberName": "Sam",
            "description": "Groceries",
            "amount": 450,
            "date": "2024-05-01",
            "clearedAmount": cleared_amount,
            "cleared": false
        })
    }

    fn script_reads(api: &ApiClient<crate::test_utils::MockTransport>) {
        let mock = api.transport();
        mock.respond(Method::Get, "/api/expenses", 200, json!([expense_json(0)]));
        mock.respond(Method::Get, "/api/members", 200, json!([{"id": 3, "name": "Sam"}]));
        mock.respond(
            Method::Get,
            "/api/expenses/summary",
            200,
            json!({"Sam": {"total": 450, "cleared": 0, "remaining": 450}}),
        );
    }

    fn groceries() -> ExpenseDraft {
        ExpenseDraft {
            member_id: 3,
            description: "Groceries".to_string(),
            amount: Decimal::from(450),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_mount_loads_all_reads_once() -> Result<()> {
        let api = mock_client(&admin_token());
        script_reads(&api);

        let mut board = ExpenseBoard::new(&api);
        let verdict = board.mount(Utc::now()).await?;

        assert!(matches!(verdict, Bootstrap::Ready(_)));
        assert_eq!(board.role(), Role::Admin);
        assert!(board.can(Action::DeleteExpense));
        assert_eq!(board.expenses.len(), 1);
        assert_eq!(board.members[0].name, "Sam");
        assert_eq!(board.summary[0].remaining, Decimal::from(450));
        assert!(board.notices.all().is_empty());
        for path in ["/api/expenses", "/api/members", "/api/expenses/summary"] {
            assert_eq!(api.transport().count(Method::Get, path), 1);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_expired_token_redirects_without_requests() -> Result<()> {
        let expired = make_token(&json!({"sub": "a@b.c", "exp": 1, "roles": ["ADMIN"]}));
        let api = mock_client(&expired);

        let mut board = ExpenseBoard::new(&api);
        let verdict = board.mount(Utc::now()).await?;

        assert_eq!(verdict, Bootstrap::RedirectToLogin(LoginReason::Expired));
        assert!(board.needs_login);
        assert!(api.session().token()?.is_none());
        assert!(api.transport().requests().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_reads_fail_independently() -> Result<()> {
        let api = mock_client(&admin_token());
        script_reads(&api);
        api.transport().fail(Method::Get, "/api/members");

        let mut board = ExpenseBoard::new(&api);
        board.mount(Utc::now()).await?;

        assert_eq!(board.expenses.len(), 1);
        assert_eq!(board.summary.len(), 1);
        assert!(board.members.is_empty());
        assert_eq!(
            board.notices.errors(),
            vec!["Failed to fetch members", FAILED_TO_INITIALIZE]
        );
        assert!(!board.needs_login);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_expense_refetches_list_and_summary_only() -> Result<()> {
        let api = mock_client(&admin_token());
        script_reads(&api);
        let mock = api.transport();
        mock.respond(Method::Post, "/api/expenses", 201, json!({"id": 8}));
        let mut second = expense_json(0);
        second["id"] = json!(8);
        second["description"] = json!("Rent");
        mock.respond_after(
            (Method::Post, "/api/expenses"),
            Method::Get,
            "/api/expenses",
            200,
            json!([expense_json(0), second]),
        );

        let mut board = ExpenseBoard::new(&api);
        board.mount(Utc::now()).await?;
        board.open(BoardDialog::Expense);
        let outcome = board.add_expense(&groceries()).await;

        assert!(outcome.succeeded());
        assert!(!board.expense_dialog.open);
        assert_eq!(board.expenses.len(), 2);
        assert_eq!(board.expense(8).unwrap().description, "Rent");
        assert_eq!(mock.count(Method::Get, "/api/expenses"), 2);
        assert_eq!(mock.count(Method::Get, "/api/expenses/summary"), 2);
        assert_eq!(mock.count(Method::Get, "/api/members"), 1);

        let post = &mock.requests_to(Method::Post, "/api/expenses")[0];
        assert_eq!(post.body.as_ref().unwrap()["date"], json!("2024-05-01"));
        assert_eq!(board.notices.successes(), vec!["Expense added successfully!"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_expense_refetches_list_and_summary_only() -> Result<()> {
        let api = mock_client(&admin_token());
        script_reads(&api);
        let mock = api.transport();
        mock.respond(Method::Put, "/api/expenses/7", 200, json!({}));
        let mut edited = expense_json(0);
        edited["description"] = json!("Groceries and wine");
        edited["amount"] = json!(520);
        mock.respond_after(
            (Method::Put, "/api/expenses/7"),
            Method::Get,
            "/api/expenses",
            200,
            json!([edited]),
        );
        mock.respond_after(
            (Method::Put, "/api/expenses/7"),
            Method::Get,
            "/api/expenses/summary",
            200,
            json!({"Sam": {"total": 520, "cleared": 0, "remaining": 520}}),
        );

        let mut board = ExpenseBoard::new(&api);
        board.mount(Utc::now()).await?;
        board.open(BoardDialog::Expense);
        let outcome = board.update_expense(7, &groceries()).await;

        assert!(outcome.succeeded());
        assert!(!board.expense_dialog.open);
        let expense = board.expense(7).unwrap();
        assert_eq!(expense.description, "Groceries and wine");
        assert_eq!(expense.amount, Decimal::from(520));
        assert_eq!(board.summary[0].remaining, Decimal::from(520));
        assert_eq!(mock.count(Method::Put, "/api/expenses/7"), 1);
        assert_eq!(mock.count(Method::Get, "/api/expenses"), 2);
        assert_eq!(mock.count(Method::Get, "/api/expenses/summary"), 2);
        assert_eq!(mock.count(Method::Get, "/api/members"), 1);
        assert_eq!(board.notices.successes(), vec!["Expense updated successfully!"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_expense_refetches_list_and_summary_only() -> Result<()> {
        let api = mock_client(&admin_token());
        script_reads(&api);
        let mock = api.transport();
        mock.respond(Method::Delete, "/api/expenses/7", 204, json!(null));
        mock.respond_after(
            (Method::Delete, "/api/expenses/7"),
            Method::Get,
            "/api/expenses",
            200,
            json!([]),
        );
        mock.respond_after(
            (Method::Delete, "/api/expenses/7"),
            Method::Get,
            "/api/expenses/summary",
            200,
            json!({}),
        );

        let mut board = ExpenseBoard::new(&api);
        board.mount(Utc::now()).await?;
        assert!(board.expense(7).is_some());
        let outcome = board.delete_expense(7).await;

        assert!(outcome.succeeded());
        assert!(board.expenses.is_empty());
        assert!(board.summary.is_empty());
        assert_eq!(board.members.len(), 1);
        assert_eq!(mock.count(Method::Delete, "/api/expenses/7"), 1);
        assert_eq!(mock.count(Method::Get, "/api/expenses"), 2);
        assert_eq!(mock.count(Method::Get, "/api/expenses/summary"), 2);
        assert_eq!(mock.count(Method::Get, "/api/members"), 1);
        assert_eq!(board.notices.successes(), vec!["Expense deleted successfully!"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_null_clearing_state_does_not_break_the_list() -> Result<()> {
        let api = mock_client(&admin_token());
        script_reads(&api);
        let mut unpaid = expense_json(0);
        unpaid["clearedAmount"] = Value::Null;
        unpaid["cleared"] = Value::Null;
        api.transport()
            .respond(Method::Get, "/api/expenses", 200, json!([unpaid, expense_json(450)]));

        let mut board = ExpenseBoard::new(&api);
        board.mount(Utc::now()).await?;

        assert!(board.notices.errors().is_empty());
        assert_eq!(board.expenses.len(), 2);
        assert_eq!(board.expenses[0].cleared_amount, Decimal::ZERO);
        assert!(!board.expenses[0].cleared);
        Ok(())
    }

    #[tokio::test]
    async fn test_partial_payment_reflects_server_state() -> Result<()> {
        let api = mock_client(&user_token());
        script_reads(&api);
        let mock = api.transport();
        mock.respond(Method::Put, "/api/expenses/clear/7", 200, json!({}));
        mock.respond_after(
            (Method::Put, "/api/expenses/clear/7"),
            Method::Get,
            "/api/expenses",
            200,
            json!([expense_json(100)]),
        );
        mock.respond_after(
            (Method::Put, "/api/expenses/clear/7"),
            Method::Get,
            "/api/expenses/summary",
            200,
            json!({"Sam": {"total": 450, "cleared": 100, "remaining": 350}}),
        );

        let mut board = ExpenseBoard::new(&api);
        board.mount(Utc::now()).await?;
        board.open(BoardDialog::Payment);
        let outcome = board
            .record_payment(
                7,
                &PaymentDraft {
                    member_id: 3,
                    amount: Decimal::from(100),
                },
            )
            .await;

        assert!(outcome.succeeded());
        let expense = board.expense(7).unwrap();
        assert_eq!(expense.cleared_amount, Decimal::from(100));
        assert!(!expense.cleared);
        assert_eq!(expense.remaining(), Decimal::from(350));
        assert!(expense.is_consistent());
        assert_eq!(board.summary[0].remaining, Decimal::from(350));
        Ok(())
    }

    #[tokio::test]
    async fn test_user_cannot_delete() -> Result<()> {
        let api = mock_client(&user_token());
        script_reads(&api);

        let mut board = ExpenseBoard::new(&api);
        board.mount(Utc::now()).await?;
        assert!(!board.can(Action::DeleteExpense));
        assert!(board.can(Action::RecordPayment));

        let outcome = board.delete_expense(7).await;
        assert!(!outcome.succeeded());
        assert_eq!(board.notices.errors(), vec!["Permission denied"]);
        assert_eq!(api.transport().count(Method::Delete, "/api/expenses/7"), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_write_keeps_dialog_and_skips_refetch() -> Result<()> {
        let api = mock_client(&admin_token());
        script_reads(&api);
        api.transport().respond(
            Method::Post,
            "/api/members",
            400,
            json!({"message": "Member already exists"}),
        );

        let mut board = ExpenseBoard::new(&api);
        board.mount(Utc::now()).await?;
        board.open(BoardDialog::Member);
        let outcome = board.add_member("Sam").await;

        assert!(!outcome.succeeded());
        assert!(board.member_dialog.open);
        assert_eq!(board.notices.errors(), vec!["Member already exists"]);
        assert_eq!(api.transport().count(Method::Get, "/api/members"), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent() -> Result<()> {
        let api = mock_client(&admin_token());
        script_reads(&api);

        let mut board = ExpenseBoard::new(&api);
        board.mount(Utc::now()).await?;
        let (expenses, members, summary) = (
            board.expenses.clone(),
            board.members.clone(),
            board.summary.clone(),
        );

        assert_eq!(board.refresh(&BOARD_QUERIES).await, 0);
        assert_eq!(board.expenses, expenses);
        assert_eq!(board.members, members);
        assert_eq!(board.summary, summary);
        Ok(())
    }

    #[tokio::test]
    async fn test_unrecoverable_401_requires_login() -> Result<()> {
        init_test_tracing();
        let api = mock_client(&admin_token());
        script_reads(&api);
        api.transport()
            .respond(Method::Get, "/api/expenses", 401, json!({}));
        api.transport()
            .respond(Method::Post, "/auth/refresh", 401, json!({}));

        let mut board = ExpenseBoard::new(&api);
        board.mount(Utc::now()).await?;

        assert!(board.needs_login);
        assert!(
            board
                .notices
                .errors()
                .contains(&"Session expired, please log in again")
        );
        assert!(api.session().token()?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_payment_history() -> Result<()> {
        let api = mock_client(&user_token());
        api.transport().respond(
            Method::Get,
            "/api/expenses/7/payments",
            200,
            json!([{"id": 1, "amount": 100, "clearedBy": "Sam"}]),
        );

        let mut board = ExpenseBoard::new(&api);
        assert!(board.show_payments(7).await);
        let history = board.payments.unwrap();
        assert_eq!(history.expense_id, 7);
        assert_eq!(history.payments[0].amount, Decimal::from(100));
        Ok(())
    }
}

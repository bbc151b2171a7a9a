//! Command-line front-end - one subcommand per screen action.
//!
//! Each command mounts the matching view, performs its action, and returns a [`Report`] with
//! the rendered output plus the notices the view produced. Nothing here talks to the server
//! directly.

/// Plain-text tables and summaries
pub mod render;

use crate::{
    core::auth,
    entities::{ExpenseDraft, PaymentDraft},
    errors::Result,
    http::{ApiClient, Transport},
    session::Bootstrap,
    views::{
        Level, Notice, Notifications,
        dashboard::Dashboard,
        expenses::{BoardDialog, ExpenseBoard},
        login::{LoginFlow, Stage},
        member_budget::MemberBudgetPage,
    },
};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::debug;

/// Shared household expenses from the terminal.
#[derive(Debug, Parser)]
#[command(name = "expense-buddy", version, about)]
#[command(
    after_help = "Environment:\n  API_BASE_URL       Expense service address\n  API_TIMEOUT_SECS   Request timeout in seconds\n  SESSION_FILE       Where the session is kept\n  EXPENSE_BUDDY_PASSWORD  Password for login, register, and reset-password\n  RUST_LOG           Log filter"
)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the session
    Login {
        /// Account email
        #[arg(long)]
        email: String,
        /// Account password, or set EXPENSE_BUDDY_PASSWORD
        #[arg(long, env = "EXPENSE_BUDDY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Create an account
    Register {
        /// Display name
        #[arg(long)]
        name: String,
        /// Account email
        #[arg(long)]
        email: String,
        /// Password for the new account, or set EXPENSE_BUDDY_PASSWORD
        #[arg(long, env = "EXPENSE_BUDDY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Email a one-time password for a reset
    ForgotPassword {
        /// Account email
        #[arg(long)]
        email: String,
    },
    /// Set a new password with the emailed OTP
    ResetPassword {
        /// Account email
        #[arg(long)]
        email: String,
        /// One-time password from the email
        #[arg(long)]
        otp: String,
        /// New password, or set EXPENSE_BUDDY_PASSWORD
        #[arg(long, env = "EXPENSE_BUDDY_PASSWORD", hide_env_values = true)]
        password: String,
        /// New password again, or set EXPENSE_BUDDY_PASSWORD
        #[arg(long, env = "EXPENSE_BUDDY_PASSWORD", hide_env_values = true)]
        confirm: String,
    },
    /// Show the signed-in account and role
    Whoami,
    /// Budget, balances, and recent expenses
    Dashboard,
    /// Expense list and edits
    Expenses {
        /// Expense action
        #[command(subcommand)]
        command: ExpenseCommand,
    },
    /// Household members
    Members {
        /// Member action
        #[command(subcommand)]
        command: MemberCommand,
    },
    /// Per-member balances
    Summary,
    /// Monthly budget
    Budget {
        /// Budget action
        #[command(subcommand)]
        command: BudgetCommand,
    },
}

/// Fields of an expense form.
#[derive(Debug, Args)]
pub struct ExpenseForm {
    /// Member the expense belongs to
    #[arg(long)]
    pub member: i64,
    /// What the money was spent on
    #[arg(long)]
    pub description: String,
    /// Full amount
    #[arg(long)]
    pub amount: Decimal,
    /// `YYYY-MM-DD`, defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

impl ExpenseForm {
    fn into_draft(self, today: NaiveDate) -> ExpenseDraft {
        ExpenseDraft {
            member_id: self.member,
            description: self.description,
            amount: self.amount,
            date: self.date.unwrap_or(today),
        }
    }
}

/// `expenses` subcommands.
#[derive(Debug, Subcommand)]
pub enum ExpenseCommand {
    /// List every expense
    List,
    /// Add an expense (admin)
    Add(ExpenseForm),
    /// Edit an expense (admin)
    Edit {
        /// Expense to edit
        id: i64,
        #[command(flatten)]
        form: ExpenseForm,
    },
    /// Delete an expense (admin)
    Delete {
        /// Expense to delete
        id: i64,
    },
    /// Record a payment against an expense
    Pay {
        /// Expense being paid
        id: i64,
        /// Member making the payment
        #[arg(long)]
        member: i64,
        /// Amount paid
        #[arg(long)]
        amount: Decimal,
    },
    /// Payment history of an expense
    History {
        /// Expense whose payments to show
        id: i64,
    },
}

/// `members` subcommands.
#[derive(Debug, Subcommand)]
pub enum MemberCommand {
    /// List members
    List,
    /// Add a member (admin)
    Add {
        /// Name of the new member
        name: String,
    },
}

/// `budget` subcommands.
#[derive(Debug, Subcommand)]
pub enum BudgetCommand {
    /// Current month snapshot
    Status,
    /// Per-member budgets
    Members,
    /// Set a member's monthly budget
    Set {
        /// Member whose budget changes
        member_id: i64,
        /// New monthly budget
        amount: Decimal,
    },
    /// Start a new budget month
    Init,
    /// Recompute utilization
    Recalc,
}

/// Result of one command.
#[derive(Debug, Default)]
pub struct Report {
    /// Rendered output
    pub output: String,
    /// Notices produced by the view
    pub notices: Vec<Notice>,
    /// The session is gone; the user has to run `login`
    pub needs_login: bool,
}

impl Report {
    fn new(output: String, notices: &mut Notifications, needs_login: bool) -> Self {
        Self {
            output,
            notices: notices.drain(),
            needs_login,
        }
    }

    fn redirect() -> Self {
        Self {
            needs_login: true,
            ..Self::default()
        }
    }

    /// True when nothing went wrong.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.needs_login && self.notices.iter().all(|n| n.level == Level::Success)
    }
}

/// Runs one command against `api`.
///
/// # Errors
/// Only session storage and formatting failures; server errors end up as notices.
pub async fn run<T: Transport>(
    command: Command,
    api: &ApiClient<T>,
    now: DateTime<Utc>,
) -> Result<Report> {
    debug!("Running command at {now}");
    match command {
        Command::Login { email, password } => {
            let mut flow = LoginFlow::new(api);
            let output = if flow.login(&email, &password).await {
                flow.signed_in
                    .as_ref()
                    .map(|o| format!("Signed in as {} ({})\n", o.name.as_deref().unwrap_or(&email), o.role))
                    .unwrap_or_default()
            } else {
                String::new()
            };
            Ok(Report::new(output, &mut flow.notices, false))
        }
        Command::Logout => {
            auth::logout(api)?;
            Ok(Report {
                output: "Signed out\n".to_string(),
                ..Report::default()
            })
        }
        Command::Register {
            name,
            email,
            password,
        } => {
            let mut flow = LoginFlow::new(api);
            flow.register(&name, &email, &password).await;
            Ok(Report::new(String::new(), &mut flow.notices, false))
        }
        Command::ForgotPassword { email } => {
            let mut flow = LoginFlow::new(api);
            flow.forgot_password();
            flow.request_otp(&email).await;
            Ok(Report::new(String::new(), &mut flow.notices, false))
        }
        Command::ResetPassword {
            email,
            otp,
            password,
            confirm,
        } => {
            let mut flow = LoginFlow::new(api);
            flow.stage = Stage::ResetPassword { email };
            flow.reset_password(&otp, &password, &confirm).await;
            Ok(Report::new(String::new(), &mut flow.notices, false))
        }
        Command::Whoami => match api.session().bootstrap(now)? {
            Bootstrap::Ready(active) => Ok(Report {
                output: render::whoami(&active)?,
                ..Report::default()
            }),
            Bootstrap::RedirectToLogin(_) => Ok(Report::redirect()),
        },
        Command::Dashboard => {
            let mut view = Dashboard::new(api);
            if let Bootstrap::RedirectToLogin(_) = view.mount(now).await? {
                return Ok(Report::redirect());
            }
            let output = render::dashboard(
                &view.budget,
                &view.totals(),
                &view.balances,
                &view.recent(),
            )?;
            Ok(Report::new(output, &mut view.notices, view.needs_login))
        }
        Command::Expenses { command } => run_expenses(command, api, now).await,
        Command::Members { command } => run_members(command, api, now).await,
        Command::Summary => {
            let mut board = ExpenseBoard::new(api);
            if let Bootstrap::RedirectToLogin(_) = board.mount(now).await? {
                return Ok(Report::redirect());
            }
            let output = render::balances(&board.summary)?;
            Ok(Report::new(output, &mut board.notices, board.needs_login))
        }
        Command::Budget { command } => run_budget(command, api, now).await,
    }
}

async fn run_expenses<T: Transport>(
    command: ExpenseCommand,
    api: &ApiClient<T>,
    now: DateTime<Utc>,
) -> Result<Report> {
    let mut board = ExpenseBoard::new(api);
    if let Bootstrap::RedirectToLogin(_) = board.mount(now).await? {
        return Ok(Report::redirect());
    }

    let today = now.date_naive();
    let output = match command {
        ExpenseCommand::List => render::expenses(&board.expenses)?,
        ExpenseCommand::Add(form) => {
            board.open(BoardDialog::Expense);
            board.add_expense(&form.into_draft(today)).await;
            render::expenses(&board.expenses)?
        }
        ExpenseCommand::Edit { id, form } => {
            board.open(BoardDialog::Expense);
            board.update_expense(id, &form.into_draft(today)).await;
            render::expenses(&board.expenses)?
        }
        ExpenseCommand::Delete { id } => {
            board.delete_expense(id).await;
            render::expenses(&board.expenses)?
        }
        ExpenseCommand::Pay { id, member, amount } => {
            board.open(BoardDialog::Payment);
            board
                .record_payment(
                    id,
                    &PaymentDraft {
                        member_id: member,
                        amount,
                    },
                )
                .await;
            render::expenses(&board.expenses)?
        }
        ExpenseCommand::History { id } => {
            if board.show_payments(id).await {
                board
                    .payments
                    .as_ref()
                    .map(|h| render::payments(h.expense_id, &h.payments))
                    .transpose()?
                    .unwrap_or_default()
            } else {
                String::new()
            }
        }
    };
    Ok(Report::new(output, &mut board.notices, board.needs_login))
}

async fn run_members<T: Transport>(
    command: MemberCommand,
    api: &ApiClient<T>,
    now: DateTime<Utc>,
) -> Result<Report> {
    let mut board = ExpenseBoard::new(api);
    if let Bootstrap::RedirectToLogin(_) = board.mount(now).await? {
        return Ok(Report::redirect());
    }
    if let MemberCommand::Add { name } = command {
        board.open(BoardDialog::Member);
        board.add_member(&name).await;
    }
    let output = render::members(&board.members)?;
    Ok(Report::new(output, &mut board.notices, board.needs_login))
}

async fn run_budget<T: Transport>(
    command: BudgetCommand,
    api: &ApiClient<T>,
    now: DateTime<Utc>,
) -> Result<Report> {
    let mut page = MemberBudgetPage::new(api);
    if let Bootstrap::RedirectToLogin(_) = page.mount(now).await? {
        return Ok(Report::redirect());
    }

    let output = match command {
        BudgetCommand::Status => render::budget_status(&page.status)?,
        BudgetCommand::Members => render::member_budgets(&page.budgets)?,
        BudgetCommand::Set { member_id, amount } => {
            page.edit_dialog.open();
            page.set_budget(member_id, amount).await;
            render::member_budgets(&page.budgets)?
        }
        BudgetCommand::Init => {
            page.initialize_month().await;
            render::budget_status(&page.status)?
        }
        BudgetCommand::Recalc => {
            page.recalculate().await;
            render::budget_status(&page.status)?
        }
    };
    Ok(Report::new(output, &mut page.notices, page.needs_login))
}

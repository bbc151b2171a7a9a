//! Plain-text rendering of view state for the terminal.

use crate::{
    entities::{BudgetStatus, Expense, Member, MemberBalance, MemberBudget, Payment},
    errors::Result,
    session::ActiveSession,
    views::dashboard::ExpenseTotals,
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use std::fmt::Write;

/// Formats money with two decimals and a dollar sign.
#[must_use]
pub fn money(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

/// Text progress bar like `[████████░░] 80.0%`.
#[must_use]
pub fn progress_bar(percent: Decimal, length: usize) -> String {
    let clamped = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    let filled = (clamped * Decimal::from(length) / Decimal::ONE_HUNDRED)
        .round()
        .to_usize()
        .unwrap_or(0)
        .min(length);
    let empty = length - filled;
    format!("[{}{}] {:.1}%", "█".repeat(filled), "░".repeat(empty), percent)
}

fn status_label(expense: &Expense) -> &'static str {
    if expense.cleared {
        "cleared"
    } else if expense.cleared_amount > Decimal::ZERO {
        "partial"
    } else {
        "open"
    }
}

/// Expense table.
pub fn expenses(list: &[Expense]) -> Result<String> {
    let mut out = String::new();
    if list.is_empty() {
        writeln!(out, "No expenses recorded.")?;
        return Ok(out);
    }
    writeln!(
        out,
        "{:>5}  {:<10}  {:<12}  {:<24}  {:>10}  {:>10}  {:<8}",
        "ID", "DATE", "MEMBER", "DESCRIPTION", "AMOUNT", "REMAINING", "STATUS"
    )?;
    for e in list {
        writeln!(
            out,
            "{:>5}  {:<10}  {:<12}  {:<24}  {:>10}  {:>10}  {:<8}",
            e.id,
            e.date.format("%Y-%m-%d"),
            e.member_name.as_deref().unwrap_or("-"),
            e.description,
            money(e.amount),
            money(e.remaining()),
            status_label(e),
        )?;
        if let (Some(amount), Some(by)) = (e.last_cleared_amount, e.last_cleared_by.as_deref()) {
            writeln!(out, "       last payment {} by {by}", money(amount))?;
        }
    }
    Ok(out)
}

/// Member list.
pub fn members(list: &[Member]) -> Result<String> {
    let mut out = String::new();
    if list.is_empty() {
        writeln!(out, "No members yet.")?;
    }
    for m in list {
        writeln!(out, "{:>5}  {}", m.id, m.name)?;
    }
    Ok(out)
}

/// Member balance table.
pub fn balances(list: &[MemberBalance]) -> Result<String> {
    let mut out = String::new();
    writeln!(
        out,
        "{:<16}  {:>10}  {:>10}  {:>10}",
        "MEMBER", "TOTAL", "CLEARED", "REMAINING"
    )?;
    for b in list {
        writeln!(
            out,
            "{:<16}  {:>10}  {:>10}  {:>10}",
            b.name,
            money(b.total),
            money(b.cleared),
            money(b.remaining)
        )?;
    }
    Ok(out)
}

/// Payment history of one expense.
pub fn payments(expense_id: i64, list: &[Payment]) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "Payments for expense {expense_id}:")?;
    if list.is_empty() {
        writeln!(out, "  none")?;
    }
    for p in list {
        let when = p
            .timestamp
            .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        writeln!(
            out,
            "  {when}  {:>10}  {}",
            money(p.amount),
            p.cleared_by.as_deref().unwrap_or("-")
        )?;
    }
    Ok(out)
}

/// Budget snapshot.
pub fn budget_status(status: &BudgetStatus) -> Result<String> {
    let mut out = String::new();
    let month = if status.month_year.is_empty() {
        "Current month"
    } else {
        status.month_year.as_str()
    };
    writeln!(out, "{month}")?;
    writeln!(out, "  Total:     {}", money(status.total_budget))?;
    writeln!(out, "  Utilized:  {}", money(status.utilized_budget))?;
    writeln!(out, "  Remaining: {}", money(status.remaining_budget))?;
    writeln!(
        out,
        "  {}",
        progress_bar(status.utilization_percent(), 20)
    )?;
    Ok(out)
}

/// Member budget table.
pub fn member_budgets(list: &[MemberBudget]) -> Result<String> {
    let mut out = String::new();
    writeln!(
        out,
        "{:>5}  {:<16}  {:>10}  {:>10}  {:>10}",
        "ID", "MEMBER", "BUDGET", "UTILIZED", "REMAINING"
    )?;
    for b in list {
        writeln!(
            out,
            "{:>5}  {:<16}  {:>10}  {:>10}  {:>10}",
            b.member_id,
            b.member_name,
            money(b.monthly_budget),
            money(b.utilized_budget),
            money(b.remaining_budget)
        )?;
    }
    Ok(out)
}

/// Dashboard: budget, totals, balances, and recent expenses.
pub fn dashboard(
    status: &BudgetStatus,
    totals: &ExpenseTotals,
    balances_list: &[MemberBalance],
    recent: &[Expense],
) -> Result<String> {
    let mut out = budget_status(status)?;
    writeln!(out)?;
    writeln!(
        out,
        "{} expenses, {} total, {} cleared, {} remaining",
        totals.count,
        money(totals.total),
        money(totals.cleared),
        money(totals.remaining)
    )?;
    writeln!(out)?;
    out.push_str(&balances(balances_list)?);
    writeln!(out)?;
    writeln!(out, "Recent expenses:")?;
    out.push_str(&expenses(recent)?);
    Ok(out)
}

/// Who is logged in.
pub fn whoami(session: &ActiveSession) -> Result<String> {
    let mut out = String::new();
    writeln!(
        out,
        "{} ({})",
        session
            .name
            .as_deref()
            .or(session.email.as_deref())
            .unwrap_or("unknown user"),
        session.role
    )?;
    if let Some(email) = &session.email {
        writeln!(out, "email: {email}")?;
    }
    if let Some(expires_at) = session.expires_at {
        writeln!(out, "token expires: {}", expires_at.format("%Y-%m-%d %H:%M UTC"))?;
    }
    Ok(out)
}

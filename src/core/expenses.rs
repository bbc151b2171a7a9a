//! Expense operations - reads and writes against `/api/expenses`.
//!
//! Writes only report success or failure. Callers that show expense data re-read it afterwards
//! through the query functions here; nothing is merged locally.

use crate::{
    entities::{
        Expense, ExpenseDraft, MemberBalance, Payment, PaymentDraft, flatten_summary,
        summary::SummaryPayload,
    },
    errors::{Error, Result},
    http::{ApiClient, ApiRequest, Method, Transport},
};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

const EXPENSES_PATH: &str = "/api/expenses";

fn invalid(message: &str) -> Error {
    Error::Validation {
        message: message.to_string(),
    }
}

/// Checks an expense form before it is sent.
///
/// # Errors
/// [`Error::Validation`] when the member is missing, the description is blank, or the amount
/// is not strictly positive.
pub fn validate_draft(draft: &ExpenseDraft) -> Result<()> {
    if draft.member_id <= 0 {
        return Err(invalid("Please select a member"));
    }
    if draft.description.trim().is_empty() {
        return Err(invalid("Please enter a description"));
    }
    if draft.amount <= Decimal::ZERO {
        return Err(invalid("Amount must be greater than zero"));
    }
    Ok(())
}

/// Checks a payment before it is sent.
///
/// # Errors
/// [`Error::Validation`] when the member or a positive amount is missing.
pub fn validate_payment(payment: &PaymentDraft) -> Result<()> {
    if payment.member_id <= 0 || payment.amount <= Decimal::ZERO {
        return Err(invalid("Please fill all fields"));
    }
    Ok(())
}

/// Retrieves every expense visible to the session.
pub async fn list_expenses<T: Transport>(api: &ApiClient<T>) -> Result<Vec<Expense>> {
    let expenses: Vec<Expense> = api.get_json(EXPENSES_PATH).await?;
    debug!("Fetched {} expenses", expenses.len());
    Ok(expenses)
}

/// Retrieves per-member totals, ordered by member name.
pub async fn member_summary<T: Transport>(api: &ApiClient<T>) -> Result<Vec<MemberBalance>> {
    let payload: Option<SummaryPayload> = api.get_json(&format!("{EXPENSES_PATH}/summary")).await?;
    Ok(flatten_summary(payload.unwrap_or_default()))
}

/// Retrieves the payment history of one expense.
pub async fn payment_history<T: Transport>(
    api: &ApiClient<T>,
    expense_id: i64,
) -> Result<Vec<Payment>> {
    let payments: Option<Vec<Payment>> = api
        .get_json(&format!("{EXPENSES_PATH}/{expense_id}/payments"))
        .await?;
    Ok(payments.unwrap_or_default())
}

/// Creates an expense.
#[instrument(skip(api))]
pub async fn create_expense<T: Transport>(api: &ApiClient<T>, draft: &ExpenseDraft) -> Result<()> {
    validate_draft(draft)?;
    api.post(EXPENSES_PATH, draft).await?;
    info!("Expense '{}' created", draft.description);
    Ok(())
}

/// Replaces an expense's fields.
#[instrument(skip(api))]
pub async fn update_expense<T: Transport>(
    api: &ApiClient<T>,
    expense_id: i64,
    draft: &ExpenseDraft,
) -> Result<()> {
    validate_draft(draft)?;
    api.put(&format!("{EXPENSES_PATH}/{expense_id}"), draft)
        .await?;
    info!("Expense {expense_id} updated");
    Ok(())
}

/// Deletes an expense.
#[instrument(skip(api))]
pub async fn delete_expense<T: Transport>(api: &ApiClient<T>, expense_id: i64) -> Result<()> {
    api.delete(&format!("{EXPENSES_PATH}/{expense_id}")).await?;
    info!("Expense {expense_id} deleted");
    Ok(())
}

/// Records a payment against an expense. The amount travels as a query parameter.
#[instrument(skip(api))]
pub async fn record_payment<T: Transport>(
    api: &ApiClient<T>,
    expense_id: i64,
    payment: &PaymentDraft,
) -> Result<()> {
    validate_payment(payment)?;
    let request = ApiRequest::new(Method::Put, format!("{EXPENSES_PATH}/clear/{expense_id}"))
        .with_query("memberId", payment.member_id)
        .with_query("amount", payment.amount);
    api.execute(request).await?;
    info!(
        "Payment of {} recorded against expense {expense_id}",
        payment.amount
    );
    Ok(())
}

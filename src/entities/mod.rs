//! Entity module - Wire types exchanged with the expense service.
//! All payloads use camelCase JSON field names and `Decimal` money amounts.

pub mod auth;
pub mod budget;
pub mod expense;
pub mod member;
pub mod payment;
pub mod summary;

use serde::{Deserialize, Deserializer};

pub use budget::{BudgetStatus, MemberBudget, MemberBudgetUpdate};
pub use expense::{Expense, ExpenseDraft, PaymentDraft};
pub use member::{Member, NewMember};
pub use payment::Payment;
pub use summary::{MemberBalance, flatten_summary};

/// Reads an explicit JSON `null` as the type's default, like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

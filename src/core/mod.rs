//! Core operations - framework-agnostic commands and queries against the expense service.
//!
//! Commands (create, update, delete, payment, budget edits) return only success or failure.
//! Queries are idempotent reads. The view layer composes them into write-then-refetch flows.

/// Login, registration, and password reset
pub mod auth;
/// Budget snapshot, member budgets, and month maintenance
pub mod budget;
/// Expense reads and writes, payments, and the member summary
pub mod expenses;
/// Household members
pub mod members;

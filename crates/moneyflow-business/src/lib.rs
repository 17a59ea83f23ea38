//! # Moneyflow Business
//!
//! Business cores for users, incomes and expenses. Each core validates its
//! input, maps between API models and storage records field by field, and
//! runs multi-step operations inside one store scope.

#![doc(html_root_url = "https://docs.rs/moneyflow-business/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod check;
mod error;
pub mod flow;
pub mod user;

pub use error::{BusinessError, AUTH_FAILED_MESSAGE, DENIED_MESSAGE, INVALID_ID_MESSAGE};
pub use flow::{Flow, FlowCore, FlowKind, NewFlow, UpdateFlow};
pub use user::{NewUser, UpdateUser, User, UserCore};

/// Marker for the income table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomeKind {}

impl FlowKind for IncomeKind {
    const TABLE: &'static str = "incomes";
    const RESOURCE: &'static str = "income";
}

/// Marker for the expense table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseKind {}

impl FlowKind for ExpenseKind {
    const TABLE: &'static str = "expenses";
    const RESOURCE: &'static str = "expense";
}

/// Every table the cores store records in.
pub const TABLES: &[&str] = &[user::TABLE, IncomeKind::TABLE, ExpenseKind::TABLE];

/// Income business operations.
pub type IncomeCore<T> = FlowCore<T, IncomeKind>;

/// Expense business operations.
pub type ExpenseCore<T> = FlowCore<T, ExpenseKind>;

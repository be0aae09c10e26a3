//! Transaction management for the expense tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the request shapes for creating and
//!   editing transactions
//! - Field-level validation of those requests
//! - Database functions for storing, querying, and aggregating transactions
//! - The JSON endpoint handlers

mod core;
mod create_endpoint;
mod delete_endpoint;
mod list_endpoint;
mod query;
mod summary;
mod update_endpoint;
mod validation;

pub use core::{
    Division, NewTransaction, Transaction, TransactionType, UpdateTransaction,
    create_transaction_table,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use list_endpoint::list_transactions_endpoint;
pub use summary::{
    CategorySummary, MonthlySummary, category_summary_endpoint, monthly_summary_endpoint,
};
pub use update_endpoint::update_transaction_endpoint;

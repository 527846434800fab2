//! Transactions are the core entity of the application.
//!
//! This module defines the transaction type and its database functions,
//! the pages for listing, creating, and editing transactions, and the
//! endpoints those pages post to.

mod core;
mod create_transaction_endpoint;
mod delete_transaction_endpoint;
mod edit_transaction_page;
mod form;
mod new_transaction_page;
mod transactions_page;
mod update_transaction_endpoint;

pub use core::{
    Transaction, TransactionBuilder, TransactionFilter, TransactionKind, TransactionPatch,
    create_transaction, create_transaction_table, delete_transaction, get_transaction,
    list_transactions, update_transaction,
};
pub use create_transaction_endpoint::{TransactionState, post_create_transaction};
pub use delete_transaction_endpoint::post_delete_transaction;
pub use edit_transaction_page::get_edit_transaction_page;
pub use form::{TransactionFormData, format_date, parse_date};
pub use new_transaction_page::get_new_transaction_page;
pub use transactions_page::get_transactions_page;
pub use update_transaction_endpoint::post_update_transaction;

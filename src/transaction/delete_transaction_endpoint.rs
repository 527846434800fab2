//! The endpoint for deleting a transaction.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    endpoints,
    transaction::{core::delete_transaction, create_transaction_endpoint::TransactionState},
    user::UserID,
};

/// Delete the transaction with ID `transaction_id` and redirect back to the
/// transactions page.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn post_delete_transaction(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<i64>,
) -> Response {
    let result = delete_transaction(
        transaction_id,
        user_id,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    );

    match result {
        Ok(()) => Redirect::to(endpoints::TRANSACTIONS_VIEW).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

//! The endpoint for saving edits to an existing transaction.

use axum::{
    Extension, Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    endpoints,
    transaction::{
        TransactionPatch, core::update_transaction,
        create_transaction_endpoint::TransactionState, form::TransactionFormData,
    },
    user::UserID,
};

/// Apply the submitted form to the transaction with ID `transaction_id` and
/// redirect back to the transactions page.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn post_update_transaction(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<i64>,
    Form(form): Form<TransactionFormData>,
) -> Response {
    let (amount, kind, date) = match form.parse_fields() {
        Ok(parsed) => parsed,
        Err(error) => return error.into_alert_response(),
    };

    let patch = TransactionPatch {
        amount: Some(amount),
        kind: Some(kind),
        category: Some(form.category),
        date: Some(date),
        note: Some(form.note),
    };

    let result = update_transaction(
        transaction_id,
        user_id,
        patch,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    );

    match result {
        Ok(_) => Redirect::to(endpoints::TRANSACTIONS_VIEW).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

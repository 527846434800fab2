//! The endpoint for creating a transaction from the new transaction form.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, endpoints,
    transaction::{Transaction, TransactionFormData, core::create_transaction},
    user::UserID,
};

/// The state needed to create, update, and delete transactions.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for persisting transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Create a transaction owned by the signed-in user and redirect back to the
/// transactions page.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn post_create_transaction(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionFormData>,
) -> Response {
    let (amount, kind, date) = match form.parse_fields() {
        Ok(parsed) => parsed,
        Err(error) => return error.into_alert_response(),
    };

    let result = create_transaction(
        Transaction::build(user_id, amount, kind, &form.category, date).note(&form.note),
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

//! The page for editing an existing transaction.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::html;

use crate::{
    Error, endpoints,
    html::{PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    shared::render,
    transaction::{
        core::get_transaction, create_transaction_endpoint::TransactionState,
        form::transaction_form,
    },
    user::UserID,
};

/// Render the form for editing the transaction with ID `transaction_id`.
///
/// Responds with a not found page if the transaction does not exist, and a
/// forbidden page if it belongs to another user.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_edit_transaction_page(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<i64>,
) -> Response {
    let transaction = match get_transaction(
        transaction_id,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    ) {
        Ok(transaction) => transaction,
        Err(error) => return error.into_response(),
    };

    if transaction.user_id != user_id {
        return Error::Forbidden.into_response();
    }

    let action = endpoints::format_endpoint(endpoints::UPDATE_TRANSACTION, transaction.id);
    let content = html! {
        (NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html())

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-md"
            {
                h1 class="text-2xl font-bold mb-6" { "Edit transaction" }

                (transaction_form(&action, "Save changes", Some(&transaction)))
            }
        }
    };

    render(StatusCode::OK, base("Edit Transaction", &content))
}

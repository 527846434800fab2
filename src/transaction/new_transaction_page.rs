//! The page for entering a new transaction.

use axum::{http::StatusCode, response::Response};
use maud::html;

use crate::{
    endpoints,
    html::{PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    shared::render,
    transaction::form::transaction_form,
};

/// Render the form for creating a new transaction.
pub async fn get_new_transaction_page() -> Response {
    let content = html! {
        (NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html())

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-md"
            {
                h1 class="text-2xl font-bold mb-6" { "New transaction" }

                (transaction_form(endpoints::TRANSACTIONS_API, "Create transaction", None))
            }
        }
    };

    render(StatusCode::OK, base("New Transaction", &content))
}

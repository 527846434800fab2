//! The page listing a user's transactions with filtering controls.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, CATEGORY_BADGE_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::NavBar,
    shared::render,
    transaction::{
        Transaction, TransactionFilter, TransactionKind,
        core::list_transactions,
        form::{format_date, parse_date},
    },
    user::UserID,
};

/// The state needed to display the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    /// The database connection for querying transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The filter controls submitted via the query string.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    pub category: Option<String>,
    pub from: Option<String>,
    pub until: Option<String>,
}

impl TransactionsQuery {
    /// Convert the raw query strings into a [TransactionFilter].
    ///
    /// Empty strings and unparseable dates are treated as no filter so that a
    /// half-filled filter form still produces a page.
    fn to_filter(&self) -> TransactionFilter {
        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };

        TransactionFilter {
            category: non_empty(&self.category),
            from: non_empty(&self.from).and_then(|s| parse_date(&s).ok()),
            until: non_empty(&self.until).and_then(|s| parse_date(&s).ok()),
        }
    }
}

fn filter_form(query: &TransactionsQuery) -> Markup {
    let value_of = |value: &Option<String>| value.clone().unwrap_or_default();

    html! {
        form method="get" action=(endpoints::TRANSACTIONS_VIEW) class="flex flex-wrap items-end gap-4 mb-6"
        {
            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }
                input type="text" name="category" id="category" class=(FORM_TEXT_INPUT_STYLE)
                    value=(value_of(&query.category));
            }

            div
            {
                label for="from" class=(FORM_LABEL_STYLE) { "From" }
                input type="date" name="from" id="from" class=(FORM_TEXT_INPUT_STYLE)
                    value=(value_of(&query.from));
            }

            div
            {
                label for="until" class=(FORM_LABEL_STYLE) { "Until" }
                input type="date" name="until" id="until" class=(FORM_TEXT_INPUT_STYLE)
                    value=(value_of(&query.until));
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) style="width: auto" { "Filter" }
        }
    }
}

fn transaction_row(transaction: &Transaction) -> Markup {
    let amount_style = match transaction.kind {
        TransactionKind::Income => "text-green-600 dark:text-green-400",
        TransactionKind::Expense => "text-red-600 dark:text-red-400",
    };

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (format_date(transaction.date)) }
            td class=(TABLE_CELL_STYLE) { (transaction.kind) }
            td class=(TABLE_CELL_STYLE)
            {
                span class=(CATEGORY_BADGE_STYLE) { (transaction.category) }
            }
            td class={(TABLE_CELL_STYLE) " " (amount_style)} { (format_currency(transaction.amount)) }
            td class=(TABLE_CELL_STYLE) { (transaction.note) }
            td class=(TABLE_CELL_STYLE)
            {
                a
                    href=(endpoints::format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id))
                    class=(LINK_STYLE)
                {
                    "Edit"
                }
            }
            td class=(TABLE_CELL_STYLE)
            {
                form
                    method="post"
                    action=(endpoints::format_endpoint(endpoints::DELETE_TRANSACTION, transaction.id))
                {
                    button type="submit" class=(BUTTON_DELETE_STYLE) { "Delete" }
                }
            }
        }
    }
}

fn transactions_table(transactions: &[Transaction]) -> Markup {
    html! {
        @if transactions.is_empty()
        {
            p class="text-gray-500 dark:text-gray-400"
            {
                "No transactions yet. "
                a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE) { "Add your first one." }
            }
        } @else
        {
            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Note" }
                        th scope="col" class=(TABLE_CELL_STYLE) colspan="2" { "Actions" }
                    }
                }

                tbody
                {
                    @for transaction in transactions
                    {
                        (transaction_row(transaction))
                    }
                }
            }
        }
    }
}

/// Render the transactions page for the signed-in user.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_transactions_page(
    State(state): State<TransactionsPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransactionsQuery>,
) -> Response {
    let filter = query.to_filter();
    let transactions = match list_transactions(
        user_id,
        &filter,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    ) {
        Ok(transactions) => transactions,
        Err(error) => return error.into_response(),
    };

    let content = html! {
        (NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html())

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl"
            {
                div class="flex items-center justify-between mb-6"
                {
                    h1 class="text-2xl font-bold" { "Transactions" }

                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(BUTTON_PRIMARY_STYLE)
                        style="width: auto"
                    {
                        "New transaction"
                    }
                }

                (filter_form(&query))
                (transactions_table(&transactions))
            }
        }
    };

    render(StatusCode::OK, base("Transactions", &content))
}

#[cfg(test)]
mod transactions_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::{Query, State}, http::StatusCode};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        PasswordHash,
        transaction::{
            Transaction, TransactionKind, create_transaction,
            transactions_page::{TransactionsPageState, TransactionsQuery, get_transactions_page},
        },
        user::create_user,
    };

    async fn response_text(response: axum::response::Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8_lossy(&body).to_string()
    }

    fn get_test_state() -> (TransactionsPageState, crate::user::UserID) {
        let connection = Connection::open_in_memory().unwrap();
        crate::db::initialize(&connection).unwrap();
        let user = create_user("alice", PasswordHash::new_unchecked("hunter2"), &connection)
            .expect("Could not create test user");

        (
            TransactionsPageState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    #[tokio::test]
    async fn page_lists_transactions() {
        let (state, user_id) = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_transaction(
                Transaction::build(
                    user_id,
                    12.5,
                    TransactionKind::Expense,
                    "groceries",
                    date!(2024 - 03 - 01),
                ),
                &connection,
            )
            .unwrap();
        }

        let response = get_transactions_page(
            State(state),
            Extension(user_id),
            Query(TransactionsQuery::default()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_text(response).await;
        assert!(body.contains("groceries"));
        assert!(body.contains("$12.50"));
    }

    #[tokio::test]
    async fn page_shows_empty_state() {
        let (state, user_id) = get_test_state();

        let response = get_transactions_page(
            State(state),
            Extension(user_id),
            Query(TransactionsQuery::default()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_text(response).await;
        assert!(body.contains("No transactions yet"));
    }

    #[tokio::test]
    async fn category_filter_narrows_listing() {
        let (state, user_id) = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_transaction(
                Transaction::build(
                    user_id,
                    12.5,
                    TransactionKind::Expense,
                    "groceries",
                    date!(2024 - 03 - 01),
                ),
                &connection,
            )
            .unwrap();
            create_transaction(
                Transaction::build(
                    user_id,
                    800.0,
                    TransactionKind::Expense,
                    "rent",
                    date!(2024 - 03 - 01),
                ),
                &connection,
            )
            .unwrap();
        }

        let response = get_transactions_page(
            State(state),
            Extension(user_id),
            Query(TransactionsQuery {
                category: Some("rent".to_owned()),
                ..Default::default()
            }),
        )
        .await;

        let body = response_text(response).await;
        assert!(body.contains("rent"));
        assert!(!body.contains("groceries"));
    }
}

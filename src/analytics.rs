//! The analytics page with income/expense breakdowns and the health score.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, endpoints,
    html::{
        CARD_STYLE, CATEGORY_BADGE_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::NavBar,
    shared::render,
    summary::{CategorySummary, category_totals, health_score, ledger_totals},
    transaction::{Transaction, TransactionFilter, TransactionKind, list_transactions},
    user::UserID,
};

/// The state needed for displaying the analytics page.
#[derive(Debug, Clone)]
pub struct AnalyticsState {
    /// The database connection for querying transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AnalyticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn stat_card(label: &str, value: &str) -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
            p class="text-2xl font-bold" { (value) }
        }
    }
}

fn expense_breakdown_view(summaries: &[CategorySummary], total_expense: f64) -> Markup {
    html! {
        h2 class="text-xl font-semibold mt-8 mb-4" { "Spending by category" }

        @if summaries.is_empty()
        {
            p class="text-gray-500 dark:text-gray-400" { "No expenses recorded yet." }
        } @else
        {
            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Total" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Share" }
                    }
                }

                tbody
                {
                    @for summary in summaries
                    {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE)
                            {
                                span class=(CATEGORY_BADGE_STYLE) { (summary.category) }
                            }
                            td class=(TABLE_CELL_STYLE) { (format_currency(summary.total)) }
                            td class=(TABLE_CELL_STYLE)
                            {
                                @if total_expense > 0.0
                                {
                                    (format!("{:.1}%", summary.total / total_expense * 100.0))
                                } @else
                                {
                                    "0.0%"
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Display breakdowns of the user's spending and their financial health score.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_analytics_page(
    State(state): State<AnalyticsState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let transactions = match list_transactions(
        user_id,
        &TransactionFilter::default(),
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    ) {
        Ok(transactions) => transactions,
        Err(error) => return error.into_response(),
    };

    let (total_income, total_expense, balance) = ledger_totals(&transactions);

    let expenses: Vec<Transaction> = transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Expense)
        .cloned()
        .collect();
    let average_expense = if expenses.is_empty() {
        0.0
    } else {
        total_expense / expenses.len() as f64
    };
    let breakdown = category_totals(&expenses);

    let score_text = match health_score(total_income, total_expense) {
        Some(score) => format!("{score}/100"),
        None => "n/a".to_owned(),
    };

    let content = html! {
        (NavBar::new(endpoints::ANALYTICS_VIEW).into_html())

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl"
            {
                h1 class="text-2xl font-bold mb-6" { "Analytics" }

                div class="grid grid-cols-1 md:grid-cols-4 gap-4"
                {
                    (stat_card("Income", &format_currency(total_income)))
                    (stat_card("Expenses", &format_currency(total_expense)))
                    (stat_card("Balance", &format_currency(balance)))
                    (stat_card("Average expense", &format_currency(average_expense)))
                }

                div class="mt-4 max-w-xs"
                {
                    (stat_card("Health score", &score_text))
                }

                (expense_breakdown_view(&breakdown, total_expense))
            }
        }
    };

    render(StatusCode::OK, base("Analytics", &content))
}

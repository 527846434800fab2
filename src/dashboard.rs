//! The dashboard page and its chart data endpoint.
//!
//! The page shows the headline numbers and the most recent activity. The
//! JSON endpoint serves the same ledger aggregated into chart-ready series.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, endpoints,
    html::{CARD_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency},
    navigation::NavBar,
    shared::render,
    summary::{Granularity, category_totals, health_score, ledger_totals, period_totals},
    transaction::{Transaction, TransactionFilter, TransactionKind, format_date, list_transactions},
    user::UserID,
};

/// How many recent transactions to show on the dashboard.
const RECENT_TRANSACTION_COUNT: usize = 5;

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for querying transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Chart-ready aggregates of the user's ledger.
#[derive(Debug, Serialize)]
pub struct DashboardData {
    /// Total income over all time.
    pub total_income: f64,
    /// Total expenses over all time.
    pub total_expense: f64,
    /// Income minus expenses.
    pub balance: f64,
    /// The financial health score, absent when there is no income.
    pub health_score: Option<u8>,
    /// Each expense category's share of total income, as a percentage.
    pub expense_shares: Vec<ExpenseShare>,
    /// Daily income and expense totals, oldest first.
    pub daily_totals: Vec<PeriodPoint>,
}

/// One expense category's share of income.
#[derive(Debug, Serialize)]
pub struct ExpenseShare {
    /// The category name.
    pub category: String,
    /// The total spent in the category.
    pub total: f64,
    /// The total as a percentage of total income, absent when there is no income.
    pub percent_of_income: Option<f64>,
}

/// Income and expense totals for one day.
#[derive(Debug, Serialize)]
pub struct PeriodPoint {
    /// The day in YYYY-MM-DD format.
    pub date: String,
    /// The income recorded on the day.
    pub income: f64,
    /// The expenses recorded on the day.
    pub expense: f64,
}

fn build_dashboard_data(transactions: &[Transaction]) -> DashboardData {
    let (total_income, total_expense, balance) = ledger_totals(transactions);

    let expenses: Vec<Transaction> = transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Expense)
        .cloned()
        .collect();

    let expense_shares = category_totals(&expenses)
        .into_iter()
        .map(|summary| ExpenseShare {
            percent_of_income: (total_income > 0.0)
                .then(|| summary.total / total_income * 100.0),
            category: summary.category,
            total: summary.total,
        })
        .collect();

    let daily_totals = period_totals(transactions, Granularity::Day)
        .into_iter()
        .map(|summary| PeriodPoint {
            date: format_date(summary.period),
            income: summary.income,
            expense: summary.expense,
        })
        .collect();

    DashboardData {
        total_income,
        total_expense,
        balance,
        health_score: health_score(total_income, total_expense),
        expense_shares,
        daily_totals,
    }
}

fn summary_card(label: &str, value: &str) -> Markup {
    html! {
        div class=(CARD_STYLE)
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
            p class="text-2xl font-bold" { (value) }
        }
    }
}

fn recent_transactions_view(transactions: &[Transaction]) -> Markup {
    html! {
        h2 class="text-xl font-semibold mt-8 mb-4" { "Recent transactions" }

        @if transactions.is_empty()
        {
            p class="text-gray-500 dark:text-gray-400"
            {
                "Nothing recorded yet. "
                a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                {
                    "Add your first transaction."
                }
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
                    }
                }

                tbody
                {
                    @for transaction in transactions
                    {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE) { (format_date(transaction.date)) }
                            td class=(TABLE_CELL_STYLE) { (transaction.kind) }
                            td class=(TABLE_CELL_STYLE) { (transaction.category) }
                            td class=(TABLE_CELL_STYLE) { (format_currency(transaction.amount)) }
                        }
                    }
                }
            }

            a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "View all transactions" }
        }
    }
}

/// Display a page with an overview of the user's ledger.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
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
    let score = health_score(total_income, total_expense);
    let score_text = match score {
        Some(score) => format!("{score}/100"),
        None => "n/a".to_owned(),
    };
    let recent = &transactions[..transactions.len().min(RECENT_TRANSACTION_COUNT)];

    let content = html! {
        (NavBar::new(endpoints::DASHBOARD_VIEW).into_html())

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl"
            {
                h1 class="text-2xl font-bold mb-6" { "Dashboard" }

                div class="grid grid-cols-1 md:grid-cols-4 gap-4"
                {
                    (summary_card("Income", &format_currency(total_income)))
                    (summary_card("Expenses", &format_currency(total_expense)))
                    (summary_card("Balance", &format_currency(balance)))
                    (summary_card("Health score", &score_text))
                }

                (recent_transactions_view(recent))
            }
        }
    };

    render(StatusCode::OK, base("Dashboard", &content))
}

/// Serve the ledger aggregated into chart-ready JSON.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_dashboard_data(
    State(state): State<DashboardState>,
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

    Json(build_dashboard_data(&transactions)).into_response()
}

//! Downloading the user's ledger as a CSV report.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState,
    csv_io::export_csv,
    transaction::{TransactionFilter, list_transactions},
    user::UserID,
};

/// The state needed to produce the CSV report.
#[derive(Debug, Clone)]
pub struct ReportState {
    /// The database connection for querying transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Serve the signed-in user's transactions as a CSV file download.
///
/// An empty ledger produces a file containing only the header row.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_report(
    State(state): State<ReportState>,
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

    let csv_bytes = export_csv(&transactions);

    (
        [
            (CONTENT_TYPE, "text/csv"),
            (
                CONTENT_DISPOSITION,
                "attachment; filename=\"transactions.csv\"",
            ),
        ],
        csv_bytes,
    )
        .into_response()
}

//! The endpoint that receives uploaded CSV files and imports their rows.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Multipart, State, multipart::Field},
    http::StatusCode,
    response::Response,
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::AlertTemplate,
    csv_io::csv::{ImportReport, import_csv},
    endpoints,
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    shared::render,
    transaction::{TransactionBuilder, create_transaction},
    user::UserID,
};

/// The state needed for importing transactions.
#[derive(Debug, Clone)]
pub struct ImportState {
    /// The database connection for persisting imported transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ImportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Route handler for importing transactions from an uploaded CSV file.
///
/// Valid rows are inserted in a single database transaction, invalid rows are
/// skipped and reported back to the user with their row numbers.
pub async fn post_import_transactions(
    State(state): State<ImportState>,
    Extension(user_id): Extension<UserID>,
    mut multipart: Multipart,
) -> Result<Response, Response> {
    let field = multipart
        .next_field()
        .await
        .map_err(|error| {
            tracing::error!("Could not read multipart form: {error}");
            Error::MultipartError(error.to_string()).into_alert_response()
        })?
        .ok_or_else(|| {
            render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error_simple("No file was uploaded.").markup(),
            )
        })?;

    let csv_data = parse_multipart_field(field).await.map_err(|error| match error {
        Error::NotCSV => render(
            StatusCode::BAD_REQUEST,
            AlertTemplate::error_simple("File type must be CSV.").markup(),
        ),
        error => {
            tracing::error!("Failed to parse multipart field: {}", error);
            error.into_alert_response()
        }
    })?;

    let report = import_csv(&csv_data, user_id)
        .inspect_err(|error| tracing::debug!("Failed to parse CSV: {}", error))
        .map_err(|_| {
            render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error(
                    "Failed to parse CSV",
                    "Check that the file starts with the header date,type,category,amount,note.",
                )
                .markup(),
            )
        })?;

    let imported_count = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError.into_alert_response()
        })?;

        insert_builders(&report.builders, &connection).map_err(|error| {
            tracing::error!("Failed to import transactions: {}", error);
            render(
                StatusCode::INTERNAL_SERVER_ERROR,
                AlertTemplate::error(
                    "Import failed",
                    "An unexpected error occurred, please try again later.",
                )
                .markup(),
            )
        })?
    };

    Ok(render(
        StatusCode::CREATED,
        import_result_view(imported_count, &report),
    ))
}

async fn parse_multipart_field(field: Field<'_>) -> Result<String, Error> {
    if field.content_type() != Some("text/csv") {
        return Err(Error::NotCSV);
    }

    let file_name = field.file_name().unwrap_or("<unnamed>").to_owned();

    let data = field.text().await.map_err(|error| {
        tracing::error!("Could not read data from multipart form field: {error}");
        Error::MultipartError("Could not read data from multipart form field.".to_owned())
    })?;

    tracing::debug!("Received file '{}' that is {} bytes", file_name, data.len());

    Ok(data)
}

/// Insert the builders in one database transaction so a mid-file SQL error
/// does not leave a partial import behind.
fn insert_builders(
    builders: &[TransactionBuilder],
    connection: &Connection,
) -> Result<usize, Error> {
    let tx = connection.unchecked_transaction()?;

    for builder in builders {
        create_transaction(builder.clone(), &tx)?;
    }

    let count = builders.len();
    tx.commit()?;

    Ok(count)
}

fn import_result_view(imported_count: usize, report: &ImportReport) -> Markup {
    let summary = format!(
        "Imported {imported_count} transaction{}.",
        if imported_count == 1 { "" } else { "s" }
    );

    let alert = if report.rejected.is_empty() {
        AlertTemplate::success(&summary, "")
    } else {
        AlertTemplate::success(&summary, "Some rows were skipped, see below.")
    };

    let content = html! {
        (NavBar::new(endpoints::IMPORT_VIEW).into_html())

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-md"
            {
                (alert.markup())

                @if !report.rejected.is_empty()
                {
                    ul class="mb-4 text-sm text-red-800 dark:text-red-400 list-disc list-inside"
                    {
                        @for rejected in &report.rejected
                        {
                            li { "Row " (rejected.row) ": " (rejected.reason) }
                        }
                    }
                }

                a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE)
                {
                    "View transactions"
                }
            }
        }
    };

    base("Import Transactions", &content)
}

#[cfg(test)]
mod import_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        body::Body,
        extract::{FromRequest, Multipart, State},
        http::{Request, StatusCode, header::CONTENT_TYPE},
    };
    use rusqlite::Connection;

    use crate::{
        PasswordHash,
        csv_io::import_endpoint::{ImportState, post_import_transactions},
        transaction::{TransactionFilter, list_transactions},
        user::{UserID, create_user},
    };

    const BOUNDARY: &str = "test-boundary";

    fn get_test_state() -> (ImportState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        crate::db::initialize(&connection).unwrap();
        let user = create_user("alice", PasswordHash::new_unchecked("hunter2"), &connection)
            .expect("Could not create test user");

        (
            ImportState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    async fn multipart_with_file(content_type: &str, data: &str) -> Multipart {
        let body = format!(
            "--{BOUNDARY}\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"transactions.csv\"\r\n\
            Content-Type: {content_type}\r\n\r\n\
            {data}\r\n\
            --{BOUNDARY}--\r\n"
        );

        let request = Request::builder()
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        Multipart::from_request(request, &()).await.unwrap()
    }

    #[tokio::test]
    async fn imports_valid_rows() {
        let (state, user_id) = get_test_state();
        let multipart = multipart_with_file(
            "text/csv",
            "date,type,category,amount,note\n\
            2024-03-01,expense,groceries,12.5,weekly shop\n\
            2024-03-02,income,salary,1000,",
        )
        .await;

        let response = post_import_transactions(State(state.clone()), Extension(user_id), multipart)
            .await
            .expect("import should succeed");

        assert_eq!(response.status(), StatusCode::CREATED);

        let connection = state.db_connection.lock().unwrap();
        let transactions =
            list_transactions(user_id, &TransactionFilter::default(), &connection).unwrap();
        assert_eq!(transactions.len(), 2);
    }

    #[tokio::test]
    async fn skips_invalid_rows_and_reports_them() {
        let (state, user_id) = get_test_state();
        let multipart = multipart_with_file(
            "text/csv",
            "date,type,category,amount,note\n\
            2024-03-01,expense,groceries,12.5,ok\n\
            2024-03-02,transfer,salary,1000,bad kind",
        )
        .await;

        let response = post_import_transactions(State(state.clone()), Extension(user_id), multipart)
            .await
            .expect("import should succeed for the valid rows");

        assert_eq!(response.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains("Imported 1 transaction."));
        assert!(body.contains("Row 2"));

        let connection = state.db_connection.lock().unwrap();
        let transactions =
            list_transactions(user_id, &TransactionFilter::default(), &connection).unwrap();
        assert_eq!(transactions.len(), 1);
    }

    #[tokio::test]
    async fn rejects_non_csv_files() {
        let (state, user_id) = get_test_state();
        let multipart = multipart_with_file("text/plain", "not a csv").await;

        let error_response = post_import_transactions(State(state), Extension(user_id), multipart)
            .await
            .expect_err("non-CSV uploads should be rejected");

        assert_eq!(error_response.status(), StatusCode::BAD_REQUEST);
    }
}

//! BudgetBuddy is a web app for tracking personal income and expenses.
//!
//! This library provides a REST API that directly serves HTML pages: users
//! register an account, record income/expense transactions against free-text
//! categories, view per-category and per-month summaries, and move their data
//! in and out of the app as CSV.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod analytics;
mod app_state;
mod auth;
mod csv_io;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod profile;
mod report;
mod routing;
mod summary;
mod transaction;
mod user;

pub use app_state::AppState;
pub use auth::{PasswordHash, ValidatedPassword};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use routing::build_router;
pub use user::{User, UserID, get_user_by_id};

use crate::{
    alert::AlertTemplate,
    internal_server_error::{InternalServerErrorPageTemplate, render_internal_server_error},
    not_found::get_404_not_found_response,
    shared::render,
};

mod shared {
    //! Helpers shared between view handlers.

    use axum::{
        http::StatusCode,
        response::{Html, IntoResponse, Response},
    };
    use maud::Markup;

    /// Render a maud template as an HTML response with the given status code.
    #[inline]
    pub fn render(status_code: StatusCode, template: Markup) -> Response {
        (status_code, Html(template.into_string())).into_response()
    }
}

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of username and password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no auth cookie in the cookie jar")]
    CookieMissing,

    /// The auth token in the cookie has passed its expiry.
    #[error("the auth token has expired")]
    TokenExpired,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The username used at registration is already taken.
    #[error("the username \"{0}\" is already taken")]
    DuplicateUsername(String),

    /// A negative amount was used to create or update a transaction.
    ///
    /// Amounts are stored as non-negative numbers, the transaction kind
    /// (income or expense) carries the direction.
    #[error("{0} is a negative amount, which is not allowed")]
    NegativeAmount(f64),

    /// A string that could not be parsed as an amount was used to create or
    /// update a transaction.
    #[error("\"{0}\" is not a number")]
    InvalidAmount(String),

    /// An empty string was used as a transaction category.
    #[error("category cannot be empty")]
    EmptyCategory,

    /// A date string could not be parsed as a calendar date.
    #[error("\"{0}\" is not a valid calendar date")]
    InvalidDate(String),

    /// A string that is neither "income" nor "expense" was used as a
    /// transaction kind.
    #[error("\"{0}\" is not a valid transaction type")]
    UnknownKind(String),

    /// The caller does not own the entity it tried to modify.
    #[error("the entity belongs to another user")]
    Forbidden,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The multipart form could not be parsed as a list of CSV files.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// The multipart form did not contain a CSV file.
    #[error("File is not a CSV")]
    NotCSV,

    /// The CSV had issues that prevented it from being parsed at all.
    #[error("Could not parse the CSV file: {0}")]
    InvalidCSV(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::Forbidden => render(
                StatusCode::FORBIDDEN,
                AlertTemplate::error(
                    "Unauthorized action",
                    "The requested entity belongs to another user.",
                )
                .markup(),
            ),
            Error::DatabaseLockError => render_internal_server_error(Default::default()),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                render_internal_server_error(InternalServerErrorPageTemplate::default())
            }
        }
    }
}

impl Error {
    /// Render the error as an inline alert fragment rather than a full page.
    fn into_alert_response(self) -> Response {
        match self {
            Error::NegativeAmount(amount) => render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error(
                    "Invalid amount",
                    &format!("{amount} is negative. Enter a positive amount and pick the transaction type instead."),
                )
                .markup(),
            ),
            Error::InvalidAmount(amount_string) => render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error(
                    "Invalid amount",
                    &format!("\"{amount_string}\" is not a number. Enter a numeric amount."),
                )
                .markup(),
            ),
            Error::EmptyCategory => render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error("Invalid category", "The category cannot be empty.").markup(),
            ),
            Error::InvalidDate(date_string) => render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error(
                    "Invalid date",
                    &format!("\"{date_string}\" is not a valid date. Use the format YYYY-MM-DD."),
                )
                .markup(),
            ),
            Error::UnknownKind(kind) => render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error(
                    "Invalid transaction type",
                    &format!("\"{kind}\" is not a transaction type, expected income or expense."),
                )
                .markup(),
            ),
            Error::NotFound => render(
                StatusCode::NOT_FOUND,
                AlertTemplate::error(
                    "Not found",
                    "The transaction could not be found. \
                    Try refreshing the page to see if it has already been deleted.",
                )
                .markup(),
            ),
            Error::Forbidden => render(
                StatusCode::FORBIDDEN,
                AlertTemplate::error(
                    "Unauthorized action",
                    "The requested entity belongs to another user.",
                )
                .markup(),
            ),
            _ => render(
                StatusCode::INTERNAL_SERVER_ERROR,
                AlertTemplate::error(
                    "Something went wrong",
                    "An unexpected error occurred, check the server logs for more details.",
                )
                .markup(),
            ),
        }
    }
}

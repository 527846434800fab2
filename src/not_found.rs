//! The 404 page shown when a route does not match.

use axum::response::Response;

use crate::{html::error_view, shared::render};

pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

pub fn get_404_not_found_response() -> Response {
    render(
        axum::http::StatusCode::NOT_FOUND,
        error_view(
            "Not Found",
            "404",
            "Sorry, we can't find that page.",
            "Check the address for typos or head back home.",
        ),
    )
}

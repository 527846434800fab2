//! Defines the templates and route handlers for the page to display for an internal server error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{html::error_view, shared::render};

pub struct InternalServerErrorPageTemplate<'a> {
    pub description: &'a str,
    pub fix: &'a str,
}

impl Default for InternalServerErrorPageTemplate<'_> {
    fn default() -> Self {
        Self {
            description: "Sorry, something went wrong.",
            fix: "Try again later or check the server logs",
        }
    }
}

pub fn render_internal_server_error(template: InternalServerErrorPageTemplate) -> Response {
    render(
        StatusCode::INTERNAL_SERVER_ERROR,
        error_view(
            "Internal Server Error",
            "500",
            template.description,
            template.fix,
        ),
    )
}

/// Redirect the client to the internal server error page.
pub fn get_internal_server_error_redirect() -> Response {
    axum::response::Redirect::to(crate::endpoints::INTERNAL_ERROR_VIEW).into_response()
}

pub async fn get_internal_server_error_page() -> Response {
    render_internal_server_error(InternalServerErrorPageTemplate::default())
}

//! Middleware for logging requests and responses.

use axum::{extract::Request, http::header::CONTENT_TYPE, middleware::Next, response::Response};

/// The fields that must never appear in the logs in clear text.
const SENSITIVE_FIELDS: [&str; 5] = [
    "password",
    "confirm_password",
    "current_password",
    "new_password",
    "confirm_new_password",
];

const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and the full body logged at the `debug` level. Password fields in form
/// submissions are redacted before logging.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body_text) = buffer_request(request).await;

    if parts.method == axum::http::Method::POST
        && parts.headers.get(CONTENT_TYPE)
            == Some(&"application/x-www-form-urlencoded".parse().unwrap())
    {
        let mut display_text = body_text.clone();

        for field in SENSITIVE_FIELDS {
            display_text = redact_field(&display_text, field);
        }

        log_request(&parts, &display_text);
    } else {
        log_request(&parts, &body_text);
    }

    let request = Request::from_parts(parts, body_text.into());
    let response = next.run(request).await;

    let (parts, body_text) = buffer_response(response).await;
    log_response(&parts, &body_text);

    Response::from_parts(parts, body_text.into())
}

fn redact_field(form_text: &str, field_name: &str) -> String {
    let start = match form_text.find(&format!("{field_name}=")) {
        Some(position) => position,
        None => return form_text.to_string(),
    };

    let end = match form_text[start..].find('&') {
        Some(end) => start + end,
        None => form_text.len(),
    };

    form_text.replace(&form_text[start..end], &format!("{field_name}=********"))
}

async fn buffer_request(request: Request) -> (axum::http::request::Parts, String) {
    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();

    (parts, String::from_utf8_lossy(&body_bytes).to_string())
}

async fn buffer_response(response: Response) -> (axum::http::response::Parts, String) {
    let (parts, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();

    (parts, String::from_utf8_lossy(&body_bytes).to_string())
}

/// Truncate `body` to at most [LOG_BODY_LENGTH_LIMIT] bytes without
/// splitting a multi-byte character.
fn truncate_body(body: &str) -> &str {
    let mut end = LOG_BODY_LENGTH_LIMIT;

    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!("Received request: {parts:#?}\nbody: {:}...", truncate_body(body));
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {parts:#?}\nbody: {body:?}");
    }
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!("Sending response: {parts:#?}\nbody: {:}...", truncate_body(body));
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {parts:#?}\nbody: {body:?}");
    }
}

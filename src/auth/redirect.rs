//! Helpers for redirect URLs during authentication flows.

use axum::{extract::Request, http::Uri};
use tracing::error;

use crate::endpoints;

fn is_safe_redirect_url(redirect_url: &str) -> bool {
    if !redirect_url.starts_with('/') || redirect_url.starts_with("//") {
        return false;
    }

    let path = redirect_url
        .split_once('?')
        .map(|(path, _)| path)
        .unwrap_or(redirect_url);

    path != endpoints::LOG_IN_VIEW
}

pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query).then(|| path_and_query.to_owned())
}

pub fn build_log_in_redirect_url(request: &Request) -> Option<String> {
    let path_and_query = request.uri().path_and_query()?.as_str();
    let redirect_target = normalize_redirect_url(path_and_query)?;

    build_log_in_redirect_url_from_target(&redirect_target)
}

pub(super) fn build_log_in_redirect_url_from_target(redirect_target: &str) -> Option<String> {
    match serde_urlencoded::to_string([("redirect_url", redirect_target)]) {
        Ok(param) => Some(format!("{}?{}", endpoints::LOG_IN_VIEW, param)),
        Err(error) => {
            error!("Could not encode redirect URL {redirect_target}: {error}");
            None
        }
    }
}

#[cfg(test)]
mod redirect_tests {
    use crate::{auth::redirect::normalize_redirect_url, endpoints};

    #[test]
    fn accepts_relative_path_with_query() {
        let url = "/transactions?category=food";

        assert_eq!(normalize_redirect_url(url), Some(url.to_owned()));
    }

    #[test]
    fn rejects_absolute_url() {
        assert_eq!(normalize_redirect_url("https://evil.example/"), None);
    }

    #[test]
    fn rejects_protocol_relative_url() {
        assert_eq!(normalize_redirect_url("//evil.example/"), None);
    }

    #[test]
    fn rejects_log_in_page_itself() {
        assert_eq!(normalize_redirect_url(endpoints::LOG_IN_VIEW), None);
    }
}

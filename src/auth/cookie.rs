//! Defines functions for handling user authentication with cookies.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, user::UserID};

/// The name of the cookie holding the serialized auth token.
pub const COOKIE_TOKEN: &str = "token";

/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(30);

/// The session token stored in the auth cookie as JSON.
///
/// The expiry is serialized as RFC 3339 so it round-trips regardless of
/// the time of day it lands on.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Token {
    pub user_id: UserID,

    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

/// Add an auth cookie to the cookie jar, indicating that a user is logged in and authenticated.
///
/// Sets the expiry of the cookie and the embedded token to `duration` from
/// the current time. You can use [DEFAULT_COOKIE_DURATION] for the default
/// duration.
///
/// Returns the cookie jar with the cookie added.
///
/// # Errors
///
/// Returns an [Error::HashingError] if the token could not be serialized,
/// which indicates a bug rather than bad user input.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let expires_at = OffsetDateTime::now_utc() + duration;
    let token = Token {
        user_id,
        expires_at,
    };
    let token_string = serde_json::to_string(&token)
        .map_err(|error| Error::HashingError(format!("could not serialize token: {error}")))?;

    Ok(jar.add(
        Cookie::build((COOKIE_TOKEN, token_string))
            .expires(expires_at)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    ))
}

/// Set the auth cookie to an invalid value and set its max age to zero, which should delete the cookie on the client side.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Push the expiry of the auth cookie in `jar` out to the later of UTC now
/// plus `duration` and the token's current expiry.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
///
/// Returns the same errors as [get_token_from_cookies], or an
/// [Error::HashingError] if the refreshed token could not be serialized.
pub(crate) fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let token = get_token_from_cookies(&jar)?;

    let new_expiry = std::cmp::max(token.expires_at, OffsetDateTime::now_utc() + duration);
    let refreshed = Token {
        user_id: token.user_id,
        expires_at: new_expiry,
    };
    let token_string = serde_json::to_string(&refreshed)
        .map_err(|error| Error::HashingError(format!("could not serialize token: {error}")))?;

    Ok(jar.add(
        Cookie::build((COOKIE_TOKEN, token_string))
            .expires(new_expiry)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    ))
}

/// Parse and verify the auth token stored in `jar`.
///
/// # Errors
///
/// Returns a:
/// - [Error::CookieMissing] if there is no auth cookie in the jar,
/// - or [Error::InvalidCredentials] if the cookie contents cannot be parsed as a token,
/// - or [Error::TokenExpired] if the token has passed its expiry.
pub(crate) fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::CookieMissing)?;

    let token: Token =
        serde_json::from_str(cookie.value_trimmed()).map_err(|_| Error::InvalidCredentials)?;

    if token.expires_at <= OffsetDateTime::now_utc() {
        return Err(Error::TokenExpired);
    }

    Ok(token)
}

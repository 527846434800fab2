//! The profile page and its account management endpoints.
//!
//! From here a user can change their password or delete their account along
//! with all of their data.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, PasswordHash, ValidatedPassword,
    alert::AlertTemplate,
    auth::invalidate_auth_cookie,
    endpoints,
    html::{BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, CARD_STYLE, PAGE_CONTAINER_STYLE, base, password_input},
    navigation::NavBar,
    shared::render,
    user::{UserID, delete_user, get_user_by_id, update_password},
};

/// The state needed for the profile page and its endpoints.
#[derive(Debug, Clone)]
pub struct ProfileState {
    /// The key for encrypting and decrypting the auth cookie.
    pub cookie_key: Key,
    /// The database connection for managing the user account.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<ProfileState> for Key {
    fn from_ref(state: &ProfileState) -> Self {
        state.cookie_key.clone()
    }
}

/// The form data for changing the account password.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordForm {
    /// The password the user currently signs in with.
    pub current_password: String,
    /// The password to switch to.
    pub new_password: String,
    /// A second copy of the new password to catch typos.
    pub confirm_new_password: String,
}

fn change_password_form() -> Markup {
    html! {
        form method="post" action=(endpoints::CHANGE_PASSWORD) class="space-y-4"
        {
            (password_input("current_password", "Current Password", None))
            (password_input("new_password", "New Password", None))
            (password_input("confirm_new_password", "Confirm New Password", None))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Change password" }
        }
    }
}

fn delete_account_form() -> Markup {
    html! {
        form method="post" action=(endpoints::DELETE_ACCOUNT)
        {
            p class="mb-2 text-sm text-gray-500 dark:text-gray-400"
            {
                "Deleting your account removes all of your transactions. This cannot be undone."
            }

            button type="submit" class=(BUTTON_DELETE_STYLE) { "Delete account" }
        }
    }
}

fn profile_page(username: &str, alert: Option<Markup>) -> Response {
    let content = html! {
        (NavBar::new(endpoints::PROFILE_VIEW).into_html())

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-6"
            {
                h1 class="text-2xl font-bold" { "Profile" }

                @if let Some(alert) = alert
                {
                    (alert)
                }

                div class=(CARD_STYLE)
                {
                    p class="text-sm text-gray-500 dark:text-gray-400" { "Signed in as" }
                    p class="text-lg font-semibold" { (username) }
                }

                div class=(CARD_STYLE)
                {
                    h2 class="text-lg font-semibold mb-4" { "Change password" }
                    (change_password_form())
                }

                div class=(CARD_STYLE)
                {
                    h2 class="text-lg font-semibold mb-4" { "Danger zone" }
                    (delete_account_form())
                }
            }
        }
    };

    render(StatusCode::OK, base("Profile", &content))
}

/// Display the profile page for the signed-in user.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_profile_page(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let user = match get_user_by_id(
        user_id,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    ) {
        Ok(user) => user,
        Err(error) => return error.into_response(),
    };

    profile_page(&user.username, None)
}

/// Change the signed-in user's password.
///
/// The current password must verify, the new password must be strong enough,
/// and both copies of the new password must match.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn post_change_password(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ChangePasswordForm>,
) -> Response {
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    let user = match get_user_by_id(user_id, &connection) {
        Ok(user) => user,
        Err(error) => return error.into_response(),
    };

    match user.password_hash.verify(&form.current_password) {
        Ok(true) => {}
        Ok(false) => {
            return profile_page(
                &user.username,
                Some(
                    AlertTemplate::error_simple("The current password is incorrect.").markup(),
                ),
            );
        }
        Err(error) => {
            tracing::error!("Password verification failed: {error}");
            return crate::Error::HashingError(error.to_string()).into_response();
        }
    }

    if form.new_password != form.confirm_new_password {
        return profile_page(
            &user.username,
            Some(AlertTemplate::error_simple("The new passwords do not match.").markup()),
        );
    }

    let validated_password = match ValidatedPassword::new(&form.new_password) {
        Ok(password) => password,
        Err(error) => {
            return profile_page(
                &user.username,
                Some(AlertTemplate::error("Password is too weak", &error.to_string()).markup()),
            );
        }
    };

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("Password hashing failed: {error}");
            return error.into_response();
        }
    };

    match update_password(user_id, password_hash, &connection) {
        Ok(()) => profile_page(
            &user.username,
            Some(AlertTemplate::success("Password changed.", "").markup()),
        ),
        Err(error) => error.into_response(),
    }
}

/// Delete the signed-in user's account and all of their transactions, then
/// sign them out.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn post_delete_account(
    State(state): State<ProfileState>,
    jar: PrivateCookieJar,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let result = delete_user(
        user_id,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    );

    match result {
        Ok(()) => {
            let jar = invalidate_auth_cookie(jar);
            (jar, Redirect::to(endpoints::REGISTER_VIEW)).into_response()
        }
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod profile_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Form, extract::State, http::StatusCode};
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use rusqlite::Connection;

    use crate::{
        Error, PasswordHash, endpoints,
        profile::{
            ChangePasswordForm, ProfileState, get_profile_page, post_change_password,
            post_delete_account,
        },
        user::{UserID, create_user, get_user_by_id},
    };

    const TEST_COST: u32 = 4;

    fn get_test_state() -> (ProfileState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        crate::db::initialize(&connection).unwrap();
        let user = create_user(
            "alice",
            PasswordHash::from_raw_password("correcthorsebatterystaple", TEST_COST).unwrap(),
            &connection,
        )
        .expect("Could not create test user");

        (
            ProfileState {
                cookie_key: Key::generate(),
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    async fn response_text(response: axum::response::Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8_lossy(&body).to_string()
    }

    #[tokio::test]
    async fn page_shows_username() {
        let (state, user_id) = get_test_state();

        let response = get_profile_page(State(state), Extension(user_id)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_text(response).await;
        assert!(body.contains("alice"));
        assert!(body.contains(endpoints::CHANGE_PASSWORD));
        assert!(body.contains(endpoints::DELETE_ACCOUNT));
    }

    #[tokio::test]
    async fn change_password_updates_the_stored_hash() {
        let (state, user_id) = get_test_state();

        let response = post_change_password(
            State(state.clone()),
            Extension(user_id),
            Form(ChangePasswordForm {
                current_password: "correcthorsebatterystaple".to_owned(),
                new_password: "anotherstronghorsestaple".to_owned(),
                confirm_new_password: "anotherstronghorsestaple".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response_text(response).await;
        assert!(body.contains("Password changed."));

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_id(user_id, &connection).unwrap();
        assert!(user.password_hash.verify("anotherstronghorsestaple").unwrap());
    }

    #[tokio::test]
    async fn change_password_rejects_wrong_current_password() {
        let (state, user_id) = get_test_state();

        let response = post_change_password(
            State(state.clone()),
            Extension(user_id),
            Form(ChangePasswordForm {
                current_password: "wrong".to_owned(),
                new_password: "anotherstronghorsestaple".to_owned(),
                confirm_new_password: "anotherstronghorsestaple".to_owned(),
            }),
        )
        .await;

        let body = response_text(response).await;
        assert!(body.contains("The current password is incorrect."));

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_id(user_id, &connection).unwrap();
        assert!(user.password_hash.verify("correcthorsebatterystaple").unwrap());
    }

    #[tokio::test]
    async fn change_password_rejects_mismatched_confirmation() {
        let (state, user_id) = get_test_state();

        let response = post_change_password(
            State(state),
            Extension(user_id),
            Form(ChangePasswordForm {
                current_password: "correcthorsebatterystaple".to_owned(),
                new_password: "anotherstronghorsestaple".to_owned(),
                confirm_new_password: "somethingelseentirely".to_owned(),
            }),
        )
        .await;

        let body = response_text(response).await;
        assert!(body.contains("The new passwords do not match."));
    }

    #[tokio::test]
    async fn change_password_rejects_weak_password() {
        let (state, user_id) = get_test_state();

        let response = post_change_password(
            State(state),
            Extension(user_id),
            Form(ChangePasswordForm {
                current_password: "correcthorsebatterystaple".to_owned(),
                new_password: "password".to_owned(),
                confirm_new_password: "password".to_owned(),
            }),
        )
        .await;

        let body = response_text(response).await;
        assert!(body.contains("Password is too weak"));
    }

    #[tokio::test]
    async fn delete_account_removes_user_and_signs_out() {
        let (state, user_id) = get_test_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = post_delete_account(State(state.clone()), jar, Extension(user_id)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            endpoints::REGISTER_VIEW
        );

        let set_cookie = response
            .headers()
            .get("set-cookie")
            .expect("deleting the account should expire the auth cookie")
            .to_str()
            .unwrap();
        assert!(set_cookie.contains("token="));

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_user_by_id(user_id, &connection), Err(Error::NotFound));
    }
}

//! The registration page for creating a new user account.
use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, log_in_register,
        password_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    shared::render,
    user::create_user,
};

pub fn confirm_password_input(error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm_password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm_password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                autofocus[error_message.is_some()]
            ;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }

    }
}

fn registration_form(
    username: &str,
    username_error_message: Option<&str>,
    password_error_message: Option<&str>,
    confirm_password_error_message: Option<&str>,
) -> Markup {
    html! {
        form
            method="post"
            action=(endpoints::USERS)
            class="space-y-4 md:space-y-6"
        {
            div
            {
                label for="username" class=(FORM_LABEL_STYLE) { "Username" }

                input
                    type="text"
                    name="username"
                    id="username"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    autofocus
                    value=(username);

                @if let Some(error_message) = username_error_message
                {
                    p class="text-red-500 text-base" { (error_message) }
                }
            }

            (password_input("password", "Password", password_error_message))
            (confirm_password_input(confirm_password_error_message))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Log in here"
                }
            }
        }
    }
}

fn registration_page(
    username: &str,
    username_error_message: Option<&str>,
    password_error_message: Option<&str>,
    confirm_password_error_message: Option<&str>,
) -> Response {
    let registration_form = registration_form(
        username,
        username_error_message,
        password_error_message,
        confirm_password_error_message,
    );
    let content = log_in_register("Create an account", &registration_form);

    render(StatusCode::OK, base("Register", &content))
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    registration_page("", None, None, None)
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

pub async fn register_user(
    State(state): State<RegistrationState>,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let username = user_data.username.trim();

    if username.is_empty() {
        return registration_page(username, Some("Enter a username"), None, None);
    }

    let validated_password = match ValidatedPassword::new(&user_data.password) {
        Ok(password) => password,
        Err(error) => {
            return registration_page(username, None, Some(error.to_string().as_ref()), None);
        }
    };

    if user_data.password != user_data.confirm_password {
        return registration_page(username, None, None, Some("Passwords do not match"));
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("an error occurred while hashing a password: {e}");

            return get_internal_server_error_redirect();
        }
    };

    match create_user(
        username,
        password_hash,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    ) {
        Ok(_) => Redirect::to(endpoints::LOG_IN_VIEW).into_response(),
        Err(Error::DuplicateUsername(username)) => registration_page(
            &username,
            Some("That username is already taken, pick another one."),
            None,
            None,
        ),
        Err(e) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {e}");

            get_internal_server_error_redirect()
        }
    }
}


#[cfg(test)]
mod register_user_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form, Router,
        body::Body,
        extract::State,
        http::{Response, StatusCode},
        response::IntoResponse,
        routing::post,
    };
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        PasswordHash,
        auth::register::{RegisterForm, register_user},
        endpoints,
        user::create_user,
    };

    use super::RegistrationState;

    fn get_test_app_config() -> RegistrationState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        crate::db::initialize(&connection).expect("Could not initialize database");

        RegistrationState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn create_user_succeeds() {
        let app = Router::new()
            .route(endpoints::USERS, post(register_user))
            .with_state(get_test_app_config());

        let server = TestServer::new(app);

        server
            .post(endpoints::USERS)
            .form(&RegisterForm {
                username: "alice".to_string(),
                password: "iamtestingwhethericancreateanewuser".to_string(),
                confirm_password: "iamtestingwhethericancreateanewuser".to_string(),
            })
            .await
            .assert_status_see_other();
    }

    #[tokio::test]
    async fn create_user_fails_with_duplicate_username() {
        let state = get_test_app_config();
        create_user(
            "alice",
            PasswordHash::from_raw_password("foobarbazquxgobbledygook", 4).unwrap(),
            &state
                .db_connection
                .lock()
                .expect("Could not acquire database connection"),
        )
        .expect("Could not create test user");

        let response = register_user(
            State(state.clone()),
            Form(RegisterForm {
                username: "alice".to_string(),
                password: "averystrongandsecurepassword".to_string(),
                confirm_password: "averystrongandsecurepassword".to_string(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let fragment = parse_html(response).await;
        let p_selector = scraper::Selector::parse("p.text-red-500").unwrap();
        let paragraphs = fragment.select(&p_selector).collect::<Vec<_>>();
        assert_eq!(paragraphs.len(), 1, "want 1 p, got {}", paragraphs.len());
        let paragraph = paragraphs.first().unwrap();
        let paragraph_text = paragraph.text().collect::<String>().to_lowercase();
        assert!(
            paragraph_text.contains("already taken"),
            "'{paragraph_text}' does not contain the text 'already taken'"
        );
    }

    #[tokio::test]
    async fn create_user_fails_when_password_is_weak() {
        let app = Router::new()
            .route(endpoints::USERS, post(register_user))
            .with_state(get_test_app_config());

        let server = TestServer::new(app);

        let response = server
            .post(endpoints::USERS)
            .form(&RegisterForm {
                username: "alice".to_string(),
                password: "foo".to_string(),
                confirm_password: "foo".to_string(),
            })
            .await
            .text();

        let fragment = parse_html(response.into_response()).await;

        let p_selector = scraper::Selector::parse("p.text-red-500").unwrap();
        let paragraphs = fragment.select(&p_selector).collect::<Vec<_>>();
        assert_eq!(paragraphs.len(), 1, "want 1 p, got {}", paragraphs.len());
        let paragraph = paragraphs.first().unwrap();
        let paragraph_text = paragraph.text().collect::<String>().to_lowercase();
        assert!(
            paragraph_text.contains("password is too weak"),
            "'{paragraph_text}' does not contain the text 'password is too weak'"
        );
    }

    #[tokio::test]
    async fn create_user_fails_when_passwords_do_not_match() {
        let app = Router::new()
            .route(endpoints::USERS, post(register_user))
            .with_state(get_test_app_config());

        let server = TestServer::new(app);

        let response = server
            .post(endpoints::USERS)
            .form(&RegisterForm {
                username: "alice".to_string(),
                password: "iamtestingwhethericancreateanewuser".to_string(),
                confirm_password: "thisisadifferentpassword".to_string(),
            })
            .await
            .text();

        let fragment = parse_html(response.into_response()).await;

        let p_selector = scraper::Selector::parse("p.text-red-500").unwrap();
        let paragraphs = fragment.select(&p_selector).collect::<Vec<_>>();
        assert_eq!(paragraphs.len(), 1, "want 1 p, got {}", paragraphs.len());
        let paragraph = paragraphs.first().unwrap();
        let paragraph_text = paragraph.text().collect::<String>().to_lowercase();
        assert!(
            paragraph_text.contains("passwords do not match"),
            "'{paragraph_text}' does not contain the text 'passwords do not match'"
        );
    }

    async fn parse_html(response: Response<Body>) -> scraper::Html {
        let body = response.into_body();
        let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&body).to_string();

        scraper::Html::parse_document(&text)
    }
}

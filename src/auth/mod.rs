//! User authentication: passwords, auth cookies, and the log-in/log-out/registration routes.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod register;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{LogInData, get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{AuthState, auth_guard};
pub use password::{PasswordHash, ValidatedPassword};
pub use redirect::normalize_redirect_url;
pub use register::{get_register_page, register_user};

#[cfg(test)]
pub use cookie::COOKIE_TOKEN;

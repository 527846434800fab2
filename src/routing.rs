//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    extract::FromRef,
    middleware,
    response::Redirect,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    analytics::get_analytics_page,
    auth::{
        AuthState, auth_guard, get_log_in_page, get_log_out, get_register_page, post_log_in,
        register_user,
    },
    csv_io::{get_import_page, post_import_transactions},
    dashboard::{get_dashboard_data, get_dashboard_page},
    endpoints,
    internal_server_error::get_internal_server_error_page,
    logging::logging_middleware,
    not_found::get_404_not_found,
    profile::{get_profile_page, post_change_password, post_delete_account},
    report::get_report,
    transaction::{
        get_edit_transaction_page, get_new_transaction_page, get_transactions_page,
        post_create_transaction, post_delete_transaction, post_update_transaction,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let auth_state = AuthState::from_ref(&state);

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::DASHBOARD_DATA, get(get_dashboard_data))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_new_transaction_page),
        )
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .route(endpoints::TRANSACTIONS_API, post(post_create_transaction))
        .route(endpoints::UPDATE_TRANSACTION, post(post_update_transaction))
        .route(endpoints::DELETE_TRANSACTION, post(post_delete_transaction))
        .route(endpoints::IMPORT_VIEW, get(get_import_page))
        .route(endpoints::IMPORT, post(post_import_transactions))
        .route(endpoints::ANALYTICS_VIEW, get(get_analytics_page))
        .route(endpoints::REPORT, get(get_report))
        .route(endpoints::PROFILE_VIEW, get(get_profile_page))
        .route(endpoints::CHANGE_PASSWORD, post(post_change_password))
        .route(endpoints::DELETE_ACCOUNT, post(post_delete_account))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .layer(middleware::from_fn_with_state(auth_state, auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}

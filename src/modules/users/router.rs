use axum::{
    Router,
    routing::{get, patch, post},
};

use super::controller::{
    create_school_admin, get_user, list_users, reset_user_password, update_user_status,
};
use crate::state::AppState;

/// Expects an admin guard on the router it is nested into, which stores the
/// caller's `AuthUser` in the request extensions.
pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/{id}", get(get_user))
        .route("/{id}/status", patch(update_user_status))
        .route("/{id}/reset-password", post(reset_user_password))
}

/// Needs a system-admin guard in addition to the users router's guard.
pub fn init_school_admins_router() -> Router<AppState> {
    Router::new().route("/school-admins", post(create_school_admin))
}

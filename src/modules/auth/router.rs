use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{change_password, forgot_password, login, me, refresh};
use crate::state::AppState;

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/me", get(me))
        .route("/change-password", post(change_password))
        .route("/forgot-password", post(forgot_password))
}

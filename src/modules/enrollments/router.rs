use axum::{
    Router,
    routing::{get, patch, post},
};

use super::controller::{
    create_enrollment, delete_enrollment, get_enrollment, list_enrollments, transfer_enrollment,
    update_enrollment_status,
};
use crate::state::AppState;

pub fn init_enrollments_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_enrollments).post(create_enrollment))
        .route("/{id}", get(get_enrollment).delete(delete_enrollment))
        .route("/{id}/status", patch(update_enrollment_status))
        .route("/{id}/transfer", post(transfer_enrollment))
}

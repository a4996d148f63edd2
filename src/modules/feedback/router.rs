use axum::{
    Router,
    routing::{get, patch},
};

use super::controller::{
    create_feedback, delete_feedback, get_feedback, list_feedback, my_feedback,
    update_feedback_status,
};
use crate::state::AppState;

pub fn init_feedback_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_feedback).post(create_feedback))
        .route("/mine", get(my_feedback))
        .route("/{id}", get(get_feedback).delete(delete_feedback))
        .route("/{id}/status", patch(update_feedback_status))
}

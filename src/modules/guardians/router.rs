use axum::{
    Router,
    routing::{delete, get},
};

use super::controller::{
    create_guardian, delete_guardian, get_guardian, get_guardian_students, link_student,
    list_guardians, unlink_student, update_guardian,
};
use crate::state::AppState;

pub fn init_guardians_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_guardians).post(create_guardian))
        .route(
            "/{id}",
            get(get_guardian).put(update_guardian).delete(delete_guardian),
        )
        .route(
            "/{id}/students",
            get(get_guardian_students).post(link_student),
        )
        .route("/{id}/students/{student_id}", delete(unlink_student))
}

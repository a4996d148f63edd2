use axum::{Router, routing::get};

use super::controller::{
    create_teacher, delete_teacher, get_teacher, get_teacher_classes, list_teachers,
    update_teacher,
};
use crate::state::AppState;

pub fn init_teachers_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_teachers).post(create_teacher))
        .route(
            "/{id}",
            get(get_teacher).put(update_teacher).delete(delete_teacher),
        )
        .route("/{id}/classes", get(get_teacher_classes))
}

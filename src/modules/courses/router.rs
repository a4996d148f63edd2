use axum::{Router, routing::get};

use super::controller::{create_course, delete_course, get_course, list_courses, update_course};
use crate::state::AppState;

pub fn init_courses_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route(
            "/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
}

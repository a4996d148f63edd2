use axum::{Router, routing::get};

use super::controller::{
    class_roster, create_class, delete_class, get_class, list_classes, update_class,
};
use crate::state::AppState;

pub fn init_classes_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_classes).post(create_class))
        .route(
            "/{id}",
            get(get_class).put(update_class).delete(delete_class),
        )
        .route("/{id}/students", get(class_roster))
}

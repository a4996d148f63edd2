use axum::{Router, routing::get};

use super::controller::{create_staff, delete_staff, get_staff, list_staff, update_staff};
use crate::state::AppState;

pub fn init_staff_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_staff).post(create_staff))
        .route(
            "/{id}",
            get(get_staff).put(update_staff).delete(delete_staff),
        )
}

use axum::{
    Router,
    routing::{get, post},
};

use super::controller::{
    activate_academic_year, create_academic_year, delete_academic_year, get_academic_year,
    list_academic_years, update_academic_year,
};
use crate::state::AppState;

pub fn init_academic_years_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_academic_years).post(create_academic_year))
        .route(
            "/{id}",
            get(get_academic_year)
                .put(update_academic_year)
                .delete(delete_academic_year),
        )
        .route("/{id}/activate", post(activate_academic_year))
}

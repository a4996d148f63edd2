use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::middleware::role::{require_admin, require_system_admin};
use crate::modules::academic_years::init_academic_years_router;
use crate::modules::auth::init_auth_router;
use crate::modules::classes::init_classes_router;
use crate::modules::courses::init_courses_router;
use crate::modules::enrollments::init_enrollments_router;
use crate::modules::feedback::init_feedback_router;
use crate::modules::guardians::init_guardians_router;
use crate::modules::health::init_health_router;
use crate::modules::schools::init_schools_router;
use crate::modules::staff::init_staff_router;
use crate::modules::students::init_students_router;
use crate::modules::teachers::init_teachers_router;
use crate::modules::users::{init_school_admins_router, init_users_router};
use crate::state::AppState;
use axum::http::{HeaderValue, Method, header};
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

pub fn init_router(state: AppState) -> Router {
    // Account administration is guarded as a whole; creating school admins
    // additionally requires a system administrator.
    let users = init_users_router()
        .merge(init_school_admins_router().route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_system_admin,
        )))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .merge(init_health_router())
        .nest(
            "/api",
            Router::new()
                .nest("/auth", init_auth_router())
                .nest("/users", users)
                .nest("/schools", init_schools_router())
                .nest("/students", init_students_router())
                .nest("/teachers", init_teachers_router())
                .nest("/staff", init_staff_router())
                .nest("/guardians", init_guardians_router())
                .nest("/academic-years", init_academic_years_router())
                .nest("/courses", init_courses_router())
                .nest("/classes", init_classes_router())
                .nest("/enrollments", init_enrollments_router())
                .nest("/feedback", init_feedback_router()),
        )
        .with_state(state.clone())
        .layer(cors_layer(&state))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
}

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use escola_core::AppError;
use escola_models::courses::{
    Course, CourseFilterParams, CreateCourseDto, PaginatedCoursesResponse, UpdateCourseDto,
};
use escola_models::ids::CourseId;
use tracing::instrument;

use super::service::CourseService;
use crate::docs::ErrorResponse;
use crate::middleware::auth::{AuthUser, RequireSchoolAdmin};
use crate::state::AppState;
use crate::utils::access::{resource_scope, school_filter, school_for_scoped_operation};
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCourseDto,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 409, description = "Course name already used", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn create_course(
    State(state): State<AppState>,
    RequireSchoolAdmin(auth_user): RequireSchoolAdmin,
    ValidatedJson(dto): ValidatedJson<CreateCourseDto>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let course = CourseService::create_course(&state.db, school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// List courses
///
/// `name` is a case-insensitive substring match.
#[utoipa::path(
    get,
    path = "/api/courses",
    params(CourseFilterParams),
    responses((status = 200, description = "Courses", body = PaginatedCoursesResponse)),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn list_courses(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<CourseFilterParams>,
) -> Result<Json<PaginatedCoursesResponse>, AppError> {
    let school_id = school_filter(&auth_user, filters.school_id)?;
    let courses = CourseService::list_courses(&state.db, school_id, filters).await?;
    Ok(Json(courses))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = CourseId, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course", body = Course),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_course(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<CourseId>,
) -> Result<Json<Course>, AppError> {
    let course = CourseService::get_course(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(Json(course))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    params(("id" = CourseId, Path, description = "Course ID")),
    request_body = UpdateCourseDto,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Course name already used", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn update_course(
    State(state): State<AppState>,
    RequireSchoolAdmin(auth_user): RequireSchoolAdmin,
    Path(id): Path<CourseId>,
    ValidatedJson(dto): ValidatedJson<UpdateCourseDto>,
) -> Result<Json<Course>, AppError> {
    let course =
        CourseService::update_course(&state.db, id, resource_scope(&auth_user)?, dto).await?;
    Ok(Json(course))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(("id" = CourseId, Path, description = "Course ID")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Classes still reference the course", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn delete_course(
    State(state): State<AppState>,
    RequireSchoolAdmin(auth_user): RequireSchoolAdmin,
    Path(id): Path<CourseId>,
) -> Result<StatusCode, AppError> {
    CourseService::delete_course(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

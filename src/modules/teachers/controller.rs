use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use escola_core::AppError;
use escola_models::classes::Class;
use escola_models::ids::TeacherId;
use escola_models::teachers::{
    CreateTeacherDto, CreatedTeacherResponse, PaginatedTeachersResponse, Teacher,
    TeacherFilterParams, UpdateTeacherDto,
};
use tracing::instrument;

use super::service::TeacherService;
use crate::docs::ErrorResponse;
use crate::middleware::auth::{RequireFaculty, RequireOffice};
use crate::state::AppState;
use crate::utils::access::{resource_scope, school_filter, school_for_scoped_operation};
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/teachers",
    request_body = CreateTeacherDto,
    responses(
        (status = 201, description = "Teacher registered", body = CreatedTeacherResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 409, description = "Email or document in use", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Teachers"
)]
#[instrument(skip(state, dto))]
pub async fn create_teacher(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    ValidatedJson(dto): ValidatedJson<CreateTeacherDto>,
) -> Result<(StatusCode, Json<CreatedTeacherResponse>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let created =
        TeacherService::create_teacher(&state.db, &state.email_config, school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/teachers",
    params(TeacherFilterParams),
    responses((status = 200, description = "Teachers", body = PaginatedTeachersResponse)),
    security(("bearer_auth" = [])),
    tag = "Teachers"
)]
#[instrument(skip(state))]
pub async fn list_teachers(
    State(state): State<AppState>,
    RequireFaculty(auth_user): RequireFaculty,
    Query(filters): Query<TeacherFilterParams>,
) -> Result<Json<PaginatedTeachersResponse>, AppError> {
    let school_id = school_filter(&auth_user, filters.school_id)?;
    let teachers = TeacherService::list_teachers(&state.db, school_id, filters).await?;
    Ok(Json(teachers))
}

#[utoipa::path(
    get,
    path = "/api/teachers/{id}",
    params(("id" = TeacherId, Path, description = "Teacher ID")),
    responses(
        (status = 200, description = "Teacher", body = Teacher),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Teachers"
)]
#[instrument(skip(state))]
pub async fn get_teacher(
    State(state): State<AppState>,
    RequireFaculty(auth_user): RequireFaculty,
    Path(id): Path<TeacherId>,
) -> Result<Json<Teacher>, AppError> {
    let teacher = TeacherService::get_teacher(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(Json(teacher))
}

#[utoipa::path(
    put,
    path = "/api/teachers/{id}",
    params(("id" = TeacherId, Path, description = "Teacher ID")),
    request_body = UpdateTeacherDto,
    responses(
        (status = 200, description = "Teacher updated", body = Teacher),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Email or document in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Teachers"
)]
#[instrument(skip(state, dto))]
pub async fn update_teacher(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    Path(id): Path<TeacherId>,
    ValidatedJson(dto): ValidatedJson<UpdateTeacherDto>,
) -> Result<Json<Teacher>, AppError> {
    let teacher =
        TeacherService::update_teacher(&state.db, id, resource_scope(&auth_user)?, dto).await?;
    Ok(Json(teacher))
}

#[utoipa::path(
    delete,
    path = "/api/teachers/{id}",
    params(("id" = TeacherId, Path, description = "Teacher ID")),
    responses(
        (status = 204, description = "Teacher deleted"),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Teachers"
)]
#[instrument(skip(state))]
pub async fn delete_teacher(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    Path(id): Path<TeacherId>,
) -> Result<StatusCode, AppError> {
    TeacherService::delete_teacher(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Classes where the teacher is the homeroom teacher
#[utoipa::path(
    get,
    path = "/api/teachers/{id}/classes",
    params(("id" = TeacherId, Path, description = "Teacher ID")),
    responses(
        (status = 200, description = "Classes", body = Vec<Class>),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Teachers"
)]
#[instrument(skip(state))]
pub async fn get_teacher_classes(
    State(state): State<AppState>,
    RequireFaculty(auth_user): RequireFaculty,
    Path(id): Path<TeacherId>,
) -> Result<Json<Vec<Class>>, AppError> {
    let classes =
        TeacherService::teacher_classes(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(Json(classes))
}

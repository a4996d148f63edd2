use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use escola_core::AppError;
use escola_models::classes::{
    Class, ClassFilterParams, CreateClassDto, PaginatedClassesResponse, RosterEntry,
    UpdateClassDto,
};
use escola_models::ids::ClassId;
use tracing::instrument;

use super::service::ClassService;
use crate::docs::ErrorResponse;
use crate::middleware::auth::{RequireFaculty, RequireOffice};
use crate::state::AppState;
use crate::utils::access::{resource_scope, school_filter, school_for_scoped_operation};
use crate::validator::ValidatedJson;

/// Create a class
///
/// The course, academic year and homeroom teacher must belong to the same
/// school as the class.
#[utoipa::path(
    post,
    path = "/api/classes",
    request_body = CreateClassDto,
    responses(
        (status = 201, description = "Class created", body = Class),
        (status = 404, description = "Course, academic year or teacher not found", body = ErrorResponse),
        (status = 409, description = "Class name already used", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn create_class(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    ValidatedJson(dto): ValidatedJson<CreateClassDto>,
) -> Result<(StatusCode, Json<Class>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let class = ClassService::create_class(&state.db, school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

#[utoipa::path(
    get,
    path = "/api/classes",
    params(ClassFilterParams),
    responses((status = 200, description = "Classes with active enrollment counts", body = PaginatedClassesResponse)),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn list_classes(
    State(state): State<AppState>,
    RequireFaculty(auth_user): RequireFaculty,
    Query(filters): Query<ClassFilterParams>,
) -> Result<Json<PaginatedClassesResponse>, AppError> {
    let school_id = school_filter(&auth_user, filters.school_id)?;
    let classes = ClassService::list_classes(&state.db, school_id, filters).await?;
    Ok(Json(classes))
}

#[utoipa::path(
    get,
    path = "/api/classes/{id}",
    params(("id" = ClassId, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class", body = Class),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn get_class(
    State(state): State<AppState>,
    RequireFaculty(auth_user): RequireFaculty,
    Path(id): Path<ClassId>,
) -> Result<Json<Class>, AppError> {
    let class = ClassService::get_class(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(Json(class))
}

#[utoipa::path(
    put,
    path = "/api/classes/{id}",
    params(("id" = ClassId, Path, description = "Class ID")),
    request_body = UpdateClassDto,
    responses(
        (status = 200, description = "Class updated", body = Class),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Class name already used", body = ErrorResponse),
        (status = 422, description = "Capacity below active enrollments", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn update_class(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    Path(id): Path<ClassId>,
    ValidatedJson(dto): ValidatedJson<UpdateClassDto>,
) -> Result<Json<Class>, AppError> {
    let class = ClassService::update_class(&state.db, id, resource_scope(&auth_user)?, dto).await?;
    Ok(Json(class))
}

#[utoipa::path(
    delete,
    path = "/api/classes/{id}",
    params(("id" = ClassId, Path, description = "Class ID")),
    responses(
        (status = 204, description = "Class deleted"),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Class has active enrollments", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn delete_class(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    Path(id): Path<ClassId>,
) -> Result<StatusCode, AppError> {
    ClassService::delete_class(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/classes/{id}/students",
    params(("id" = ClassId, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Students actively enrolled in the class", body = Vec<RosterEntry>),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Classes"
)]
#[instrument(skip(state))]
pub async fn class_roster(
    State(state): State<AppState>,
    RequireFaculty(auth_user): RequireFaculty,
    Path(id): Path<ClassId>,
) -> Result<Json<Vec<RosterEntry>>, AppError> {
    let roster = ClassService::roster(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(Json(roster))
}

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use escola_core::AppError;
use escola_models::guardians::{
    CreateGuardianDto, CreatedGuardianResponse, Guardian, GuardianFilterParams, GuardianStudent,
    LinkStudentDto, PaginatedGuardiansResponse, UpdateGuardianDto,
};
use escola_models::ids::{GuardianId, StudentId};
use tracing::instrument;

use super::service::GuardianService;
use crate::docs::ErrorResponse;
use crate::middleware::auth::RequireOffice;
use crate::state::AppState;
use crate::utils::access::{resource_scope, school_filter, school_for_scoped_operation};
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/guardians",
    request_body = CreateGuardianDto,
    responses(
        (status = 201, description = "Guardian registered", body = CreatedGuardianResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 409, description = "Email or document in use", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Guardians"
)]
#[instrument(skip(state, dto))]
pub async fn create_guardian(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    ValidatedJson(dto): ValidatedJson<CreateGuardianDto>,
) -> Result<(StatusCode, Json<CreatedGuardianResponse>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let created =
        GuardianService::create_guardian(&state.db, &state.email_config, school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/guardians",
    params(GuardianFilterParams),
    responses((status = 200, description = "Guardians", body = PaginatedGuardiansResponse)),
    security(("bearer_auth" = [])),
    tag = "Guardians"
)]
#[instrument(skip(state))]
pub async fn list_guardians(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    Query(filters): Query<GuardianFilterParams>,
) -> Result<Json<PaginatedGuardiansResponse>, AppError> {
    let school_id = school_filter(&auth_user, filters.school_id)?;
    let guardians = GuardianService::list_guardians(&state.db, school_id, filters).await?;
    Ok(Json(guardians))
}

#[utoipa::path(
    get,
    path = "/api/guardians/{id}",
    params(("id" = GuardianId, Path, description = "Guardian ID")),
    responses(
        (status = 200, description = "Guardian", body = Guardian),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Guardians"
)]
#[instrument(skip(state))]
pub async fn get_guardian(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    Path(id): Path<GuardianId>,
) -> Result<Json<Guardian>, AppError> {
    let guardian =
        GuardianService::get_guardian(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(Json(guardian))
}

#[utoipa::path(
    put,
    path = "/api/guardians/{id}",
    params(("id" = GuardianId, Path, description = "Guardian ID")),
    request_body = UpdateGuardianDto,
    responses(
        (status = 200, description = "Guardian updated", body = Guardian),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Guardians"
)]
#[instrument(skip(state, dto))]
pub async fn update_guardian(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    Path(id): Path<GuardianId>,
    ValidatedJson(dto): ValidatedJson<UpdateGuardianDto>,
) -> Result<Json<Guardian>, AppError> {
    let guardian =
        GuardianService::update_guardian(&state.db, id, resource_scope(&auth_user)?, dto).await?;
    Ok(Json(guardian))
}

#[utoipa::path(
    delete,
    path = "/api/guardians/{id}",
    params(("id" = GuardianId, Path, description = "Guardian ID")),
    responses(
        (status = 204, description = "Guardian deleted"),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Guardians"
)]
#[instrument(skip(state))]
pub async fn delete_guardian(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    Path(id): Path<GuardianId>,
) -> Result<StatusCode, AppError> {
    GuardianService::delete_guardian(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Link a student to the guardian
#[utoipa::path(
    post,
    path = "/api/guardians/{id}/students",
    params(("id" = GuardianId, Path, description = "Guardian ID")),
    request_body = LinkStudentDto,
    responses(
        (status = 201, description = "Student linked", body = GuardianStudent),
        (status = 404, description = "Guardian or student not found", body = ErrorResponse),
        (status = 409, description = "Already linked", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Guardians"
)]
#[instrument(skip(state, dto))]
pub async fn link_student(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    Path(id): Path<GuardianId>,
    ValidatedJson(dto): ValidatedJson<LinkStudentDto>,
) -> Result<(StatusCode, Json<GuardianStudent>), AppError> {
    let link =
        GuardianService::link_student(&state.db, id, resource_scope(&auth_user)?, dto).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

#[utoipa::path(
    get,
    path = "/api/guardians/{id}/students",
    params(("id" = GuardianId, Path, description = "Guardian ID")),
    responses(
        (status = 200, description = "Linked students", body = Vec<GuardianStudent>),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Guardians"
)]
#[instrument(skip(state))]
pub async fn get_guardian_students(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    Path(id): Path<GuardianId>,
) -> Result<Json<Vec<GuardianStudent>>, AppError> {
    let students =
        GuardianService::guardian_students(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(Json(students))
}

#[utoipa::path(
    delete,
    path = "/api/guardians/{id}/students/{student_id}",
    params(
        ("id" = GuardianId, Path, description = "Guardian ID"),
        ("student_id" = StudentId, Path, description = "Student ID")
    ),
    responses(
        (status = 204, description = "Link removed"),
        (status = 404, description = "Not linked", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Guardians"
)]
#[instrument(skip(state))]
pub async fn unlink_student(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    Path((id, student_id)): Path<(GuardianId, StudentId)>,
) -> Result<StatusCode, AppError> {
    GuardianService::unlink_student(&state.db, id, student_id, resource_scope(&auth_user)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

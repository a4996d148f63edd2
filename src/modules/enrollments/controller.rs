use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use escola_core::AppError;
use escola_models::enrollments::{
    CreateEnrollmentDto, EnrollmentDetail, EnrollmentFilterParams, PaginatedEnrollmentsResponse,
    TransferEnrollmentDto, TransferResponse, UpdateEnrollmentStatusDto,
};
use escola_models::ids::EnrollmentId;
use tracing::instrument;

use super::service::EnrollmentService;
use crate::docs::ErrorResponse;
use crate::middleware::auth::{RequireFaculty, RequireOffice, RequireSchoolAdmin};
use crate::state::AppState;
use crate::utils::access::{resource_scope, school_filter};
use crate::validator::ValidatedJson;

/// Enroll a student
///
/// The academic year is taken from the class and the shift defaults to the
/// class shift.
#[utoipa::path(
    post,
    path = "/api/enrollments",
    request_body = CreateEnrollmentDto,
    responses(
        (status = 201, description = "Enrollment created", body = EnrollmentDetail),
        (status = 404, description = "Student or class not found", body = ErrorResponse),
        (status = 409, description = "Already enrolled this year, or class full", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip(state))]
pub async fn create_enrollment(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    ValidatedJson(dto): ValidatedJson<CreateEnrollmentDto>,
) -> Result<(StatusCode, Json<EnrollmentDetail>), AppError> {
    let enrollment =
        EnrollmentService::create_enrollment(&state.db, resource_scope(&auth_user)?, dto).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[utoipa::path(
    get,
    path = "/api/enrollments",
    params(EnrollmentFilterParams),
    responses((status = 200, description = "Enrollments", body = PaginatedEnrollmentsResponse)),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip(state))]
pub async fn list_enrollments(
    State(state): State<AppState>,
    RequireFaculty(auth_user): RequireFaculty,
    Query(filters): Query<EnrollmentFilterParams>,
) -> Result<Json<PaginatedEnrollmentsResponse>, AppError> {
    let school_id = school_filter(&auth_user, filters.school_id)?;
    let enrollments = EnrollmentService::list_enrollments(&state.db, school_id, filters).await?;
    Ok(Json(enrollments))
}

#[utoipa::path(
    get,
    path = "/api/enrollments/{id}",
    params(("id" = EnrollmentId, Path, description = "Enrollment ID")),
    responses(
        (status = 200, description = "Enrollment", body = EnrollmentDetail),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip(state))]
pub async fn get_enrollment(
    State(state): State<AppState>,
    RequireFaculty(auth_user): RequireFaculty,
    Path(id): Path<EnrollmentId>,
) -> Result<Json<EnrollmentDetail>, AppError> {
    let enrollment =
        EnrollmentService::get_enrollment(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(Json(enrollment))
}

/// Cancel or complete an enrollment
#[utoipa::path(
    patch,
    path = "/api/enrollments/{id}/status",
    params(("id" = EnrollmentId, Path, description = "Enrollment ID")),
    request_body = UpdateEnrollmentStatusDto,
    responses(
        (status = 200, description = "Status changed", body = EnrollmentDetail),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 422, description = "Transition not allowed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip(state))]
pub async fn update_enrollment_status(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    Path(id): Path<EnrollmentId>,
    ValidatedJson(dto): ValidatedJson<UpdateEnrollmentStatusDto>,
) -> Result<Json<EnrollmentDetail>, AppError> {
    let enrollment =
        EnrollmentService::update_status(&state.db, id, resource_scope(&auth_user)?, dto).await?;
    Ok(Json(enrollment))
}

#[utoipa::path(
    post,
    path = "/api/enrollments/{id}/transfer",
    params(("id" = EnrollmentId, Path, description = "Enrollment ID")),
    request_body = TransferEnrollmentDto,
    responses(
        (status = 200, description = "Closed and opened enrollments", body = TransferResponse),
        (status = 404, description = "Enrollment or target class not found", body = ErrorResponse),
        (status = 409, description = "Target class is full", body = ErrorResponse),
        (status = 422, description = "Enrollment not active, same class, or different year", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip(state))]
pub async fn transfer_enrollment(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    Path(id): Path<EnrollmentId>,
    ValidatedJson(dto): ValidatedJson<TransferEnrollmentDto>,
) -> Result<Json<TransferResponse>, AppError> {
    let transfer =
        EnrollmentService::transfer(&state.db, id, resource_scope(&auth_user)?, dto).await?;
    Ok(Json(transfer))
}

#[utoipa::path(
    delete,
    path = "/api/enrollments/{id}",
    params(("id" = EnrollmentId, Path, description = "Enrollment ID")),
    responses(
        (status = 204, description = "Enrollment deleted"),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollments"
)]
#[instrument(skip(state))]
pub async fn delete_enrollment(
    State(state): State<AppState>,
    RequireSchoolAdmin(auth_user): RequireSchoolAdmin,
    Path(id): Path<EnrollmentId>,
) -> Result<StatusCode, AppError> {
    EnrollmentService::delete_enrollment(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

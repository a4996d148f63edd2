use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use escola_core::AppError;
use escola_models::ids::StaffId;
use escola_models::staff::{
    CreateStaffDto, CreatedStaffResponse, PaginatedStaffResponse, StaffFilterParams, StaffMember,
    UpdateStaffDto,
};
use tracing::instrument;

use super::service::StaffService;
use crate::docs::ErrorResponse;
use crate::middleware::auth::{RequireOffice, RequireSchoolAdmin};
use crate::state::AppState;
use crate::utils::access::{resource_scope, school_filter, school_for_scoped_operation};
use crate::validator::ValidatedJson;

/// Register a secretariat staff member
#[utoipa::path(
    post,
    path = "/api/staff",
    request_body = CreateStaffDto,
    responses(
        (status = 201, description = "Staff member registered", body = CreatedStaffResponse),
        (status = 403, description = "School admin only", body = ErrorResponse),
        (status = 409, description = "Email or document in use", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
#[instrument(skip(state, dto))]
pub async fn create_staff(
    State(state): State<AppState>,
    RequireSchoolAdmin(auth_user): RequireSchoolAdmin,
    ValidatedJson(dto): ValidatedJson<CreateStaffDto>,
) -> Result<(StatusCode, Json<CreatedStaffResponse>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let created = StaffService::create_staff(&state.db, &state.email_config, school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/staff",
    params(StaffFilterParams),
    responses((status = 200, description = "Staff members", body = PaginatedStaffResponse)),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
#[instrument(skip(state))]
pub async fn list_staff(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    Query(filters): Query<StaffFilterParams>,
) -> Result<Json<PaginatedStaffResponse>, AppError> {
    let school_id = school_filter(&auth_user, filters.school_id)?;
    let staff = StaffService::list_staff(&state.db, school_id, filters).await?;
    Ok(Json(staff))
}

#[utoipa::path(
    get,
    path = "/api/staff/{id}",
    params(("id" = StaffId, Path, description = "Staff ID")),
    responses(
        (status = 200, description = "Staff member", body = StaffMember),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
#[instrument(skip(state))]
pub async fn get_staff(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    Path(id): Path<StaffId>,
) -> Result<Json<StaffMember>, AppError> {
    let staff = StaffService::get_staff(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(Json(staff))
}

#[utoipa::path(
    put,
    path = "/api/staff/{id}",
    params(("id" = StaffId, Path, description = "Staff ID")),
    request_body = UpdateStaffDto,
    responses(
        (status = 200, description = "Staff member updated", body = StaffMember),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
#[instrument(skip(state, dto))]
pub async fn update_staff(
    State(state): State<AppState>,
    RequireSchoolAdmin(auth_user): RequireSchoolAdmin,
    Path(id): Path<StaffId>,
    ValidatedJson(dto): ValidatedJson<UpdateStaffDto>,
) -> Result<Json<StaffMember>, AppError> {
    let staff = StaffService::update_staff(&state.db, id, resource_scope(&auth_user)?, dto).await?;
    Ok(Json(staff))
}

#[utoipa::path(
    delete,
    path = "/api/staff/{id}",
    params(("id" = StaffId, Path, description = "Staff ID")),
    responses(
        (status = 204, description = "Staff member deleted"),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
#[instrument(skip(state))]
pub async fn delete_staff(
    State(state): State<AppState>,
    RequireSchoolAdmin(auth_user): RequireSchoolAdmin,
    Path(id): Path<StaffId>,
) -> Result<StatusCode, AppError> {
    StaffService::delete_staff(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

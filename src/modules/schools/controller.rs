use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use escola_core::AppError;
use escola_models::UserRole;
use escola_models::ids::SchoolId;
use escola_models::schools::{
    CreateSchoolDto, PaginatedSchoolsResponse, School, SchoolDetail, SchoolFilterParams,
    UpdateSchoolDto,
};
use tracing::instrument;

use super::service::SchoolService;
use crate::docs::ErrorResponse;
use crate::middleware::auth::{AuthUser, RequireSystemAdmin};
use crate::state::AppState;
use crate::utils::access::ensure_school_member;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/schools",
    request_body = CreateSchoolDto,
    responses(
        (status = 201, description = "School created", body = School),
        (status = 403, description = "System admin only", body = ErrorResponse),
        (status = 409, description = "Name or code already in use", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Schools"
)]
#[instrument(skip(state))]
pub async fn create_school(
    State(state): State<AppState>,
    _admin: RequireSystemAdmin,
    ValidatedJson(dto): ValidatedJson<CreateSchoolDto>,
) -> Result<(StatusCode, Json<School>), AppError> {
    let school = SchoolService::create_school(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(school)))
}

#[utoipa::path(
    get,
    path = "/api/schools",
    params(SchoolFilterParams),
    responses(
        (status = 200, description = "Schools", body = PaginatedSchoolsResponse),
        (status = 403, description = "System admin only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Schools"
)]
#[instrument(skip(state))]
pub async fn list_schools(
    State(state): State<AppState>,
    _admin: RequireSystemAdmin,
    Query(filters): Query<SchoolFilterParams>,
) -> Result<Json<PaginatedSchoolsResponse>, AppError> {
    let schools = SchoolService::list_schools(&state.db, filters).await?;
    Ok(Json(schools))
}

/// School profile with member counts
///
/// Open to system admins and to anyone registered in the school.
#[utoipa::path(
    get,
    path = "/api/schools/{id}",
    params(("id" = SchoolId, Path, description = "School ID")),
    responses(
        (status = 200, description = "School", body = SchoolDetail),
        (status = 403, description = "Not a member of this school", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Schools"
)]
#[instrument(skip(state))]
pub async fn get_school(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<SchoolId>,
) -> Result<Json<SchoolDetail>, AppError> {
    ensure_school_member(&state.db, &auth_user, id).await?;
    let school = SchoolService::get_school_detail(&state.db, id).await?;
    Ok(Json(school))
}

#[utoipa::path(
    put,
    path = "/api/schools/{id}",
    params(("id" = SchoolId, Path, description = "School ID")),
    request_body = UpdateSchoolDto,
    responses(
        (status = 200, description = "School updated", body = School),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Name or code already in use", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Schools"
)]
#[instrument(skip(state))]
pub async fn update_school(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<SchoolId>,
    ValidatedJson(dto): ValidatedJson<UpdateSchoolDto>,
) -> Result<Json<School>, AppError> {
    let allowed = auth_user.is_system_admin()
        || (auth_user.role() == UserRole::SchoolAdmin && auth_user.school_id() == Some(id));
    if !allowed {
        return Err(AppError::forbidden(
            "Only a system admin or this school's admin can update it".to_string(),
        ));
    }

    let school = SchoolService::update_school(&state.db, id, dto).await?;
    Ok(Json(school))
}

#[utoipa::path(
    delete,
    path = "/api/schools/{id}",
    params(("id" = SchoolId, Path, description = "School ID")),
    responses(
        (status = 204, description = "School and its members deleted"),
        (status = 403, description = "System admin only", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Schools"
)]
#[instrument(skip(state))]
pub async fn delete_school(
    State(state): State<AppState>,
    _admin: RequireSystemAdmin,
    Path(id): Path<SchoolId>,
) -> Result<StatusCode, AppError> {
    SchoolService::delete_school(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

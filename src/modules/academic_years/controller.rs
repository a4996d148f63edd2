use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use escola_core::AppError;
use escola_models::academic_years::{
    AcademicYear, AcademicYearFilterParams, CreateAcademicYearDto, PaginatedAcademicYearsResponse,
    UpdateAcademicYearDto,
};
use escola_models::ids::AcademicYearId;
use tracing::instrument;

use super::service::AcademicYearService;
use crate::docs::ErrorResponse;
use crate::middleware::auth::{AuthUser, RequireSchoolAdmin};
use crate::state::AppState;
use crate::utils::access::{resource_scope, school_filter, school_for_scoped_operation};
use crate::validator::ValidatedJson;

/// Create an academic year
///
/// When `is_current` is set, the school's other years stop being current.
#[utoipa::path(
    post,
    path = "/api/academic-years",
    request_body = CreateAcademicYearDto,
    responses(
        (status = 201, description = "Academic year created", body = AcademicYear),
        (status = 409, description = "Year already exists", body = ErrorResponse),
        (status = 422, description = "Invalid year or date range", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Academic Years"
)]
#[instrument(skip(state))]
pub async fn create_academic_year(
    State(state): State<AppState>,
    RequireSchoolAdmin(auth_user): RequireSchoolAdmin,
    ValidatedJson(dto): ValidatedJson<CreateAcademicYearDto>,
) -> Result<(StatusCode, Json<AcademicYear>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let year = AcademicYearService::create_academic_year(&state.db, school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(year)))
}

#[utoipa::path(
    get,
    path = "/api/academic-years",
    params(AcademicYearFilterParams),
    responses((status = 200, description = "Academic years, newest first", body = PaginatedAcademicYearsResponse)),
    security(("bearer_auth" = [])),
    tag = "Academic Years"
)]
#[instrument(skip(state))]
pub async fn list_academic_years(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<AcademicYearFilterParams>,
) -> Result<Json<PaginatedAcademicYearsResponse>, AppError> {
    let school_id = school_filter(&auth_user, filters.school_id)?;
    let years = AcademicYearService::list_academic_years(&state.db, school_id, filters).await?;
    Ok(Json(years))
}

#[utoipa::path(
    get,
    path = "/api/academic-years/{id}",
    params(("id" = AcademicYearId, Path, description = "Academic year ID")),
    responses(
        (status = 200, description = "Academic year", body = AcademicYear),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Academic Years"
)]
#[instrument(skip(state))]
pub async fn get_academic_year(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<AcademicYearId>,
) -> Result<Json<AcademicYear>, AppError> {
    let year =
        AcademicYearService::get_academic_year(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(Json(year))
}

#[utoipa::path(
    put,
    path = "/api/academic-years/{id}",
    params(("id" = AcademicYearId, Path, description = "Academic year ID")),
    request_body = UpdateAcademicYearDto,
    responses(
        (status = 200, description = "Academic year updated", body = AcademicYear),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Year already exists", body = ErrorResponse),
        (status = 422, description = "Invalid year or date range", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Academic Years"
)]
#[instrument(skip(state))]
pub async fn update_academic_year(
    State(state): State<AppState>,
    RequireSchoolAdmin(auth_user): RequireSchoolAdmin,
    Path(id): Path<AcademicYearId>,
    ValidatedJson(dto): ValidatedJson<UpdateAcademicYearDto>,
) -> Result<Json<AcademicYear>, AppError> {
    let year =
        AcademicYearService::update_academic_year(&state.db, id, resource_scope(&auth_user)?, dto)
            .await?;
    Ok(Json(year))
}

#[utoipa::path(
    delete,
    path = "/api/academic-years/{id}",
    params(("id" = AcademicYearId, Path, description = "Academic year ID")),
    responses(
        (status = 204, description = "Academic year deleted"),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Classes still reference the year", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Academic Years"
)]
#[instrument(skip(state))]
pub async fn delete_academic_year(
    State(state): State<AppState>,
    RequireSchoolAdmin(auth_user): RequireSchoolAdmin,
    Path(id): Path<AcademicYearId>,
) -> Result<StatusCode, AppError> {
    AcademicYearService::delete_academic_year(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/academic-years/{id}/activate",
    params(("id" = AcademicYearId, Path, description = "Academic year ID")),
    responses(
        (status = 200, description = "Academic year is now current", body = AcademicYear),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Academic Years"
)]
#[instrument(skip(state))]
pub async fn activate_academic_year(
    State(state): State<AppState>,
    RequireSchoolAdmin(auth_user): RequireSchoolAdmin,
    Path(id): Path<AcademicYearId>,
) -> Result<Json<AcademicYear>, AppError> {
    let year =
        AcademicYearService::activate_academic_year(&state.db, id, resource_scope(&auth_user)?)
            .await?;
    Ok(Json(year))
}

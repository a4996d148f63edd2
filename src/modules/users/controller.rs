use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use escola_core::AppError;
use escola_models::ids::UserId;
use escola_models::users::{
    AccountProfile, CreateSchoolAdminDto, CreatedSchoolAdminResponse, PaginatedUsersResponse,
    PasswordResetResponse, UpdateUserStatusDto, UserFilterParams,
};
use tracing::instrument;

use super::service::UserService;
use crate::docs::ErrorResponse;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::utils::access::{resource_scope, school_filter};
use crate::validator::ValidatedJson;

/// List accounts
///
/// School admins see their own school; system admins see every school unless
/// they filter by `school_id`.
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserFilterParams),
    responses(
        (status = 200, description = "Accounts", body = PaginatedUsersResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(filters): Query<UserFilterParams>,
) -> Result<Json<PaginatedUsersResponse>, AppError> {
    let school_id = school_filter(&auth_user, filters.school_id)?;
    let users = UserService::list_users(&state.db, school_id, filters).await?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = UserId, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account profile", body = AccountProfile),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<UserId>,
) -> Result<Json<AccountProfile>, AppError> {
    let scope = resource_scope(&auth_user)?;
    let user = UserService::get_user(&state.db, id, scope).await?;
    Ok(Json(user))
}

/// Activate or deactivate an account
#[utoipa::path(
    patch,
    path = "/api/users/{id}/status",
    params(("id" = UserId, Path, description = "Account ID")),
    request_body = UpdateUserStatusDto,
    responses(
        (status = 200, description = "Status updated", body = AccountProfile),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 422, description = "Cannot deactivate yourself", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn update_user_status(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<UserId>,
    ValidatedJson(dto): ValidatedJson<UpdateUserStatusDto>,
) -> Result<Json<AccountProfile>, AppError> {
    let scope = resource_scope(&auth_user)?;
    let user =
        UserService::update_status(&state.db, auth_user.user_id(), id, scope, dto.is_active)
            .await?;
    Ok(Json(user))
}

/// Reset an account's password
///
/// A new temporary password is mailed when SMTP is enabled and returned in
/// the response otherwise.
#[utoipa::path(
    post,
    path = "/api/users/{id}/reset-password",
    params(("id" = UserId, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Password reset", body = PasswordResetResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn reset_user_password(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<UserId>,
) -> Result<Json<PasswordResetResponse>, AppError> {
    let scope = resource_scope(&auth_user)?;
    let response = UserService::reset_password(&state.db, &state.email_config, id, scope).await?;
    Ok(Json(response))
}

/// Create a school administrator (system admin only)
#[utoipa::path(
    post,
    path = "/api/users/school-admins",
    request_body = CreateSchoolAdminDto,
    responses(
        (status = 201, description = "School admin created", body = CreatedSchoolAdminResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "School not found", body = ErrorResponse),
        (status = 409, description = "Email or document already in use", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn create_school_admin(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateSchoolAdminDto>,
) -> Result<(StatusCode, Json<CreatedSchoolAdminResponse>), AppError> {
    let created = UserService::create_school_admin(&state.db, &state.email_config, dto).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

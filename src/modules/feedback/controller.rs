use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use escola_core::AppError;
use escola_models::feedback::{
    CreateFeedbackDto, Feedback, FeedbackFilterParams, PaginatedFeedbackResponse,
    UpdateFeedbackStatusDto,
};
use escola_models::ids::FeedbackId;
use tracing::instrument;

use super::service::FeedbackService;
use crate::docs::ErrorResponse;
use crate::middleware::auth::{AuthUser, RequireOffice};
use crate::state::AppState;
use crate::utils::access::{
    ensure_school_member, resource_scope, school_filter, school_for_scoped_operation,
};
use crate::validator::ValidatedJson;

/// Submit feedback
///
/// Any authenticated member of the school may submit. System administrators
/// must name the school.
#[utoipa::path(
    post,
    path = "/api/feedback",
    request_body = CreateFeedbackDto,
    responses(
        (status = 201, description = "Feedback submitted", body = Feedback),
        (status = 400, description = "Missing school_id", body = ErrorResponse),
        (status = 403, description = "Not a member of the school", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
#[instrument(skip(state, dto))]
pub async fn create_feedback(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateFeedbackDto>,
) -> Result<(StatusCode, Json<Feedback>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    ensure_school_member(&state.db, &auth_user, school_id).await?;

    let feedback =
        FeedbackService::create_feedback(&state.db, auth_user.user_id(), school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

#[utoipa::path(
    get,
    path = "/api/feedback",
    params(FeedbackFilterParams),
    responses((status = 200, description = "Feedback, newest first", body = PaginatedFeedbackResponse)),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
#[instrument(skip(state))]
pub async fn list_feedback(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    Query(filters): Query<FeedbackFilterParams>,
) -> Result<Json<PaginatedFeedbackResponse>, AppError> {
    let school_id = school_filter(&auth_user, filters.school_id)?;
    let feedback = FeedbackService::list_feedback(&state.db, school_id, None, filters).await?;
    Ok(Json(feedback))
}

/// List my feedback
#[utoipa::path(
    get,
    path = "/api/feedback/mine",
    params(FeedbackFilterParams),
    responses((status = 200, description = "Feedback written by the caller", body = PaginatedFeedbackResponse)),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
#[instrument(skip(state))]
pub async fn my_feedback(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<FeedbackFilterParams>,
) -> Result<Json<PaginatedFeedbackResponse>, AppError> {
    let feedback =
        FeedbackService::list_feedback(&state.db, None, Some(auth_user.user_id()), filters)
            .await?;
    Ok(Json(feedback))
}

/// Get feedback
///
/// Office roles see any feedback of their school; everyone else only their
/// own.
#[utoipa::path(
    get,
    path = "/api/feedback/{id}",
    params(("id" = FeedbackId, Path, description = "Feedback ID")),
    responses(
        (status = 200, description = "Feedback", body = Feedback),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
#[instrument(skip(state))]
pub async fn get_feedback(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<FeedbackId>,
) -> Result<Json<Feedback>, AppError> {
    let feedback = FeedbackService::get_feedback(&state.db, id, resource_scope(&auth_user)?).await?;

    if !auth_user.role().is_office() && feedback.author_id != auth_user.user_id() {
        return Err(AppError::not_found(anyhow::anyhow!("Feedback not found")));
    }

    Ok(Json(feedback))
}

#[utoipa::path(
    patch,
    path = "/api/feedback/{id}/status",
    params(("id" = FeedbackId, Path, description = "Feedback ID")),
    request_body = UpdateFeedbackStatusDto,
    responses(
        (status = 200, description = "Status changed", body = Feedback),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
#[instrument(skip(state))]
pub async fn update_feedback_status(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    Path(id): Path<FeedbackId>,
    ValidatedJson(dto): ValidatedJson<UpdateFeedbackStatusDto>,
) -> Result<Json<Feedback>, AppError> {
    let feedback =
        FeedbackService::update_status(&state.db, id, resource_scope(&auth_user)?, dto.status)
            .await?;
    Ok(Json(feedback))
}

#[utoipa::path(
    delete,
    path = "/api/feedback/{id}",
    params(("id" = FeedbackId, Path, description = "Feedback ID")),
    responses(
        (status = 204, description = "Feedback deleted"),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Feedback"
)]
#[instrument(skip(state))]
pub async fn delete_feedback(
    State(state): State<AppState>,
    RequireOffice(auth_user): RequireOffice,
    Path(id): Path<FeedbackId>,
) -> Result<StatusCode, AppError> {
    FeedbackService::delete_feedback(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

//! Router-level role guards.
//!
//! Handlers normally declare their requirement with one of the extractors in
//! [`crate::middleware::auth`]; these middleware functions guard a whole
//! router instead.
//!
//! ```rust,ignore
//! Router::new()
//!     .nest("/users", init_users_router())
//!     .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));
//! ```

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use escola_core::AppError;
use escola_models::UserRole;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Lets the request through when the caller's role is in `allowed_roles`.
/// The validated [`AuthUser`] is stored in the request extensions.
pub async fn require_roles(
    State(state): State<AppState>,
    req: Request,
    next: Next,
    allowed_roles: &[UserRole],
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;
    let role = auth_user.role();

    if !allowed_roles.contains(&role) {
        return Err(AppError::forbidden(format!(
            "Access denied for role {role}"
        )));
    }

    parts.extensions.insert(auth_user);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

pub async fn require_system_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    require_roles(State(state), req, next, &[UserRole::SystemAdmin])
        .await
        .unwrap_or_else(IntoResponse::into_response)
}

/// System or school administrators.
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_roles(
        State(state),
        req,
        next,
        &[UserRole::SystemAdmin, UserRole::SchoolAdmin],
    )
    .await
    .unwrap_or_else(IntoResponse::into_response)
}

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use escola_auth::{Claims, verify_token};
use escola_core::AppError;
use escola_models::UserRole;
use escola_models::ids::{SchoolId, UserId};

use crate::state::AppState;

/// Extractor that validates the bearer token and exposes its claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> UserId {
        self.0.sub
    }

    pub fn role(&self) -> UserRole {
        self.0.role
    }

    /// `None` only for system administrators.
    pub fn school_id(&self) -> Option<SchoolId> {
        self.0.school_id
    }

    pub fn is_system_admin(&self) -> bool {
        self.0.role.is_system_admin()
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized("Invalid authorization header format".to_string())
        })?;

        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

/// Declares an extractor that accepts a valid token whose role passes one of
/// the [`UserRole`] group checks.
#[macro_export]
macro_rules! require_roles {
    ($name:ident, $check:ident, $message:literal) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = escola_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user =
                    $crate::middleware::auth::AuthUser::from_request_parts(parts, state).await?;

                if !auth_user.role().$check() {
                    return Err(escola_core::AppError::forbidden($message.to_string()));
                }

                Ok($name(auth_user))
            }
        }
    };
}

require_roles!(
    RequireSystemAdmin,
    is_system_admin,
    "Access denied. Only system administrators can access this resource."
);
require_roles!(
    RequireSchoolAdmin,
    is_school_admin,
    "Access denied. Administrator privileges required."
);
require_roles!(
    RequireOffice,
    is_office,
    "Access denied. Secretariat privileges required."
);
require_roles!(
    RequireFaculty,
    is_faculty,
    "Access denied. Teacher or staff privileges required."
);

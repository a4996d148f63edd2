//! JWT claim structures.
//!
//! - [`Claims`]: access token, carries everything authorization needs
//! - [`RefreshTokenClaims`]: refresh token, carries only the subject

use escola_models::UserRole;
use escola_models::ids::{SchoolId, UserId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Access token claims.
///
/// `school_id` is `None` only for system administrators.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// Account ID
    pub sub: UserId,
    pub username: String,
    pub role: UserRole,
    pub school_id: Option<SchoolId>,
    /// Expiry (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

impl Claims {
    pub fn user_id(&self) -> UserId {
        self.sub
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub sub: UserId,
    pub exp: usize,
    pub iat: usize,
    /// Makes every refresh token unique even when issued in the same second
    pub jti: String,
}

//! Token creation and verification.
//!
//! Access and refresh tokens are HS256 JWTs signed with the same secret.
//! They are told apart by shape: a refresh token lacks `role`, so it never
//! verifies as an access token, and an access token lacks `jti`.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use escola_config::JwtConfig;
use escola_core::AppError;
use escola_models::UserRole;
use escola_models::ids::{SchoolId, UserId};

use crate::claims::{Claims, RefreshTokenClaims};

fn now() -> usize {
    Utc::now().timestamp() as usize
}

pub fn create_access_token(
    user_id: UserId,
    username: &str,
    role: UserRole,
    school_id: Option<SchoolId>,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let iat = now();
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        role,
        school_id,
        exp: iat + jwt_config.access_token_expiry as usize,
        iat,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {e}")))
}

pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token".to_string()))
}

pub fn create_refresh_token(user_id: UserId, jwt_config: &JwtConfig) -> Result<String, AppError> {
    let iat = now();
    let claims = RefreshTokenClaims {
        sub: user_id,
        exp: iat + jwt_config.refresh_token_expiry as usize,
        iat,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create refresh token: {e}")))
}

pub fn verify_refresh_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<RefreshTokenClaims, AppError> {
    decode::<RefreshTokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired refresh token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
        }
    }

    #[test]
    fn test_access_token_roundtrip() {
        let user_id = UserId::new();
        let school_id = SchoolId::new();
        let token =
            create_access_token(user_id, "ana.souza", UserRole::Staff, Some(school_id), &config())
                .unwrap();

        let claims = verify_token(&token, &config()).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "ana.souza");
        assert_eq!(claims.role, UserRole::Staff);
        assert_eq!(claims.school_id, Some(school_id));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let token =
            create_access_token(UserId::new(), "x", UserRole::SystemAdmin, None, &config()).unwrap();
        let other = JwtConfig {
            secret: "another-secret-key-at-least-32-characters".to_string(),
            ..config()
        };
        let err = verify_token(&token, &other).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(verify_token("not.a.jwt", &config()).is_err());
        assert!(verify_refresh_token("", &config()).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let iat = now() - 7200;
        let claims = Claims {
            sub: UserId::new(),
            username: "x".into(),
            role: UserRole::Teacher,
            school_id: None,
            exp: iat + 3600,
            iat,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config().secret.as_bytes()),
        )
        .unwrap();
        assert!(verify_token(&token, &config()).is_err());
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let user_id = UserId::new();
        let refresh = create_refresh_token(user_id, &config()).unwrap();
        assert!(verify_token(&refresh, &config()).is_err());
        assert_eq!(verify_refresh_token(&refresh, &config()).unwrap().sub, user_id);
    }

    #[test]
    fn test_access_token_is_not_a_refresh_token() {
        let access =
            create_access_token(UserId::new(), "x", UserRole::Student, None, &config()).unwrap();
        assert!(verify_refresh_token(&access, &config()).is_err());
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let user_id = UserId::new();
        let a = create_refresh_token(user_id, &config()).unwrap();
        let b = create_refresh_token(user_id, &config()).unwrap();
        assert_ne!(a, b);
    }
}

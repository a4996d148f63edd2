//! Authentication requests and responses.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::users::AccountProfile;
use crate::value_types::Email;

/// `login` accepts either the username or the email address.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 255))]
    #[schema(example = "ana.souza")]
    pub login: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub user: AccountProfile,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: Email,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_validation() {
        let ok = LoginRequest {
            login: "ana.souza".into(),
            password: "x".into(),
        };
        assert!(ok.validate().is_ok());

        let empty = LoginRequest {
            login: String::new(),
            password: String::new(),
        };
        let errors = empty.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("login"));
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_new_password_minimum_length() {
        let short = ChangePasswordRequest {
            current_password: "old-password".into(),
            new_password: "short".into(),
        };
        assert!(short.validate().is_err());

        let ok = ChangePasswordRequest {
            current_password: "old-password".into(),
            new_password: "long-enough-1".into(),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_forgot_password_requires_valid_email() {
        assert!(serde_json::from_str::<ForgotPasswordRequest>(r#"{"email":"x"}"#).is_err());
        assert!(serde_json::from_str::<ForgotPasswordRequest>(r#"{"email":"a@b.io"}"#).is_ok());
    }
}

//! Login accounts.

use chrono::{DateTime, Utc};
use escola_core::serde::{deserialize_optional_bool, deserialize_optional_id};
use escola_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{PersonId, SchoolId, StaffId, UserId};
use crate::people::{AccountCredentials, PersonInput};
use crate::roles::UserRole;
use crate::value_types::{Email, PhoneNumber};

/// An account joined with its person, as returned by `/api/auth/me` and the
/// users endpoints. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AccountProfile {
    pub id: UserId,
    pub username: String,
    pub role: UserRole,
    pub school_id: Option<SchoolId>,
    pub is_active: bool,
    pub must_change_password: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub person_id: PersonId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: Option<PhoneNumber>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct UserFilterParams {
    pub role: Option<UserRole>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_active: Option<bool>,
    /// Matches username, name, or email
    pub search: Option<String>,
    /// Required for system admins to scope the query
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub school_id: Option<SchoolId>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedUsersResponse {
    pub data: Vec<AccountProfile>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserStatusDto {
    pub is_active: bool,
}

/// Creates a person, a staff record, and a `school_admin` account.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSchoolAdminDto {
    #[serde(flatten)]
    #[validate(nested)]
    pub person: PersonInput,
    pub school_id: SchoolId,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedSchoolAdminResponse {
    pub profile: AccountProfile,
    pub staff_id: StaffId,
    pub account: AccountCredentials,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PasswordResetResponse {
    pub user_id: UserId,
    pub credentials_emailed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporary_password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_school_admin_body_is_flat() {
        let school_id = SchoolId::new();
        let dto: CreateSchoolAdminDto = serde_json::from_value(serde_json::json!({
            "first_name": "Carla",
            "last_name": "Mendes",
            "email": "carla@escola.io",
            "school_id": school_id,
        }))
        .unwrap();
        assert_eq!(dto.school_id, school_id);
        assert_eq!(dto.person.first_name, "Carla");
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_nested_person_errors_surface() {
        let dto: CreateSchoolAdminDto = serde_json::from_value(serde_json::json!({
            "first_name": "",
            "last_name": "Mendes",
            "email": "carla@escola.io",
            "school_id": SchoolId::new(),
        }))
        .unwrap();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_filter_params_parse_query_strings() {
        let params: UserFilterParams = serde_json::from_value(serde_json::json!({
            "role": "teacher",
            "is_active": "false",
            "limit": "5",
        }))
        .unwrap();
        assert_eq!(params.role, Some(UserRole::Teacher));
        assert_eq!(params.is_active, Some(false));
        assert_eq!(params.pagination.limit(), 5);
    }
}

//! Secretariat staff models and DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use escola_core::{PaginationMeta, PaginationParams};
use escola_core::serde::deserialize_optional_id;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{PersonId, SchoolId, StaffId, UserId};
use crate::people::{AccountCredentials, PersonInput, PersonUpdate};
use crate::value_types::{Email, PhoneNumber};

/// Position given to the staff record created with every school admin.
pub const SCHOOL_ADMIN_POSITION: &str = "School Administrator";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StaffMember {
    pub id: StaffId,
    pub person_id: PersonId,
    pub school_id: SchoolId,
    pub position: String,
    pub hire_date: Option<NaiveDate>,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: Option<PhoneNumber>,
    pub document: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateStaffDto {
    #[serde(flatten)]
    #[validate(nested)]
    pub person: PersonInput,
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Secretary")]
    pub position: String,
    pub hire_date: Option<NaiveDate>,
    pub school_id: Option<SchoolId>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateStaffDto {
    #[serde(flatten)]
    #[validate(nested)]
    pub person: PersonUpdate,
    #[validate(length(min = 1, max = 100))]
    pub position: Option<String>,
    pub hire_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct StaffFilterParams {
    /// Matches name, email, or position
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub school_id: Option<SchoolId>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedStaffResponse {
    pub data: Vec<StaffMember>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedStaffResponse {
    pub staff: StaffMember,
    pub account: AccountCredentials,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_is_required() {
        let result = serde_json::from_value::<CreateStaffDto>(serde_json::json!({
            "first_name": "Rita",
            "last_name": "Campos",
            "email": "rita@escola.io",
        }));
        assert!(result.is_err());

        let dto: CreateStaffDto = serde_json::from_value(serde_json::json!({
            "first_name": "Rita",
            "last_name": "Campos",
            "email": "rita@escola.io",
            "position": "",
        }))
        .unwrap();
        assert!(dto.validate().is_err());
    }
}

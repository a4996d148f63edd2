//! Teacher models and DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use escola_core::{PaginationMeta, PaginationParams};
use escola_core::serde::deserialize_optional_id;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{PersonId, SchoolId, TeacherId, UserId};
use crate::people::{AccountCredentials, PersonInput, PersonUpdate};
use crate::value_types::{Email, PhoneNumber};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Teacher {
    pub id: TeacherId,
    pub person_id: PersonId,
    pub school_id: SchoolId,
    pub specialization: Option<String>,
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
pub struct CreateTeacherDto {
    #[serde(flatten)]
    #[validate(nested)]
    pub person: PersonInput,
    #[validate(length(max = 100))]
    #[schema(example = "Mathematics")]
    pub specialization: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub school_id: Option<SchoolId>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTeacherDto {
    #[serde(flatten)]
    #[validate(nested)]
    pub person: PersonUpdate,
    #[validate(length(max = 100))]
    pub specialization: Option<String>,
    pub hire_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct TeacherFilterParams {
    /// Matches name, email, or specialization
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub school_id: Option<SchoolId>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedTeachersResponse {
    pub data: Vec<Teacher>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedTeacherResponse {
    pub teacher: Teacher,
    pub account: AccountCredentials,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specialization_length() {
        let dto: CreateTeacherDto = serde_json::from_value(serde_json::json!({
            "first_name": "Luiza",
            "last_name": "Prado",
            "email": "luiza@escola.io",
            "specialization": "x".repeat(101),
        }))
        .unwrap();
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("specialization"));
    }

    #[test]
    fn test_hire_date_parses() {
        let dto: CreateTeacherDto = serde_json::from_value(serde_json::json!({
            "first_name": "Luiza",
            "last_name": "Prado",
            "email": "luiza@escola.io",
            "hire_date": "2024-02-01",
        }))
        .unwrap();
        assert_eq!(
            dto.hire_date,
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
    }
}

//! School (tenant) models and DTOs.

use chrono::{DateTime, Utc};
use escola_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::SchoolId;
use crate::value_types::{Email, PhoneNumber};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct School {
    pub id: SchoolId,
    pub name: String,
    pub code: Option<String>,
    pub address: Option<String>,
    pub phone: Option<PhoneNumber>,
    pub email: Option<Email>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A school with head counts, returned by `GET /api/schools/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SchoolDetail {
    pub id: SchoolId,
    pub name: String,
    pub code: Option<String>,
    pub address: Option<String>,
    pub phone: Option<PhoneNumber>,
    pub email: Option<Email>,
    pub student_count: i64,
    pub teacher_count: i64,
    pub staff_count: i64,
    pub class_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSchoolDto {
    #[validate(length(min = 1, max = 200))]
    #[schema(example = "Escola Estadual Dom Pedro II")]
    pub name: String,
    /// Short unique code, e.g. an official registry number
    #[validate(length(min = 2, max = 20))]
    pub code: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    pub phone: Option<PhoneNumber>,
    pub email: Option<Email>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSchoolDto {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 2, max = 20))]
    pub code: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    pub phone: Option<PhoneNumber>,
    pub email: Option<Email>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct SchoolFilterParams {
    /// Case-insensitive substring match on the name
    pub name: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedSchoolsResponse {
    pub data: Vec<School>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_school_validation() {
        let dto = CreateSchoolDto {
            name: "Escola Municipal Aurora".into(),
            code: Some("EMA-01".into()),
            address: None,
            phone: None,
            email: None,
        };
        assert!(dto.validate().is_ok());

        let dto = CreateSchoolDto {
            name: String::new(),
            code: Some("X".into()),
            address: Some("a".repeat(256)),
            phone: None,
            email: None,
        };
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("code"));
        assert!(fields.contains_key("address"));
    }

    #[test]
    fn test_empty_update_is_valid() {
        assert!(UpdateSchoolDto::default().validate().is_ok());
    }
}

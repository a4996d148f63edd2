//! Student models and DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use escola_core::{PaginationMeta, PaginationParams};
use escola_core::serde::deserialize_optional_id;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{ClassId, GuardianId, PersonId, SchoolId, StudentId, UserId};
use crate::people::{AccountCredentials, PersonInput, PersonUpdate};
use crate::value_types::{Email, PhoneNumber};

/// A student joined with its person record and account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    pub id: StudentId,
    pub person_id: PersonId,
    pub school_id: SchoolId,
    #[schema(example = "2025123456")]
    pub registration_number: String,
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
pub struct CreateStudentDto {
    #[serde(flatten)]
    #[validate(nested)]
    pub person: PersonInput,
    /// Generated when absent
    #[validate(length(min = 4, max = 30))]
    pub registration_number: Option<String>,
    /// Required for system admins, ignored for everyone else
    pub school_id: Option<SchoolId>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateStudentDto {
    #[serde(flatten)]
    #[validate(nested)]
    pub person: PersonUpdate,
    #[validate(length(min = 4, max = 30))]
    pub registration_number: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct StudentFilterParams {
    /// Matches name, email, or registration number
    pub search: Option<String>,
    /// Only students with an active enrollment in this class
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub class_id: Option<ClassId>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub school_id: Option<SchoolId>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedStudentsResponse {
    pub data: Vec<Student>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedStudentResponse {
    pub student: Student,
    pub account: AccountCredentials,
}

/// A guardian as seen from one of their students.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StudentGuardian {
    pub guardian_id: GuardianId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: Option<PhoneNumber>,
    pub relationship: String,
    pub is_primary: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_student_from_flat_json() {
        let dto: CreateStudentDto = serde_json::from_value(serde_json::json!({
            "first_name": "Pedro",
            "last_name": "Alves",
            "email": "pedro@escola.io",
            "birth_date": "2012-04-09",
        }))
        .unwrap();
        assert!(dto.validate().is_ok());
        assert!(dto.registration_number.is_none());
        assert!(dto.school_id.is_none());
    }

    #[test]
    fn test_registration_number_length() {
        let dto: CreateStudentDto = serde_json::from_value(serde_json::json!({
            "first_name": "Pedro",
            "last_name": "Alves",
            "email": "pedro@escola.io",
            "registration_number": "12",
        }))
        .unwrap();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_update_student_accepts_partial_body() {
        let dto: UpdateStudentDto =
            serde_json::from_value(serde_json::json!({ "last_name": "Alves Lima" })).unwrap();
        assert!(dto.validate().is_ok());
        assert_eq!(dto.person.last_name.as_deref(), Some("Alves Lima"));
        assert!(dto.registration_number.is_none());
    }
}

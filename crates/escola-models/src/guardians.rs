//! Guardian models and the guardian-student link.

use chrono::{DateTime, NaiveDate, Utc};
use escola_core::{PaginationMeta, PaginationParams};
use escola_core::serde::deserialize_optional_id;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{GuardianId, PersonId, SchoolId, StudentId, UserId};
use crate::people::{AccountCredentials, PersonInput, PersonUpdate};
use crate::value_types::{Email, PhoneNumber};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Guardian {
    pub id: GuardianId,
    pub person_id: PersonId,
    pub school_id: SchoolId,
    pub occupation: Option<String>,
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
pub struct CreateGuardianDto {
    #[serde(flatten)]
    #[validate(nested)]
    pub person: PersonInput,
    #[validate(length(max = 100))]
    pub occupation: Option<String>,
    pub school_id: Option<SchoolId>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateGuardianDto {
    #[serde(flatten)]
    #[validate(nested)]
    pub person: PersonUpdate,
    #[validate(length(max = 100))]
    pub occupation: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct GuardianFilterParams {
    /// Matches name or email
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub school_id: Option<SchoolId>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedGuardiansResponse {
    pub data: Vec<Guardian>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedGuardianResponse {
    pub guardian: Guardian,
    pub account: AccountCredentials,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LinkStudentDto {
    pub student_id: StudentId,
    #[validate(length(min = 1, max = 50))]
    #[schema(example = "mother")]
    pub relationship: String,
    #[serde(default)]
    pub is_primary: bool,
}

/// A student as seen from one of their guardians.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct GuardianStudent {
    pub student_id: StudentId,
    pub registration_number: String,
    pub first_name: String,
    pub last_name: String,
    pub relationship: String,
    pub is_primary: bool,
}

//! Enrollment models, DTOs, and status transitions.

use chrono::{DateTime, NaiveDate, Utc};
use escola_core::{PaginationMeta, PaginationParams};
use escola_core::serde::deserialize_optional_id;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::classes::Shift;
use crate::ids::{AcademicYearId, ClassId, EnrollmentId, SchoolId, StudentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "enrollment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Active,
    Transferred,
    Cancelled,
    Completed,
}

impl EnrollmentStatus {
    /// Only active enrollments change status, and only by being cancelled or
    /// completed. `Transferred` is reached through the transfer operation.
    pub fn can_transition_to(self, next: EnrollmentStatus) -> bool {
        matches!(
            (self, next),
            (
                EnrollmentStatus::Active,
                EnrollmentStatus::Cancelled | EnrollmentStatus::Completed
            )
        )
    }

    pub fn is_final(self) -> bool {
        !matches!(self, EnrollmentStatus::Active)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub school_id: SchoolId,
    pub student_id: StudentId,
    pub class_id: ClassId,
    pub academic_year_id: AcademicYearId,
    pub shift: Shift,
    pub status: EnrollmentStatus,
    pub enrolled_at: NaiveDate,
    pub ended_at: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An enrollment with the labels list views need.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EnrollmentDetail {
    pub id: EnrollmentId,
    pub school_id: SchoolId,
    pub student_id: StudentId,
    pub registration_number: String,
    pub student_name: String,
    pub class_id: ClassId,
    pub class_name: String,
    pub academic_year_id: AcademicYearId,
    pub academic_year: i32,
    pub shift: Shift,
    pub status: EnrollmentStatus,
    pub enrolled_at: NaiveDate,
    pub ended_at: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEnrollmentDto {
    pub student_id: StudentId,
    pub class_id: ClassId,
    /// Defaults to the class shift
    pub shift: Option<Shift>,
    /// Defaults to today
    pub enrolled_at: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateEnrollmentStatusDto {
    pub status: EnrollmentStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TransferEnrollmentDto {
    pub class_id: ClassId,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransferResponse {
    pub previous: Enrollment,
    pub current: Enrollment,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct EnrollmentFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub student_id: Option<StudentId>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub class_id: Option<ClassId>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub academic_year_id: Option<AcademicYearId>,
    pub status: Option<EnrollmentStatus>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub school_id: Option<SchoolId>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedEnrollmentsResponse {
    pub data: Vec<EnrollmentDetail>,
    pub meta: PaginationMeta,
}

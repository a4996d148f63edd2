//! Class (cohort) models and DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use escola_core::{PaginationMeta, PaginationParams};
use escola_core::serde::deserialize_optional_id;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{AcademicYearId, ClassId, CourseId, EnrollmentId, SchoolId, StudentId, TeacherId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "shift", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Shift {
    Morning,
    Afternoon,
    Evening,
    FullTime,
}

/// A class with its course and year labels and the number of active
/// enrollments.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Class {
    pub id: ClassId,
    pub school_id: SchoolId,
    pub course_id: CourseId,
    pub course_name: String,
    pub academic_year_id: AcademicYearId,
    pub academic_year: i32,
    #[schema(example = "7º Ano A")]
    pub name: String,
    pub shift: Shift,
    pub capacity: Option<i32>,
    pub homeroom_teacher_id: Option<TeacherId>,
    pub enrolled_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Class {
    /// `true` when another active enrollment would exceed the capacity.
    pub fn is_full(&self) -> bool {
        self.capacity
            .is_some_and(|capacity| self.enrolled_count >= i64::from(capacity))
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateClassDto {
    pub course_id: CourseId,
    pub academic_year_id: AcademicYearId,
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    pub shift: Shift,
    #[validate(range(min = 1, max = 500))]
    pub capacity: Option<i32>,
    pub homeroom_teacher_id: Option<TeacherId>,
    pub school_id: Option<SchoolId>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateClassDto {
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,
    pub shift: Option<Shift>,
    #[validate(range(min = 1, max = 500))]
    pub capacity: Option<i32>,
    pub homeroom_teacher_id: Option<TeacherId>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct ClassFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub course_id: Option<CourseId>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub academic_year_id: Option<AcademicYearId>,
    pub shift: Option<Shift>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub school_id: Option<SchoolId>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedClassesResponse {
    pub data: Vec<Class>,
    pub meta: PaginationMeta,
}

/// One line of a class roster: a student holding an active enrollment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RosterEntry {
    pub enrollment_id: EnrollmentId,
    pub student_id: StudentId,
    pub registration_number: String,
    pub first_name: String,
    pub last_name: String,
    pub enrolled_at: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(capacity: Option<i32>, enrolled_count: i64) -> Class {
        Class {
            id: ClassId::new(),
            school_id: SchoolId::new(),
            course_id: CourseId::new(),
            course_name: "Fundamental".into(),
            academic_year_id: AcademicYearId::new(),
            academic_year: 2025,
            name: "7A".into(),
            shift: Shift::Morning,
            capacity,
            homeroom_teacher_id: None,
            enrolled_count,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_full() {
        assert!(!class(None, 1000).is_full());
        assert!(!class(Some(30), 29).is_full());
        assert!(class(Some(30), 30).is_full());
    }

    #[test]
    fn test_shift_wire_names() {
        assert_eq!(serde_json::to_string(&Shift::FullTime).unwrap(), r#""full_time""#);
        let shift: Shift = serde_json::from_str(r#""evening""#).unwrap();
        assert_eq!(shift, Shift::Evening);
    }

    #[test]
    fn test_capacity_bounds() {
        let dto = CreateClassDto {
            course_id: CourseId::new(),
            academic_year_id: AcademicYearId::new(),
            name: "7A".into(),
            shift: Shift::Morning,
            capacity: Some(0),
            homeroom_teacher_id: None,
            school_id: None,
        };
        assert!(dto.validate().is_err());
    }
}

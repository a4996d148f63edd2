//! Course models and DTOs.

use chrono::{DateTime, Utc};
use escola_core::{PaginationMeta, PaginationParams};
use escola_core::serde::deserialize_optional_id;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{CourseId, SchoolId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    pub id: CourseId,
    pub school_id: SchoolId,
    #[schema(example = "Ensino Fundamental II")]
    pub name: String,
    pub description: Option<String>,
    pub workload_hours: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCourseDto {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 10000))]
    pub workload_hours: Option<i32>,
    pub school_id: Option<SchoolId>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCourseDto {
    #[validate(length(min = 1, max = 150))]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 10000))]
    pub workload_hours: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct CourseFilterParams {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub school_id: Option<SchoolId>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedCoursesResponse {
    pub data: Vec<Course>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_course_validation() {
        let valid = CreateCourseDto {
            name: "Ensino Médio".into(),
            description: None,
            workload_hours: Some(800),
            school_id: None,
        };
        assert!(valid.validate().is_ok());

        let zero_hours = CreateCourseDto {
            name: "Ensino Médio".into(),
            description: None,
            workload_hours: Some(0),
            school_id: None,
        };
        assert!(zero_hours.validate().is_err());

        let empty_name = CreateCourseDto {
            name: String::new(),
            description: None,
            workload_hours: None,
            school_id: None,
        };
        assert!(empty_name.validate().is_err());
    }
}

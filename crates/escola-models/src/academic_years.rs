//! Academic year models and DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use escola_core::{PaginationMeta, PaginationParams};
use escola_core::serde::deserialize_optional_id;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::ids::{AcademicYearId, SchoolId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AcademicYear {
    pub id: AcademicYearId,
    pub school_id: SchoolId,
    #[schema(example = 2025)]
    pub year: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_current: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `end_date` must fall strictly after `start_date`.
pub fn check_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if end <= start {
        let mut err = ValidationError::new("date_range");
        err.message = Some("end_date must be after start_date".into());
        return Err(err);
    }
    Ok(())
}

fn validate_create_range(dto: &CreateAcademicYearDto) -> Result<(), ValidationError> {
    check_date_range(dto.start_date, dto.end_date)
}

fn validate_update_range(dto: &UpdateAcademicYearDto) -> Result<(), ValidationError> {
    match (dto.start_date, dto.end_date) {
        (Some(start), Some(end)) => check_date_range(start, end),
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_create_range"))]
pub struct CreateAcademicYearDto {
    #[validate(range(min = 1900, max = 2200))]
    pub year: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_current: bool,
    pub school_id: Option<SchoolId>,
}

/// Partial update. When only one date is given the range is checked against
/// the stored value.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_update_range"))]
pub struct UpdateAcademicYearDto {
    #[validate(range(min = 1900, max = 2200))]
    pub year: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct AcademicYearFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub school_id: Option<SchoolId>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedAcademicYearsResponse {
    pub data: Vec<AcademicYear>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create(year: i32, start: NaiveDate, end: NaiveDate) -> CreateAcademicYearDto {
        CreateAcademicYearDto {
            year,
            start_date: start,
            end_date: end,
            is_current: false,
            school_id: None,
        }
    }

    #[test]
    fn test_valid_year() {
        assert!(create(2025, date(2025, 2, 3), date(2025, 12, 12)).validate().is_ok());
    }

    #[test]
    fn test_end_before_start_rejected() {
        let errors = create(2025, date(2025, 12, 12), date(2025, 2, 3))
            .validate()
            .unwrap_err();
        assert!(errors.errors().contains_key("__all__"));
    }

    #[test]
    fn test_same_day_rejected() {
        assert!(create(2025, date(2025, 2, 3), date(2025, 2, 3)).validate().is_err());
    }

    #[test]
    fn test_year_range() {
        assert!(create(1899, date(1899, 2, 1), date(1899, 12, 1)).validate().is_err());
        assert!(create(2201, date(2201, 2, 1), date(2201, 12, 1)).validate().is_err());
    }

    #[test]
    fn test_update_checks_only_complete_ranges() {
        let partial = UpdateAcademicYearDto {
            end_date: Some(date(2020, 1, 1)),
            ..Default::default()
        };
        assert!(partial.validate().is_ok());

        let inverted = UpdateAcademicYearDto {
            start_date: Some(date(2025, 6, 1)),
            end_date: Some(date(2025, 1, 1)),
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }
}

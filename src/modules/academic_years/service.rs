use anyhow::anyhow;
use escola_core::{AppError, PaginationMeta};
use escola_models::academic_years::{
    AcademicYear, AcademicYearFilterParams, CreateAcademicYearDto, PaginatedAcademicYearsResponse,
    UpdateAcademicYearDto, check_date_range,
};
use escola_models::ids::{AcademicYearId, SchoolId};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use crate::utils::access::ensure_school_exists;

const YEAR_COLUMNS: &str =
    "id, school_id, year, start_date, end_date, is_current, created_at, updated_at";

fn not_found() -> AppError {
    AppError::not_found(anyhow!("Academic year not found"))
}

fn year_write_error(err: sqlx::Error) -> AppError {
    match escola_db::violated_constraint(&err) {
        Some("academic_years_school_year_key") => {
            AppError::conflict(anyhow!("This academic year already exists for the school"))
        }
        Some("academic_years_date_range") => {
            AppError::unprocessable(anyhow!("end_date must be after start_date"))
        }
        Some("academic_years_one_current") => {
            AppError::conflict(anyhow!("Another academic year is already current"))
        }
        _ => AppError::database(err),
    }
}

pub struct AcademicYearService;

impl AcademicYearService {
    async fn clear_current(conn: &mut PgConnection, school_id: SchoolId) -> Result<(), AppError> {
        sqlx::query("UPDATE academic_years SET is_current = false WHERE school_id = $1 AND is_current")
            .bind(school_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    #[instrument(skip(db, dto), fields(year = dto.year))]
    pub async fn create_academic_year(
        db: &PgPool,
        school_id: SchoolId,
        dto: CreateAcademicYearDto,
    ) -> Result<AcademicYear, AppError> {
        ensure_school_exists(db, school_id).await?;

        let mut tx = db.begin().await?;

        if dto.is_current {
            Self::clear_current(&mut tx, school_id).await?;
        }

        let sql = format!(
            r#"INSERT INTO academic_years (school_id, year, start_date, end_date, is_current)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {YEAR_COLUMNS}"#
        );
        let year = sqlx::query_as::<_, AcademicYear>(&sql)
            .bind(school_id)
            .bind(dto.year)
            .bind(dto.start_date)
            .bind(dto.end_date)
            .bind(dto.is_current)
            .fetch_one(&mut *tx)
            .await
            .map_err(year_write_error)?;

        tx.commit().await?;
        info!(academic_year.id = %year.id, school.id = %school_id, "Academic year created");

        Ok(year)
    }

    #[instrument(skip(db))]
    pub async fn list_academic_years(
        db: &PgPool,
        school_id: Option<SchoolId>,
        filters: AcademicYearFilterParams,
    ) -> Result<PaginatedAcademicYearsResponse, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM academic_years WHERE ($1::uuid IS NULL OR school_id = $1)",
        )
        .bind(school_id)
        .fetch_one(db)
        .await?;

        let sql = format!(
            "SELECT {YEAR_COLUMNS} FROM academic_years
             WHERE ($1::uuid IS NULL OR school_id = $1)
             ORDER BY year DESC, id LIMIT $2 OFFSET $3"
        );
        let years = sqlx::query_as::<_, AcademicYear>(&sql)
            .bind(school_id)
            .bind(filters.pagination.limit())
            .bind(filters.pagination.offset())
            .fetch_all(db)
            .await?;

        Ok(PaginatedAcademicYearsResponse {
            data: years,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_academic_year(
        db: &PgPool,
        year_id: AcademicYearId,
        scope: Option<SchoolId>,
    ) -> Result<AcademicYear, AppError> {
        let sql = format!(
            "SELECT {YEAR_COLUMNS} FROM academic_years WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)"
        );
        sqlx::query_as::<_, AcademicYear>(&sql)
            .bind(year_id)
            .bind(scope)
            .fetch_optional(db)
            .await?
            .ok_or_else(not_found)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_academic_year(
        db: &PgPool,
        year_id: AcademicYearId,
        scope: Option<SchoolId>,
        dto: UpdateAcademicYearDto,
    ) -> Result<AcademicYear, AppError> {
        let existing = Self::get_academic_year(db, year_id, scope).await?;

        let start_date = dto.start_date.unwrap_or(existing.start_date);
        let end_date = dto.end_date.unwrap_or(existing.end_date);
        check_date_range(start_date, end_date)
            .map_err(|_| AppError::unprocessable(anyhow!("end_date must be after start_date")))?;

        let sql = format!(
            r#"UPDATE academic_years
               SET year = $2, start_date = $3, end_date = $4
               WHERE id = $1
               RETURNING {YEAR_COLUMNS}"#
        );
        sqlx::query_as::<_, AcademicYear>(&sql)
            .bind(year_id)
            .bind(dto.year.unwrap_or(existing.year))
            .bind(start_date)
            .bind(end_date)
            .fetch_one(db)
            .await
            .map_err(year_write_error)
    }

    #[instrument(skip(db))]
    pub async fn delete_academic_year(
        db: &PgPool,
        year_id: AcademicYearId,
        scope: Option<SchoolId>,
    ) -> Result<(), AppError> {
        let year = Self::get_academic_year(db, year_id, scope).await?;

        let has_classes = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM classes WHERE academic_year_id = $1)",
        )
        .bind(year.id)
        .fetch_one(db)
        .await?;
        if has_classes {
            return Err(AppError::conflict(anyhow!(
                "Academic year still has classes and cannot be deleted"
            )));
        }

        sqlx::query("DELETE FROM academic_years WHERE id = $1")
            .bind(year.id)
            .execute(db)
            .await
            .map_err(|e| {
                if escola_db::is_foreign_key_violation(&e) {
                    AppError::conflict(anyhow!("Academic year is still referenced"))
                } else {
                    AppError::database(e)
                }
            })?;

        Ok(())
    }

    /// Makes this year the school's current one.
    #[instrument(skip(db))]
    pub async fn activate_academic_year(
        db: &PgPool,
        year_id: AcademicYearId,
        scope: Option<SchoolId>,
    ) -> Result<AcademicYear, AppError> {
        let year = Self::get_academic_year(db, year_id, scope).await?;
        if year.is_current {
            return Ok(year);
        }

        let mut tx = db.begin().await?;
        Self::clear_current(&mut tx, year.school_id).await?;

        let sql = format!(
            "UPDATE academic_years SET is_current = true WHERE id = $1 RETURNING {YEAR_COLUMNS}"
        );
        let year = sqlx::query_as::<_, AcademicYear>(&sql)
            .bind(year_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(year_write_error)?;

        tx.commit().await?;
        info!(academic_year.id = %year.id, school.id = %year.school_id, "Academic year activated");

        Ok(year)
    }
}

use anyhow::anyhow;
use escola_core::{AppError, PaginationMeta};
use escola_models::ids::SchoolId;
use escola_models::schools::{
    CreateSchoolDto, PaginatedSchoolsResponse, School, SchoolDetail, SchoolFilterParams,
    UpdateSchoolDto,
};
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};

use crate::metrics::track_school_created;
use crate::utils::sql::like_pattern;

const SCHOOL_COLUMNS: &str = "id, name, code, address, phone, email, created_at, updated_at";

fn school_write_error(err: sqlx::Error) -> AppError {
    match escola_db::violated_constraint(&err) {
        Some("schools_name_key") => {
            AppError::conflict(anyhow!("A school with this name already exists"))
        }
        Some("schools_code_key") => {
            AppError::conflict(anyhow!("A school with this code already exists"))
        }
        _ => AppError::database(err),
    }
}

pub struct SchoolService;

impl SchoolService {
    #[instrument(skip(db, dto), fields(school.name = %dto.name, db.operation = "INSERT", db.table = "schools"))]
    pub async fn create_school(db: &PgPool, dto: CreateSchoolDto) -> Result<School, AppError> {
        let sql = format!(
            "INSERT INTO schools (name, code, address, phone, email) VALUES ($1, $2, $3, $4, $5)
             RETURNING {SCHOOL_COLUMNS}"
        );
        let school = sqlx::query_as::<_, School>(&sql)
            .bind(dto.name.trim())
            .bind(&dto.code)
            .bind(&dto.address)
            .bind(&dto.phone)
            .bind(&dto.email)
            .fetch_one(db)
            .await
            .map_err(|e| {
                if escola_db::is_unique_violation(&e) {
                    warn!(school.name = %dto.name, "Attempted to create a duplicate school");
                }
                school_write_error(e)
            })?;

        track_school_created();
        info!(school.id = %school.id, school.name = %school.name, "School created");

        Ok(school)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "schools"))]
    pub async fn list_schools(
        db: &PgPool,
        filters: SchoolFilterParams,
    ) -> Result<PaginatedSchoolsResponse, AppError> {
        let name = like_pattern(filters.name.as_deref());

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM schools WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(&name)
        .fetch_one(db)
        .await?;

        let sql = format!(
            "SELECT {SCHOOL_COLUMNS} FROM schools
             WHERE ($1::text IS NULL OR name ILIKE $1)
             ORDER BY name LIMIT $2 OFFSET $3"
        );
        let schools = sqlx::query_as::<_, School>(&sql)
            .bind(&name)
            .bind(filters.pagination.limit())
            .bind(filters.pagination.offset())
            .fetch_all(db)
            .await?;

        debug!(total, returned = schools.len(), "Listed schools");

        Ok(PaginatedSchoolsResponse {
            data: schools,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "schools"))]
    pub async fn get_school_detail(
        db: &PgPool,
        school_id: SchoolId,
    ) -> Result<SchoolDetail, AppError> {
        sqlx::query_as::<_, SchoolDetail>(
            r#"
            SELECT s.id, s.name, s.code, s.address, s.phone, s.email,
                   (SELECT COUNT(*) FROM students WHERE school_id = s.id) AS student_count,
                   (SELECT COUNT(*) FROM teachers WHERE school_id = s.id) AS teacher_count,
                   (SELECT COUNT(*) FROM staff WHERE school_id = s.id) AS staff_count,
                   (SELECT COUNT(*) FROM classes WHERE school_id = s.id) AS class_count,
                   s.created_at, s.updated_at
            FROM schools s
            WHERE s.id = $1
            "#,
        )
        .bind(school_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("School not found")))
    }

    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "schools"))]
    pub async fn update_school(
        db: &PgPool,
        school_id: SchoolId,
        dto: UpdateSchoolDto,
    ) -> Result<School, AppError> {
        let sql = format!(
            "UPDATE schools
             SET name = COALESCE($2, name),
                 code = COALESCE($3, code),
                 address = COALESCE($4, address),
                 phone = COALESCE($5, phone),
                 email = COALESCE($6, email)
             WHERE id = $1
             RETURNING {SCHOOL_COLUMNS}"
        );
        sqlx::query_as::<_, School>(&sql)
            .bind(school_id)
            .bind(dto.name.as_deref().map(str::trim))
            .bind(&dto.code)
            .bind(&dto.address)
            .bind(&dto.phone)
            .bind(&dto.email)
            .fetch_optional(db)
            .await
            .map_err(school_write_error)?
            .ok_or_else(|| AppError::not_found(anyhow!("School not found")))
    }

    /// Removes the school with every person registered in it. Role records,
    /// accounts, and academic data go with the cascade.
    #[instrument(skip(db), fields(db.operation = "DELETE", db.table = "schools"))]
    pub async fn delete_school(db: &PgPool, school_id: SchoolId) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let removed_people = sqlx::query(
            r#"
            DELETE FROM people WHERE id IN (
                SELECT person_id FROM students WHERE school_id = $1
                UNION SELECT person_id FROM teachers WHERE school_id = $1
                UNION SELECT person_id FROM staff WHERE school_id = $1
                UNION SELECT person_id FROM guardians WHERE school_id = $1
                UNION SELECT person_id FROM users WHERE school_id = $1
            )
            "#,
        )
        .bind(school_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let deleted = sqlx::query("DELETE FROM schools WHERE id = $1")
            .bind(school_id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("School not found")));
        }

        tx.commit().await?;
        info!(school.id = %school_id, removed_people, "School deleted");

        Ok(())
    }
}

use anyhow::anyhow;
use escola_core::{AppError, PaginationMeta};
use escola_models::courses::{
    Course, CourseFilterParams, CreateCourseDto, PaginatedCoursesResponse, UpdateCourseDto,
};
use escola_models::ids::{CourseId, SchoolId};
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::utils::access::ensure_school_exists;
use crate::utils::sql::like_pattern;

const COURSE_COLUMNS: &str =
    "id, school_id, name, description, workload_hours, created_at, updated_at";

fn course_write_error(err: sqlx::Error) -> AppError {
    match escola_db::violated_constraint(&err) {
        Some("courses_school_name_key") => {
            AppError::conflict(anyhow!("A course with this name already exists"))
        }
        _ => AppError::database(err),
    }
}

pub struct CourseService;

impl CourseService {
    #[instrument(skip(db, dto))]
    pub async fn create_course(
        db: &PgPool,
        school_id: SchoolId,
        dto: CreateCourseDto,
    ) -> Result<Course, AppError> {
        ensure_school_exists(db, school_id).await?;

        let sql = format!(
            r#"INSERT INTO courses (school_id, name, description, workload_hours)
               VALUES ($1, $2, $3, $4)
               RETURNING {COURSE_COLUMNS}"#
        );
        let course = sqlx::query_as::<_, Course>(&sql)
            .bind(school_id)
            .bind(dto.name.trim())
            .bind(&dto.description)
            .bind(dto.workload_hours)
            .fetch_one(db)
            .await
            .map_err(course_write_error)?;

        info!(course.id = %course.id, school.id = %school_id, "Course created");
        Ok(course)
    }

    #[instrument(skip(db))]
    pub async fn list_courses(
        db: &PgPool,
        school_id: Option<SchoolId>,
        filters: CourseFilterParams,
    ) -> Result<PaginatedCoursesResponse, AppError> {
        let name = like_pattern(filters.name.as_deref());

        let total = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM courses
               WHERE ($1::uuid IS NULL OR school_id = $1)
                 AND ($2::text IS NULL OR name ILIKE $2)"#,
        )
        .bind(school_id)
        .bind(&name)
        .fetch_one(db)
        .await?;

        let sql = format!(
            r#"SELECT {COURSE_COLUMNS} FROM courses
               WHERE ($1::uuid IS NULL OR school_id = $1)
                 AND ($2::text IS NULL OR name ILIKE $2)
               ORDER BY name, id
               LIMIT $3 OFFSET $4"#
        );
        let courses = sqlx::query_as::<_, Course>(&sql)
            .bind(school_id)
            .bind(&name)
            .bind(filters.pagination.limit())
            .bind(filters.pagination.offset())
            .fetch_all(db)
            .await?;

        Ok(PaginatedCoursesResponse {
            data: courses,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_course(
        db: &PgPool,
        course_id: CourseId,
        scope: Option<SchoolId>,
    ) -> Result<Course, AppError> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)"
        );
        sqlx::query_as::<_, Course>(&sql)
            .bind(course_id)
            .bind(scope)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Course not found")))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_course(
        db: &PgPool,
        course_id: CourseId,
        scope: Option<SchoolId>,
        dto: UpdateCourseDto,
    ) -> Result<Course, AppError> {
        let sql = format!(
            r#"UPDATE courses
               SET name = COALESCE($3, name),
                   description = COALESCE($4, description),
                   workload_hours = COALESCE($5, workload_hours)
               WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)
               RETURNING {COURSE_COLUMNS}"#
        );
        sqlx::query_as::<_, Course>(&sql)
            .bind(course_id)
            .bind(scope)
            .bind(dto.name.as_deref().map(str::trim))
            .bind(&dto.description)
            .bind(dto.workload_hours)
            .fetch_optional(db)
            .await
            .map_err(course_write_error)?
            .ok_or_else(|| AppError::not_found(anyhow!("Course not found")))
    }

    #[instrument(skip(db))]
    pub async fn delete_course(
        db: &PgPool,
        course_id: CourseId,
        scope: Option<SchoolId>,
    ) -> Result<(), AppError> {
        let course = Self::get_course(db, course_id, scope).await?;

        let has_classes = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM classes WHERE course_id = $1)",
        )
        .bind(course.id)
        .fetch_one(db)
        .await?;
        if has_classes {
            return Err(AppError::conflict(anyhow!(
                "Course still has classes and cannot be deleted"
            )));
        }

        sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(course.id)
            .execute(db)
            .await
            .map_err(|e| {
                if escola_db::is_foreign_key_violation(&e) {
                    AppError::conflict(anyhow!("Course is still referenced"))
                } else {
                    AppError::database(e)
                }
            })?;

        Ok(())
    }
}

use anyhow::anyhow;
use escola_config::EmailConfig;
use escola_core::{AppError, PaginationMeta};
use escola_models::UserRole;
use escola_models::classes::Class;
use escola_models::ids::{SchoolId, TeacherId};
use escola_models::teachers::{
    CreateTeacherDto, CreatedTeacherResponse, PaginatedTeachersResponse, Teacher,
    TeacherFilterParams, UpdateTeacherDto,
};
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::modules::classes::ClassService;
use crate::modules::people::{PersonService, deliver_credentials, provision_account};
use crate::utils::access::ensure_school_exists;
use crate::utils::sql::like_pattern;

const TEACHER_SELECT: &str = r#"
    SELECT t.id, t.person_id, t.school_id, t.specialization, t.hire_date,
           p.first_name, p.last_name, p.email, p.phone, p.document, p.birth_date, p.address,
           u.id AS user_id, u.username, t.created_at, t.updated_at
    FROM teachers t
    JOIN people p ON p.id = t.person_id
    LEFT JOIN users u ON u.person_id = t.person_id
"#;

fn not_found() -> AppError {
    AppError::not_found(anyhow!("Teacher not found"))
}

pub struct TeacherService;

impl TeacherService {
    #[instrument(skip(db, email_config, dto))]
    pub async fn create_teacher(
        db: &PgPool,
        email_config: &EmailConfig,
        school_id: SchoolId,
        dto: CreateTeacherDto,
    ) -> Result<CreatedTeacherResponse, AppError> {
        ensure_school_exists(db, school_id).await?;

        let mut tx = db.begin().await?;

        let person_id = PersonService::insert(&mut tx, &dto.person).await?;
        let teacher_id = sqlx::query_scalar::<_, TeacherId>(
            r#"INSERT INTO teachers (person_id, school_id, specialization, hire_date)
               VALUES ($1, $2, $3, $4) RETURNING id"#,
        )
        .bind(person_id)
        .bind(school_id)
        .bind(&dto.specialization)
        .bind(dto.hire_date)
        .fetch_one(&mut *tx)
        .await?;

        let account = provision_account(
            &mut tx,
            person_id,
            &dto.person.first_name,
            &dto.person.last_name,
            UserRole::Teacher,
            Some(school_id),
        )
        .await?;

        tx.commit().await?;
        info!(teacher.id = %teacher_id, school.id = %school_id, "Teacher registered");

        let teacher = Self::get_teacher(db, teacher_id, None).await?;
        let full_name = format!("{} {}", teacher.first_name, teacher.last_name);
        let account =
            deliver_credentials(email_config, account, teacher.email.as_str(), &full_name).await;

        Ok(CreatedTeacherResponse { teacher, account })
    }

    #[instrument(skip(db))]
    pub async fn list_teachers(
        db: &PgPool,
        school_id: Option<SchoolId>,
        filters: TeacherFilterParams,
    ) -> Result<PaginatedTeachersResponse, AppError> {
        let search = like_pattern(filters.search.as_deref());
        let where_clause = r#"
            WHERE ($1::uuid IS NULL OR t.school_id = $1)
              AND ($2::text IS NULL
                   OR (p.first_name || ' ' || p.last_name) ILIKE $2
                   OR p.email ILIKE $2
                   OR t.specialization ILIKE $2)
        "#;

        let count_sql = format!(
            "SELECT COUNT(*) FROM teachers t JOIN people p ON p.id = t.person_id {where_clause}"
        );
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(school_id)
            .bind(&search)
            .fetch_one(db)
            .await?;

        let data_sql = format!(
            "{TEACHER_SELECT} {where_clause} ORDER BY p.last_name, p.first_name, t.id LIMIT $3 OFFSET $4"
        );
        let teachers = sqlx::query_as::<_, Teacher>(&data_sql)
            .bind(school_id)
            .bind(&search)
            .bind(filters.pagination.limit())
            .bind(filters.pagination.offset())
            .fetch_all(db)
            .await?;

        Ok(PaginatedTeachersResponse {
            data: teachers,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_teacher(
        db: &PgPool,
        teacher_id: TeacherId,
        scope: Option<SchoolId>,
    ) -> Result<Teacher, AppError> {
        let sql = format!("{TEACHER_SELECT} WHERE t.id = $1 AND ($2::uuid IS NULL OR t.school_id = $2)");
        sqlx::query_as::<_, Teacher>(&sql)
            .bind(teacher_id)
            .bind(scope)
            .fetch_optional(db)
            .await?
            .ok_or_else(not_found)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_teacher(
        db: &PgPool,
        teacher_id: TeacherId,
        scope: Option<SchoolId>,
        dto: UpdateTeacherDto,
    ) -> Result<Teacher, AppError> {
        let mut tx = db.begin().await?;

        let person_id =
            PersonService::owned_person(&mut tx, "teachers", teacher_id.into_inner(), scope)
                .await?
                .ok_or_else(not_found)?;
        PersonService::update(&mut tx, person_id, &dto.person).await?;

        sqlx::query(
            r#"UPDATE teachers
               SET specialization = COALESCE($2, specialization),
                   hire_date = COALESCE($3, hire_date)
               WHERE id = $1"#,
        )
        .bind(teacher_id)
        .bind(&dto.specialization)
        .bind(dto.hire_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Self::get_teacher(db, teacher_id, scope).await
    }

    /// Classes they lead lose their homeroom teacher.
    #[instrument(skip(db))]
    pub async fn delete_teacher(
        db: &PgPool,
        teacher_id: TeacherId,
        scope: Option<SchoolId>,
    ) -> Result<(), AppError> {
        let mut conn = db.acquire().await?;
        let person_id =
            PersonService::owned_person(&mut conn, "teachers", teacher_id.into_inner(), scope)
                .await?
                .ok_or_else(not_found)?;
        drop(conn);

        PersonService::delete(db, person_id).await?;
        info!(teacher.id = %teacher_id, "Teacher deleted");
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn teacher_classes(
        db: &PgPool,
        teacher_id: TeacherId,
        scope: Option<SchoolId>,
    ) -> Result<Vec<Class>, AppError> {
        let teacher = Self::get_teacher(db, teacher_id, scope).await?;
        ClassService::list_for_teacher(db, teacher.id).await
    }
}

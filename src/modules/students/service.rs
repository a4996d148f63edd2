use anyhow::anyhow;
use chrono::{Datelike, Utc};
use escola_config::EmailConfig;
use escola_core::{AppError, PaginationMeta};
use escola_models::UserRole;
use escola_models::enrollments::EnrollmentDetail;
use escola_models::ids::{SchoolId, StudentId};
use escola_models::students::{
    CreateStudentDto, CreatedStudentResponse, PaginatedStudentsResponse, Student,
    StudentFilterParams, StudentGuardian, UpdateStudentDto,
};
use rand::Rng;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use crate::modules::enrollments::EnrollmentService;
use crate::modules::people::{PersonService, deliver_credentials, provision_account};
use crate::utils::access::ensure_school_exists;
use crate::utils::sql::like_pattern;

const STUDENT_SELECT: &str = r#"
    SELECT s.id, s.person_id, s.school_id, s.registration_number,
           p.first_name, p.last_name, p.email, p.phone, p.document, p.birth_date, p.address,
           u.id AS user_id, u.username, s.created_at, s.updated_at
    FROM students s
    JOIN people p ON p.id = s.person_id
    LEFT JOIN users u ON u.person_id = s.person_id
"#;

const REGISTRATION_ATTEMPTS: usize = 5;

/// `YYYY` followed by six random digits.
pub fn generate_registration_number(year: i32) -> String {
    let serial: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{year}{serial:06}")
}

fn registration_conflict(err: sqlx::Error) -> AppError {
    if escola_db::violated_constraint(&err) == Some("students_school_registration_key") {
        AppError::conflict(anyhow!("Registration number is already in use in this school"))
    } else {
        AppError::database(err)
    }
}

fn not_found() -> AppError {
    AppError::not_found(anyhow!("Student not found"))
}

pub struct StudentService;

impl StudentService {
    async fn free_registration_number(
        conn: &mut PgConnection,
        school_id: SchoolId,
    ) -> Result<String, AppError> {
        let year = Utc::now().year();
        for _ in 0..REGISTRATION_ATTEMPTS {
            let candidate = generate_registration_number(year);
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM students WHERE school_id = $1 AND registration_number = $2)",
            )
            .bind(school_id)
            .bind(&candidate)
            .fetch_one(&mut *conn)
            .await?;
            if !taken {
                return Ok(candidate);
            }
        }

        Err(AppError::conflict(anyhow!(
            "Could not generate a free registration number, please retry"
        )))
    }

    #[instrument(skip(db, email_config, dto), fields(school.id = %school_id))]
    pub async fn create_student(
        db: &PgPool,
        email_config: &EmailConfig,
        school_id: SchoolId,
        dto: CreateStudentDto,
    ) -> Result<CreatedStudentResponse, AppError> {
        ensure_school_exists(db, school_id).await?;

        let mut tx = db.begin().await?;

        let person_id = PersonService::insert(&mut tx, &dto.person).await?;
        let registration_number = match dto.registration_number {
            Some(number) => number.trim().to_string(),
            None => Self::free_registration_number(&mut tx, school_id).await?,
        };

        let student_id = sqlx::query_scalar::<_, StudentId>(
            "INSERT INTO students (person_id, school_id, registration_number) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(person_id)
        .bind(school_id)
        .bind(&registration_number)
        .fetch_one(&mut *tx)
        .await
        .map_err(registration_conflict)?;

        let account = provision_account(
            &mut tx,
            person_id,
            &dto.person.first_name,
            &dto.person.last_name,
            UserRole::Student,
            Some(school_id),
        )
        .await?;

        tx.commit().await?;
        info!(student.id = %student_id, %registration_number, "Student registered");

        let student = Self::get_student(db, student_id, None).await?;
        let full_name = format!("{} {}", student.first_name, student.last_name);
        let account =
            deliver_credentials(email_config, account, student.email.as_str(), &full_name).await;

        Ok(CreatedStudentResponse { student, account })
    }

    #[instrument(skip(db))]
    pub async fn list_students(
        db: &PgPool,
        school_id: Option<SchoolId>,
        filters: StudentFilterParams,
    ) -> Result<PaginatedStudentsResponse, AppError> {
        let search = like_pattern(filters.search.as_deref());
        let where_clause = r#"
            WHERE ($1::uuid IS NULL OR s.school_id = $1)
              AND ($2::text IS NULL
                   OR (p.first_name || ' ' || p.last_name) ILIKE $2
                   OR p.email ILIKE $2
                   OR s.registration_number ILIKE $2)
              AND ($3::uuid IS NULL OR EXISTS (
                   SELECT 1 FROM enrollments e
                   WHERE e.student_id = s.id AND e.class_id = $3 AND e.status = 'active'))
        "#;

        let count_sql = format!(
            "SELECT COUNT(*) FROM students s JOIN people p ON p.id = s.person_id {where_clause}"
        );
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(school_id)
            .bind(&search)
            .bind(filters.class_id)
            .fetch_one(db)
            .await?;

        let data_sql = format!(
            "{STUDENT_SELECT} {where_clause} ORDER BY p.last_name, p.first_name, s.id LIMIT $4 OFFSET $5"
        );
        let students = sqlx::query_as::<_, Student>(&data_sql)
            .bind(school_id)
            .bind(&search)
            .bind(filters.class_id)
            .bind(filters.pagination.limit())
            .bind(filters.pagination.offset())
            .fetch_all(db)
            .await?;

        Ok(PaginatedStudentsResponse {
            data: students,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_student(
        db: &PgPool,
        student_id: StudentId,
        scope: Option<SchoolId>,
    ) -> Result<Student, AppError> {
        let sql = format!("{STUDENT_SELECT} WHERE s.id = $1 AND ($2::uuid IS NULL OR s.school_id = $2)");
        sqlx::query_as::<_, Student>(&sql)
            .bind(student_id)
            .bind(scope)
            .fetch_optional(db)
            .await?
            .ok_or_else(not_found)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_student(
        db: &PgPool,
        student_id: StudentId,
        scope: Option<SchoolId>,
        dto: UpdateStudentDto,
    ) -> Result<Student, AppError> {
        let mut tx = db.begin().await?;

        let person_id =
            PersonService::owned_person(&mut tx, "students", student_id.into_inner(), scope)
                .await?
                .ok_or_else(not_found)?;
        PersonService::update(&mut tx, person_id, &dto.person).await?;

        if let Some(number) = &dto.registration_number {
            sqlx::query("UPDATE students SET registration_number = $2 WHERE id = $1")
                .bind(student_id)
                .bind(number.trim())
                .execute(&mut *tx)
                .await
                .map_err(registration_conflict)?;
        }

        tx.commit().await?;
        Self::get_student(db, student_id, scope).await
    }

    #[instrument(skip(db))]
    pub async fn delete_student(
        db: &PgPool,
        student_id: StudentId,
        scope: Option<SchoolId>,
    ) -> Result<(), AppError> {
        let mut conn = db.acquire().await?;
        let person_id =
            PersonService::owned_person(&mut conn, "students", student_id.into_inner(), scope)
                .await?
                .ok_or_else(not_found)?;
        drop(conn);

        PersonService::delete(db, person_id).await?;
        info!(student.id = %student_id, "Student deleted");
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn student_enrollments(
        db: &PgPool,
        student_id: StudentId,
        scope: Option<SchoolId>,
    ) -> Result<Vec<EnrollmentDetail>, AppError> {
        let student = Self::get_student(db, student_id, scope).await?;
        EnrollmentService::list_for_student(db, student.id).await
    }

    #[instrument(skip(db))]
    pub async fn student_guardians(
        db: &PgPool,
        student_id: StudentId,
        scope: Option<SchoolId>,
    ) -> Result<Vec<StudentGuardian>, AppError> {
        let student = Self::get_student(db, student_id, scope).await?;

        let guardians = sqlx::query_as::<_, StudentGuardian>(
            r#"
            SELECT g.id AS guardian_id, p.first_name, p.last_name, p.email, p.phone,
                   sg.relationship, sg.is_primary
            FROM student_guardians sg
            JOIN guardians g ON g.id = sg.guardian_id
            JOIN people p ON p.id = g.person_id
            WHERE sg.student_id = $1
            ORDER BY sg.is_primary DESC, p.last_name, p.first_name
            "#,
        )
        .bind(student.id)
        .fetch_all(db)
        .await?;

        Ok(guardians)
    }
}

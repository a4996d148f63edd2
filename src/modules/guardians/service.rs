use anyhow::anyhow;
use escola_config::EmailConfig;
use escola_core::{AppError, PaginationMeta};
use escola_models::UserRole;
use escola_models::guardians::{
    CreateGuardianDto, CreatedGuardianResponse, Guardian, GuardianFilterParams, GuardianStudent,
    LinkStudentDto, PaginatedGuardiansResponse, UpdateGuardianDto,
};
use escola_models::ids::{GuardianId, SchoolId, StudentId};
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::modules::people::{PersonService, deliver_credentials, provision_account};
use crate::utils::access::ensure_school_exists;
use crate::utils::sql::like_pattern;

const GUARDIAN_SELECT: &str = r#"
    SELECT g.id, g.person_id, g.school_id, g.occupation,
           p.first_name, p.last_name, p.email, p.phone, p.document, p.birth_date, p.address,
           u.id AS user_id, u.username, g.created_at, g.updated_at
    FROM guardians g
    JOIN people p ON p.id = g.person_id
    LEFT JOIN users u ON u.person_id = g.person_id
"#;

const GUARDIAN_STUDENT_SELECT: &str = r#"
    SELECT s.id AS student_id, s.registration_number, p.first_name, p.last_name,
           sg.relationship, sg.is_primary
    FROM student_guardians sg
    JOIN students s ON s.id = sg.student_id
    JOIN people p ON p.id = s.person_id
"#;

fn not_found() -> AppError {
    AppError::not_found(anyhow!("Guardian not found"))
}

pub struct GuardianService;

impl GuardianService {
    #[instrument(skip(db, email_config, dto))]
    pub async fn create_guardian(
        db: &PgPool,
        email_config: &EmailConfig,
        school_id: SchoolId,
        dto: CreateGuardianDto,
    ) -> Result<CreatedGuardianResponse, AppError> {
        ensure_school_exists(db, school_id).await?;

        let mut tx = db.begin().await?;

        let person_id = PersonService::insert(&mut tx, &dto.person).await?;
        let guardian_id = sqlx::query_scalar::<_, GuardianId>(
            "INSERT INTO guardians (person_id, school_id, occupation) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(person_id)
        .bind(school_id)
        .bind(&dto.occupation)
        .fetch_one(&mut *tx)
        .await?;

        let account = provision_account(
            &mut tx,
            person_id,
            &dto.person.first_name,
            &dto.person.last_name,
            UserRole::Guardian,
            Some(school_id),
        )
        .await?;

        tx.commit().await?;
        info!(guardian.id = %guardian_id, school.id = %school_id, "Guardian registered");

        let guardian = Self::get_guardian(db, guardian_id, None).await?;
        let full_name = format!("{} {}", guardian.first_name, guardian.last_name);
        let account =
            deliver_credentials(email_config, account, guardian.email.as_str(), &full_name).await;

        Ok(CreatedGuardianResponse { guardian, account })
    }

    #[instrument(skip(db))]
    pub async fn list_guardians(
        db: &PgPool,
        school_id: Option<SchoolId>,
        filters: GuardianFilterParams,
    ) -> Result<PaginatedGuardiansResponse, AppError> {
        let search = like_pattern(filters.search.as_deref());
        let where_clause = r#"
            WHERE ($1::uuid IS NULL OR g.school_id = $1)
              AND ($2::text IS NULL
                   OR (p.first_name || ' ' || p.last_name) ILIKE $2
                   OR p.email ILIKE $2)
        "#;

        let count_sql = format!(
            "SELECT COUNT(*) FROM guardians g JOIN people p ON p.id = g.person_id {where_clause}"
        );
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(school_id)
            .bind(&search)
            .fetch_one(db)
            .await?;

        let data_sql = format!(
            "{GUARDIAN_SELECT} {where_clause} ORDER BY p.last_name, p.first_name, g.id LIMIT $3 OFFSET $4"
        );
        let guardians = sqlx::query_as::<_, Guardian>(&data_sql)
            .bind(school_id)
            .bind(&search)
            .bind(filters.pagination.limit())
            .bind(filters.pagination.offset())
            .fetch_all(db)
            .await?;

        Ok(PaginatedGuardiansResponse {
            data: guardians,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_guardian(
        db: &PgPool,
        guardian_id: GuardianId,
        scope: Option<SchoolId>,
    ) -> Result<Guardian, AppError> {
        let sql = format!("{GUARDIAN_SELECT} WHERE g.id = $1 AND ($2::uuid IS NULL OR g.school_id = $2)");
        sqlx::query_as::<_, Guardian>(&sql)
            .bind(guardian_id)
            .bind(scope)
            .fetch_optional(db)
            .await?
            .ok_or_else(not_found)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_guardian(
        db: &PgPool,
        guardian_id: GuardianId,
        scope: Option<SchoolId>,
        dto: UpdateGuardianDto,
    ) -> Result<Guardian, AppError> {
        let mut tx = db.begin().await?;

        let person_id =
            PersonService::owned_person(&mut tx, "guardians", guardian_id.into_inner(), scope)
                .await?
                .ok_or_else(not_found)?;
        PersonService::update(&mut tx, person_id, &dto.person).await?;

        sqlx::query("UPDATE guardians SET occupation = COALESCE($2, occupation) WHERE id = $1")
            .bind(guardian_id)
            .bind(&dto.occupation)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Self::get_guardian(db, guardian_id, scope).await
    }

    #[instrument(skip(db))]
    pub async fn delete_guardian(
        db: &PgPool,
        guardian_id: GuardianId,
        scope: Option<SchoolId>,
    ) -> Result<(), AppError> {
        let mut conn = db.acquire().await?;
        let person_id =
            PersonService::owned_person(&mut conn, "guardians", guardian_id.into_inner(), scope)
                .await?
                .ok_or_else(not_found)?;
        drop(conn);

        PersonService::delete(db, person_id).await?;
        info!(guardian.id = %guardian_id, "Guardian deleted");
        Ok(())
    }

    /// Links a student of the guardian's school. Marking the link primary
    /// demotes the student's other guardians.
    #[instrument(skip(db, dto), fields(student.id = %dto.student_id))]
    pub async fn link_student(
        db: &PgPool,
        guardian_id: GuardianId,
        scope: Option<SchoolId>,
        dto: LinkStudentDto,
    ) -> Result<GuardianStudent, AppError> {
        let guardian = Self::get_guardian(db, guardian_id, scope).await?;

        let student_in_school = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM students WHERE id = $1 AND school_id = $2)",
        )
        .bind(dto.student_id)
        .bind(guardian.school_id)
        .fetch_one(db)
        .await?;
        if !student_in_school {
            return Err(AppError::not_found(anyhow!("Student not found")));
        }

        let mut tx = db.begin().await?;

        if dto.is_primary {
            sqlx::query("UPDATE student_guardians SET is_primary = false WHERE student_id = $1")
                .bind(dto.student_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"INSERT INTO student_guardians (student_id, guardian_id, relationship, is_primary)
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(dto.student_id)
        .bind(guardian_id)
        .bind(dto.relationship.trim())
        .bind(dto.is_primary)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if escola_db::is_unique_violation(&e) {
                AppError::conflict(anyhow!("Student is already linked to this guardian"))
            } else {
                AppError::database(e)
            }
        })?;

        tx.commit().await?;

        let sql = format!("{GUARDIAN_STUDENT_SELECT} WHERE sg.guardian_id = $1 AND sg.student_id = $2");
        let link = sqlx::query_as::<_, GuardianStudent>(&sql)
            .bind(guardian_id)
            .bind(dto.student_id)
            .fetch_one(db)
            .await?;

        Ok(link)
    }

    #[instrument(skip(db))]
    pub async fn guardian_students(
        db: &PgPool,
        guardian_id: GuardianId,
        scope: Option<SchoolId>,
    ) -> Result<Vec<GuardianStudent>, AppError> {
        let guardian = Self::get_guardian(db, guardian_id, scope).await?;

        let sql = format!("{GUARDIAN_STUDENT_SELECT} WHERE sg.guardian_id = $1 ORDER BY p.last_name, p.first_name");
        let students = sqlx::query_as::<_, GuardianStudent>(&sql)
            .bind(guardian.id)
            .fetch_all(db)
            .await?;

        Ok(students)
    }

    #[instrument(skip(db))]
    pub async fn unlink_student(
        db: &PgPool,
        guardian_id: GuardianId,
        student_id: StudentId,
        scope: Option<SchoolId>,
    ) -> Result<(), AppError> {
        let guardian = Self::get_guardian(db, guardian_id, scope).await?;

        let deleted =
            sqlx::query("DELETE FROM student_guardians WHERE guardian_id = $1 AND student_id = $2")
                .bind(guardian.id)
                .bind(student_id)
                .execute(db)
                .await?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!(
                "Student is not linked to this guardian"
            )));
        }

        Ok(())
    }
}

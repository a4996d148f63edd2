use anyhow::anyhow;
use chrono::Utc;
use escola_core::{AppError, PaginationMeta};
use escola_models::enrollments::{
    CreateEnrollmentDto, Enrollment, EnrollmentDetail, EnrollmentFilterParams,
    PaginatedEnrollmentsResponse, TransferEnrollmentDto, TransferResponse, UpdateEnrollmentStatusDto,
};
use escola_models::ids::{EnrollmentId, SchoolId, StudentId};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use crate::metrics::track_enrollment_created;
use crate::modules::classes::ClassService;

const ENROLLMENT_COLUMNS: &str = "id, school_id, student_id, class_id, academic_year_id, shift, \
     status, enrolled_at, ended_at, created_at, updated_at";

const DETAIL_SELECT: &str = r#"
    SELECT e.id, e.school_id, e.student_id, s.registration_number,
           p.first_name || ' ' || p.last_name AS student_name,
           e.class_id, c.name AS class_name,
           e.academic_year_id, ay.year AS academic_year,
           e.shift, e.status, e.enrolled_at, e.ended_at, e.created_at, e.updated_at
    FROM enrollments e
    JOIN students s ON s.id = e.student_id
    JOIN people p ON p.id = s.person_id
    JOIN classes c ON c.id = e.class_id
    JOIN academic_years ay ON ay.id = e.academic_year_id
"#;

fn not_found() -> AppError {
    AppError::not_found(anyhow!("Enrollment not found"))
}

fn enrollment_write_error(err: sqlx::Error) -> AppError {
    match escola_db::violated_constraint(&err) {
        Some("enrollments_one_active_per_year") => AppError::conflict(anyhow!(
            "Student already has an active enrollment in this academic year"
        )),
        _ => AppError::database(err),
    }
}

async fn lock_enrollment(
    conn: &mut PgConnection,
    enrollment_id: EnrollmentId,
    scope: Option<SchoolId>,
) -> Result<Enrollment, AppError> {
    let sql = format!(
        "SELECT {ENROLLMENT_COLUMNS} FROM enrollments
         WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)
         FOR UPDATE"
    );
    sqlx::query_as::<_, Enrollment>(&sql)
        .bind(enrollment_id)
        .bind(scope)
        .fetch_optional(conn)
        .await?
        .ok_or_else(not_found)
}

pub struct EnrollmentService;

impl EnrollmentService {
    /// Enrolls a student in a class.
    ///
    /// The class row stays locked until commit so two concurrent
    /// enrollments cannot both take the last seat.
    #[instrument(skip(db, dto), fields(student.id = %dto.student_id, class.id = %dto.class_id))]
    pub async fn create_enrollment(
        db: &PgPool,
        scope: Option<SchoolId>,
        dto: CreateEnrollmentDto,
    ) -> Result<EnrollmentDetail, AppError> {
        let mut tx = db.begin().await?;

        let class = ClassService::lock_class(&mut tx, dto.class_id, scope)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Class not found")))?;

        let student_in_school = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM students WHERE id = $1 AND school_id = $2)",
        )
        .bind(dto.student_id)
        .bind(class.school_id)
        .fetch_one(&mut *tx)
        .await?;
        if !student_in_school {
            return Err(AppError::not_found(anyhow!("Student not found")));
        }

        if class.is_full() {
            return Err(AppError::conflict(anyhow!("Class is full")));
        }

        let enrollment_id = sqlx::query_scalar::<_, EnrollmentId>(
            r#"INSERT INTO enrollments
                   (school_id, student_id, class_id, academic_year_id, shift, enrolled_at)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id"#,
        )
        .bind(class.school_id)
        .bind(dto.student_id)
        .bind(class.id)
        .bind(class.academic_year_id)
        .bind(dto.shift.unwrap_or(class.shift))
        .bind(dto.enrolled_at.unwrap_or_else(|| Utc::now().date_naive()))
        .fetch_one(&mut *tx)
        .await
        .map_err(enrollment_write_error)?;

        tx.commit().await?;
        track_enrollment_created();
        info!(enrollment.id = %enrollment_id, "Enrollment created");

        Self::get_enrollment(db, enrollment_id, None).await
    }

    #[instrument(skip(db))]
    pub async fn list_enrollments(
        db: &PgPool,
        school_id: Option<SchoolId>,
        filters: EnrollmentFilterParams,
    ) -> Result<PaginatedEnrollmentsResponse, AppError> {
        const WHERE: &str = r#"
            WHERE ($1::uuid IS NULL OR e.school_id = $1)
              AND ($2::uuid IS NULL OR e.student_id = $2)
              AND ($3::uuid IS NULL OR e.class_id = $3)
              AND ($4::uuid IS NULL OR e.academic_year_id = $4)
              AND ($5::enrollment_status IS NULL OR e.status = $5)
        "#;

        let total =
            sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM enrollments e {WHERE}"))
                .bind(school_id)
                .bind(filters.student_id)
                .bind(filters.class_id)
                .bind(filters.academic_year_id)
                .bind(filters.status)
                .fetch_one(db)
                .await?;

        let sql = format!(
            "{DETAIL_SELECT} {WHERE} ORDER BY e.enrolled_at DESC, e.created_at DESC LIMIT $6 OFFSET $7"
        );
        let enrollments = sqlx::query_as::<_, EnrollmentDetail>(&sql)
            .bind(school_id)
            .bind(filters.student_id)
            .bind(filters.class_id)
            .bind(filters.academic_year_id)
            .bind(filters.status)
            .bind(filters.pagination.limit())
            .bind(filters.pagination.offset())
            .fetch_all(db)
            .await?;

        Ok(PaginatedEnrollmentsResponse {
            data: enrollments,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_enrollment(
        db: &PgPool,
        enrollment_id: EnrollmentId,
        scope: Option<SchoolId>,
    ) -> Result<EnrollmentDetail, AppError> {
        let sql =
            format!("{DETAIL_SELECT} WHERE e.id = $1 AND ($2::uuid IS NULL OR e.school_id = $2)");
        sqlx::query_as::<_, EnrollmentDetail>(&sql)
            .bind(enrollment_id)
            .bind(scope)
            .fetch_optional(db)
            .await?
            .ok_or_else(not_found)
    }

    /// Full enrollment history of a student, newest academic year first.
    pub async fn list_for_student(
        db: &PgPool,
        student_id: StudentId,
    ) -> Result<Vec<EnrollmentDetail>, AppError> {
        let sql = format!(
            "{DETAIL_SELECT} WHERE e.student_id = $1 ORDER BY ay.year DESC, e.enrolled_at DESC"
        );
        Ok(sqlx::query_as::<_, EnrollmentDetail>(&sql)
            .bind(student_id)
            .fetch_all(db)
            .await?)
    }

    #[instrument(skip(db))]
    pub async fn update_status(
        db: &PgPool,
        enrollment_id: EnrollmentId,
        scope: Option<SchoolId>,
        dto: UpdateEnrollmentStatusDto,
    ) -> Result<EnrollmentDetail, AppError> {
        let mut tx = db.begin().await?;

        let enrollment = lock_enrollment(&mut tx, enrollment_id, scope).await?;
        if !enrollment.status.can_transition_to(dto.status) {
            return Err(AppError::unprocessable(anyhow!(
                "Only active enrollments can be cancelled or completed"
            )));
        }

        sqlx::query("UPDATE enrollments SET status = $2, ended_at = CURRENT_DATE WHERE id = $1")
            .bind(enrollment_id)
            .bind(dto.status)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(enrollment.id = %enrollment_id, status = ?dto.status, "Enrollment status changed");

        Self::get_enrollment(db, enrollment_id, None).await
    }

    /// Moves an active enrollment to another class of the same school and
    /// academic year. The source is closed as `transferred` and a new active
    /// enrollment is opened in the target class.
    #[instrument(skip(db))]
    pub async fn transfer(
        db: &PgPool,
        enrollment_id: EnrollmentId,
        scope: Option<SchoolId>,
        dto: TransferEnrollmentDto,
    ) -> Result<TransferResponse, AppError> {
        let mut tx = db.begin().await?;

        let source = lock_enrollment(&mut tx, enrollment_id, scope).await?;
        if source.status.is_final() {
            return Err(AppError::unprocessable(anyhow!(
                "Only active enrollments can be transferred"
            )));
        }
        if source.class_id == dto.class_id {
            return Err(AppError::unprocessable(anyhow!(
                "Enrollment is already in this class"
            )));
        }

        let target = ClassService::lock_class(&mut tx, dto.class_id, Some(source.school_id))
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Target class not found")))?;
        if target.academic_year_id != source.academic_year_id {
            return Err(AppError::unprocessable(anyhow!(
                "Target class belongs to a different academic year"
            )));
        }
        if target.is_full() {
            return Err(AppError::conflict(anyhow!("Target class is full")));
        }

        let update = format!(
            r#"UPDATE enrollments SET status = 'transferred', ended_at = CURRENT_DATE
               WHERE id = $1
               RETURNING {ENROLLMENT_COLUMNS}"#
        );
        let previous = sqlx::query_as::<_, Enrollment>(&update)
            .bind(source.id)
            .fetch_one(&mut *tx)
            .await?;

        let insert = format!(
            r#"INSERT INTO enrollments
                   (school_id, student_id, class_id, academic_year_id, shift, enrolled_at)
               VALUES ($1, $2, $3, $4, $5, CURRENT_DATE)
               RETURNING {ENROLLMENT_COLUMNS}"#
        );
        let current = sqlx::query_as::<_, Enrollment>(&insert)
            .bind(source.school_id)
            .bind(source.student_id)
            .bind(target.id)
            .bind(target.academic_year_id)
            .bind(target.shift)
            .fetch_one(&mut *tx)
            .await
            .map_err(enrollment_write_error)?;

        tx.commit().await?;
        info!(
            enrollment.from = %previous.id,
            enrollment.to = %current.id,
            class.id = %target.id,
            "Enrollment transferred"
        );

        Ok(TransferResponse { previous, current })
    }

    #[instrument(skip(db))]
    pub async fn delete_enrollment(
        db: &PgPool,
        enrollment_id: EnrollmentId,
        scope: Option<SchoolId>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM enrollments WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)",
        )
        .bind(enrollment_id)
        .bind(scope)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found());
        }

        info!(enrollment.id = %enrollment_id, "Enrollment deleted");
        Ok(())
    }
}


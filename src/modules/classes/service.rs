use anyhow::anyhow;
use escola_core::{AppError, PaginationMeta};
use escola_models::classes::{
    Class, ClassFilterParams, CreateClassDto, PaginatedClassesResponse, RosterEntry,
    UpdateClassDto,
};
use escola_models::ids::{ClassId, SchoolId, TeacherId};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

const CLASS_SELECT: &str = r#"
    SELECT c.id, c.school_id, c.course_id, co.name AS course_name,
           c.academic_year_id, ay.year AS academic_year,
           c.name, c.shift, c.capacity, c.homeroom_teacher_id,
           (SELECT COUNT(*) FROM enrollments e
             WHERE e.class_id = c.id AND e.status = 'active') AS enrolled_count,
           c.created_at, c.updated_at
    FROM classes c
    JOIN courses co ON co.id = c.course_id
    JOIN academic_years ay ON ay.id = c.academic_year_id
"#;

fn not_found() -> AppError {
    AppError::not_found(anyhow!("Class not found"))
}

fn class_write_error(err: sqlx::Error) -> AppError {
    match escola_db::violated_constraint(&err) {
        Some("classes_year_course_name_key") => AppError::conflict(anyhow!(
            "A class with this name already exists for the course and academic year"
        )),
        _ => AppError::database(err),
    }
}

/// Checks that a row of `table` with `id` belongs to `school_id`.
async fn exists_in_school(
    conn: &mut PgConnection,
    table: &'static str,
    id: uuid::Uuid,
    school_id: SchoolId,
) -> Result<bool, AppError> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1 AND school_id = $2)");
    Ok(sqlx::query_scalar::<_, bool>(&sql)
        .bind(id)
        .bind(school_id)
        .fetch_one(conn)
        .await?)
}

async fn ensure_teacher(
    conn: &mut PgConnection,
    teacher_id: TeacherId,
    school_id: SchoolId,
) -> Result<(), AppError> {
    if !exists_in_school(conn, "teachers", teacher_id.into_inner(), school_id).await? {
        return Err(AppError::not_found(anyhow!("Homeroom teacher not found")));
    }
    Ok(())
}

pub struct ClassService;

impl ClassService {
    #[instrument(skip(db, dto))]
    pub async fn create_class(
        db: &PgPool,
        school_id: SchoolId,
        dto: CreateClassDto,
    ) -> Result<Class, AppError> {
        let mut conn = db.acquire().await?;

        if !exists_in_school(&mut conn, "courses", dto.course_id.into_inner(), school_id).await? {
            return Err(AppError::not_found(anyhow!("Course not found")));
        }
        if !exists_in_school(
            &mut conn,
            "academic_years",
            dto.academic_year_id.into_inner(),
            school_id,
        )
        .await?
        {
            return Err(AppError::not_found(anyhow!("Academic year not found")));
        }
        if let Some(teacher_id) = dto.homeroom_teacher_id {
            ensure_teacher(&mut conn, teacher_id, school_id).await?;
        }

        let class_id = sqlx::query_scalar::<_, ClassId>(
            r#"INSERT INTO classes
                   (school_id, course_id, academic_year_id, name, shift, capacity, homeroom_teacher_id)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING id"#,
        )
        .bind(school_id)
        .bind(dto.course_id)
        .bind(dto.academic_year_id)
        .bind(dto.name.trim())
        .bind(dto.shift)
        .bind(dto.capacity)
        .bind(dto.homeroom_teacher_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(class_write_error)?;

        info!(class.id = %class_id, school.id = %school_id, "Class created");
        Self::get_class(db, class_id, None).await
    }

    #[instrument(skip(db))]
    pub async fn list_classes(
        db: &PgPool,
        school_id: Option<SchoolId>,
        filters: ClassFilterParams,
    ) -> Result<PaginatedClassesResponse, AppError> {
        const WHERE: &str = r#"
            WHERE ($1::uuid IS NULL OR c.school_id = $1)
              AND ($2::uuid IS NULL OR c.course_id = $2)
              AND ($3::uuid IS NULL OR c.academic_year_id = $3)
              AND ($4::shift IS NULL OR c.shift = $4)
        "#;

        let total =
            sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM classes c {WHERE}"))
                .bind(school_id)
                .bind(filters.course_id)
                .bind(filters.academic_year_id)
                .bind(filters.shift)
                .fetch_one(db)
                .await?;

        let sql = format!(
            "{CLASS_SELECT} {WHERE} ORDER BY ay.year DESC, co.name, c.name LIMIT $5 OFFSET $6"
        );
        let classes = sqlx::query_as::<_, Class>(&sql)
            .bind(school_id)
            .bind(filters.course_id)
            .bind(filters.academic_year_id)
            .bind(filters.shift)
            .bind(filters.pagination.limit())
            .bind(filters.pagination.offset())
            .fetch_all(db)
            .await?;

        Ok(PaginatedClassesResponse {
            data: classes,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_class(
        db: &PgPool,
        class_id: ClassId,
        scope: Option<SchoolId>,
    ) -> Result<Class, AppError> {
        let sql = format!("{CLASS_SELECT} WHERE c.id = $1 AND ($2::uuid IS NULL OR c.school_id = $2)");
        sqlx::query_as::<_, Class>(&sql)
            .bind(class_id)
            .bind(scope)
            .fetch_optional(db)
            .await?
            .ok_or_else(not_found)
    }

    /// Locks the class row until the transaction ends, then loads the class.
    ///
    /// The lock and the read are separate statements: a caller that waited
    /// for the lock must count the enrollments committed by the previous
    /// holder, and a statement only sees rows committed before it started.
    pub async fn lock_class(
        conn: &mut PgConnection,
        class_id: ClassId,
        scope: Option<SchoolId>,
    ) -> Result<Option<Class>, AppError> {
        let locked = sqlx::query_scalar::<_, ClassId>(
            r#"SELECT id FROM classes
               WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)
               FOR UPDATE"#,
        )
        .bind(class_id)
        .bind(scope)
        .fetch_optional(&mut *conn)
        .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let sql = format!("{CLASS_SELECT} WHERE c.id = $1");
        Ok(sqlx::query_as::<_, Class>(&sql)
            .bind(class_id)
            .fetch_optional(&mut *conn)
            .await?)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_class(
        db: &PgPool,
        class_id: ClassId,
        scope: Option<SchoolId>,
        dto: UpdateClassDto,
    ) -> Result<Class, AppError> {
        let mut tx = db.begin().await?;

        let class = Self::lock_class(&mut tx, class_id, scope)
            .await?
            .ok_or_else(not_found)?;

        if dto
            .capacity
            .is_some_and(|capacity| i64::from(capacity) < class.enrolled_count)
        {
            return Err(AppError::unprocessable(anyhow!(
                "Capacity cannot be lower than the {} active enrollments",
                class.enrolled_count
            )));
        }
        if let Some(teacher_id) = dto.homeroom_teacher_id {
            ensure_teacher(&mut tx, teacher_id, class.school_id).await?;
        }

        sqlx::query(
            r#"UPDATE classes
               SET name = COALESCE($2, name),
                   shift = COALESCE($3, shift),
                   capacity = COALESCE($4, capacity),
                   homeroom_teacher_id = COALESCE($5, homeroom_teacher_id)
               WHERE id = $1"#,
        )
        .bind(class_id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(dto.shift)
        .bind(dto.capacity)
        .bind(dto.homeroom_teacher_id)
        .execute(&mut *tx)
        .await
        .map_err(class_write_error)?;

        tx.commit().await?;
        Self::get_class(db, class_id, None).await
    }

    /// Deletes a class together with its finished enrollments. Classes with
    /// active enrollments are kept.
    #[instrument(skip(db))]
    pub async fn delete_class(
        db: &PgPool,
        class_id: ClassId,
        scope: Option<SchoolId>,
    ) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let class = Self::lock_class(&mut tx, class_id, scope)
            .await?
            .ok_or_else(not_found)?;
        if class.enrolled_count > 0 {
            return Err(AppError::conflict(anyhow!(
                "Class still has active enrollments"
            )));
        }

        sqlx::query("DELETE FROM enrollments WHERE class_id = $1 AND status <> 'active'")
            .bind(class_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(class_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if escola_db::is_foreign_key_violation(&e) {
                    AppError::conflict(anyhow!("Class is still referenced"))
                } else {
                    AppError::database(e)
                }
            })?;

        tx.commit().await?;
        info!(class.id = %class_id, "Class deleted");
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn roster(
        db: &PgPool,
        class_id: ClassId,
        scope: Option<SchoolId>,
    ) -> Result<Vec<RosterEntry>, AppError> {
        let class = Self::get_class(db, class_id, scope).await?;

        let roster = sqlx::query_as::<_, RosterEntry>(
            r#"SELECT e.id AS enrollment_id, s.id AS student_id, s.registration_number,
                      p.first_name, p.last_name, e.enrolled_at
               FROM enrollments e
               JOIN students s ON s.id = e.student_id
               JOIN people p ON p.id = s.person_id
               WHERE e.class_id = $1 AND e.status = 'active'
               ORDER BY p.first_name, p.last_name, s.registration_number"#,
        )
        .bind(class.id)
        .fetch_all(db)
        .await?;

        Ok(roster)
    }

    /// Classes where the teacher is homeroom teacher, newest year first.
    pub async fn list_for_teacher(
        db: &PgPool,
        teacher_id: TeacherId,
    ) -> Result<Vec<Class>, AppError> {
        let sql = format!(
            "{CLASS_SELECT} WHERE c.homeroom_teacher_id = $1 ORDER BY ay.year DESC, c.name"
        );
        Ok(sqlx::query_as::<_, Class>(&sql)
            .bind(teacher_id)
            .fetch_all(db)
            .await?)
    }
}

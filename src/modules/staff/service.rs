use anyhow::anyhow;
use escola_config::EmailConfig;
use escola_core::{AppError, PaginationMeta};
use escola_models::UserRole;
use escola_models::ids::{SchoolId, StaffId};
use escola_models::staff::{
    CreateStaffDto, CreatedStaffResponse, PaginatedStaffResponse, StaffFilterParams, StaffMember,
    UpdateStaffDto,
};
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::modules::people::{PersonService, deliver_credentials, provision_account};
use crate::utils::access::ensure_school_exists;
use crate::utils::sql::like_pattern;

const STAFF_SELECT: &str = r#"
    SELECT st.id, st.person_id, st.school_id, st.position, st.hire_date,
           p.first_name, p.last_name, p.email, p.phone, p.document, p.birth_date, p.address,
           u.id AS user_id, u.username, st.created_at, st.updated_at
    FROM staff st
    JOIN people p ON p.id = st.person_id
    LEFT JOIN users u ON u.person_id = st.person_id
"#;

fn not_found() -> AppError {
    AppError::not_found(anyhow!("Staff member not found"))
}

pub struct StaffService;

impl StaffService {
    #[instrument(skip(db, email_config, dto))]
    pub async fn create_staff(
        db: &PgPool,
        email_config: &EmailConfig,
        school_id: SchoolId,
        dto: CreateStaffDto,
    ) -> Result<CreatedStaffResponse, AppError> {
        ensure_school_exists(db, school_id).await?;

        let mut tx = db.begin().await?;

        let person_id = PersonService::insert(&mut tx, &dto.person).await?;
        let staff_id = sqlx::query_scalar::<_, StaffId>(
            r#"INSERT INTO staff (person_id, school_id, position, hire_date)
               VALUES ($1, $2, $3, $4) RETURNING id"#,
        )
        .bind(person_id)
        .bind(school_id)
        .bind(dto.position.trim())
        .bind(dto.hire_date)
        .fetch_one(&mut *tx)
        .await?;

        let account = provision_account(
            &mut tx,
            person_id,
            &dto.person.first_name,
            &dto.person.last_name,
            UserRole::Staff,
            Some(school_id),
        )
        .await?;

        tx.commit().await?;
        info!(staff.id = %staff_id, school.id = %school_id, "Staff member registered");

        let staff = Self::get_staff(db, staff_id, None).await?;
        let full_name = format!("{} {}", staff.first_name, staff.last_name);
        let account =
            deliver_credentials(email_config, account, staff.email.as_str(), &full_name).await;

        Ok(CreatedStaffResponse { staff, account })
    }

    #[instrument(skip(db))]
    pub async fn list_staff(
        db: &PgPool,
        school_id: Option<SchoolId>,
        filters: StaffFilterParams,
    ) -> Result<PaginatedStaffResponse, AppError> {
        let search = like_pattern(filters.search.as_deref());
        let where_clause = r#"
            WHERE ($1::uuid IS NULL OR st.school_id = $1)
              AND ($2::text IS NULL
                   OR (p.first_name || ' ' || p.last_name) ILIKE $2
                   OR p.email ILIKE $2
                   OR st.position ILIKE $2)
        "#;

        let count_sql = format!(
            "SELECT COUNT(*) FROM staff st JOIN people p ON p.id = st.person_id {where_clause}"
        );
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(school_id)
            .bind(&search)
            .fetch_one(db)
            .await?;

        let data_sql = format!(
            "{STAFF_SELECT} {where_clause} ORDER BY p.last_name, p.first_name, st.id LIMIT $3 OFFSET $4"
        );
        let staff = sqlx::query_as::<_, StaffMember>(&data_sql)
            .bind(school_id)
            .bind(&search)
            .bind(filters.pagination.limit())
            .bind(filters.pagination.offset())
            .fetch_all(db)
            .await?;

        Ok(PaginatedStaffResponse {
            data: staff,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_staff(
        db: &PgPool,
        staff_id: StaffId,
        scope: Option<SchoolId>,
    ) -> Result<StaffMember, AppError> {
        let sql = format!("{STAFF_SELECT} WHERE st.id = $1 AND ($2::uuid IS NULL OR st.school_id = $2)");
        sqlx::query_as::<_, StaffMember>(&sql)
            .bind(staff_id)
            .bind(scope)
            .fetch_optional(db)
            .await?
            .ok_or_else(not_found)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_staff(
        db: &PgPool,
        staff_id: StaffId,
        scope: Option<SchoolId>,
        dto: UpdateStaffDto,
    ) -> Result<StaffMember, AppError> {
        let mut tx = db.begin().await?;

        let person_id = PersonService::owned_person(&mut tx, "staff", staff_id.into_inner(), scope)
            .await?
            .ok_or_else(not_found)?;
        PersonService::update(&mut tx, person_id, &dto.person).await?;

        sqlx::query(
            r#"UPDATE staff
               SET position = COALESCE($2, position),
                   hire_date = COALESCE($3, hire_date)
               WHERE id = $1"#,
        )
        .bind(staff_id)
        .bind(dto.position.as_deref().map(str::trim))
        .bind(dto.hire_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Self::get_staff(db, staff_id, scope).await
    }

    #[instrument(skip(db))]
    pub async fn delete_staff(
        db: &PgPool,
        staff_id: StaffId,
        scope: Option<SchoolId>,
    ) -> Result<(), AppError> {
        let mut conn = db.acquire().await?;
        let person_id =
            PersonService::owned_person(&mut conn, "staff", staff_id.into_inner(), scope)
                .await?
                .ok_or_else(not_found)?;
        drop(conn);

        PersonService::delete(db, person_id).await?;
        info!(staff.id = %staff_id, "Staff member deleted");
        Ok(())
    }
}

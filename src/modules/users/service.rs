use anyhow::anyhow;
use escola_config::EmailConfig;
use escola_core::{AppError, PaginationMeta, hash_password};
use escola_models::UserRole;
use escola_models::ids::{SchoolId, StaffId, UserId};
use escola_models::staff::SCHOOL_ADMIN_POSITION;
use escola_models::users::{
    AccountProfile, CreateSchoolAdminDto, CreatedSchoolAdminResponse, PaginatedUsersResponse,
    PasswordResetResponse, UserFilterParams,
};
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use crate::modules::people::{
    PersonService, deliver_credentials, deliver_password_reset, generate_temporary_password,
    provision_account,
};
use crate::utils::access::ensure_school_exists;
use crate::utils::sql::like_pattern;

pub(crate) const PROFILE_SELECT: &str = r#"
    SELECT u.id, u.username, u.role, u.school_id, u.is_active, u.must_change_password,
           u.last_login_at, p.id AS person_id, p.first_name, p.last_name, p.email, p.phone,
           u.created_at, u.updated_at
    FROM users u
    JOIN people p ON p.id = u.person_id
"#;

pub struct UserService;

impl UserService {
    #[instrument(skip(db))]
    pub async fn find_profile(
        db: &PgPool,
        user_id: UserId,
    ) -> Result<Option<AccountProfile>, AppError> {
        let sql = format!("{PROFILE_SELECT} WHERE u.id = $1");
        let profile = sqlx::query_as::<_, AccountProfile>(&sql)
            .bind(user_id)
            .fetch_optional(db)
            .await?;
        Ok(profile)
    }

    /// `scope` restricts the lookup to one school; `None` is unrestricted.
    #[instrument(skip(db))]
    pub async fn get_user(
        db: &PgPool,
        user_id: UserId,
        scope: Option<SchoolId>,
    ) -> Result<AccountProfile, AppError> {
        let sql = format!("{PROFILE_SELECT} WHERE u.id = $1 AND ($2::uuid IS NULL OR u.school_id = $2)");
        sqlx::query_as::<_, AccountProfile>(&sql)
            .bind(user_id)
            .bind(scope)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    #[instrument(skip(db))]
    pub async fn list_users(
        db: &PgPool,
        school_id: Option<SchoolId>,
        filters: UserFilterParams,
    ) -> Result<PaginatedUsersResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();
        let search = like_pattern(filters.search.as_deref());

        let where_clause = r#"
            WHERE ($1::uuid IS NULL OR u.school_id = $1)
              AND ($2::user_role IS NULL OR u.role = $2)
              AND ($3::boolean IS NULL OR u.is_active = $3)
              AND ($4::text IS NULL
                   OR u.username ILIKE $4
                   OR p.email ILIKE $4
                   OR (p.first_name || ' ' || p.last_name) ILIKE $4)
        "#;

        let count_sql = format!(
            "SELECT COUNT(*) FROM users u JOIN people p ON p.id = u.person_id {where_clause}"
        );
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(school_id)
            .bind(filters.role)
            .bind(filters.is_active)
            .bind(&search)
            .fetch_one(db)
            .await?;

        let data_sql = format!(
            "{PROFILE_SELECT} {where_clause} ORDER BY p.last_name, p.first_name, u.id LIMIT $5 OFFSET $6"
        );
        let users = sqlx::query_as::<_, AccountProfile>(&data_sql)
            .bind(school_id)
            .bind(filters.role)
            .bind(filters.is_active)
            .bind(&search)
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await?;

        Ok(PaginatedUsersResponse {
            data: users,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn update_status(
        db: &PgPool,
        actor_id: UserId,
        user_id: UserId,
        scope: Option<SchoolId>,
        is_active: bool,
    ) -> Result<AccountProfile, AppError> {
        if actor_id == user_id && !is_active {
            return Err(AppError::unprocessable(anyhow!(
                "You cannot deactivate your own account"
            )));
        }

        let updated = sqlx::query(
            "UPDATE users SET is_active = $3 WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)",
        )
        .bind(user_id)
        .bind(scope)
        .bind(is_active)
        .execute(db)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("User not found")));
        }

        Self::get_user(db, user_id, scope).await
    }

    /// Replaces the password with a random one and forces a change on the
    /// next login. Returns the plain password.
    #[instrument(skip(conn))]
    pub async fn assign_temporary_password(
        conn: &mut PgConnection,
        user_id: UserId,
    ) -> Result<String, AppError> {
        let temporary_password = generate_temporary_password();
        let password_hash = hash_password(&temporary_password)?;

        sqlx::query(
            "UPDATE users SET password_hash = $2, must_change_password = true WHERE id = $1",
        )
        .bind(user_id)
        .bind(&password_hash)
        .execute(conn)
        .await?;

        Ok(temporary_password)
    }

    #[instrument(skip(db, email_config))]
    pub async fn reset_password(
        db: &PgPool,
        email_config: &EmailConfig,
        user_id: UserId,
        scope: Option<SchoolId>,
    ) -> Result<PasswordResetResponse, AppError> {
        let profile = Self::get_user(db, user_id, scope).await?;
        let temporary_password = {
            let mut conn = db.acquire().await?;
            Self::assign_temporary_password(&mut conn, profile.id).await?
        };

        let full_name = format!("{} {}", profile.first_name, profile.last_name);
        let emailed = deliver_password_reset(
            email_config,
            profile.email.as_str(),
            &full_name,
            &profile.username,
            &temporary_password,
        )
        .await;

        Ok(PasswordResetResponse {
            user_id: profile.id,
            credentials_emailed: emailed,
            temporary_password: (!emailed).then_some(temporary_password),
        })
    }

    /// Person, staff record, and `school_admin` account in one transaction.
    #[instrument(skip(db, email_config, dto), fields(school.id = %dto.school_id))]
    pub async fn create_school_admin(
        db: &PgPool,
        email_config: &EmailConfig,
        dto: CreateSchoolAdminDto,
    ) -> Result<CreatedSchoolAdminResponse, AppError> {
        ensure_school_exists(db, dto.school_id).await?;

        let mut tx = db.begin().await?;

        let person_id = PersonService::insert(&mut tx, &dto.person).await?;
        let staff_id = sqlx::query_scalar::<_, StaffId>(
            "INSERT INTO staff (person_id, school_id, position) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(person_id)
        .bind(dto.school_id)
        .bind(SCHOOL_ADMIN_POSITION)
        .fetch_one(&mut *tx)
        .await?;
        let account = provision_account(
            &mut tx,
            person_id,
            &dto.person.first_name,
            &dto.person.last_name,
            UserRole::SchoolAdmin,
            Some(dto.school_id),
        )
        .await?;

        tx.commit().await?;

        let profile = Self::find_profile(db, account.user_id)
            .await?
            .ok_or_else(|| AppError::internal_error("Created account vanished".to_string()))?;
        let full_name = format!("{} {}", profile.first_name, profile.last_name);
        let account =
            deliver_credentials(email_config, account, profile.email.as_str(), &full_name).await;

        Ok(CreatedSchoolAdminResponse {
            profile,
            staff_id,
            account,
        })
    }
}

use anyhow::anyhow;
use escola_auth::{create_access_token, create_refresh_token, verify_refresh_token};
use escola_config::{EmailConfig, JwtConfig};
use escola_core::{AppError, hash_password, verify_password};
use escola_models::UserRole;
use escola_models::auth::{ChangePasswordRequest, LoginRequest, LoginResponse};
use escola_models::ids::UserId;
use escola_models::users::AccountProfile;
use escola_models::value_types::Email;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use crate::metrics::{track_login_failure, track_login_success};
use crate::modules::people::deliver_password_reset;
use crate::modules::users::UserService;

#[derive(sqlx::FromRow)]
struct LoginCandidate {
    id: UserId,
    password_hash: String,
    role: UserRole,
    is_active: bool,
}

pub struct AuthService;

impl AuthService {
    fn issue_tokens(
        profile: AccountProfile,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let access_token = create_access_token(
            profile.id,
            &profile.username,
            profile.role,
            profile.school_id,
            jwt_config,
        )?;
        let refresh_token = create_refresh_token(profile.id, jwt_config)?;

        Ok(LoginResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: jwt_config.access_token_expiry,
            user: profile,
        })
    }

    /// `login` is either the username or the person's email, compared
    /// case-insensitively.
    #[instrument(skip(db, jwt_config, dto), fields(login = %dto.login))]
    pub async fn login(
        db: &PgPool,
        jwt_config: &JwtConfig,
        dto: LoginRequest,
    ) -> Result<LoginResponse, AppError> {
        let login = dto.login.trim().to_lowercase();

        let candidate = sqlx::query_as::<_, LoginCandidate>(
            r#"
            SELECT u.id, u.password_hash, u.role, u.is_active
            FROM users u
            JOIN people p ON p.id = u.person_id
            WHERE lower(u.username) = $1 OR p.email = $1
            LIMIT 1
            "#,
        )
        .bind(&login)
        .fetch_optional(db)
        .await?;

        let Some(candidate) = candidate else {
            track_login_failure("unknown_login");
            return Err(AppError::unauthorized("Invalid credentials".to_string()));
        };

        if !verify_password(&dto.password, &candidate.password_hash)? {
            track_login_failure("wrong_password");
            return Err(AppError::unauthorized("Invalid credentials".to_string()));
        }

        if !candidate.is_active {
            track_login_failure("inactive");
            return Err(AppError::forbidden("Account is deactivated".to_string()));
        }

        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(candidate.id)
            .execute(db)
            .await?;

        let profile = UserService::find_profile(db, candidate.id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid credentials".to_string()))?;

        track_login_success(candidate.role);
        info!(user_id = %candidate.id, role = %candidate.role, "User logged in");

        Self::issue_tokens(profile, jwt_config)
    }

    #[instrument(skip_all)]
    pub async fn refresh(
        db: &PgPool,
        jwt_config: &JwtConfig,
        refresh_token: &str,
    ) -> Result<LoginResponse, AppError> {
        let claims = verify_refresh_token(refresh_token, jwt_config)?;

        let profile = UserService::find_profile(db, claims.sub)
            .await?
            .filter(|profile| profile.is_active)
            .ok_or_else(|| AppError::unauthorized("Account is no longer active".to_string()))?;

        Self::issue_tokens(profile, jwt_config)
    }

    #[instrument(skip(db))]
    pub async fn me(db: &PgPool, user_id: UserId) -> Result<AccountProfile, AppError> {
        UserService::find_profile(db, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    #[instrument(skip(db, dto))]
    pub async fn change_password(
        db: &PgPool,
        user_id: UserId,
        dto: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        let password_hash =
            sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(db)
                .await?
                .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;

        if !verify_password(&dto.current_password, &password_hash)? {
            return Err(AppError::unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }

        if dto.current_password == dto.new_password {
            return Err(AppError::unprocessable(anyhow!(
                "New password must differ from the current password"
            )));
        }

        let new_hash = hash_password(&dto.new_password)?;
        sqlx::query(
            "UPDATE users SET password_hash = $2, must_change_password = false WHERE id = $1",
        )
        .bind(user_id)
        .bind(&new_hash)
        .execute(db)
        .await?;

        info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Resets and mails a temporary password when an active account uses
    /// `email`. Does nothing while SMTP is disabled, since nobody could
    /// receive the new password.
    #[instrument(skip(db, email_config, email))]
    pub async fn forgot_password(
        db: &PgPool,
        email_config: &EmailConfig,
        email: &Email,
    ) -> Result<(), AppError> {
        if !email_config.enabled {
            info!("Password reset requested while email delivery is disabled");
            return Ok(());
        }

        #[derive(sqlx::FromRow)]
        struct ResetTarget {
            id: UserId,
            username: String,
            first_name: String,
            last_name: String,
        }

        let target = sqlx::query_as::<_, ResetTarget>(
            r#"
            SELECT u.id, u.username, p.first_name, p.last_name
            FROM users u
            JOIN people p ON p.id = u.person_id
            WHERE p.email = $1 AND u.is_active
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;

        let Some(target) = target else {
            return Ok(());
        };

        // The new hash stays uncommitted until the mail is out; a failed
        // send must leave the current password working.
        let mut tx = db.begin().await?;
        let temporary_password =
            UserService::assign_temporary_password(&mut tx, target.id).await?;
        let full_name = format!("{} {}", target.first_name, target.last_name);
        let sent = deliver_password_reset(
            email_config,
            email.as_str(),
            &full_name,
            &target.username,
            &temporary_password,
        )
        .await;

        if sent {
            tx.commit().await?;
            info!(user_id = %target.id, "Temporary password mailed");
        } else {
            tx.rollback().await?;
            warn!(user_id = %target.id, "Password reset rolled back after failed delivery");
        }

        Ok(())
    }
}

//! System administrator bootstrap.

use escola_core::hash_password;
use escola_models::UserRole;
use escola_models::ids::{PersonId, UserId};
use sqlx::PgPool;

pub struct SystemAdminInput<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

/// Suggested username: the local part of the email, lowercased.
pub fn default_username(email: &str) -> String {
    email
        .split('@')
        .next()
        .unwrap_or(email)
        .trim()
        .to_lowercase()
}

/// Creates the person and a `system_admin` account without a school.
///
/// The account does not have to change its password on first login.
pub async fn create_system_admin(
    db: &PgPool,
    input: &SystemAdminInput<'_>,
) -> Result<UserId, Box<dyn std::error::Error>> {
    let email = input.email.trim().to_lowercase();
    let username = input.username.trim().to_lowercase();
    if username.is_empty() || username.len() > 50 {
        return Err("Username must be between 1 and 50 characters".into());
    }
    if input.password.len() < 8 {
        return Err("Password must be at least 8 characters".into());
    }

    let password_hash =
        hash_password(input.password).map_err(|e| format!("Failed to hash password: {}", e.error))?;

    let mut tx = db.begin().await?;

    let person_id = sqlx::query_scalar::<_, PersonId>(
        "INSERT INTO people (first_name, last_name, email)
         VALUES ($1, $2, $3)
         ON CONFLICT (email) DO NOTHING
         RETURNING id",
    )
    .bind(input.first_name.trim())
    .bind(input.last_name.trim())
    .bind(&email)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(person_id) = person_id else {
        tx.rollback().await?;
        return Err("A person with this email already exists".into());
    };

    let user_id = sqlx::query_scalar::<_, UserId>(
        "INSERT INTO users (person_id, username, password_hash, role, school_id, must_change_password)
         VALUES ($1, $2, $3, $4, NULL, FALSE)
         ON CONFLICT (username) DO NOTHING
         RETURNING id",
    )
    .bind(person_id)
    .bind(&username)
    .bind(&password_hash)
    .bind(UserRole::SystemAdmin)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(user_id) = user_id else {
        tx.rollback().await?;
        return Err(format!("Username '{username}' is already taken").into());
    };

    tx.commit().await?;
    Ok(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_username_uses_local_part() {
        assert_eq!(default_username("Maria.Souza@Escola.br"), "maria.souza");
        assert_eq!(default_username("root"), "root");
    }
}

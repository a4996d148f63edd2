//! Account on-boarding for newly registered people.
//!
//! Every person-backed resource gets a login account when it is created. The
//! username is derived from the person's name and made unique with a numeric
//! suffix; the password is random and must be changed on first login.
//! Credentials are mailed when SMTP is enabled and otherwise handed back in
//! the API response.

use std::collections::HashSet;

use anyhow::anyhow;
use escola_config::EmailConfig;
use escola_core::{AppError, hash_password};
use escola_models::UserRole;
use escola_models::ids::{PersonId, SchoolId, UserId};
use escola_models::people::AccountCredentials;
use rand::Rng;
use rand::seq::SliceRandom;
use sqlx::PgConnection;
use tracing::{instrument, warn};

use crate::metrics::{track_account_created, track_credentials_email};
use crate::utils::email::EmailService;

pub const MAX_USERNAME_LEN: usize = 30;
pub const TEMPORARY_PASSWORD_LEN: usize = 12;

// No 0/O, 1/l/I.
const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const DIGITS: &[u8] = b"23456789";

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

fn slug(word: &str) -> String {
    word.chars()
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// `first.last` from the first word of the first name and the last word of
/// the last name, e.g. "José Carlos" / "da Silva Araújo" → `jose.araujo`.
pub fn derive_username(first_name: &str, last_name: &str) -> String {
    let first = first_name.split_whitespace().next().map(slug).unwrap_or_default();
    let last = last_name.split_whitespace().last().map(slug).unwrap_or_default();

    let mut username = match (first.is_empty(), last.is_empty()) {
        (false, false) => format!("{first}.{last}"),
        (false, true) => first,
        (true, false) => last,
        (true, true) => return "user".to_string(),
    };

    username.truncate(MAX_USERNAME_LEN);
    username.trim_end_matches('.').to_string()
}

/// `base` when free, otherwise `base` followed by the smallest free suffix
/// starting at 2.
pub fn next_available_username(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }

    (2u32..)
        .map(|n| format!("{base}{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Postgres regex matching `base` and every numbered variant of it.
fn taken_pattern(base: &str) -> String {
    format!("^{}[0-9]*$", base.replace('.', "\\."))
}

pub fn generate_temporary_password() -> String {
    let mut rng = rand::thread_rng();
    let alphabet: Vec<u8> = [UPPER, LOWER, DIGITS].concat();

    let mut chars: Vec<u8> = vec![
        UPPER[rng.gen_range(0..UPPER.len())],
        LOWER[rng.gen_range(0..LOWER.len())],
        DIGITS[rng.gen_range(0..DIGITS.len())],
    ];
    while chars.len() < TEMPORARY_PASSWORD_LEN {
        chars.push(alphabet[rng.gen_range(0..alphabet.len())]);
    }
    chars.shuffle(&mut rng);

    chars.into_iter().map(char::from).collect()
}

/// A freshly created account together with its plain temporary password.
#[derive(Debug)]
pub struct ProvisionedAccount {
    pub user_id: UserId,
    pub username: String,
    pub role: UserRole,
    pub temporary_password: String,
}

#[instrument(skip(conn))]
async fn unique_username(
    conn: &mut PgConnection,
    first_name: &str,
    last_name: &str,
) -> Result<String, AppError> {
    let base = derive_username(first_name, last_name);
    let taken: HashSet<String> =
        sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE username ~ $1")
            .bind(taken_pattern(&base))
            .fetch_all(conn)
            .await?
            .into_iter()
            .collect();

    Ok(next_available_username(&base, &taken))
}

/// Creates the `users` row for `person_id` inside the caller's transaction.
#[instrument(skip(conn))]
pub async fn provision_account(
    conn: &mut PgConnection,
    person_id: PersonId,
    first_name: &str,
    last_name: &str,
    role: UserRole,
    school_id: Option<SchoolId>,
) -> Result<ProvisionedAccount, AppError> {
    let username = unique_username(&mut *conn, first_name, last_name).await?;
    let temporary_password = generate_temporary_password();
    let password_hash = hash_password(&temporary_password)?;

    let user_id = sqlx::query_scalar::<_, UserId>(
        r#"
        INSERT INTO users (person_id, username, password_hash, role, school_id, must_change_password)
        VALUES ($1, $2, $3, $4, $5, true)
        RETURNING id
        "#,
    )
    .bind(person_id)
    .bind(&username)
    .bind(&password_hash)
    .bind(role)
    .bind(school_id)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        if escola_db::is_unique_violation(&e) {
            AppError::conflict(anyhow!("Could not reserve a username, please retry"))
        } else {
            AppError::database(e)
        }
    })?;

    track_account_created(role);

    Ok(ProvisionedAccount {
        user_id,
        username,
        role,
        temporary_password,
    })
}

/// Mails the credentials when SMTP is enabled. Delivery failures are logged
/// and reported as `credentials_emailed: false`; the temporary password is
/// then returned to the caller instead.
#[instrument(skip(email_config, account), fields(username = %account.username))]
pub async fn deliver_credentials(
    email_config: &EmailConfig,
    account: ProvisionedAccount,
    to_email: &str,
    to_name: &str,
) -> AccountCredentials {
    let emailed = if email_config.enabled {
        let service = EmailService::new(email_config.clone());
        match service
            .send_credentials_email(to_email, to_name, &account.username, &account.temporary_password)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e.error, "Failed to send credentials email");
                false
            }
        }
    } else {
        false
    };

    if email_config.enabled {
        track_credentials_email(emailed);
    }

    AccountCredentials {
        user_id: account.user_id,
        username: account.username,
        role: account.role,
        credentials_emailed: emailed,
        temporary_password: (!emailed).then_some(account.temporary_password),
    }
}

/// Mails a reset temporary password. Returns whether it was sent.
#[instrument(skip(email_config, temporary_password))]
pub async fn deliver_password_reset(
    email_config: &EmailConfig,
    to_email: &str,
    to_name: &str,
    username: &str,
    temporary_password: &str,
) -> bool {
    if !email_config.enabled {
        return false;
    }

    let service = EmailService::new(email_config.clone());
    let sent = match service
        .send_password_reset_email(to_email, to_name, username, temporary_password)
        .await
    {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e.error, "Failed to send password reset email");
            false
        }
    };
    track_credentials_email(sent);
    sent
}

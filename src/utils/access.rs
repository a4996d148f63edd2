//! Tenant scoping and school membership.
//!
//! Every token except a system administrator's carries a `school_id`. Scoped
//! creation and listing always use that school; system administrators have to
//! name one explicitly. Lookups by id are unscoped for system administrators
//! and restricted to the caller's school for everyone else.

use anyhow::anyhow;
use escola_core::AppError;
use escola_models::ids::{PersonId, SchoolId, UserId};
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;
use utoipa::ToSchema;

use crate::middleware::auth::AuthUser;

fn own_school(auth_user: &AuthUser) -> Result<SchoolId, AppError> {
    auth_user
        .school_id()
        .ok_or_else(|| AppError::forbidden("User is not assigned to a school".to_string()))
}

/// School for creating or listing school-owned rows.
///
/// System administrators must pass `requested`; for everyone else it is
/// ignored and their own school is used.
pub fn school_for_scoped_operation(
    auth_user: &AuthUser,
    requested: Option<SchoolId>,
) -> Result<SchoolId, AppError> {
    if auth_user.is_system_admin() {
        requested.ok_or_else(|| {
            AppError::bad_request(anyhow!("System admin must specify school_id"))
        })
    } else {
        own_school(auth_user)
    }
}

/// Like [`school_for_scoped_operation`], but lets system administrators list
/// across every school when they do not filter.
pub fn school_filter(
    auth_user: &AuthUser,
    requested: Option<SchoolId>,
) -> Result<Option<SchoolId>, AppError> {
    if auth_user.is_system_admin() {
        Ok(requested)
    } else {
        own_school(auth_user).map(Some)
    }
}

/// Scope applied to lookups by id: `None` means unrestricted.
pub fn resource_scope(auth_user: &AuthUser) -> Result<Option<SchoolId>, AppError> {
    school_filter(auth_user, None)
}

/// How a person belongs to a school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    Staff,
    Teacher,
    Student,
    Guardian,
}

async fn exists_in(
    db: &PgPool,
    table: &'static str,
    person_id: PersonId,
    school_id: SchoolId,
) -> Result<bool, AppError> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {table} WHERE person_id = $1 AND school_id = $2)"
    );
    sqlx::query_scalar::<_, bool>(&sql)
        .bind(person_id)
        .bind(school_id)
        .fetch_one(db)
        .await
        .map_err(AppError::database)
}

/// First record tying `person_id` to `school_id`, checked in the order
/// staff, teacher, student, guardian.
#[instrument(skip(db))]
pub async fn membership_in_school(
    db: &PgPool,
    person_id: PersonId,
    school_id: SchoolId,
) -> Result<Option<Membership>, AppError> {
    const CHECKS: [(&str, Membership); 4] = [
        ("staff", Membership::Staff),
        ("teachers", Membership::Teacher),
        ("students", Membership::Student),
        ("guardians", Membership::Guardian),
    ];

    for (table, membership) in CHECKS {
        if exists_in(db, table, person_id, school_id).await? {
            return Ok(Some(membership));
        }
    }

    Ok(None)
}

/// Fails with 404 when `school_id` names no school. System administrators
/// pick the school of new rows themselves, so it may be made up.
#[instrument(skip(db))]
pub async fn ensure_school_exists(db: &PgPool, school_id: SchoolId) -> Result<(), AppError> {
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM schools WHERE id = $1)")
            .bind(school_id)
            .fetch_one(db)
            .await?;
    if !exists {
        return Err(AppError::not_found(anyhow!("School not found")));
    }
    Ok(())
}

pub async fn person_id_of_user(db: &PgPool, user_id: UserId) -> Result<PersonId, AppError> {
    sqlx::query_scalar::<_, PersonId>("SELECT person_id FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::unauthorized("Account no longer exists".to_string()))
}

/// Fails with 403 unless the caller is a system administrator or a member of
/// `school_id`.
#[instrument(skip(db, auth_user), fields(user_id = %auth_user.user_id()))]
pub async fn ensure_school_member(
    db: &PgPool,
    auth_user: &AuthUser,
    school_id: SchoolId,
) -> Result<(), AppError> {
    if auth_user.is_system_admin() {
        return Ok(());
    }

    let person_id = person_id_of_user(db, auth_user.user_id()).await?;
    match membership_in_school(db, person_id, school_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::forbidden(
            "You are not a member of this school".to_string(),
        )),
    }
}

use anyhow::anyhow;
use escola_core::AppError;
use escola_models::ids::{PersonId, SchoolId};
use escola_models::people::{PersonInput, PersonUpdate};
use sqlx::{PgConnection, PgPool};
use tracing::instrument;
use uuid::Uuid;

/// Maps unique violations on `people` to a 409 naming the field.
pub(crate) fn person_write_error(err: sqlx::Error) -> AppError {
    match escola_db::violated_constraint(&err) {
        Some("people_email_key") => AppError::conflict(anyhow!("Email is already in use")),
        Some("people_document_key") => {
            AppError::conflict(anyhow!("Document is already registered"))
        }
        _ => AppError::database(err),
    }
}

pub struct PersonService;

impl PersonService {
    #[instrument(skip(conn, input))]
    pub async fn insert(conn: &mut PgConnection, input: &PersonInput) -> Result<PersonId, AppError> {
        sqlx::query_scalar::<_, PersonId>(
            r#"
            INSERT INTO people (first_name, last_name, email, phone, document, birth_date, address)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.document)
        .bind(input.birth_date)
        .bind(&input.address)
        .fetch_one(conn)
        .await
        .map_err(person_write_error)
    }

    /// Applies the present fields of `update`; absent fields are left alone.
    #[instrument(skip(conn, update))]
    pub async fn update(
        conn: &mut PgConnection,
        person_id: PersonId,
        update: &PersonUpdate,
    ) -> Result<(), AppError> {
        if update.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            UPDATE people
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                document = COALESCE($6, document),
                birth_date = COALESCE($7, birth_date),
                address = COALESCE($8, address)
            WHERE id = $1
            "#,
        )
        .bind(person_id)
        .bind(update.first_name.as_deref().map(str::trim))
        .bind(update.last_name.as_deref().map(str::trim))
        .bind(&update.email)
        .bind(&update.phone)
        .bind(&update.document)
        .bind(update.birth_date)
        .bind(&update.address)
        .execute(conn)
        .await
        .map_err(person_write_error)?;

        Ok(())
    }

    /// Person behind row `id` of a role table (`students`, `teachers`,
    /// `staff`, `guardians`), restricted to `scope` when set.
    #[instrument(skip(conn))]
    pub async fn owned_person(
        conn: &mut PgConnection,
        table: &'static str,
        id: Uuid,
        scope: Option<SchoolId>,
    ) -> Result<Option<PersonId>, AppError> {
        let sql = format!(
            "SELECT person_id FROM {table} WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)"
        );
        let person_id = sqlx::query_scalar::<_, PersonId>(&sql)
            .bind(id)
            .bind(scope)
            .fetch_optional(conn)
            .await?;
        Ok(person_id)
    }

    /// Deleting the person cascades to its role record and account.
    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, person_id: PersonId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM people WHERE id = $1")
            .bind(person_id)
            .execute(db)
            .await?;
        Ok(())
    }
}

use anyhow::anyhow;
use escola_core::{AppError, PaginationMeta};
use escola_models::feedback::{
    CreateFeedbackDto, Feedback, FeedbackFilterParams, FeedbackStatus, PaginatedFeedbackResponse,
};
use escola_models::ids::{FeedbackId, SchoolId, UserId};
use sqlx::PgPool;
use tracing::{info, instrument};

const FEEDBACK_SELECT: &str = r#"
    SELECT f.id, f.school_id, f.author_id, u.username AS author_username,
           f.subject, f.message, f.rating, f.status, f.created_at, f.updated_at
    FROM feedback f
    JOIN users u ON u.id = f.author_id
"#;

const FILTER: &str = r#"
    WHERE ($1::uuid IS NULL OR f.school_id = $1)
      AND ($2::uuid IS NULL OR f.author_id = $2)
      AND ($3::feedback_status IS NULL OR f.status = $3)
"#;

fn not_found() -> AppError {
    AppError::not_found(anyhow!("Feedback not found"))
}

pub struct FeedbackService;

impl FeedbackService {
    #[instrument(skip(db, dto))]
    pub async fn create_feedback(
        db: &PgPool,
        author_id: UserId,
        school_id: SchoolId,
        dto: CreateFeedbackDto,
    ) -> Result<Feedback, AppError> {
        let feedback_id = sqlx::query_scalar::<_, FeedbackId>(
            r#"INSERT INTO feedback (school_id, author_id, subject, message, rating)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id"#,
        )
        .bind(school_id)
        .bind(author_id)
        .bind(dto.subject.trim())
        .bind(dto.message.trim())
        .bind(dto.rating)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if escola_db::is_foreign_key_violation(&e) {
                AppError::not_found(anyhow!("School not found"))
            } else {
                AppError::database(e)
            }
        })?;

        info!(feedback.id = %feedback_id, school.id = %school_id, "Feedback submitted");
        Self::get_feedback(db, feedback_id, None).await
    }

    /// Lists feedback, optionally restricted to one school and one author.
    #[instrument(skip(db))]
    pub async fn list_feedback(
        db: &PgPool,
        school_id: Option<SchoolId>,
        author_id: Option<UserId>,
        filters: FeedbackFilterParams,
    ) -> Result<PaginatedFeedbackResponse, AppError> {
        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM feedback f {FILTER}"))
            .bind(school_id)
            .bind(author_id)
            .bind(filters.status)
            .fetch_one(db)
            .await?;

        let sql = format!("{FEEDBACK_SELECT} {FILTER} ORDER BY f.created_at DESC LIMIT $4 OFFSET $5");
        let feedback = sqlx::query_as::<_, Feedback>(&sql)
            .bind(school_id)
            .bind(author_id)
            .bind(filters.status)
            .bind(filters.pagination.limit())
            .bind(filters.pagination.offset())
            .fetch_all(db)
            .await?;

        Ok(PaginatedFeedbackResponse {
            data: feedback,
            meta: PaginationMeta::from_params(total, &filters.pagination),
        })
    }

    #[instrument(skip(db))]
    pub async fn get_feedback(
        db: &PgPool,
        feedback_id: FeedbackId,
        scope: Option<SchoolId>,
    ) -> Result<Feedback, AppError> {
        let sql =
            format!("{FEEDBACK_SELECT} WHERE f.id = $1 AND ($2::uuid IS NULL OR f.school_id = $2)");
        sqlx::query_as::<_, Feedback>(&sql)
            .bind(feedback_id)
            .bind(scope)
            .fetch_optional(db)
            .await?
            .ok_or_else(not_found)
    }

    #[instrument(skip(db))]
    pub async fn update_status(
        db: &PgPool,
        feedback_id: FeedbackId,
        scope: Option<SchoolId>,
        status: FeedbackStatus,
    ) -> Result<Feedback, AppError> {
        let result = sqlx::query(
            "UPDATE feedback SET status = $3 WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)",
        )
        .bind(feedback_id)
        .bind(scope)
        .bind(status)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found());
        }

        Self::get_feedback(db, feedback_id, None).await
    }

    #[instrument(skip(db))]
    pub async fn delete_feedback(
        db: &PgPool,
        feedback_id: FeedbackId,
        scope: Option<SchoolId>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM feedback WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)",
        )
        .bind(feedback_id)
        .bind(scope)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found());
        }
        Ok(())
    }
}

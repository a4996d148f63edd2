//! Feedback submitted by school members.

use chrono::{DateTime, Utc};
use escola_core::{PaginationMeta, PaginationParams};
use escola_core::serde::deserialize_optional_id;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{FeedbackId, SchoolId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "feedback_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    Open,
    Acknowledged,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Feedback {
    pub id: FeedbackId,
    pub school_id: SchoolId,
    pub author_id: UserId,
    pub author_username: String,
    pub subject: String,
    pub message: String,
    pub rating: Option<i32>,
    pub status: FeedbackStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFeedbackDto {
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(length(min = 1, max = 5000))]
    pub message: String,
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i32>,
    /// Required for system admins
    pub school_id: Option<SchoolId>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateFeedbackStatusDto {
    pub status: FeedbackStatus,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct FeedbackFilterParams {
    pub status: Option<FeedbackStatus>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub school_id: Option<SchoolId>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedFeedbackResponse {
    pub data: Vec<Feedback>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(subject: &str, message: &str, rating: Option<i32>) -> CreateFeedbackDto {
        CreateFeedbackDto {
            subject: subject.into(),
            message: message.into(),
            rating,
            school_id: None,
        }
    }

    #[test]
    fn test_rating_bounds() {
        assert!(dto("Cantina", "Mais opções", Some(1)).validate().is_ok());
        assert!(dto("Cantina", "Mais opções", Some(5)).validate().is_ok());
        assert!(dto("Cantina", "Mais opções", Some(0)).validate().is_err());
        assert!(dto("Cantina", "Mais opções", Some(6)).validate().is_err());
        assert!(dto("Cantina", "Mais opções", None).validate().is_ok());
    }

    #[test]
    fn test_subject_and_message_lengths() {
        assert!(dto("", "x", None).validate().is_err());
        assert!(dto(&"s".repeat(201), "x", None).validate().is_err());
        assert!(dto("ok", &"m".repeat(5001), None).validate().is_err());
    }
}

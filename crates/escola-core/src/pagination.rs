//! Pagination primitives shared by every list endpoint.
//!
//! Clients may page with `limit` + `offset` or with `limit` + `page`. When
//! both `page` and `offset` are sent, `page` wins. Limits are clamped to
//! `[1, 100]` and default to 10.
//!
//! ```ignore
//! let params = PaginationParams { limit: Some(20), offset: None, page: Some(3) };
//! assert_eq!(params.offset(), 40);
//!
//! let meta = PaginationMeta::from_params(total, &params);
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Query strings carry numbers as text and empty values (`?limit=`) must
/// behave like an absent parameter.
fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Metadata attached to every paginated response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Total number of matching rows
    pub total: i64,
    /// Limit that was applied
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    /// Whether rows exist past this page
    pub has_more: bool,
}

impl PaginationMeta {
    /// Builds the metadata for a page described by `params` out of `total` rows.
    pub fn from_params(total: i64, params: &PaginationParams) -> Self {
        let limit = params.limit();
        let offset = params.offset();

        Self {
            total,
            limit,
            offset: Some(offset),
            page: params.page(),
            has_more: offset.saturating_add(limit) < total,
        }
    }
}

/// `limit` / `offset` / `page` query parameters.
#[derive(Debug, Clone, Default, Hash, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Maximum number of items to return (1-100, default: 10)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
    /// Number of items to skip (ignored when `page` is set)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub offset: Option<i64>,
    /// Page number, 1-indexed
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
}

impl PaginationParams {
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        match self.page {
            Some(page) => (page.max(1) - 1).saturating_mul(self.limit()),
            None => self.offset.unwrap_or(0).max(0),
        }
    }

    #[must_use]
    pub fn page(&self) -> Option<i64> {
        self.page.map(|p| p.max(1))
    }
}

//! Person records and the fields every person-backed resource shares.
//!
//! Students, teachers, staff, and guardians each own exactly one row in
//! `people`; their create and update DTOs embed [`PersonInput`] /
//! [`PersonUpdate`] with `#[serde(flatten)]`, so the JSON bodies stay flat.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::ids::{PersonId, UserId};
use crate::roles::UserRole;
use crate::value_types::{Email, PhoneNumber};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Person {
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: Option<PhoneNumber>,
    pub document: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) fn validate_birth_date(date: &NaiveDate) -> Result<(), ValidationError> {
    if *date > Utc::now().date_naive() {
        let mut err = ValidationError::new("birth_date");
        err.message = Some("birth date cannot be in the future".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PersonInput {
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Ana")]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Souza")]
    pub last_name: String,
    pub email: Email,
    pub phone: Option<PhoneNumber>,
    /// National ID or similar; unique when present
    #[validate(length(min = 5, max = 20))]
    pub document: Option<String>,
    #[validate(custom(function = "validate_birth_date"))]
    pub birth_date: Option<NaiveDate>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct PersonUpdate {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    pub email: Option<Email>,
    pub phone: Option<PhoneNumber>,
    #[validate(length(min = 5, max = 20))]
    pub document: Option<String>,
    #[validate(custom(function = "validate_birth_date"))]
    pub birth_date: Option<NaiveDate>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
}

impl PersonUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.document.is_none()
            && self.birth_date.is_none()
            && self.address.is_none()
    }
}

/// The login account created alongside a person.
///
/// `temporary_password` is only present when the credentials could not be
/// emailed; the caller is then responsible for handing them over.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountCredentials {
    pub user_id: UserId,
    pub username: String,
    pub role: UserRole,
    pub credentials_emailed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporary_password: Option<String>,
}

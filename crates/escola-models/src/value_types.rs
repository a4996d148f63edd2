//! Validated string values.
//!
//! [`Email`] and [`PhoneNumber`] validate when parsed or deserialized, so a
//! request body carrying a malformed address never reaches a service.
//! Values read back from the database are trusted.

use serde::{Deserialize, Serialize};
use sqlx::{
    Database, Decode, Encode, Type,
    postgres::{PgHasArrayType, PgTypeInfo},
};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidateEmail;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueTypeError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),
    #[error("Invalid phone number: {0}")]
    InvalidPhoneNumber(String),
}

/// Implements display, parsing, and text-column mapping for a `String` newtype
/// whose `new` constructor validates.
macro_rules! text_value {
    ($name:ident) => {
        impl $name {
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            #[inline]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValueTypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.0
            }
        }

        impl Type<sqlx::Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <String as Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <String as Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'q> Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <String as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }

        impl<'r> Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: <sqlx::Postgres as Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                <String as Decode<'r, sqlx::Postgres>>::decode(value).map(Self)
            }
        }

        impl PgHasArrayType for $name {
            fn array_type_info() -> PgTypeInfo {
                <String as PgHasArrayType>::array_type_info()
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::new(s).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// An email address, trimmed and lowercased.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[schema(value_type = String, format = "email", example = "ana.souza@escola.io")]
pub struct Email(String);

impl Email {
    pub fn new(email: impl Into<String>) -> Result<Self, ValueTypeError> {
        let email = email.into().trim().to_lowercase();
        if email.is_empty() {
            return Err(ValueTypeError::InvalidEmail("email cannot be empty".into()));
        }
        if !email.validate_email() {
            return Err(ValueTypeError::InvalidEmail(format!(
                "'{email}' is not a valid email address"
            )));
        }
        Ok(Self(email))
    }

    pub fn domain(&self) -> &str {
        self.0.split('@').nth(1).unwrap_or("")
    }
}

text_value!(Email);

/// A phone number: digits with optional `+`, spaces, dashes, and parentheses,
/// 7 to 15 digits in total.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[schema(value_type = String, example = "+55 11 98765-4321")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    const MIN_DIGITS: usize = 7;
    const MAX_DIGITS: usize = 15;

    pub fn new(phone: impl Into<String>) -> Result<Self, ValueTypeError> {
        let phone = phone.into().trim().to_string();
        if phone.is_empty() {
            return Err(ValueTypeError::InvalidPhoneNumber(
                "phone number cannot be empty".into(),
            ));
        }

        let allowed = |c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' ');
        if !phone.chars().all(allowed) {
            return Err(ValueTypeError::InvalidPhoneNumber(format!(
                "'{phone}' contains invalid characters"
            )));
        }
        if phone.chars().skip(1).any(|c| c == '+') {
            return Err(ValueTypeError::InvalidPhoneNumber(
                "+ can only appear at the start".into(),
            ));
        }

        let digits = phone.chars().filter(char::is_ascii_digit).count();
        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits) {
            return Err(ValueTypeError::InvalidPhoneNumber(format!(
                "phone number must have between {} and {} digits, got {digits}",
                Self::MIN_DIGITS,
                Self::MAX_DIGITS
            )));
        }

        Ok(Self(phone))
    }

    pub fn digits_only(&self) -> String {
        self.0.chars().filter(char::is_ascii_digit).collect()
    }
}

text_value!(PhoneNumber);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_normalized() {
        let email = Email::new("  Ana.Souza@Escola.IO ").unwrap();
        assert_eq!(email.as_str(), "ana.souza@escola.io");
        assert_eq!(email.domain(), "escola.io");
    }

    #[test]
    fn test_invalid_emails() {
        for bad in ["", "   ", "ana", "ana@", "@escola.io"] {
            assert!(Email::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_email_deserialize_validates() {
        assert!(serde_json::from_str::<Email>(r#""ana@escola.io""#).is_ok());
        let err = serde_json::from_str::<Email>(r#""nope""#).unwrap_err();
        assert!(err.to_string().contains("Invalid email"));
    }

    #[test]
    fn test_phone_accepts_formatted_numbers() {
        let phone = PhoneNumber::new("+55 (11) 98765-4321").unwrap();
        assert_eq!(phone.digits_only(), "5511987654321");
    }

    #[test]
    fn test_phone_digit_bounds() {
        assert!(PhoneNumber::new("123456").is_err());
        assert!(PhoneNumber::new("1234567").is_ok());
        assert!(PhoneNumber::new("1234567890123456").is_err());
    }

    #[test]
    fn test_phone_rejects_letters_and_inner_plus() {
        assert!(PhoneNumber::new("555-CALL-NOW").is_err());
        assert!(PhoneNumber::new("55+11987654321").is_err());
    }
}

//! Typed identifiers.
//!
//! Each table gets its own `Uuid` newtype so a `StudentId` can never be
//! bound where a `PersonId` is expected, even though both are UUIDs in
//! PostgreSQL.
//!
//! ```ignore
//! use escola_models::ids::{ClassId, StudentId};
//!
//! fn enroll(student: StudentId, class: ClassId) { /* ... */ }
//! ```

use serde::{Deserialize, Serialize};
use sqlx::{
    Database, Decode, Encode, Type,
    postgres::{PgHasArrayType, PgTypeInfo},
};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
        #[schema(value_type = String, format = "uuid")]
        pub struct $name(pub Uuid);

        impl $name {
            #[inline]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[inline]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            #[inline]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            #[inline]
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            #[inline]
            fn from(id: $name) -> Uuid {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl Type<sqlx::Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <Uuid as Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <Uuid as Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'q> Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <Uuid as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }

        impl<'r> Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: <sqlx::Postgres as Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                <Uuid as Decode<'r, sqlx::Postgres>>::decode(value).map(Self)
            }
        }

        impl PgHasArrayType for $name {
            fn array_type_info() -> PgTypeInfo {
                <Uuid as PgHasArrayType>::array_type_info()
            }
        }

        // Transparent, so path segments and query values parse as plain UUIDs.
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                Uuid::deserialize(deserializer).map(Self)
            }
        }
    };
}

define_id!(
    /// A school (tenant).
    SchoolId
);
define_id!(
    /// A row in `people`, shared by every person-backed role.
    PersonId
);
define_id!(
    /// A login account.
    UserId
);
define_id!(StudentId);
define_id!(TeacherId);
define_id!(StaffId);
define_id!(GuardianId);
define_id!(AcademicYearId);
define_id!(CourseId);
define_id!(ClassId);
define_id!(EnrollmentId);
define_id!(FeedbackId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_random() {
        assert_ne!(StudentId::new(), StudentId::new());
    }

    #[test]
    fn test_debug_names_the_type() {
        let id = ClassId::from_uuid(Uuid::from_u128(0x1234));
        assert!(format!("{id:?}").starts_with("ClassId("));
    }

    #[test]
    fn test_display_is_bare_uuid() {
        let uuid = Uuid::from_u128(0x12345678_1234_1234_1234_123456789abc);
        assert_eq!(
            SchoolId::from(uuid).to_string(),
            "12345678-1234-1234-1234-123456789abc"
        );
    }

    #[test]
    fn test_parse() {
        let id: EnrollmentId = "12345678-1234-1234-1234-123456789abc".parse().unwrap();
        assert_eq!(
            Uuid::from(id),
            Uuid::from_u128(0x12345678_1234_1234_1234_123456789abc)
        );
        assert!("not-a-uuid".parse::<EnrollmentId>().is_err());
    }

    #[test]
    fn test_json_is_transparent() {
        let id = PersonId::from_uuid(Uuid::from_u128(1));
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", Uuid::from_u128(1)));
        let back: PersonId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}

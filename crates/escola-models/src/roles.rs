//! Account roles.
//!
//! Roles are a fixed PostgreSQL enum. Handlers authorize against role
//! groups ([`UserRole::is_school_admin`], [`UserRole::is_office`], ...)
//! rather than single roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Global administrator with no school
    SystemAdmin,
    /// Manages a single school
    SchoolAdmin,
    /// Secretariat / office staff
    Staff,
    Teacher,
    Student,
    Guardian,
}

impl UserRole {
    pub const ALL: [UserRole; 6] = [
        UserRole::SystemAdmin,
        UserRole::SchoolAdmin,
        UserRole::Staff,
        UserRole::Teacher,
        UserRole::Student,
        UserRole::Guardian,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::SystemAdmin => "system_admin",
            UserRole::SchoolAdmin => "school_admin",
            UserRole::Staff => "staff",
            UserRole::Teacher => "teacher",
            UserRole::Student => "student",
            UserRole::Guardian => "guardian",
        }
    }

    pub fn is_system_admin(&self) -> bool {
        matches!(self, UserRole::SystemAdmin)
    }

    /// System or school administrator.
    pub fn is_school_admin(&self) -> bool {
        matches!(self, UserRole::SystemAdmin | UserRole::SchoolAdmin)
    }

    /// Administrators and secretariat staff.
    pub fn is_office(&self) -> bool {
        self.is_school_admin() || matches!(self, UserRole::Staff)
    }

    /// Office roles plus teachers.
    pub fn is_faculty(&self) -> bool {
        self.is_office() || matches!(self, UserRole::Teacher)
    }

    /// Every role except the system administrator belongs to a school.
    pub fn requires_school(&self) -> bool {
        !self.is_system_admin()
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown role: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_groups_are_nested() {
        for role in UserRole::ALL {
            if role.is_system_admin() {
                assert!(role.is_school_admin());
            }
            if role.is_school_admin() {
                assert!(role.is_office());
            }
            if role.is_office() {
                assert!(role.is_faculty());
            }
        }
    }

    #[test]
    fn test_group_membership() {
        assert!(UserRole::Staff.is_office());
        assert!(!UserRole::Staff.is_school_admin());
        assert!(UserRole::Teacher.is_faculty());
        assert!(!UserRole::Teacher.is_office());
        assert!(!UserRole::Student.is_faculty());
        assert!(!UserRole::Guardian.is_faculty());
    }

    #[test]
    fn test_only_system_admin_is_schoolless() {
        let schoolless: Vec<_> = UserRole::ALL
            .into_iter()
            .filter(|r| !r.requires_school())
            .collect();
        assert_eq!(schoolless, vec![UserRole::SystemAdmin]);
    }

    #[test]
    fn test_string_forms_agree() {
        for role in UserRole::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert!("principal".parse::<UserRole>().is_err());
    }
}

//! # Escola Models
//!
//! Database rows, request/response DTOs, typed IDs, and validated value
//! types for the Escola API.
//!
//! Person-backed resources (students, teachers, staff, guardians) are
//! returned flat: the role-specific columns sit next to the person columns
//! and the account's `user_id` / `username`.
//!
//! ```ignore
//! use escola_models::ids::StudentId;
//! use escola_models::students::{CreateStudentDto, Student};
//! use escola_models::roles::UserRole;
//!
//! if claims.role.is_office() { /* ... */ }
//! ```

pub mod academic_years;
pub mod auth;
pub mod classes;
pub mod courses;
pub mod enrollments;
pub mod feedback;
pub mod guardians;
pub mod ids;
pub mod people;
pub mod roles;
pub mod schools;
pub mod staff;
pub mod students;
pub mod teachers;
pub mod users;
pub mod value_types;

pub use roles::UserRole;
pub use value_types::{Email, PhoneNumber, ValueTypeError};

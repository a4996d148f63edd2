//! # Escola Core
//!
//! Foundational types shared by every Escola crate:
//!
//! - [`errors`]: the [`AppError`] type and its HTTP response mapping
//! - [`pagination`]: `limit` / `offset` / `page` handling for list endpoints
//! - [`password`]: bcrypt hashing and verification
//! - [`serde`]: lenient deserializers for query-string values
//!
//! ```ignore
//! use escola_core::{AppError, PaginationParams, hash_password};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Course not found"));
//! let hash = hash_password("s3cret-Pass")?;
//! let limit = PaginationParams::default().limit();
//! ```

pub mod errors;
pub mod pagination;
pub mod password;
pub mod serde;

pub use errors::AppError;
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};

//! # Escola Auth
//!
//! JWT claims and token utilities.
//!
//! ```ignore
//! use escola_auth::{create_access_token, verify_token};
//!
//! let token = create_access_token(user_id, "ana.souza", UserRole::Teacher, Some(school_id), &config)?;
//! let claims = verify_token(&token, &config)?;
//! assert!(claims.role.is_faculty());
//! ```

pub mod claims;
pub mod jwt;

pub use claims::{Claims, RefreshTokenClaims};
pub use jwt::{create_access_token, create_refresh_token, verify_refresh_token, verify_token};

//! # Escola Config
//!
//! Configuration structures loaded from environment variables. Every struct
//! has a `from_env()` constructor that falls back to development defaults
//! for anything unset or unparsable.
//!
//! - [`jwt`]: token signing secret and lifetimes
//! - [`email`]: SMTP delivery of account credentials
//! - [`cors`]: allowed browser origins
//! - [`server`]: HTTP and metrics listeners
//! - [`database`]: PostgreSQL connection settings
//!
//! ```ignore
//! use escola_config::{load_dotenv, JwtConfig, EmailConfig};
//!
//! load_dotenv();
//! let jwt_config = JwtConfig::from_env();
//! let email_config = EmailConfig::from_env();
//! ```

pub mod cors;
pub mod database;
pub mod email;
pub mod jwt;
pub mod server;

mod env;

pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use email::EmailConfig;
pub use jwt::JwtConfig;
pub use server::ServerConfig;

/// Loads `.env` when present. A missing file is not an error.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Err(e) if !e.not_found() => tracing::warn!(error = %e, "failed to load .env file"),
        _ => {}
    }
}

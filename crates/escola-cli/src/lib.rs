//! # Escola CLI
//!
//! Administrative tasks that have no HTTP endpoint: bootstrapping the first
//! system administrator and filling a development database with fake data.
//!
//! ```ignore
//! use escola_cli::seeder::{seed_all, SeedConfig};
//!
//! let config = SeedConfig::new(3);
//! seed_all(&pool, &config).await?;
//! ```

pub mod seeder;
pub mod sysadmin;

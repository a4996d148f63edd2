//! # Escola API
//!
//! Multi-tenant school management over HTTP, built on Axum and PostgreSQL.
//! A system administrator creates schools and their administrators; each
//! school then manages its own staff, teachers, students, guardians,
//! academic calendar, courses, classes and enrollments.
//!
//! ```text
//! src/
//! ├── middleware/   # bearer-token extractors and role guards
//! ├── modules/      # one directory per resource: controller, service, router
//! ├── utils/        # tenant scoping, email delivery, SQL helpers
//! ├── docs.rs       # OpenAPI document
//! ├── logging.rs    # tracing setup and request logging
//! ├── metrics.rs    # Prometheus recorder and business counters
//! ├── router.rs     # route tree and global layers
//! ├── state.rs      # shared application state
//! └── validator.rs  # JSON extractor with validation
//! ```
//!
//! Models and DTOs live in `escola-models`; errors and pagination in
//! `escola-core`; tokens in `escola-auth`; configuration in `escola-config`.
//!
//! ## Roles
//!
//! | Role | Scope |
//! |------|-------|
//! | `system_admin` | every school, created from the CLI |
//! | `school_admin` | one school |
//! | `staff` | one school, office work |
//! | `teacher` | one school, read access to classes and students |
//! | `student`, `guardian` | one school, own data and feedback |
//!
//! Every school-scoped account carries its `school_id` in the access token,
//! and services filter by it. System administrators pass `school_id`
//! explicitly where an operation needs one.
//!
//! ## Documentation
//!
//! - Swagger UI: `/swagger-ui`
//! - Scalar: `/scalar`

pub mod docs;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod utils;
pub mod validator;

pub use escola_auth;
pub use escola_config;
pub use escola_core;
pub use escola_db;
pub use escola_models;

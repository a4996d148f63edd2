//! Person records and the accounts created for them.
//!
//! Not routed on its own: the student, teacher, staff, guardian, and user
//! modules call into it.

pub mod onboarding;
pub mod service;

pub use onboarding::{
    ProvisionedAccount, deliver_credentials, deliver_password_reset, generate_temporary_password,
    provision_account,
};
pub use service::PersonService;

use crate::env::{ProcessEnv, Vars};

/// PostgreSQL connection settings.
///
/// `DATABASE_URL` has no default; [`DatabaseConfig::from_env`] returns `None`
/// when it is missing so the binary can fail with a clear message.
#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn from_env() -> Option<Self> {
        Self::from_vars(&ProcessEnv)
    }

    pub(crate) fn from_vars(vars: &impl Vars) -> Option<Self> {
        let url = vars.get("DATABASE_URL").filter(|u| !u.trim().is_empty())?;

        Some(Self {
            url,
            max_connections: vars.parse_or("DATABASE_MAX_CONNECTIONS", 10),
            run_migrations: vars.flag_or("RUN_MIGRATIONS", true),
        })
    }
}

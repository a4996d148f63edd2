use crate::env::{ProcessEnv, Vars};

#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn from_env() -> Self {
        Self::from_vars(&ProcessEnv)
    }

    pub(crate) fn from_vars(vars: &impl Vars) -> Self {
        let allowed_origins = vars
            .string_or("ALLOWED_ORIGINS", "http://localhost:3000,http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self { allowed_origins }
    }
}

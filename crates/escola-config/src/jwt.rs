use crate::env::{ProcessEnv, Vars};

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    /// Seconds
    pub access_token_expiry: i64,
    /// Seconds
    pub refresh_token_expiry: i64,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        Self::from_vars(&ProcessEnv)
    }

    pub(crate) fn from_vars(vars: &impl Vars) -> Self {
        Self {
            secret: vars.string_or("JWT_SECRET", "change-me-in-production"),
            access_token_expiry: vars.parse_or("JWT_ACCESS_EXPIRY", 3600), // 1 hour
            refresh_token_expiry: vars.parse_or("JWT_REFRESH_EXPIRY", 604800), // 7 days
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::fixed;

    #[test]
    fn test_defaults() {
        let config = JwtConfig::from_vars(&fixed(&[]));
        assert_eq!(config.access_token_expiry, 3600);
        assert_eq!(config.refresh_token_expiry, 604800);
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let config = JwtConfig::from_vars(&fixed(&[
            ("JWT_SECRET", "s3cret"),
            ("JWT_ACCESS_EXPIRY", "900"),
            ("JWT_REFRESH_EXPIRY", "a week"),
        ]));
        assert_eq!(config.secret, "s3cret");
        assert_eq!(config.access_token_expiry, 900);
        assert_eq!(config.refresh_token_expiry, 604800);
    }
}

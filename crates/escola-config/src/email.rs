use crate::env::{ProcessEnv, Vars};

/// SMTP settings for credential and password-reset mail.
///
/// Delivery is off unless `SMTP_ENABLED` is set; while it is off, freshly
/// generated passwords are returned in API responses instead of mailed.
#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
    pub frontend_url: String,
}

impl EmailConfig {
    pub fn from_env() -> Self {
        Self::from_vars(&ProcessEnv)
    }

    pub(crate) fn from_vars(vars: &impl Vars) -> Self {
        Self {
            enabled: vars.flag_or("SMTP_ENABLED", false),
            smtp_host: vars.string_or("SMTP_HOST", "localhost"),
            smtp_port: vars.parse_or("SMTP_PORT", 1025),
            smtp_username: vars.string_or("SMTP_USERNAME", ""),
            smtp_password: vars.string_or("SMTP_PASSWORD", ""),
            from_email: vars.string_or("FROM_EMAIL", "noreply@escola.local"),
            from_name: vars.string_or("FROM_NAME", "Escola"),
            frontend_url: vars.string_or("FRONTEND_URL", "http://localhost:5173"),
        }
    }

    /// Disabled mail, for tests and tooling.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::from_vars(&|_: &str| -> Option<String> { None })
        }
    }

    pub fn login_url(&self) -> String {
        format!("{}/login", self.frontend_url.trim_end_matches('/'))
    }

    pub fn has_credentials(&self) -> bool {
        !self.smtp_username.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::fixed;

    #[test]
    fn test_disabled_by_default() {
        let config = EmailConfig::from_vars(&fixed(&[]));
        assert!(!config.enabled);
        assert_eq!(config.smtp_port, 1025);
        assert!(!config.has_credentials());
    }

    #[test]
    fn test_enabled_flag_variants() {
        for value in ["true", "TRUE", "1", "yes"] {
            let config = EmailConfig::from_vars(&fixed(&[("SMTP_ENABLED", value)]));
            assert!(config.enabled, "{value} should enable smtp");
        }
        let config = EmailConfig::from_vars(&fixed(&[("SMTP_ENABLED", "off")]));
        assert!(!config.enabled);
    }

    #[test]
    fn test_login_url_strips_trailing_slash() {
        let config = EmailConfig::from_vars(&fixed(&[("FRONTEND_URL", "https://app.escola.io/")]));
        assert_eq!(config.login_url(), "https://app.escola.io/login");
    }
}

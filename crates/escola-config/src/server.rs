use crate::env::{ProcessEnv, Vars};

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub metrics_port: u16,
    pub observability_enabled: bool,
    pub log_dir: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_vars(&ProcessEnv)
    }

    pub(crate) fn from_vars(vars: &impl Vars) -> Self {
        Self {
            host: vars.string_or("APP_HOST", "0.0.0.0"),
            port: vars.parse_or("APP_PORT", 3000),
            metrics_port: vars.parse_or("METRICS_PORT", 9090),
            observability_enabled: vars.flag_or("OBSERVABILITY_ENABLED", true),
            log_dir: vars.string_or("LOG_DIR", "storage/logs"),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn metrics_address(&self) -> String {
        format!("{}:{}", self.host, self.metrics_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::fixed;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_vars(&fixed(&[]));
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.metrics_address(), "0.0.0.0:9090");
        assert!(config.observability_enabled);
    }

    #[test]
    fn test_observability_can_be_disabled() {
        let config = ServerConfig::from_vars(&fixed(&[
            ("OBSERVABILITY_ENABLED", "false"),
            ("APP_PORT", "8080"),
        ]));
        assert!(!config.observability_enabled);
        assert_eq!(config.port, 8080);
    }
}

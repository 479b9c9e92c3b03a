//! Service configuration from the environment

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub nats_url: Option<String>,
    pub port: u16,
    pub log_filter: String,
    /// Accept pickup-location details on add-to-cart requests.
    pub click_and_collect: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

impl AppConfig {
    /// Load `.env` (if any), then read the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parse from any key lookup, so tests never touch the real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar { var: var.to_string(), reason };

        let database_url = get("DATABASE_URL").ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".into()))?;
        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|e| invalid("DATABASE_MAX_CONNECTIONS", e.to_string()))?,
            None => 10,
        };
        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| invalid("PORT", e.to_string()))?,
            None => 8083,
        };
        let click_and_collect = match get("ENABLE_CLICK_AND_COLLECT").as_deref().map(str::trim) {
            None => false,
            Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            Some(other) => return Err(invalid("ENABLE_CLICK_AND_COLLECT", format!("expected true or false, got '{other}'"))),
        };

        Ok(Self {
            database_url,
            database_max_connections,
            nats_url: get("NATS_URL"),
            port,
            log_filter: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            click_and_collect,
        })
    }

    pub fn bind_addr(&self) -> String { format!("0.0.0.0:{}", self.port) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/shop")]).unwrap();
        assert_eq!(config.port, 8083);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.nats_url, None);
        assert_eq!(config.log_filter, "info");
        assert!(!config.click_and_collect);
        assert_eq!(config.bind_addr(), "0.0.0.0:8083");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgres://db/shop"),
            ("PORT", "9000"),
            ("NATS_URL", "nats://bus:4222"),
            ("ENABLE_CLICK_AND_COLLECT", "true"),
            ("RUST_LOG", "opensase_configurator=debug"),
        ]).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.nats_url.as_deref(), Some("nats://bus:4222"));
        assert!(config.click_and_collect);
        assert_eq!(config.log_filter, "opensase_configurator=debug");
    }

    #[test]
    fn test_errors() {
        assert_eq!(load(&[]), Err(ConfigError::MissingEnvVar("DATABASE_URL".into())));
        assert!(matches!(
            load(&[("DATABASE_URL", "x"), ("PORT", "eighty")]),
            Err(ConfigError::InvalidEnvVar { var, .. }) if var == "PORT"
        ));
        assert!(load(&[("DATABASE_URL", "x"), ("ENABLE_CLICK_AND_COLLECT", "maybe")]).is_err());
    }
}

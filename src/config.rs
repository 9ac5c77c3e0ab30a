use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(&'static str, String),
}

/// Administrator created on startup when it does not exist yet.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Runtime settings read from the environment. Only `DATABASE_URL` and
/// `JWT_SECRET` are required.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub app_env: String,
    pub static_dir: PathBuf,
    pub db_max_connections: u32,
    /// Take the client address from `X-Forwarded-For` (behind a reverse proxy).
    pub trust_proxy: bool,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let host = optional("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match optional("SERVER_PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidEnvVar("SERVER_PORT", raw))?,
            None => 3000,
        };
        let db_max_connections = match optional("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidEnvVar("DB_MAX_CONNECTIONS", raw))?,
            None => 5,
        };

        let trust_proxy = match optional("TRUST_PROXY") {
            Some(raw) => parse_flag(&raw)
                .ok_or(ConfigError::InvalidEnvVar("TRUST_PROXY", raw))?,
            None => false,
        };

        let bootstrap_admin = match (optional("ADMIN_EMAIL"), optional("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                email,
                password,
                name: optional("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            host,
            port,
            app_env: optional("APP_ENV").unwrap_or_else(|| "development".to_string()),
            static_dir: optional("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
            db_max_connections,
            trust_proxy,
            bootstrap_admin,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse()
            .map_err(|_| ConfigError::InvalidEnvVar("SERVER_HOST", raw))
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::MissingEnvVar(key))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            database_url: "mysql://localhost/test".into(),
            jwt_secret: "secret".into(),
            host: "127.0.0.1".into(),
            port: 8080,
            app_env: "Production".into(),
            static_dir: PathBuf::from("public"),
            db_max_connections: 5,
            trust_proxy: false,
            bootstrap_admin: None,
        }
    }

    #[test]
    fn production_check_ignores_case() {
        assert!(sample().is_production());
        let mut dev = sample();
        dev.app_env = "development".into();
        assert!(!dev.is_production());
    }

    #[test]
    fn socket_addr_combines_host_and_port() {
        let addr = sample().socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn proxy_flag_values() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 1 "), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn bad_host_is_reported() {
        let mut cfg = sample();
        cfg.host = "not a host".into();
        assert!(matches!(
            cfg.socket_addr(),
            Err(ConfigError::InvalidEnvVar("SERVER_HOST", _))
        ));
    }
}

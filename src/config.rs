use anyhow::{Context, bail};
use std::env;

const DEFAULT_DATABASE_URL: &str = "sqlite://data.db?mode=rwc";
const DEV_SESSION_SECRET: &str = "dev-secret-key-change-in-production";
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    MySql,
}

impl Backend {
    pub fn from_url(url: &str) -> anyhow::Result<Self> {
        if url.starts_with("sqlite:") {
            Ok(Backend::Sqlite)
        } else if url.starts_with("mysql:") || url.starts_with("mariadb:") {
            Ok(Backend::MySql)
        } else {
            bail!("unsupported database url scheme: {url}")
        }
    }
}

/// Only changes log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: Option<String>) -> anyhow::Result<Self> {
        match raw.as_deref().map(str::trim) {
            None | Some("") | Some("development") | Some("dev") => Ok(Environment::Development),
            Some("production") | Some("prod") => Ok(Environment::Production),
            Some(other) => bail!("APP_ENV must be production or development, got {other}"),
        }
    }

    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub backend: Backend,
    pub db_max_connections: u32,
    pub session_secret: String,
    /// SESSION_SECRET was unset and the built-in development secret is used.
    pub dev_secret: bool,
    pub server_addr: String,
    pub environment: Environment,

    /// Base for generated codes. Derived from the request when unset.
    pub public_base_url: Option<String>,
    pub log_dir: String,

    // Rate limiting
    pub rate_presence_per_min: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = Environment::parse(var("APP_ENV"))?;

        let database_url = var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let backend = Backend::from_url(&database_url)?;

        let (session_secret, dev_secret) = match var("SESSION_SECRET") {
            Some(secret) => (secret, false),
            None if environment.is_production() => {
                bail!("SESSION_SECRET must be set in production")
            }
            None => (DEV_SESSION_SECRET.to_string(), true),
        };
        if session_secret.len() < MIN_SECRET_LEN {
            bail!("SESSION_SECRET must be at least {MIN_SECRET_LEN} bytes long");
        }

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = var("PORT")
            .unwrap_or_else(|| "5000".to_string())
            .parse()
            .context("PORT must be a valid port number")?;

        let db_max_connections: u32 = var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|| "5".to_string())
            .parse()
            .context("DB_MAX_CONNECTIONS must be a positive integer")?;
        if db_max_connections == 0 {
            bail!("DB_MAX_CONNECTIONS must be a positive integer, got 0");
        }

        Ok(Self {
            database_url,
            backend,
            db_max_connections,
            session_secret,
            dev_secret,
            server_addr: format!("{host}:{port}"),
            environment,
            public_base_url: var("PUBLIC_BASE_URL"),
            log_dir: var("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            rate_presence_per_min: var("RATE_PRESENCE_PER_MIN")
                .unwrap_or_else(|| "10".to_string())
                .parse()
                .context("RATE_PRESENCE_PER_MIN must be an integer")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_to_embedded_sqlite_in_development() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.server_addr, "0.0.0.0:5000");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.session_secret, DEV_SESSION_SECRET);
        assert!(config.dev_secret);
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.rate_presence_per_min, 10);
        assert!(config.public_base_url.is_none());
    }

    #[test]
    fn reads_mysql_url_and_port() {
        let config = config_from(&[
            ("DATABASE_URL", "mysql://root:pw@localhost/pointage"),
            ("PORT", "8080"),
            ("PUBLIC_BASE_URL", "https://pointage.example.com/"),
        ])
        .unwrap();

        assert_eq!(config.backend, Backend::MySql);
        assert_eq!(config.server_addr, "0.0.0.0:8080");
        assert_eq!(
            config.public_base_url.as_deref(),
            Some("https://pointage.example.com/")
        );
    }

    #[test]
    fn production_requires_a_secret() {
        assert!(config_from(&[("APP_ENV", "production")]).is_err());

        let config = config_from(&[
            ("APP_ENV", "production"),
            ("SESSION_SECRET", "0123456789abcdef0123456789abcdef"),
        ])
        .unwrap();
        assert!(config.environment.is_production());
        assert!(!config.dev_secret);
    }

    #[test]
    fn rejects_short_secret_and_unknown_scheme() {
        assert!(config_from(&[("SESSION_SECRET", "too-short")]).is_err());
        assert!(config_from(&[("DATABASE_URL", "redis://localhost")]).is_err());
        assert!(config_from(&[("PORT", "not-a-port")]).is_err());
    }

    #[test]
    fn pool_size_must_be_positive() {
        assert!(config_from(&[("DB_MAX_CONNECTIONS", "0")]).is_err());
        assert!(config_from(&[("DB_MAX_CONNECTIONS", "-1")]).is_err());

        let config = config_from(&[("DB_MAX_CONNECTIONS", "1")]).unwrap();
        assert_eq!(config.db_max_connections, 1);
    }
}

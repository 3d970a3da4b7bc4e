use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Longest session a deployment may configure.
pub const MAX_SESSION_LIFETIME_DAYS: i64 = 365;

/// Errors raised while assembling configuration from the environment
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    /// Names of optional route extensions to enable at startup
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub session_lifetime_days: i64,
    pub cookie_secure: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    /// Build configuration from the process environment.
    ///
    /// `JWT_SECRET` is required; everything else falls back to the preset
    /// selected by `APP_ENV`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        let preset = match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        };

        preset.with_env_overrides(|key| env::var(key).ok())
    }

    fn with_env_overrides<F>(mut self, var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = var("BIND_ADDR") {
            self.server.bind_addr = v;
        }
        if let Some(v) = var("PORT") {
            self.server.port = parse_value("PORT", v)?;
        }

        // Database overrides
        if let Some(v) = var("STORE_BACKEND") {
            self.database.backend = match v.to_ascii_lowercase().as_str() {
                "postgres" | "pg" => StoreBackend::Postgres,
                "memory" => StoreBackend::Memory,
                _ => return Err(ConfigError::Invalid { key: "STORE_BACKEND", value: v }),
            };
        }
        if let Some(v) = var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Some(v) = var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_value("DATABASE_MAX_CONNECTIONS", v)?;
        }

        // Security overrides
        self.security.jwt_secret = var("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if let Some(v) = var("SESSION_LIFETIME_DAYS") {
            let days: i64 = parse_value("SESSION_LIFETIME_DAYS", v.clone())?;
            if !(1..=MAX_SESSION_LIFETIME_DAYS).contains(&days) {
                return Err(ConfigError::Invalid { key: "SESSION_LIFETIME_DAYS", value: v });
            }
            self.security.session_lifetime_days = days;
        }
        if let Some(v) = var("COOKIE_SECURE") {
            self.security.cookie_secure = parse_value("COOKIE_SECURE", v)?;
        }
        if let Some(v) = var("CORS_ORIGIN") {
            // Credentialed CORS cannot use a wildcard origin
            let origins = split_list(&v);
            if origins.iter().any(|origin| origin.contains('*')) {
                return Err(ConfigError::Invalid { key: "CORS_ORIGIN", value: v });
            }
            self.security.cors_origins = origins;
        }

        if let Some(v) = var("EXTENSIONS") {
            self.extensions = split_list(&v);
        }

        Ok(self)
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                bind_addr: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 10,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                session_lifetime_days: 5,
                cookie_secure: false,
                cors_origins: vec!["http://localhost:3000".to_string()],
            },
            extensions: vec!["imagery".to_string()],
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                bind_addr: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 50,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                session_lifetime_days: 5,
                cookie_secure: true,
                cors_origins: vec![],
            },
            extensions: vec!["imagery".to_string()],
        }
    }

    /// Development preset with an explicit secret and the in-memory store.
    /// Used by tests and local demos that have no database.
    pub fn for_testing(jwt_secret: impl Into<String>) -> Self {
        let mut config = Self::development();
        config.database.backend = StoreBackend::Memory;
        config.security.jwt_secret = jwt_secret.into();
        config
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

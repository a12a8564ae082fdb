//! Application configuration, loaded from the environment.

use anyhow::Context;
use log::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_issuer: String,
    pub token_audience: String,
    /// Session tokens expire this many hours after issuance.
    pub token_ttl_hours: i64,
    /// Clock-skew tolerance applied during validation.
    pub leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_issuer: "deskserver".to_string(),
            token_audience: "deskserver-api".to_string(),
            token_ttl_hours: 24,
            leeway_seconds: 30,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let get_str = |key: &str, default: &str| -> String {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };

        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set (path to the sqlite database file)")?;

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using development secret - do not use in production");
            "deskserver-dev-secret-do-not-use-in-production".to_string()
        });

        Ok(AppConfig {
            server: ServerConfig {
                host: get_str("SERVER_HOST", "127.0.0.1"),
                port: std::env::var("SERVER_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
            },
            database: DatabaseConfig {
                url: database_url,
                pool_size: std::env::var("DATABASE_POOL_SIZE")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(16),
            },
            auth: AuthConfig {
                jwt_secret,
                token_issuer: get_str("TOKEN_ISSUER", "deskserver"),
                token_audience: get_str("TOKEN_AUDIENCE", "deskserver-api"),
                token_ttl_hours: std::env::var("TOKEN_TTL_HOURS")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(24),
                leeway_seconds: 30,
            },
        })
    }
}

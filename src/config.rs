use std::net::SocketAddr;

use anyhow::{bail, Context};
use serde::Deserialize;

/// One year; anything longer is treated as a misconfiguration.
const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub ttl_minutes: i64,
    pub reuse_window_seconds: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 60,
            reuse_window_seconds: 60,
        }
    }
}

impl TokenConfig {
    /// TTL must be positive and at most a year; the reuse window must be
    /// non-negative and shorter than the TTL.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_TTL_MINUTES).contains(&self.ttl_minutes) {
            bail!(
                "TOKEN_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}, got {}",
                self.ttl_minutes
            );
        }
        let ttl_seconds = self.ttl_minutes * 60;
        if !(0..ttl_seconds).contains(&self.reuse_window_seconds) {
            bail!(
                "TOKEN_REUSE_WINDOW_SECONDS must be between 0 and {}, got {}",
                ttl_seconds - 1,
                self.reuse_window_seconds
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub token: TokenConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let defaults = TokenConfig::default();
        let token = TokenConfig {
            ttl_minutes: env_parse("TOKEN_TTL_MINUTES").unwrap_or(defaults.ttl_minutes),
            reuse_window_seconds: env_parse("TOKEN_REUSE_WINDOW_SECONDS")
                .unwrap_or(defaults.reuse_window_seconds),
        };
        token.validate()?;

        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_parse("APP_PORT").unwrap_or(8080),
            max_connections: env_parse("DB_MAX_CONNECTIONS").unwrap_or(10),
            token,
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid APP_HOST {:?}", self.host))
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

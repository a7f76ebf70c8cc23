use std::str::FromStr;

use iterra_core::rate_limit::DEFAULT_DAILY_LIMIT;

use crate::auth::jwt::JwtConfig;

/// Where the per-day usage counters live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageStoreKind {
    /// Transactional counters in PostgreSQL; shared by every replica.
    Postgres,
    /// Process-local counters, reset on restart. Local development only.
    Memory,
}

impl FromStr for UsageStoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(UsageStoreKind::Postgres),
            "memory" => Ok(UsageStoreKind::Memory),
            other => Err(format!("unknown usage store '{other}' (expected postgres or memory)")),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `60`; LLM calls are slow).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
    /// Feedback requests allowed per identity and per address per UTC day.
    pub daily_request_limit: i64,
    pub usage_store: UsageStoreKind,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `0.0.0.0`                  |
    /// | `PORT`                  | `3000`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `60`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                       |
    /// | `DAILY_REQUEST_LIMIT`   | `20`                       |
    /// | `USAGE_STORE`           | `postgres`                 |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let daily_request_limit: i64 = std::env::var("DAILY_REQUEST_LIMIT")
            .unwrap_or_else(|_| DEFAULT_DAILY_LIMIT.to_string())
            .parse()
            .expect("DAILY_REQUEST_LIMIT must be a valid i64");
        assert!(daily_request_limit >= 0, "DAILY_REQUEST_LIMIT must not be negative");

        let usage_store = std::env::var("USAGE_STORE")
            .unwrap_or_else(|_| "postgres".into())
            .parse()
            .unwrap_or_else(|e| panic!("USAGE_STORE: {e}"));

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            daily_request_limit,
            usage_store,
        }
    }
}

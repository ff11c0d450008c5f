// src/config.rs

//! Environment-backed application settings.
//!
//! Every process role (worker, server, scheduler) loads the same `Settings`
//! once at startup and passes it by reference; nothing reads the environment
//! after that point.

use std::env;

use crate::error::{AppError, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    /// NATS endpoint, e.g. `nats://localhost:4222`
    pub nats_url: String,
    /// NATS token auth (empty string disables token auth)
    pub nats_token: String,
    /// Postgres connection string
    pub database_url: String,
    /// Per-request HTTP timeout in seconds
    pub http_timeout_secs: u64,
    /// Cap on simultaneous fetches (and pooled connections per host)
    pub fetch_conn_limit: usize,
    /// User agent sent by the static/json fetchers
    pub user_agent: String,
    /// Headless-browser rendering service (`/content` endpoint)
    pub render_url: String,
    /// Optional token for the rendering service
    pub render_token: Option<String>,
    /// URL dedup service endpoint; unset means use the local engine
    pub dedup_url: Option<String>,
    /// Summarization gateway endpoint
    pub summary_url: String,
    /// Summarization gateway API key
    pub summary_api_key: String,
    /// Push delivery webhook endpoint
    pub push_url: String,
    /// Admin token guarding the HTTP surface
    pub admin_token: String,
    /// Subscriber ids restricted to the quiet-hours window, comma-separated
    pub quiet_hours_users: Vec<String>,
    /// Bind address for the admin HTTP server
    pub bind_addr: String,
}

impl Settings {
    /// Load configuration from environment variables.
    ///
    /// Reads a `.env` file first when present (development convenience).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            nats_url: env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string()),
            nats_token: env::var("NATS_TOKEN").unwrap_or_default(),
            database_url: env::var("DATABASE_URL")
                .map_err(|_| AppError::config("DATABASE_URL must be set"))?,
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| AppError::config("HTTP_TIMEOUT_SECS must be a number"))?,
            fetch_conn_limit: env::var("FETCH_CONN_LIMIT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| AppError::config("FETCH_CONN_LIMIT must be a number"))?,
            user_agent: env::var("USER_AGENT").unwrap_or_else(|_| default_user_agent()),
            render_url: env::var("RENDER_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            render_token: env::var("RENDER_TOKEN").ok(),
            dedup_url: env::var("DEDUP_URL").ok(),
            summary_url: env::var("SUMMARY_URL").unwrap_or_default(),
            summary_api_key: env::var("SUMMARY_API_KEY").unwrap_or_default(),
            push_url: env::var("PUSH_URL").unwrap_or_default(),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_default(),
            quiet_hours_users: env::var("QUIET_HOURS_USERS")
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
        })
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/137.0.0.0 Safari/537.36"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user_agent_looks_like_browser() {
        assert!(default_user_agent().starts_with("Mozilla/5.0"));
    }
}

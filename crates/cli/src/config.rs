//! Process configuration, read from the environment once at startup.

use anyhow::{Context, Result};
use simtrack_core::{env_nonempty, env_parse_with_default};

/// Everything the process needs, resolved from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Provider API endpoint (`SIMTRACK_PROVIDER_URL`).
    pub provider_url: String,
    /// Provider API key (`SIMTRACK_PROVIDER_KEY`).
    pub provider_key: String,
    /// GOIP gateway base URL (`SIMTRACK_GOIP_URL`).
    pub goip_url: String,
    /// GOIP gateway username (`SIMTRACK_GOIP_USER`, default "admin").
    pub goip_user: String,
    /// GOIP gateway password (`SIMTRACK_GOIP_PASSWORD`).
    pub goip_password: String,
    /// Postgres connection string (`DATABASE_URL`); unset runs in-memory.
    pub database_url: Option<String>,
    /// Calling-code prefix for sn/phone mapping (`SIMTRACK_COUNTRY_CODE`).
    pub country_code: String,
    /// Provider country identifier (`SIMTRACK_COUNTRY_ID`).
    pub country_id: String,
    /// Seconds between reconcile poll ticks (`SIMTRACK_POLL_INTERVAL_SECS`).
    pub poll_interval_secs: u64,
    /// Bearer token for the HTTP API (`SIMTRACK_API_TOKEN`); unset disables auth.
    pub api_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            provider_url: env_nonempty("SIMTRACK_PROVIDER_URL")
                .context("SIMTRACK_PROVIDER_URL must be set")?,
            provider_key: env_nonempty("SIMTRACK_PROVIDER_KEY")
                .context("SIMTRACK_PROVIDER_KEY must be set")?,
            goip_url: env_nonempty("SIMTRACK_GOIP_URL").context("SIMTRACK_GOIP_URL must be set")?,
            goip_user: env_nonempty("SIMTRACK_GOIP_USER").unwrap_or_else(|| "admin".to_owned()),
            goip_password: env_nonempty("SIMTRACK_GOIP_PASSWORD")
                .context("SIMTRACK_GOIP_PASSWORD must be set")?,
            database_url: env_nonempty("DATABASE_URL"),
            country_code: env_nonempty("SIMTRACK_COUNTRY_CODE").unwrap_or_else(|| "57".to_owned()),
            country_id: env_nonempty("SIMTRACK_COUNTRY_ID").unwrap_or_else(|| "col".to_owned()),
            poll_interval_secs: env_parse_with_default("SIMTRACK_POLL_INTERVAL_SECS", 3u64),
            api_token: env_nonempty("SIMTRACK_API_TOKEN"),
        })
    }
}

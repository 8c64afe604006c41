use std::env;
use std::str::FromStr;
use std::time::Duration;
use anyhow::Context;
use crate::generator::provider::{LumaConfig, DEFAULT_LUMA_BASE_URL};
use crate::generator::ManagerConfig;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub luma: LumaConfig,
    pub manager: ManagerConfig,
}

impl AppConfig {
    /// Reads the process environment, after applying a `.env` file if one exists
    pub fn load() -> anyhow::Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e).context("Failed to read .env file");
            }
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = parse_or(&lookup, "PORT", 3000u16)?;

        let manager = ManagerConfig {
            poll_interval: Duration::from_secs(parse_or(&lookup, "REEL_POLL_INTERVAL_SECS", 5)?),
            polling_budget: Duration::from_secs(parse_or(&lookup, "REEL_POLL_BUDGET_SECS", 300)?),
            request_timeout: Duration::from_secs(parse_or(&lookup, "REEL_REQUEST_TIMEOUT_SECS", 20)?),
            retention: Duration::from_secs(parse_or(&lookup, "REEL_RETENTION_SECS", 600)?),
        };
        if manager.poll_interval.is_zero() {
            anyhow::bail!("REEL_POLL_INTERVAL_SECS must be greater than zero");
        }

        let luma = LumaConfig {
            api_key: lookup("LUMAAI_API_KEY").filter(|k| !k.trim().is_empty()),
            base_url: lookup("LUMAAI_BASE_URL").unwrap_or_else(|| DEFAULT_LUMA_BASE_URL.to_string()),
            request_timeout: manager.request_timeout,
        };

        Ok(Self {
            port,
            luma,
            manager,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number, got '{}'", key, raw)),
        None => Ok(default),
    }
}

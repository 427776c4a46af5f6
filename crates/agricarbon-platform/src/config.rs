use std::time::Duration;

use agricarbon_advisory::DEFAULT_POWER_URL;
use agricarbon_core::Methodology;
use anyhow::{Context, Result, anyhow};
use tracing::info;

const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub database_url: String,
    pub http_addr: String,
    pub methodology_path: Option<String>,
    pub climate_api_url: String,
    pub upstream_timeout: Duration,
    /// `token=owner` pairs. When set, bearer tokens are checked against this
    /// list instead of the session table.
    pub api_tokens: Option<String>,
}

impl ServiceConfig {
    pub fn from_env(default_http_addr: &str) -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;
        let http_addr =
            std::env::var("HTTP_ADDR").unwrap_or_else(|_| default_http_addr.to_string());
        let methodology_path = non_empty_var("METHODOLOGY_PATH");
        let climate_api_url = non_empty_var("CLIMATE_API_URL")
            .unwrap_or_else(|| DEFAULT_POWER_URL.to_string());
        let upstream_timeout = match non_empty_var("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .with_context(|| format!("UPSTREAM_TIMEOUT_SECS must be whole seconds, got '{raw}'"))?,
            ),
            None => Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        };

        Ok(Self {
            database_url,
            http_addr,
            methodology_path,
            climate_api_url,
            upstream_timeout,
            api_tokens: non_empty_var("API_TOKENS"),
        })
    }

    /// Reads the methodology file when one is configured, otherwise the
    /// built-in baseline. Either way the result is validated before use.
    pub fn load_methodology(&self) -> Result<Methodology> {
        let methodology = match &self.methodology_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read methodology file {path}"))?;
                parse_methodology(&raw).with_context(|| format!("invalid methodology file {path}"))?
            }
            None => Methodology::default(),
        };

        info!(methodology = %methodology.name, "methodology loaded");
        Ok(methodology)
    }
}

pub fn parse_methodology(raw: &str) -> Result<Methodology> {
    let methodology: Methodology = serde_json::from_str(raw)?;
    methodology.validate().map_err(|reason| anyhow!(reason))?;
    Ok(methodology)
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

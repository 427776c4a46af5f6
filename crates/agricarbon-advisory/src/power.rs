//! NASA POWER daily point client.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info};

use crate::series::{DailyObservation, DateWindow, PowerDailyResponse};

pub const DEFAULT_POWER_URL: &str = "https://power.larc.nasa.gov/api/temporal/daily/point";
const PARAMETERS: &str = "T2M,RH2M,PRECTOT,WS10M";
const COMMUNITY: &str = "AG";

#[derive(Error, Debug)]
pub enum AdvisoryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("POWER API error: {status}")]
    Server { status: u16 },
}

/// Read-only source of daily climate observations for a point.
#[async_trait]
pub trait ClimateSource: Send + Sync {
    async fn daily_point(
        &self,
        lat: f64,
        lon: f64,
        window: DateWindow,
    ) -> Result<Vec<DailyObservation>, AdvisoryError>;
}

/// No caching and no retries; every call hits the API once and gives up
/// after `timeout`.
pub struct PowerClient {
    client: reqwest::Client,
    base_url: String,
}

impl PowerClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AdvisoryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ClimateSource for PowerClient {
    async fn daily_point(
        &self,
        lat: f64,
        lon: f64,
        window: DateWindow,
    ) -> Result<Vec<DailyObservation>, AdvisoryError> {
        let query = [
            ("parameters", PARAMETERS.to_string()),
            ("community", COMMUNITY.to_string()),
            ("longitude", lon.to_string()),
            ("latitude", lat.to_string()),
            ("start", window.start_label()),
            ("end", window.end_label()),
            ("format", "JSON".to_string()),
        ];

        info!(lat, lon, start = %window.start, end = %window.end, "fetching POWER daily series");
        let resp = self.client.get(&self.base_url).query(&query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            error!(status = status.as_u16(), "POWER API request failed");
            return Err(AdvisoryError::Server {
                status: status.as_u16(),
            });
        }

        let payload: PowerDailyResponse = resp.json().await?;
        Ok(payload.into_series())
    }
}

//! Point-location climate series and the agronomic advice derived from them.
//!
//! Read-only and independent of credit estimation.

pub mod indicators;
pub mod power;
pub mod series;

pub use indicators::{
    AgricultureAdvice, AgricultureSummary, DroughtRisk, ForecastDay, SeriesIndicators,
    series_indicators, summarize_agriculture, weather_forecast,
};
pub use power::{AdvisoryError, ClimateSource, DEFAULT_POWER_URL, PowerClient};
pub use series::{DailyObservation, DateWindow, PowerDailyResponse};

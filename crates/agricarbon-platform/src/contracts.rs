use agricarbon_advisory::{AgricultureSummary, DailyObservation, ForecastDay, SeriesIndicators};
use agricarbon_core::{CropType, Methodology, Side, Transaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EstimateRequest {
    #[serde(default)]
    pub crop: Option<CropType>,
    #[serde(default)]
    pub hectares: Option<f64>,
    /// Raw GeoJSON, only read when no usable hectare figure is given.
    #[serde(default)]
    pub geometry: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    #[serde(default)]
    pub crop: Option<CropType>,
    #[serde(default)]
    pub hectares: Option<f64>,
    #[serde(default)]
    pub side: Option<Side>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionResponse {
    pub transaction: Transaction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTransactionsResponse {
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            detail: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropRate {
    pub crop: CropType,
    pub rate: f64,
}

/// Active methodology plus the rate every crop resolves to, fallbacks
/// included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodologyResponse {
    pub methodology: Methodology,
    pub effective_rates: Vec<CropRate>,
}

/// Query string shared by the climate routes. Coordinates stay raw so a
/// missing or garbled value can be reported with one message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClimateQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub days: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl ClimateQuery {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let parse = |raw: &Option<String>| {
            raw.as_deref()
                .and_then(|value| value.trim().parse::<f64>().ok())
                .filter(|value| value.is_finite())
        };
        Some((parse(&self.lat)?, parse(&self.lon)?))
    }

    /// Window length for the forecast view, defaulting to a week.
    pub fn days(&self) -> u32 {
        self.days
            .as_deref()
            .and_then(|value| value.trim().parse::<u32>().ok())
            .unwrap_or(7)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClimateDataRequest {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl ClimateDataRequest {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }
}

impl From<ClimateQuery> for ClimateDataRequest {
    fn from(query: ClimateQuery) -> Self {
        let (lat, lon) = query.coordinates().unzip();
        Self {
            lat,
            lon,
            start: query.start,
            end: query.end,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherResponse {
    pub ok: bool,
    pub lat: f64,
    pub lon: f64,
    pub forecast: Vec<ForecastDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgricultureResponse {
    pub ok: bool,
    pub lat: f64,
    pub lon: f64,
    pub summary: AgricultureSummary,
    pub series: Vec<DailyObservation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimateData {
    pub source: String,
    pub lat: f64,
    pub lon: f64,
    pub start: String,
    pub end: String,
    pub latest: Option<DailyObservation>,
    pub series: Vec<DailyObservation>,
    pub indicators: SeriesIndicators,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimateDataResponse {
    pub ok: bool,
    pub data: ClimateData,
}

/// Upstream failure body for the climate routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimateFailure {
    pub ok: bool,
    pub error: String,
}

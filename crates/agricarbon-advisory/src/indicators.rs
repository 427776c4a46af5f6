use serde::{Deserialize, Serialize};

use crate::series::DailyObservation;

/// Rain total (mm over the window) that counts as fully wet.
const SATURATING_RAIN_MM: f64 = 50.0;
const RAIN_WEIGHT: f64 = 0.7;
const HUMIDITY_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DroughtRisk {
    High,
    Medium,
    Low,
}

impl DroughtRisk {
    pub fn from_moisture(score: f64) -> Self {
        if score < 0.35 {
            Self::High
        } else if score < 0.6 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgricultureAdvice {
    pub irrigation: String,
    pub sow_harvest: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgricultureSummary {
    #[serde(rename = "avgTemp14")]
    pub avg_temp: f64,
    #[serde(rename = "avgRH14")]
    pub avg_humidity: f64,
    #[serde(rename = "totalRain14")]
    pub total_rain: f64,
    #[serde(rename = "droughtRisk")]
    pub drought_risk: DroughtRisk,
    #[serde(rename = "moistureScore")]
    pub moisture_score: f64,
    pub advice: AgricultureAdvice,
}

/// Forecast-view row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub date: String,
    pub temp_c: Option<f64>,
    pub humidity: Option<f64>,
    pub rainfall: Option<f64>,
    #[serde(rename = "wind10m")]
    pub wind_10m: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesIndicators {
    #[serde(rename = "avgT2M")]
    pub avg_t2m: Option<f64>,
    #[serde(rename = "totalRain")]
    pub total_rain: Option<f64>,
}

fn sum(series: &[DailyObservation], field: impl Fn(&DailyObservation) -> Option<f64>) -> f64 {
    series.iter().map(|day| field(day).unwrap_or(0.0)).sum()
}

/// Missing values count as zero; an empty series averages to zero.
fn mean(series: &[DailyObservation], field: impl Fn(&DailyObservation) -> Option<f64>) -> f64 {
    sum(series, field) / series.len().max(1) as f64
}

pub fn summarize_agriculture(series: &[DailyObservation]) -> AgricultureSummary {
    let total_rain = sum(series, |day| day.prectot);
    let avg_temp = mean(series, |day| day.t2m);
    let avg_humidity = mean(series, |day| day.rh2m);

    let moisture_score = ((total_rain / SATURATING_RAIN_MM) * RAIN_WEIGHT
        + (avg_humidity / 100.0) * HUMIDITY_WEIGHT)
        .clamp(0.0, 1.0);

    let irrigation = if moisture_score < 0.35 {
        "Increase irrigation: low moisture detected."
    } else if moisture_score < 0.5 {
        "Slightly increase irrigation: below optimal moisture."
    } else {
        "Maintain normal irrigation schedule."
    };

    let sow_harvest = if avg_temp < 15.0 {
        "Cool conditions; delay sowing sensitive crops."
    } else if avg_temp > 30.0 {
        "High temperature; consider heat-tolerant varieties."
    } else {
        "Conditions stable; follow planned schedule."
    };

    AgricultureSummary {
        avg_temp,
        avg_humidity,
        total_rain,
        drought_risk: DroughtRisk::from_moisture(moisture_score),
        moisture_score,
        advice: AgricultureAdvice {
            irrigation: irrigation.to_string(),
            sow_harvest: sow_harvest.to_string(),
        },
    }
}

pub fn weather_forecast(series: &[DailyObservation]) -> Vec<ForecastDay> {
    series
        .iter()
        .map(|day| ForecastDay {
            date: day.date.clone(),
            temp_c: day.t2m,
            humidity: day.rh2m,
            rainfall: day.prectot,
            wind_10m: day.ws10m,
        })
        .collect()
}

pub fn series_indicators(series: &[DailyObservation]) -> SeriesIndicators {
    if series.is_empty() {
        return SeriesIndicators {
            avg_t2m: None,
            total_rain: None,
        };
    }

    SeriesIndicators {
        avg_t2m: Some(mean(series, |day| day.t2m)),
        total_rain: Some(sum(series, |day| day.prectot)),
    }
}

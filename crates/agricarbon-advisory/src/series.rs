use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// POWER marks days without data with this value.
const POWER_FILL_VALUE: f64 = -999.0;

const DATE_FORMAT: &str = "%Y%m%d";

/// One day of the normalized climate series. Missing values are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    /// `YYYYMMDD`
    pub date: String,
    /// Air temperature at 2 m, °C.
    pub t2m: Option<f64>,
    /// Relative humidity at 2 m, %.
    pub rh2m: Option<f64>,
    /// Precipitation, mm/day.
    pub prectot: Option<f64>,
    /// Wind speed at 10 m, m/s.
    pub ws10m: Option<f64>,
}

/// Inclusive date range of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// The `days` calendar days ending on `today`, at least one.
    pub fn trailing(today: NaiveDate, days: u32) -> Self {
        let span = u64::from(days.max(1) - 1);
        let start = today.checked_sub_days(Days::new(span)).unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    pub fn parse_bound(value: &str) -> Result<NaiveDate, chrono::ParseError> {
        NaiveDate::parse_from_str(value, DATE_FORMAT)
    }

    pub fn start_label(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    pub fn end_label(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

/// Subset of the POWER daily point payload that carries the series.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PowerDailyResponse {
    #[serde(default)]
    pub properties: PowerProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PowerProperties {
    #[serde(default)]
    pub parameter: PowerParameters,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PowerParameters {
    #[serde(rename = "T2M", default)]
    pub t2m: BTreeMap<String, Option<f64>>,
    #[serde(rename = "RH2M", default)]
    pub rh2m: BTreeMap<String, Option<f64>>,
    #[serde(rename = "PRECTOT", alias = "PRECTOTCORR", default)]
    pub prectot: BTreeMap<String, Option<f64>>,
    #[serde(rename = "WS10M", default)]
    pub ws10m: BTreeMap<String, Option<f64>>,
}

impl PowerDailyResponse {
    /// One observation per temperature date, ascending.
    pub fn into_series(self) -> Vec<DailyObservation> {
        let parameters = self.properties.parameter;
        let lookup = |values: &BTreeMap<String, Option<f64>>, date: &str| {
            values
                .get(date)
                .copied()
                .flatten()
                .filter(|value| value.is_finite() && *value != POWER_FILL_VALUE)
        };

        parameters
            .t2m
            .keys()
            .map(|date| DailyObservation {
                date: date.clone(),
                t2m: lookup(&parameters.t2m, date),
                rh2m: lookup(&parameters.rh2m, date),
                prectot: lookup(&parameters.prectot, date),
                ws10m: lookup(&parameters.ws10m, date),
            })
            .collect()
    }
}

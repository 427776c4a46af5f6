use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CropType, Side};

/// Inclusive unit-price range, currency per credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBand {
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub min: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub max: Decimal,
}

impl PriceBand {
    pub const fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, price: Decimal) -> bool {
        self.min <= price && price <= self.max
    }
}

/// Sequestration rate per crop, tCO2e per hectare per year.
///
/// Always carries a `mixed` entry; any crop without its own entry is priced
/// at the `mixed` rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, f64>",
    into = "BTreeMap<String, f64>"
)]
pub struct SequestrationRates {
    rates: BTreeMap<CropType, f64>,
}

impl SequestrationRates {
    pub fn new(rates: BTreeMap<CropType, f64>) -> Result<Self, String> {
        if !rates.contains_key(&CropType::Mixed) {
            return Err("rate table must define the 'mixed' fallback rate".to_string());
        }
        if let Some((crop, rate)) = rates
            .iter()
            .find(|(_, rate)| !rate.is_finite() || **rate < 0.0)
        {
            return Err(format!("rate for '{crop}' must be finite and >= 0, got {rate}"));
        }

        Ok(Self { rates })
    }

    pub fn rate(&self, crop: CropType) -> f64 {
        self.rates
            .get(&crop)
            .or_else(|| self.rates.get(&CropType::Mixed))
            .copied()
            // unreachable: `new` guarantees the mixed entry
            .unwrap_or_default()
    }

    pub fn entries(&self) -> impl Iterator<Item = (CropType, f64)> + '_ {
        CropType::ALL.into_iter().map(|crop| (crop, self.rate(crop)))
    }
}

impl Default for SequestrationRates {
    fn default() -> Self {
        Self {
            rates: BTreeMap::from([
                (CropType::Rice, 3.0),
                (CropType::Wheat, 2.0),
                (CropType::Maize, 2.2),
                (CropType::Mixed, 2.5),
                (CropType::Other, 2.0),
            ]),
        }
    }
}

impl TryFrom<BTreeMap<String, f64>> for SequestrationRates {
    type Error = String;

    fn try_from(raw: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let mut rates = BTreeMap::new();
        for (label, rate) in raw {
            let crop: CropType = label.parse()?;
            rates.insert(crop, rate);
        }
        Self::new(rates)
    }
}

impl From<SequestrationRates> for BTreeMap<String, f64> {
    fn from(table: SequestrationRates) -> Self {
        table
            .rates
            .into_iter()
            .map(|(crop, rate)| (crop.as_str().to_string(), rate))
            .collect()
    }
}

/// Rate table and price bands in force for the process lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Methodology {
    pub name: String,
    pub rates: SequestrationRates,
    pub farmer_band: PriceBand,
    pub industry_band: PriceBand,
}

impl Default for Methodology {
    fn default() -> Self {
        Self {
            name: "baseline".to_string(),
            rates: SequestrationRates::default(),
            farmer_band: PriceBand::new(Decimal::from(12), Decimal::from(14)),
            industry_band: PriceBand::new(Decimal::from(18), Decimal::from(19)),
        }
    }
}

impl Methodology {
    pub fn band(&self, side: Side) -> PriceBand {
        match side {
            Side::Industry => self.industry_band,
            Side::Farmer => self.farmer_band,
        }
    }

    pub fn rate(&self, crop: CropType) -> f64 {
        self.rates.rate(crop)
    }

    pub fn validate(&self) -> Result<(), String> {
        for (side, band) in [
            (Side::Farmer, self.farmer_band),
            (Side::Industry, self.industry_band),
        ] {
            if band.min.is_sign_negative() || band.min > band.max {
                return Err(format!(
                    "{side} price band must satisfy 0 <= min <= max, got {}-{}",
                    band.min, band.max
                ));
            }
        }

        Ok(())
    }
}

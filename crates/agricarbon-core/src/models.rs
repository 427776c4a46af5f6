use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Crop categories with a known sequestration rate.
///
/// Deserialization is permissive: an unrecognized or empty label resolves to
/// [`CropType::Mixed`] instead of failing. Use [`str::parse`] when a strict
/// match is required.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum CropType {
    Rice,
    Wheat,
    Maize,
    #[default]
    Mixed,
    Other,
}

impl CropType {
    pub const ALL: [CropType; 5] = [
        CropType::Rice,
        CropType::Wheat,
        CropType::Maize,
        CropType::Mixed,
        CropType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rice => "rice",
            Self::Wheat => "wheat",
            Self::Maize => "maize",
            Self::Mixed => "mixed",
            Self::Other => "other",
        }
    }

    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or_default()
    }
}

impl FromStr for CropType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rice" => Ok(Self::Rice),
            "wheat" => Ok(Self::Wheat),
            "maize" => Ok(Self::Maize),
            "mixed" => Ok(Self::Mixed),
            "other" => Ok(Self::Other),
            _ => Err(format!("unknown crop type '{value}'")),
        }
    }
}

impl From<String> for CropType {
    fn from(value: String) -> Self {
        Self::from_label(&value)
    }
}

impl fmt::Display for CropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Economic role of the transacting party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Seller of credits.
    #[default]
    Farmer,
    /// Buyer of credits.
    Industry,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Farmer => "farmer",
            Self::Industry => "industry",
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "farmer" => Ok(Self::Farmer),
            "industry" => Ok(Self::Industry),
            _ => Err(format!("unknown side '{value}'")),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive currency range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange {
    #[serde(with = "rust_decimal::serde::float")]
    pub min: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub max: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditEstimate {
    pub hectares: f64,
    pub crop: CropType,
    /// tCO2e per hectare per year.
    pub rate: f64,
    pub credits: f64,
    pub farmer: ValueRange,
    pub industry: ValueRange,
}

/// Authenticated caller. Transactions are scoped to `id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub owner: String,
    pub side: Side,
    pub crop_type: CropType,
    pub area_ha: f64,
    pub credits: f64,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_value: Decimal,
    pub method_rate_tco2e_per_ha: f64,
    pub created_at: DateTime<Utc>,
}

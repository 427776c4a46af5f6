//! Error taxonomy for estimation, validation and recording

use rust_decimal::Decimal;
use thiserror::Error;

use crate::Side;

#[derive(Debug, Error)]
pub enum CarbonError {
    #[error("invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    #[error("hectares must be > 0")]
    MissingOrInvalidArea,

    #[error("unit_price must be {min}-{max} USD for {side}")]
    PriceOutOfBand {
        side: Side,
        min: Decimal,
        max: Decimal,
    },

    #[error("credit volume {credits} cannot be valued")]
    ValuationOutOfRange { credits: f64 },

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("upstream failure: {0}")]
    Upstream(String),
}

pub type Result<T> = std::result::Result<T, CarbonError>;

impl CarbonError {
    pub fn invalid_geometry(reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            reason: reason.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidGeometry { .. } => "invalid_geometry",
            Self::MissingOrInvalidArea => "missing_or_invalid_area",
            Self::PriceOutOfBand { .. } => "price_out_of_band",
            Self::ValuationOutOfRange { .. } => "valuation_out_of_range",
            Self::Unauthenticated => "unauthenticated",
            Self::PersistenceFailure(_) => "persistence_failure",
            Self::Upstream(_) => "upstream_failure",
        }
    }

    /// Client errors are 4xx, collaborator failures 5xx.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidGeometry { .. }
            | Self::MissingOrInvalidArea
            | Self::PriceOutOfBand { .. }
            | Self::ValuationOutOfRange { .. } => 400,
            Self::Unauthenticated => 401,
            Self::PersistenceFailure(_) | Self::Upstream(_) => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

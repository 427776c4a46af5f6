use std::sync::Arc;

use agricarbon_core::{
    CarbonError, CreditEstimate, CropType, Methodology, PriceBand, Result, ValueRange,
};
use rust_decimal::Decimal;

use crate::area::{AreaHectares, AreaInput};

/// Converts an area and crop into a credit volume and its valuation on both
/// sides of the market. Pure function of its inputs and the methodology it
/// was built with.
#[derive(Debug, Clone)]
pub struct CreditEstimator {
    methodology: Arc<Methodology>,
}

impl CreditEstimator {
    pub fn new(methodology: Arc<Methodology>) -> Self {
        Self { methodology }
    }

    pub fn methodology(&self) -> &Methodology {
        &self.methodology
    }

    /// Money is `Decimal`, so valuation is bounded: once credits times the
    /// top of a price band passes `Decimal::MAX` (about 7.9e28) the call
    /// returns `ValuationOutOfRange`. With the default bands that happens
    /// somewhere past 1e27 ha.
    pub fn estimate(&self, area: AreaHectares, crop: CropType) -> Result<CreditEstimate> {
        let hectares = area.value();
        let rate = self.methodology.rate(crop);
        let credits = hectares.max(0.0) * rate;

        let volume =
            Decimal::try_from(credits).map_err(|_| CarbonError::ValuationOutOfRange { credits })?;

        Ok(CreditEstimate {
            hectares,
            crop,
            rate,
            credits,
            farmer: value_range(volume, self.methodology.farmer_band, credits)?,
            industry: value_range(volume, self.methodology.industry_band, credits)?,
        })
    }

    pub fn estimate_hectares(&self, hectares: f64, crop: CropType) -> Result<CreditEstimate> {
        self.estimate(AreaHectares::new(hectares)?, crop)
    }

    pub fn estimate_input(&self, input: &AreaInput, crop: CropType) -> Result<CreditEstimate> {
        self.estimate(input.resolve()?, crop)
    }
}

fn value_range(volume: Decimal, band: PriceBand, credits: f64) -> Result<ValueRange> {
    let out_of_range = || CarbonError::ValuationOutOfRange { credits };
    Ok(ValueRange {
        min: volume.checked_mul(band.min).ok_or_else(out_of_range)?,
        max: volume.checked_mul(band.max).ok_or_else(out_of_range)?,
    })
}

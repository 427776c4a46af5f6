use agricarbon_core::{CarbonError, Methodology, Result, Side};
use rust_decimal::Decimal;

pub fn is_price_allowed(methodology: &Methodology, side: Side, unit_price: Decimal) -> bool {
    methodology.band(side).contains(unit_price)
}

/// Fails with the side's inclusive bounds when `unit_price` falls outside them.
pub fn validate_price(methodology: &Methodology, side: Side, unit_price: Decimal) -> Result<()> {
    if is_price_allowed(methodology, side, unit_price) {
        return Ok(());
    }

    Err(band_violation(methodology, side))
}

pub fn band_violation(methodology: &Methodology, side: Side) -> CarbonError {
    let band = methodology.band(side);
    CarbonError::PriceOutOfBand {
        side,
        min: band.min,
        max: band.max,
    }
}

//! Area resolution, credit estimation and price band validation.
//!
//! Everything here is synchronous and free of I/O. The methodology is passed
//! in by the caller.

pub mod area;
pub mod estimate;
pub mod pricing;

pub use area::{AreaHectares, AreaInput, Boundary, SQUARE_METERS_PER_HECTARE, planar_area_m2};
pub use estimate::CreditEstimator;
pub use pricing::{band_violation, is_price_allowed, validate_price};

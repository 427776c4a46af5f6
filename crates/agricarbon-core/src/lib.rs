pub mod errors;
pub mod methodology;
pub mod models;
pub mod storage;

pub use errors::{CarbonError, Result};
pub use methodology::{Methodology, PriceBand, SequestrationRates};
pub use models::{CreditEstimate, CropType, Principal, Side, Transaction, ValueRange};
pub use storage::{Authenticator, TransactionStore};

use std::sync::Arc;

use agricarbon_core::{
    CarbonError, CropType, Principal, Result, Side, Transaction, TransactionStore,
};
use agricarbon_estimator::{AreaHectares, CreditEstimator, band_violation, validate_price};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRequest {
    pub side: Side,
    pub crop: CropType,
    pub hectares: f64,
    /// A missing price is outside every band.
    pub unit_price: Option<Decimal>,
}

/// Validates, prices and persists carbon credit transactions.
///
/// Every check runs before the store is touched, so a rejected request never
/// leaves a partial row behind.
#[derive(Clone)]
pub struct TransactionRecorder {
    estimator: CreditEstimator,
    store: Arc<dyn TransactionStore>,
}

impl TransactionRecorder {
    pub fn new(estimator: CreditEstimator, store: Arc<dyn TransactionStore>) -> Self {
        Self { estimator, store }
    }

    pub fn estimator(&self) -> &CreditEstimator {
        &self.estimator
    }

    pub async fn record(
        &self,
        principal: &Principal,
        request: TransactionRequest,
    ) -> Result<Transaction> {
        let methodology = self.estimator.methodology();
        let area = AreaHectares::new(request.hectares)?;
        let unit_price = request
            .unit_price
            .ok_or_else(|| band_violation(methodology, request.side))?;
        validate_price(methodology, request.side, unit_price)?;

        let estimate = self.estimator.estimate(area, request.crop)?;
        let total_value = Decimal::try_from(estimate.credits)
            .ok()
            .and_then(|credits| credits.checked_mul(unit_price))
            .ok_or(CarbonError::ValuationOutOfRange {
                credits: estimate.credits,
            })?;

        let transaction = Transaction {
            id: Uuid::new_v4(),
            owner: principal.id.clone(),
            side: request.side,
            crop_type: estimate.crop,
            area_ha: estimate.hectares,
            credits: estimate.credits,
            unit_price,
            total_value,
            method_rate_tco2e_per_ha: estimate.rate,
            created_at: Utc::now(),
        };

        let stored = self.store.insert(transaction).await.map_err(|err| {
            error!("failed to persist carbon transaction: {err}");
            CarbonError::PersistenceFailure(err.to_string())
        })?;

        info!(
            transaction_id = %stored.id,
            owner = %stored.owner,
            side = %stored.side,
            credits = stored.credits,
            "carbon transaction recorded"
        );

        Ok(stored)
    }

    pub async fn list(&self, principal: &Principal) -> Result<Vec<Transaction>> {
        self.store.list_for_owner(&principal.id).await.map_err(|err| {
            error!("failed to load carbon transactions: {err}");
            CarbonError::PersistenceFailure(err.to_string())
        })
    }
}

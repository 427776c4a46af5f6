use std::time::Duration;

use agricarbon_core::{CropType, Side, Transaction, TransactionStore};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};
use uuid::Uuid;

pub async fn connect_database(database_url: &str, acquire_timeout: Duration) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await?;

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .context("failed to apply database migrations")?;
    Ok(())
}

// `insert_seq` breaks `created_at` ties in favour of the later insert.
const LIST_FOR_OWNER: &str = r#"
    SELECT
        id, owner, side, crop_type, area_ha, credits, unit_price,
        total_value, method_rate_tco2e_per_ha, created_at
    FROM carbon_transactions
    WHERE owner = $1
    ORDER BY created_at DESC, insert_seq DESC
"#;

/// `carbon_transactions` table. Rows are append-only.
#[derive(Clone)]
pub struct PgTransactionStore {
    pool: PgPool,
}

impl PgTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    async fn insert(&self, transaction: Transaction) -> Result<Transaction> {
        let row = sqlx::query(
            r#"
            INSERT INTO carbon_transactions (
                id, owner, side, crop_type, area_ha, credits, unit_price,
                total_value, method_rate_tco2e_per_ha, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING
                id, owner, side, crop_type, area_ha, credits, unit_price,
                total_value, method_rate_tco2e_per_ha, created_at
            "#,
        )
        .bind(transaction.id)
        .bind(&transaction.owner)
        .bind(transaction.side.as_str())
        .bind(transaction.crop_type.as_str())
        .bind(transaction.area_ha)
        .bind(transaction.credits)
        .bind(transaction.unit_price)
        .bind(transaction.total_value)
        .bind(transaction.method_rate_tco2e_per_ha)
        .bind(transaction.created_at)
        .fetch_one(&self.pool)
        .await?;

        transaction_from_row(&row)
    }

    async fn list_for_owner(&self, owner: &str) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(LIST_FOR_OWNER)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(transaction_from_row).collect()
    }
}

fn transaction_from_row(row: &PgRow) -> Result<Transaction> {
    let side: String = row.try_get("side")?;
    let crop_type: String = row.try_get("crop_type")?;

    Ok(Transaction {
        id: row.try_get::<Uuid, _>("id")?,
        owner: row.try_get::<String, _>("owner")?,
        side: side.parse::<Side>().map_err(|err| anyhow!(err))?,
        crop_type: crop_type.parse::<CropType>().map_err(|err| anyhow!(err))?,
        area_ha: row.try_get::<f64, _>("area_ha")?,
        credits: row.try_get::<f64, _>("credits")?,
        unit_price: row.try_get::<Decimal, _>("unit_price")?,
        total_value: row.try_get::<Decimal, _>("total_value")?,
        method_rate_tco2e_per_ha: row.try_get::<f64, _>("method_rate_tco2e_per_ha")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

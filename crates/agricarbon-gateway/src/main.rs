mod api;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use agricarbon_advisory::PowerClient;
use agricarbon_core::Authenticator;
use agricarbon_estimator::CreditEstimator;
use agricarbon_ledger::TransactionRecorder;
use agricarbon_platform::{
    PgSessionAuthenticator, PgTransactionStore, ServiceConfig, StaticTokenAuthenticator,
    connect_database, run_migrations,
};
use anyhow::{Context, Result as AnyResult};
use tracing::info;

use crate::api::{AppState, create_router};

const DB_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> AnyResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "agricarbon_gateway=info,tower_http=info".to_string()),
        )
        .init();

    let config = ServiceConfig::from_env("0.0.0.0:8080")?;
    let methodology = Arc::new(config.load_methodology()?);
    let pool = connect_database(&config.database_url, DB_ACQUIRE_TIMEOUT).await?;
    run_migrations(&pool).await?;

    let authenticator: Arc<dyn Authenticator> = match &config.api_tokens {
        Some(tokens) => {
            info!("using static API tokens");
            Arc::new(StaticTokenAuthenticator::parse(tokens)?)
        }
        None => Arc::new(PgSessionAuthenticator::new(pool.clone())),
    };
    let climate = PowerClient::new(config.climate_api_url.clone(), config.upstream_timeout)
        .context("failed to build climate client")?;

    let estimator = CreditEstimator::new(methodology);
    let state = AppState {
        recorder: TransactionRecorder::new(estimator, Arc::new(PgTransactionStore::new(pool))),
        authenticator,
        climate: Arc::new(climate),
    };
    let router = create_router(state);

    let addr: SocketAddr = config.http_addr.parse()?;
    info!("gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

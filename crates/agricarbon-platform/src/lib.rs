pub mod auth;
pub mod config;
pub mod contracts;
pub mod db;

pub use auth::{PgSessionAuthenticator, StaticTokenAuthenticator, bearer_token, token_digest};
pub use config::{ServiceConfig, parse_methodology};
pub use contracts::{
    AgricultureResponse, ClimateData, ClimateDataRequest, ClimateDataResponse, ClimateFailure,
    ClimateQuery, CreateTransactionRequest, CropRate, CreateTransactionResponse, ErrorBody,
    EstimateRequest, ListTransactionsResponse, MethodologyResponse, WeatherResponse,
};
pub use db::{PgTransactionStore, connect_database, run_migrations};

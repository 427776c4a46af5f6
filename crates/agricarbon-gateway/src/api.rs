//! HTTP surface: estimation, owner-scoped transactions and climate advisory.

use std::sync::Arc;

use agricarbon_advisory::{
    ClimateSource, DailyObservation, DateWindow, series_indicators, summarize_agriculture,
    weather_forecast,
};
use agricarbon_core::{Authenticator, CarbonError, CreditEstimate, Principal};
use agricarbon_estimator::AreaInput;
use agricarbon_ledger::{TransactionRecorder, TransactionRequest};
use agricarbon_platform::{
    AgricultureResponse, ClimateData, ClimateDataRequest, ClimateDataResponse, ClimateFailure,
    ClimateQuery, CreateTransactionRequest, CropRate, CreateTransactionResponse, ErrorBody,
    EstimateRequest, ListTransactionsResponse, MethodologyResponse, WeatherResponse,
    bearer_token,
};
use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::{HeaderMap, Method, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, warn};

const AREA_REQUIRED: &str = "Provide hectares > 0 or a valid GeoJSON geometry";
const COORDINATES_REQUIRED: &str = "lat and lon are required";
const DATES_MALFORMED: &str = "start and end must be YYYYMMDD";
const CLIMATE_SOURCE: &str = "NASA POWER";
const AGRICULTURE_WINDOW_DAYS: u32 = 14;
const DATA_WINDOW_DAYS: u32 = 7;

#[derive(Clone)]
pub struct AppState {
    pub recorder: TransactionRecorder,
    pub authenticator: Arc<dyn Authenticator>,
    pub climate: Arc<dyn ClimateSource>,
}

type ApiResult<T> = Result<Json<T>, Response>;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/methodology", get(methodology))
        .route("/estimate", post(estimate))
        .route(
            "/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/climate/weather", get(climate_weather))
        .route("/climate/agriculture", get(climate_agriculture))
        .route(
            "/climate/data",
            get(climate_data_from_query).post(climate_data_from_body),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn methodology(State(state): State<AppState>) -> Json<MethodologyResponse> {
    let methodology = state.recorder.estimator().methodology();
    Json(MethodologyResponse {
        effective_rates: methodology
            .rates
            .entries()
            .map(|(crop, rate)| CropRate { crop, rate })
            .collect(),
        methodology: methodology.clone(),
    })
}

async fn estimate(
    State(state): State<AppState>,
    payload: Result<Json<EstimateRequest>, JsonRejection>,
) -> ApiResult<CreditEstimate> {
    let Json(payload) = payload.map_err(body_rejection)?;
    let crop = payload.crop.unwrap_or_default();

    let estimate = AreaInput::select(payload.hectares, payload.geometry)
        .and_then(|input| state.recorder.estimator().estimate_input(&input, crop))
        .map_err(|err| match err {
            CarbonError::MissingOrInvalidArea => {
                debug!("estimate rejected: no usable area");
                error_response(StatusCode::BAD_REQUEST, ErrorBody::new(AREA_REQUIRED))
            }
            CarbonError::InvalidGeometry { reason } => {
                debug!(%reason, "estimate rejected: invalid geometry");
                error_response(
                    StatusCode::BAD_REQUEST,
                    ErrorBody {
                        error: AREA_REQUIRED.to_string(),
                        detail: Some(reason),
                    },
                )
            }
            other => carbon_error(other),
        })?;

    Ok(Json(estimate))
}

async fn list_transactions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<ListTransactionsResponse> {
    let principal = authenticate(&state, &headers).await?;
    let transactions = state.recorder.list(&principal).await.map_err(carbon_error)?;

    Ok(Json(ListTransactionsResponse { transactions }))
}

async fn create_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> ApiResult<CreateTransactionResponse> {
    let principal = authenticate(&state, &headers).await?;
    let Json(payload) = payload.map_err(body_rejection)?;

    let request = TransactionRequest {
        side: payload.side.unwrap_or_default(),
        crop: payload.crop.unwrap_or_default(),
        hectares: payload.hectares.unwrap_or(0.0),
        unit_price: payload.unit_price,
    };
    let transaction = state
        .recorder
        .record(&principal, request)
        .await
        .map_err(carbon_error)?;

    Ok(Json(CreateTransactionResponse { transaction }))
}

async fn climate_weather(
    State(state): State<AppState>,
    Query(query): Query<ClimateQuery>,
) -> ApiResult<WeatherResponse> {
    let (lat, lon) = query.coordinates().ok_or_else(coordinates_required)?;
    let window = DateWindow::trailing(today(), query.days());
    let series = fetch_series(&state, lat, lon, window).await?;

    Ok(Json(WeatherResponse {
        ok: true,
        lat,
        lon,
        forecast: weather_forecast(&series),
    }))
}

async fn climate_agriculture(
    State(state): State<AppState>,
    Query(query): Query<ClimateQuery>,
) -> ApiResult<AgricultureResponse> {
    let (lat, lon) = query.coordinates().ok_or_else(coordinates_required)?;
    let window = DateWindow::trailing(today(), AGRICULTURE_WINDOW_DAYS);
    let series = fetch_series(&state, lat, lon, window).await?;

    Ok(Json(AgricultureResponse {
        ok: true,
        lat,
        lon,
        summary: summarize_agriculture(&series),
        series,
    }))
}

async fn climate_data_from_query(
    State(state): State<AppState>,
    Query(query): Query<ClimateQuery>,
) -> ApiResult<ClimateDataResponse> {
    climate_data(&state, ClimateDataRequest::from(query)).await
}

async fn climate_data_from_body(
    State(state): State<AppState>,
    payload: Result<Json<ClimateDataRequest>, JsonRejection>,
) -> ApiResult<ClimateDataResponse> {
    let Json(request) = payload.map_err(|rejection| {
        error_response(
            StatusCode::BAD_REQUEST,
            ErrorBody {
                error: COORDINATES_REQUIRED.to_string(),
                detail: Some(rejection.body_text()),
            },
        )
    })?;
    climate_data(&state, request).await
}

async fn climate_data(
    state: &AppState,
    request: ClimateDataRequest,
) -> ApiResult<ClimateDataResponse> {
    let (lat, lon) = request.coordinates().ok_or_else(coordinates_required)?;
    let window = data_window(&request, today())?;
    let series = fetch_series(state, lat, lon, window).await?;

    Ok(Json(ClimateDataResponse {
        ok: true,
        data: ClimateData {
            source: CLIMATE_SOURCE.to_string(),
            lat,
            lon,
            start: window.start_label(),
            end: window.end_label(),
            latest: series.last().cloned(),
            indicators: series_indicators(&series),
            series,
        },
    }))
}

/// Explicit bounds win; a missing bound comes from the trailing week.
fn data_window(request: &ClimateDataRequest, today: NaiveDate) -> Result<DateWindow, Response> {
    let fallback = DateWindow::trailing(today, DATA_WINDOW_DAYS);
    let bound = |raw: &Option<String>, default: NaiveDate| match raw.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => DateWindow::parse_bound(value).map_err(|err| {
            debug!(value, "climate window rejected: {err}");
            error_response(StatusCode::BAD_REQUEST, ErrorBody::new(DATES_MALFORMED))
        }),
        _ => Ok(default),
    };

    Ok(DateWindow {
        start: bound(&request.start, fallback.start)?,
        end: bound(&request.end, fallback.end)?,
    })
}

async fn fetch_series(
    state: &AppState,
    lat: f64,
    lon: f64,
    window: DateWindow,
) -> Result<Vec<DailyObservation>, Response> {
    state
        .climate
        .daily_point(lat, lon, window)
        .await
        .map_err(|err| {
            let failure = CarbonError::Upstream(err.to_string());
            error!(lat, lon, code = failure.error_code(), "climate lookup failed: {err}");
            let status = StatusCode::from_u16(failure.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                Json(ClimateFailure {
                    ok: false,
                    error: err.to_string(),
                }),
            )
                .into_response()
        })
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Principal, Response> {
    let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
    else {
        warn!("request without bearer token rejected");
        return Err(carbon_error(CarbonError::Unauthenticated));
    };

    match state.authenticator.authenticate(token).await {
        Ok(Some(principal)) => Ok(principal),
        Ok(None) => {
            warn!("unknown or expired bearer token rejected");
            Err(carbon_error(CarbonError::Unauthenticated))
        }
        Err(err) => {
            error!("session lookup failed: {err}");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("internal server error"),
            ))
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn carbon_error(err: CarbonError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if err.is_client_error() {
        debug!(code = err.error_code(), "request rejected: {err}");
        return error_response(status, ErrorBody::new(err.to_string()));
    }

    error_response(
        status,
        ErrorBody {
            error: "internal server error".to_string(),
            detail: Some(err.error_code().to_string()),
        },
    )
}

fn body_rejection(rejection: JsonRejection) -> Response {
    debug!("request body rejected: {}", rejection.body_text());
    error_response(
        StatusCode::BAD_REQUEST,
        ErrorBody::new(format!("invalid request body: {}", rejection.body_text())),
    )
}

fn coordinates_required() -> Response {
    error_response(StatusCode::BAD_REQUEST, ErrorBody::new(COORDINATES_REQUIRED))
}

fn error_response(status: StatusCode, body: ErrorBody) -> Response {
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agricarbon_advisory::AdvisoryError;
    use agricarbon_core::{Methodology, Transaction, TransactionStore};
    use agricarbon_estimator::CreditEstimator;
    use agricarbon_ledger::InMemoryTransactionStore;
    use agricarbon_platform::StaticTokenAuthenticator;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct CannedClimate {
        series: Vec<DailyObservation>,
        windows: Mutex<Vec<DateWindow>>,
    }

    #[async_trait]
    impl ClimateSource for CannedClimate {
        async fn daily_point(
            &self,
            _lat: f64,
            _lon: f64,
            window: DateWindow,
        ) -> Result<Vec<DailyObservation>, AdvisoryError> {
            self.windows.lock().unwrap().push(window);
            Ok(self.series.clone())
        }
    }

    struct DownClimate;

    #[async_trait]
    impl ClimateSource for DownClimate {
        async fn daily_point(
            &self,
            _lat: f64,
            _lon: f64,
            _window: DateWindow,
        ) -> Result<Vec<DailyObservation>, AdvisoryError> {
            Err(AdvisoryError::Server { status: 503 })
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl TransactionStore for BrokenStore {
        async fn insert(&self, _transaction: Transaction) -> anyhow::Result<Transaction> {
            anyhow::bail!("pool timed out")
        }

        async fn list_for_owner(&self, _owner: &str) -> anyhow::Result<Vec<Transaction>> {
            anyhow::bail!("pool timed out")
        }
    }

    fn observation(date: &str, t2m: f64, rh2m: f64, prectot: Option<f64>) -> DailyObservation {
        DailyObservation {
            date: date.to_string(),
            t2m: Some(t2m),
            rh2m: Some(rh2m),
            prectot,
            ws10m: Some(3.0),
        }
    }

    fn canned_climate() -> Arc<CannedClimate> {
        Arc::new(CannedClimate {
            series: vec![
                observation("20240301", 22.0, 70.0, Some(4.0)),
                observation("20240302", 24.0, 60.0, None),
            ],
            windows: Mutex::new(Vec::new()),
        })
    }

    fn state_with(store: Arc<dyn TransactionStore>, climate: Arc<dyn ClimateSource>) -> AppState {
        let estimator = CreditEstimator::new(Arc::new(Methodology::default()));
        let authenticator = StaticTokenAuthenticator::default()
            .with_token("token-alice", "alice")
            .with_token("token-bob", "bob");

        AppState {
            recorder: TransactionRecorder::new(estimator, store),
            authenticator: Arc::new(authenticator),
            climate,
        }
    }

    fn test_router() -> Router {
        create_router(state_with(
            Arc::new(InMemoryTransactionStore::default()),
            canned_climate(),
        ))
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let resp = router.clone().oneshot(request).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(router: &Router, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        send(router, builder.body(Body::empty()).unwrap()).await
    }

    async fn post_json(
        router: &Router,
        path: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        send(router, builder.body(Body::from(body.to_string())).unwrap()).await
    }

    #[tokio::test]
    async fn healthz_returns_ok() {
        let router = test_router();
        let req = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn estimate_from_hectares_values_both_sides() {
        let router = test_router();
        let (status, body) = post_json(
            &router,
            "/estimate",
            None,
            json!({ "crop": "rice", "hectares": 2.5 }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hectares"], json!(2.5));
        assert_eq!(body["crop"], json!("rice"));
        assert_eq!(body["rate"], json!(3.0));
        assert_eq!(body["credits"], json!(7.5));
        assert_eq!(body["farmer"]["min"].as_f64(), Some(90.0));
        assert_eq!(body["farmer"]["max"].as_f64(), Some(105.0));
        assert_eq!(body["industry"]["min"].as_f64(), Some(135.0));
        assert_eq!(body["industry"]["max"].as_f64(), Some(142.5));
    }

    #[tokio::test]
    async fn estimate_measures_geometry_when_hectares_absent() {
        let router = test_router();
        let geometry = json!({
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [200.0, 0.0], [200.0, 100.0], [0.0, 100.0], [0.0, 0.0]]]
            }
        });

        let (status, body) = post_json(
            &router,
            "/estimate",
            None,
            json!({ "hectares": 0, "geometry": geometry }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hectares"], json!(2.0));
        assert_eq!(body["crop"], json!("mixed"));
        assert_eq!(body["credits"], json!(5.0));
    }

    #[tokio::test]
    async fn estimate_without_area_is_rejected() {
        let router = test_router();

        let (status, body) = post_json(&router, "/estimate", None, json!({ "crop": "wheat" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": AREA_REQUIRED }));

        let (status, body) =
            post_json(&router, "/estimate", None, json!({ "hectares": -4 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!(AREA_REQUIRED));
    }

    #[tokio::test]
    async fn estimate_with_degenerate_ring_reports_detail() {
        let router = test_router();
        let geometry = json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [0.0, 0.0]]]
        });

        let (status, body) =
            post_json(&router, "/estimate", None, json!({ "geometry": geometry })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!(AREA_REQUIRED));
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn estimate_ignores_unsupported_geometry_when_hectares_given() {
        let router = test_router();
        let (status, body) = post_json(
            &router,
            "/estimate",
            None,
            json!({
                "crop": "rice",
                "hectares": 5,
                "geometry": { "type": "Point", "coordinates": [0, 0] }
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hectares"], json!(5.0));
        assert_eq!(body["credits"], json!(15.0));
    }

    #[tokio::test]
    async fn estimate_with_string_coordinates_reports_area_message() {
        let router = test_router();
        let geometry = json!({
            "type": "Polygon",
            "coordinates": [[["a", "b"], [100, 0], [100, 100], [0, 100], [0, 0]]]
        });

        let (status, body) =
            post_json(&router, "/estimate", None, json!({ "geometry": geometry })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!(AREA_REQUIRED));
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn estimate_rejects_hole_larger_than_shell() {
        let router = test_router();
        let geometry = json!({
            "type": "Polygon",
            "coordinates": [
                [[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]],
                [[-50, -50], [50, -50], [50, 50], [-50, 50], [-50, -50]]
            ]
        });

        let (status, body) =
            post_json(&router, "/estimate", None, json!({ "geometry": geometry })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!(AREA_REQUIRED));
    }

    #[tokio::test]
    async fn estimate_treats_unknown_crop_as_mixed() {
        let router = test_router();
        let (status, body) = post_json(
            &router,
            "/estimate",
            None,
            json!({ "crop": "quinoa", "hectares": 4 }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["crop"], json!("mixed"));
        assert_eq!(body["rate"], json!(2.5));
        assert_eq!(body["credits"], json!(10.0));
    }

    #[tokio::test]
    async fn transactions_require_a_known_bearer_token() {
        let router = test_router();

        let (status, body) = get(&router, "/transactions", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Not authenticated" }));

        let (status, _) = get(&router, "/transactions", Some("token-mallory")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = post_json(
            &router,
            "/transactions",
            None,
            json!({ "hectares": 10, "side": "industry", "unit_price": 19 }),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], json!("Not authenticated"));
    }

    #[tokio::test]
    async fn authentication_precedes_body_parsing() {
        let router = test_router();
        let req = Request::builder()
            .method("POST")
            .uri("/transactions")
            .header("content-type", "application/json")
            .body(Body::from("{ not json"))
            .unwrap();

        let (status, body) = send(&router, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], json!("Not authenticated"));
    }

    #[tokio::test]
    async fn industry_purchase_is_recorded_and_listed() {
        let router = test_router();

        let (status, body) = post_json(
            &router,
            "/transactions",
            Some("token-alice"),
            json!({ "crop": "wheat", "hectares": 10, "side": "industry", "unit_price": 19 }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let transaction = &body["transaction"];
        assert_eq!(transaction["owner"], json!("alice"));
        assert_eq!(transaction["side"], json!("industry"));
        assert_eq!(transaction["crop_type"], json!("wheat"));
        assert_eq!(transaction["area_ha"], json!(10.0));
        assert_eq!(transaction["credits"], json!(20.0));
        assert_eq!(transaction["unit_price"].as_f64(), Some(19.0));
        assert_eq!(transaction["total_value"].as_f64(), Some(380.0));
        assert_eq!(transaction["method_rate_tco2e_per_ha"], json!(2.0));
        assert!(transaction["created_at"].is_string());

        let (status, body) = get(&router, "/transactions", Some("token-alice")).await;
        assert_eq!(status, StatusCode::OK);
        let transactions = body["transactions"].as_array().unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0]["id"], transaction["id"]);
    }

    #[tokio::test]
    async fn farmer_price_outside_band_is_rejected() {
        let router = test_router();

        let (status, body) = post_json(
            &router,
            "/transactions",
            Some("token-alice"),
            json!({ "crop": "maize", "hectares": 5, "side": "farmer", "unit_price": 20 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "unit_price must be 12-14 USD for farmer" }));

        let (_, body) = get(&router, "/transactions", Some("token-alice")).await;
        assert_eq!(body["transactions"], json!([]));
    }

    #[tokio::test]
    async fn transaction_defaults_to_farmer_and_checks_area_first() {
        let router = test_router();

        let (status, body) = post_json(
            &router,
            "/transactions",
            Some("token-alice"),
            json!({ "unit_price": 13 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("hectares must be > 0"));

        let (status, body) = post_json(
            &router,
            "/transactions",
            Some("token-alice"),
            json!({ "hectares": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("unit_price must be 12-14 USD for farmer"));

        let (status, body) = post_json(
            &router,
            "/transactions",
            Some("token-alice"),
            json!({ "hectares": 1, "unit_price": 13 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["transaction"]["side"], json!("farmer"));
        assert_eq!(body["transaction"]["crop_type"], json!("mixed"));
    }

    #[tokio::test]
    async fn unknown_side_is_a_malformed_body() {
        let router = test_router();
        let (status, body) = post_json(
            &router,
            "/transactions",
            Some("token-alice"),
            json!({ "hectares": 1, "side": "broker", "unit_price": 13 }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("invalid request body:")
        );
    }

    #[tokio::test]
    async fn owners_only_list_their_own_transactions() {
        let router = test_router();

        post_json(
            &router,
            "/transactions",
            Some("token-alice"),
            json!({ "crop": "rice", "hectares": 2, "side": "farmer", "unit_price": 12 }),
        )
        .await;
        post_json(
            &router,
            "/transactions",
            Some("token-bob"),
            json!({ "crop": "maize", "hectares": 3, "side": "industry", "unit_price": 18.5 }),
        )
        .await;

        let (_, body) = get(&router, "/transactions", Some("token-bob")).await;
        let transactions = body["transactions"].as_array().unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0]["owner"], json!("bob"));

        let (_, body) = get(&router, "/transactions", Some("token-alice")).await;
        let transactions = body["transactions"].as_array().unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0]["owner"], json!("alice"));
    }

    #[tokio::test]
    async fn store_failures_are_opaque_server_errors() {
        let router = create_router(state_with(Arc::new(BrokenStore), canned_climate()));

        let (status, body) = get(&router, "/transactions", Some("token-alice")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], json!("internal server error"));
        assert!(!body.to_string().contains("pool timed out"));
    }

    #[tokio::test]
    async fn methodology_lists_rates_and_bands() {
        let router = test_router();
        let (status, body) = get(&router, "/methodology", None).await;

        assert_eq!(status, StatusCode::OK);
        let methodology = &body["methodology"];
        assert_eq!(methodology["rates"]["rice"], json!(3.0));
        assert_eq!(methodology["rates"]["maize"], json!(2.2));
        assert_eq!(methodology["farmer_band"]["min"].as_f64(), Some(12.0));
        assert_eq!(methodology["industry_band"]["max"].as_f64(), Some(19.0));
        assert_eq!(
            body["effective_rates"][0],
            json!({ "crop": "rice", "rate": 3.0 })
        );
        assert_eq!(body["effective_rates"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn weather_requires_coordinates() {
        let router = test_router();

        let (status, body) = get(&router, "/climate/weather?lat=1.5", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": COORDINATES_REQUIRED }));

        let (status, _) = get(&router, "/climate/agriculture?lat=abc&lon=2", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn weather_forecast_spans_requested_days() {
        let climate = canned_climate();
        let router = create_router(state_with(
            Arc::new(InMemoryTransactionStore::default()),
            climate.clone(),
        ));

        let (status, body) = get(&router, "/climate/weather?lat=-1.28&lon=36.82&days=3", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));
        assert_eq!(body["lat"], json!(-1.28));
        assert_eq!(body["forecast"][0]["tempC"], json!(22.0));
        assert_eq!(body["forecast"][1]["rainfall"], Value::Null);

        let window = climate.windows.lock().unwrap()[0];
        assert_eq!((window.end - window.start).num_days(), 2);
    }

    #[tokio::test]
    async fn agriculture_summary_covers_a_fortnight() {
        let climate = canned_climate();
        let router = create_router(state_with(
            Arc::new(InMemoryTransactionStore::default()),
            climate.clone(),
        ));

        let (status, body) = get(&router, "/climate/agriculture?lat=10&lon=20", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["totalRain14"], json!(4.0));
        assert_eq!(body["summary"]["avgTemp14"], json!(23.0));
        assert_eq!(body["summary"]["droughtRisk"], json!("high"));
        assert_eq!(body["series"].as_array().unwrap().len(), 2);

        let window = climate.windows.lock().unwrap()[0];
        assert_eq!((window.end - window.start).num_days(), 13);
    }

    #[tokio::test]
    async fn climate_data_honours_explicit_window() {
        let climate = canned_climate();
        let router = create_router(state_with(
            Arc::new(InMemoryTransactionStore::default()),
            climate.clone(),
        ));

        let (status, body) = post_json(
            &router,
            "/climate/data",
            None,
            json!({ "lat": 5, "lon": 6, "start": "20240301", "end": "20240302" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["source"], json!("NASA POWER"));
        assert_eq!(data["start"], json!("20240301"));
        assert_eq!(data["end"], json!("20240302"));
        assert_eq!(data["latest"]["date"], json!("20240302"));
        assert_eq!(data["indicators"]["avgT2M"], json!(23.0));
        assert_eq!(data["indicators"]["totalRain"], json!(4.0));

        let (status, body) = get(&router, "/climate/data?lat=5&lon=6", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["lat"], json!(5.0));
        let window = climate.windows.lock().unwrap()[1];
        assert_eq!((window.end - window.start).num_days(), 6);
    }

    #[tokio::test]
    async fn climate_data_rejects_malformed_dates() {
        let router = test_router();
        let (status, body) =
            get(&router, "/climate/data?lat=5&lon=6&start=2024-03-01", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!(DATES_MALFORMED));
    }

    #[tokio::test]
    async fn upstream_failure_is_reported_as_server_error() {
        let router = create_router(state_with(
            Arc::new(InMemoryTransactionStore::default()),
            Arc::new(DownClimate),
        ));

        let (status, body) = get(&router, "/climate/weather?lat=1&lon=2", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "ok": false, "error": "POWER API error: 503" }));
    }
}

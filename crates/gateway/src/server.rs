//! HTTP surface: ingestion, latest-reading lookup, health.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use telemetry::{
    Broadcaster, Caller, IngestError, Ingestor, LivestockId, ReadingStore, SqliteStore,
    StoreError, TelemetryMonitor, VitalsSample,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{error, Level};

/// Request timeout for the JSON endpoints. The stream endpoint is not
/// behind this layer since dashboard connections stay open indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub ingestor: Arc<Ingestor>,
    pub store: Arc<SqliteStore>,
    pub broadcaster: Arc<Broadcaster>,
    pub monitor: Arc<TelemetryMonitor>,
}

/// Build the gateway router.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route(
            "/livestock-health-data/{livestock_id}",
            post(ingest_reading),
        )
        .route(
            "/livestock-health-data/{livestock_id}/latest",
            get(latest_reading),
        )
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT));

    Router::new()
        .merge(api)
        .route("/livestock-health-stream", get(crate::ws::stream_handler))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "herdpulse-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// `POST /livestock-health-data/{livestock_id}`
///
/// The body is taken as raw bytes so that every malformed-payload case
/// maps to the documented 400 instead of axum's extractor rejections.
async fn ingest_reading(
    State(state): State<AppState>,
    Path(livestock_id): Path<i64>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let sample = match parse_sample(&body) {
        Ok(sample) => sample,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, &message),
    };

    let caller = caller_from(&headers);

    match state
        .ingestor
        .receive(&caller, LivestockId(livestock_id), sample)
        .await
    {
        Ok(ack) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "message": "Health data recorded successfully",
                "ownerId": ack.owner_ref,
            })),
        ),
        Err(err) => ingest_error_response(&err),
    }
}

/// `GET /livestock-health-data/{livestock_id}/latest`
async fn latest_reading(
    State(state): State<AppState>,
    Path(livestock_id): Path<i64>,
) -> (StatusCode, Json<Value>) {
    match state.store.latest_for(LivestockId(livestock_id)).await {
        Ok(Some(stored)) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "reading": stored,
            })),
        ),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            &format!("no readings recorded for livestock {livestock_id}"),
        ),
        Err(StoreError::UnknownLivestock(id)) => error_response(
            StatusCode::NOT_FOUND,
            &format!("livestock {id} is not registered"),
        ),
        Err(err) => {
            error!(livestock_id, error = %err, "latest reading lookup failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
        }
    }
}

/// The caller identity presented as a bearer token.
fn caller_from(headers: &HeaderMap) -> Caller {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map_or_else(Caller::anonymous, Caller::with_token)
}

/// Parse the ingestion body. Both fields are required; extra fields are
/// ignored. `temperature` must be a JSON number, `pulse` a JSON integer.
fn parse_sample(body: &Bytes) -> Result<VitalsSample, String> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|_| "request body must be a JSON object".to_string())?;
    let object = payload
        .as_object()
        .ok_or_else(|| "request body must be a JSON object".to_string())?;

    let temperature = object
        .get("temperature")
        .and_then(Value::as_f64)
        .ok_or_else(|| "temperature is required and must be a number".to_string())?;
    let pulse = object
        .get("pulse")
        .and_then(Value::as_i64)
        .ok_or_else(|| "pulse is required and must be an integer".to_string())?;

    Ok(VitalsSample { temperature, pulse })
}

fn ingest_error_response(err: &IngestError) -> (StatusCode, Json<Value>) {
    let status = match err {
        IngestError::Validation(_) => StatusCode::BAD_REQUEST,
        IngestError::UnknownLivestock(_) => StatusCode::NOT_FOUND,
        IngestError::Unauthorized(_) => StatusCode::FORBIDDEN,
        IngestError::Persistence(_) | IngestError::Directory(_) => {
            error!(error = %err, "ingestion backend failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, &err.to_string())
}

fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({
            "status": "error",
            "message": message,
        })),
    )
}

//! HTTP adapter.
//!
//! GET endpoints over [`ExplorerService`]. Error bodies are a JSON array
//! holding one fixed message; store and cache detail never reaches a client.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::domain::config::HttpConfig;
use crate::domain::error::QueryError;
use crate::domain::resolver::Page;
use crate::service::ExplorerService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ExplorerService>,
}

/// Build the explorer router with tracing, CORS and a request deadline.
pub fn build_router(service: Arc<ExplorerService>, config: &HttpConfig) -> Router {
    let cors = if config.cors_allow_any_origin {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(TimeoutLayer::new(config.request_timeout));

    Router::new()
        .route("/blocks", get(list_blocks))
        .route("/blocks/:id", get(get_block_by_id))
        .route("/search", get(search))
        .route("/get_block", get(get_block))
        .route("/get_block_by_height", get(get_block_by_height))
        .route("/get_block_by_kernel", get(get_block_by_kernel))
        .route("/get_block_range", get(get_block_range))
        .route("/get_status", get(get_status))
        .route("/get_major_block", get(get_major_block))
        .route(
            "/get_coins_in_circulation_mined",
            get(get_coins_in_circulation_mined),
        )
        .route(
            "/get_coins_in_circulation_treasury",
            get(get_coins_in_circulation_treasury),
        )
        .route(
            "/get_total_coins_in_circulation",
            get(get_total_coins_in_circulation),
        )
        .route(
            "/get_next_treasury_emission_block_height",
            get(get_next_treasury_emission_block_height),
        )
        .route(
            "/get_next_treasury_emission_coin_amount",
            get(get_next_treasury_emission_coin_amount),
        )
        .route("/get_total_emission", get(get_total_emission))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .layer(middleware)
        .with_state(AppState { service })
}

/// Client-facing error: a status and a fixed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: &'static str,
}

impl ApiError {
    const NOT_FOUND: &'static str = "Not found";

    fn not_found(message: &'static str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message,
        }
    }

    /// Map a query failure; `not_found` is the body for a miss on this route.
    pub fn from_query(err: QueryError, not_found: &'static str) -> Self {
        match err {
            QueryError::NotFound => Self::not_found(not_found),
            QueryError::AccessDenied => Self::not_found("Incorrect access key"),
            QueryError::DataIntegrity(_) => Self::not_found(not_found),
            QueryError::UpstreamUnavailable => Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: "Service unavailable",
            },
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        Self::from_query(err, Self::NOT_FOUND)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json([self.message])).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// A bare JSON number served as `text/plain`.
fn plain_number<T: Serialize>(value: T) -> Response {
    match serde_json::to_string(&value) {
        Ok(body) => ([(header::CONTENT_TYPE, "text/plain")], body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render number");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HashParams {
    hash: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HeightParams {
    height: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct KernelParams {
    kernel_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    offset: Option<String>,
    limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MajorBlockParams {
    key: Option<String>,
    period: Option<String>,
}

/// Empty or absent is `None`; anything that is not a `T` is a 400.
fn optional_param<T: std::str::FromStr>(
    raw: Option<&str>,
    message: &'static str,
) -> ApiResult<Option<T>> {
    match raw.filter(|p| !p.is_empty()) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|_| ApiError {
            status: StatusCode::BAD_REQUEST,
            message,
        }),
    }
}

async fn list_blocks(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<impl IntoResponse> {
    let offset = optional_param(params.offset.as_deref(), "Incorrect offset")?;
    let limit = optional_param(params.limit.as_deref(), "Incorrect limit")?;
    Ok(Json(state.service.list_blocks(Page::new(offset, limit)).await?))
}

async fn get_block_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.get_block_by_id(&id).await?))
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Response> {
    let term = params.q.unwrap_or_default();
    match state.service.search(&term).await {
        Ok(block) => Ok(Json(block).into_response()),
        Err(QueryError::NotFound) => Ok(Json(json!({ "found": false })).into_response()),
        Err(e) => Err(e.into()),
    }
}

async fn get_block(
    State(state): State<AppState>,
    Query(params): Query<HashParams>,
) -> ApiResult<impl IntoResponse> {
    let hash = params.hash.unwrap_or_default();
    Ok(Json(state.service.get_block_by_hash(&hash).await?))
}

async fn get_block_by_height(
    State(state): State<AppState>,
    Query(params): Query<HeightParams>,
) -> ApiResult<impl IntoResponse> {
    let height = params.height.unwrap_or_default();
    Ok(Json(state.service.get_block_by_height(&height).await?))
}

async fn get_block_by_kernel(
    State(state): State<AppState>,
    Query(params): Query<KernelParams>,
) -> ApiResult<impl IntoResponse> {
    let kernel_id = params.kernel_id.unwrap_or_default();
    let height = state
        .service
        .get_block_height_by_kernel(&kernel_id)
        .await
        .map_err(|e| ApiError::from_query(e, "Incorrect kernel id"))?;
    Ok(Json(json!({ "block": height })))
}

async fn get_block_range(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.get_block_range().await?))
}

async fn get_status(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.service.get_status().await?))
}

async fn get_major_block(
    State(state): State<AppState>,
    Query(params): Query<MajorBlockParams>,
) -> ApiResult<impl IntoResponse> {
    let period = optional_param::<u32>(params.period.as_deref(), "Incorrect period")?;
    let key = params.key.unwrap_or_default();
    Ok(Json(state.service.get_major_block(&key, period).await?))
}

async fn get_coins_in_circulation_mined(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(plain_number(
        state.service.get_coins_in_circulation_mined().await?,
    ))
}

async fn get_coins_in_circulation_treasury(State(state): State<AppState>) -> Response {
    plain_number(state.service.get_coins_in_circulation_treasury())
}

async fn get_total_coins_in_circulation(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(plain_number(
        state.service.get_total_coins_in_circulation().await?,
    ))
}

async fn get_next_treasury_emission_block_height(State(state): State<AppState>) -> Response {
    plain_number(state.service.get_next_treasury_emission_block_height())
}

async fn get_next_treasury_emission_coin_amount(State(state): State<AppState>) -> Response {
    plain_number(state.service.get_next_treasury_emission_coin_amount())
}

async fn get_total_emission(State(state): State<AppState>) -> Response {
    plain_number(state.service.get_total_emission())
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

/// Prometheus text exposition
async fn metrics() -> Response {
    match explorer_telemetry::encode_metrics() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

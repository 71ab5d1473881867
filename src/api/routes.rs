use crate::api::get_embedded_asset;
use crate::config::ServiceSettings;
use crate::db::{CheckinRow, Database, StoreError};
use crate::streak::{self, StreakStats};
use anyhow::Context;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct ApiState {
    pub settings: Arc<ServiceSettings>,
}

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/checkin", post(create_checkin))
        .route("/checkins", get(list_checkins))
        .route("/streak", get(streak_stats))
        .fallback(get(static_assets))
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct CheckinPayload {
    date: String,
    completed: bool,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CheckinsQuery {
    limit: Option<u32>,
}

#[derive(Debug, Serialize)]
struct CheckinsPayload {
    items: Vec<CheckinRow>,
}

async fn index(State(state): State<ApiState>) -> ApiResult<Response> {
    if !state.settings.serve_static {
        return Err(ApiError::NotFound(
            "Landing page is not served in this deployment".to_string(),
        ));
    }

    let (bytes, mime) =
        get_embedded_asset("index.html").context("Embedded index.html is missing")?;
    asset_response(bytes, &mime)
}

async fn create_checkin(
    State(state): State<ApiState>,
    Json(payload): Json<CheckinPayload>,
) -> ApiResult<Json<Value>> {
    let date = parse_date(&payload.date)?;

    let database = Database::open(&state.settings.db_path)?;
    database.insert_checkin(date, payload.completed, payload.note.as_deref())?;

    info!(date = %date, completed = payload.completed, "check-in recorded");
    Ok(Json(json!({ "ok": true })))
}

async fn list_checkins(
    State(state): State<ApiState>,
    Query(query): Query<CheckinsQuery>,
) -> ApiResult<Json<CheckinsPayload>> {
    let limit = query.limit.unwrap_or(state.settings.list_limit);
    let database = Database::open(&state.settings.db_path)?;
    let items = database.recent_checkins(limit)?;

    Ok(Json(CheckinsPayload { items }))
}

async fn streak_stats(State(state): State<ApiState>) -> ApiResult<Json<StreakStats>> {
    let database = Database::open(&state.settings.db_path)?;
    let completed = database.completed_dates_desc()?;
    let today = state.settings.clock.today();

    Ok(Json(streak::compute_streaks(&completed, today)))
}

async fn static_assets(State(state): State<ApiState>, uri: Uri) -> ApiResult<Response> {
    let path = uri.path();

    match get_embedded_asset(path).filter(|_| state.settings.serve_static) {
        Some((bytes, mime)) => asset_response(bytes, &mime),
        None => Err(ApiError::NotFound(format!("Not found: {path}"))),
    }
}

fn asset_response(bytes: Vec<u8>, mime: &str) -> ApiResult<Response> {
    let mut response = Response::new(bytes.into_response().into_body());
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_str(mime)?);
    Ok(response)
}

fn parse_date(input: &str) -> ApiResult<NaiveDate> {
    streak::parse_day(input).ok_or_else(|| {
        ApiError::Unprocessable(format!(
            "Invalid date format: {input}. Expected YYYY-MM-DD, e.g. 2024-01-05"
        ))
    })
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
enum ApiError {
    Unprocessable(String),
    Conflict(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value)
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::DuplicateDate(date) => {
                warn!(date = %date, "duplicate check-in rejected");
                Self::Conflict(format!("A check-in for {date} is already recorded"))
            }
            StoreError::Sqlite(error) => Self::Internal(error.into()),
            StoreError::Other(error) => Self::Internal(error),
        }
    }
}

impl From<axum::http::header::InvalidHeaderValue> for ApiError {
    fn from(value: axum::http::header::InvalidHeaderValue) -> Self {
        Self::Internal(value.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unprocessable(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": message })),
            )
                .into_response(),
            ApiError::Conflict(message) => {
                (StatusCode::CONFLICT, Json(json!({ "error": message }))).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(error) => {
                error!(error = %format!("{error:#}"), "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": error.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

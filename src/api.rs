//! HTTP API for the Parking Engine.
//!
//! This module exposes a minimal REST API around the calculation core
//! using the [`axum`](https://crates.io/crates/axum) framework.  The
//! API quotes exit fees, builds PIX payloads and computes revenue
//! reports; the vehicle store itself is external, so report requests
//! carry the records to aggregate.  Settings live in a JSON file and
//! are the only state shared across requests.

use crate::fee::{compute_fee, validate_config};
use crate::models::{ReportPeriod, Settings, Vehicle};
use crate::pix::{self, encode_payload};
use crate::report::revenue_report;
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Application state shared across requests.
pub struct AppState {
    pub settings: RwLock<Settings>,
}

/// Load the lot settings from a JSON file.  A missing file is not an
/// error: the engine starts with the default settings and the
/// attendant configures it through `PUT /api/settings`.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if path.is_file() {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    } else {
        Ok(Settings::default())
    }
}

/// Build the API router and initialise settings from the given file.
/// Returns the router and a handle to the state.
pub fn build_router(settings_path: &Path) -> Result<(Router, Arc<AppState>)> {
    let settings = load_settings(settings_path)?;
    let state = Arc::new(AppState {
        settings: RwLock::new(settings),
    });
    let router = Router::new()
        .route("/api/settings", get(get_settings).put(put_settings))
        .route("/api/exit/quote", post(quote_handler))
        .route("/api/exit/pix", post(pix_handler))
        .route("/api/reports", post(report_handler))
        .with_state(state.clone());
    Ok((router, state))
}

fn error_body(message: impl ToString) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "error": message.to_string() }))
}

/// Handler for GET /api/settings
async fn get_settings(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let settings = state.settings.read().await;
    Json(settings.clone())
}

/// Handler for PUT /api/settings
async fn put_settings(
    State(state): State<Arc<AppState>>,
    Json(new_settings): Json<Settings>,
) -> impl IntoResponse {
    if let Err(err) = validate_config(&new_settings.pricing) {
        return (StatusCode::UNPROCESSABLE_ENTITY, error_body(err)).into_response();
    }
    let mut settings = state.settings.write().await;
    *settings = new_settings;
    (StatusCode::OK, Json(settings.clone())).into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub entry_time: DateTime<Utc>,
    /// The instant to quote against; the server clock when omitted.
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

/// Handler for POST /api/exit/quote
async fn quote_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QuoteRequest>,
) -> impl IntoResponse {
    let settings = state.settings.read().await;
    let now = request.now.unwrap_or_else(Utc::now);
    match compute_fee(request.entry_time, now, &settings.pricing) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => (StatusCode::UNPROCESSABLE_ENTITY, error_body(err)).into_response(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixRequest {
    /// The frozen amount for the exit, as quoted when the attendant
    /// picked the PIX method.
    pub amount: f64,
    /// Plate used to derive a transaction id when none is supplied.
    #[serde(default)]
    pub plate: Option<String>,
    /// Reuse an id from an earlier encoding of the same exit, so the
    /// copyable text and the rendered QR never diverge.
    #[serde(default)]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PixResponse {
    pub transaction_id: String,
    pub payload: String,
    pub crc: String,
}

/// Handler for POST /api/exit/pix
async fn pix_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PixRequest>,
) -> impl IntoResponse {
    let settings = state.settings.read().await;
    let transaction_id = request.transaction_id.unwrap_or_else(|| {
        pix::transaction_id(request.plate.as_deref().unwrap_or(""), Utc::now())
    });
    match encode_payload(&settings.receiver, request.amount, &transaction_id) {
        Ok(payload) => {
            let response = PixResponse {
                transaction_id,
                crc: payload.crc().to_string(),
                payload: payload.text().to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => (StatusCode::UNPROCESSABLE_ENTITY, error_body(err)).into_response(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub period: ReportPeriod,
    pub vehicles: Vec<Vehicle>,
}

/// Handler for POST /api/reports
async fn report_handler(Json(request): Json<ReportRequest>) -> impl IntoResponse {
    let summary = revenue_report(&request.vehicles, request.period, Local::now());
    Json(summary)
}

/// Launch the API server.  This function builds the router from the
/// given settings file and binds to the supplied address.  It blocks
/// until the server terminates (e.g. when interrupted).
pub async fn serve(addr: &str, settings_path: PathBuf) -> Result<()> {
    let (router, _state) = build_router(&settings_path)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("server listening on {addr}");
    axum::serve(listener, router).await?;
    Ok(())
}

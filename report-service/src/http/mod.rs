use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use meter_client::ReadingStore;
use serde::Deserialize;

use crate::error::Result;
use crate::report::Report;
use crate::services::{IngestService, ReportService};

#[derive(Clone)]
pub struct AppState {
    pub ingest: IngestService,
    pub reports: ReportService,
}

impl AppState {
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self {
            ingest: IngestService::new(store.clone()),
            reports: ReportService::new(store),
        }
    }
}

#[derive(Deserialize)]
pub struct ReportQuery {
    #[serde(rename = "meterId")]
    meter_id: String,
}

pub fn create_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/data", post(ingest_data))
        .route("/api/report", get(get_report))
        .route("/api/meters", get(get_meters))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

async fn ingest_data(State(state): State<AppState>, body: Bytes) -> Result<StatusCode> {
    metrics::counter!("http_ingest_requests_total").increment(1);
    state.ingest.ingest(&body).await?;
    Ok(StatusCode::OK)
}

async fn get_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Report>> {
    let report = state.reports.report(&query.meter_id).await?;
    Ok(Json(report))
}

async fn get_meters(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let meter_ids = state.reports.meter_ids().await?;
    Ok(Json(meter_ids))
}

async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

//! `GET /metrics`: Prometheus exposition (§6, out of core scope beyond the
//! handful of gauges/counters the orchestrator and log dispatcher expose).

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

use crate::app::AppState;

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    metrics::gauge!("dropped_log_records").set(state.log_dispatcher.dropped_count() as f64);
    let body = state.metrics_handle.render();
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}

//! `GET /v1/chat/requests/:requestId/status` (§6).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use crate::app::AppState;

pub async fn tool_status(State(state): State<Arc<AppState>>, Path(request_id): Path<String>) -> Json<serde_json::Value> {
    let statuses = state.tool_status.get_all(&request_id).await;
    Json(serde_json::json!({ "requestId": request_id, "tools": statuses }))
}

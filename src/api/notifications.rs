/// Inbox and report endpoints
///
/// GET /api/notifications lists what is pending for the caller's role;
/// DELETE consumes one entry so it is shown only once.

use crate::{
    api::{session_from_headers, ApiError, AppState},
    error::WorkflowError,
    notify::NotificationRecord,
};
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
    routing::{delete, get},
    Router,
};
use serde_json::{json, Value};

pub fn create_notification_routes() -> Router<AppState> {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/{id}", delete(consume_notification))
        .route("/api/reports", get(list_reports))
}

async fn list_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let session = session_from_headers(&state, &headers).await?;
    let notifications = state.engine.inbox().for_role(session.role).await?;
    Ok(Json(json!({ "notifications": notifications })))
}

/// Consume one notification addressed to the caller's role
async fn consume_notification(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<NotificationRecord>, ApiError> {
    let session = session_from_headers(&state, &headers).await?;

    let pending = state.engine.inbox().for_role(session.role).await?;
    if !pending.iter().any(|record| record.id == id) {
        return Err(WorkflowError::NotFound(format!("notification {}", id)).into());
    }

    Ok(Json(state.engine.inbox().consume(&id).await?))
}

async fn list_reports(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    session_from_headers(&state, &headers).await?;
    let reports = state.engine.list_reports().await?;
    Ok(Json(json!({ "reports": reports })))
}

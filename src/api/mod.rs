/// HTTP API Layer
///
/// This module provides the REST endpoints over the workflow engine. It handles:
/// - User sign-up and session resolution
/// - Case transitions (Stage A through the report)
/// - Role inboxes and archived reports
///
/// The acting user is identified by the `x-user-email` header and resolved to a
/// [`Session`] through the role directory on every request.

use crate::{
    directory::Session,
    error::{AuthFailureKind, WorkflowError},
    workflow::WorkflowEngine,
};
use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    Router,
};
use serde_json::json;
use std::sync::Arc;

// Sign-up and sign-in endpoints
pub mod users;

// Case transition endpoints
pub mod cases;

// Inbox and report listing endpoints
pub mod notifications;

/// Header carrying the authenticated email of the acting user
pub const USER_HEADER: &str = "x-user-email";

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Workflow engine (store, push gateway, exporter, directory, inbox)
    pub engine: Arc<WorkflowEngine>,
}

/// Create every API route
pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        .merge(users::create_user_routes())
        .merge(cases::create_case_routes())
        .merge(notifications::create_notification_routes())
}

/// Workflow error rendered as `{ error, message }` with a matching status
#[derive(Debug)]
pub struct ApiError(pub WorkflowError);

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            WorkflowError::ValidationFailure { .. } | WorkflowError::InvalidCasePath(_) => {
                StatusCode::BAD_REQUEST
            }
            WorkflowError::AuthFailure(AuthFailureKind::EmailInUse) => StatusCode::CONFLICT,
            WorkflowError::AuthFailure(_) => StatusCode::UNAUTHORIZED,
            WorkflowError::RoleNotPermitted { .. } => StatusCode::FORBIDDEN,
            WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkflowError::PrerequisiteMissing { .. }
            | WorkflowError::IllegalTransition { .. }
            | WorkflowError::IncompleteData { .. } => StatusCode::CONFLICT,
            WorkflowError::NotificationUndeliverable(_) | WorkflowError::ExportFailure(_) => {
                StatusCode::BAD_GATEWAY
            }
            WorkflowError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match &self.0 {
            WorkflowError::ValidationFailure { .. } => "validation_failure",
            WorkflowError::AuthFailure(_) => "auth_failure",
            WorkflowError::RoleNotPermitted { .. } => "role_not_permitted",
            WorkflowError::PrerequisiteMissing { .. } => "prerequisite_missing",
            WorkflowError::IllegalTransition { .. } => "illegal_transition",
            WorkflowError::IncompleteData { .. } => "incomplete_data",
            WorkflowError::InvalidCasePath(_) => "invalid_case_path",
            WorkflowError::NotFound(_) => "not_found",
            WorkflowError::PersistenceFailure(_) => "persistence_failure",
            WorkflowError::NotificationUndeliverable(_) => "notification_undeliverable",
            WorkflowError::ExportFailure(_) => "export_failure",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("❌ Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self.0);
        }
        let body = json!({ "error": self.kind(), "message": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

/// Resolve the acting user from the `x-user-email` header
pub async fn session_from_headers(state: &AppState, headers: &HeaderMap) -> Result<Session, ApiError> {
    let email = headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .ok_or(WorkflowError::AuthFailure(AuthFailureKind::Other))?;

    Ok(state.engine.directory().sign_in(email).await?)
}

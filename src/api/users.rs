/// Sign-up and sign-in endpoints
///
/// Sign-up binds an email to one role and registers the device's push token in
/// that role's slot. Sign-in resolves the email to its role and returns the
/// session the client carries for every later call.

use crate::{
    api::{ApiError, AppState},
    directory::{Role, Session, UserProfile},
};
use axum::{extract::State, http::StatusCode, response::Json, routing::post, Router};
use serde::{Deserialize, Serialize};

/// Response for a successful sign-up
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub email: String,
    pub role: Role,
    pub message: String,
}

/// Request body for session resolution
#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub email: String,
}

pub fn create_user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(register_user))
        .route("/api/sessions", post(create_session))
}

/// Register a user
///
/// POST /api/users
/// Body: { "name": "...", "profession": "...", "role": 0, "email": "...", "token": "..." }
async fn register_user(
    State(state): State<AppState>,
    Json(profile): Json<UserProfile>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let role = state.engine.directory().register(&profile).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: format!("{} registered as {}", profile.email, role),
            email: profile.email,
            role,
        }),
    ))
}

/// Resolve the session for an authenticated email
///
/// POST /api/sessions
/// Body: { "email": "..." }
async fn create_session(
    State(state): State<AppState>,
    Json(payload): Json<SessionRequest>,
) -> Result<Json<Session>, ApiError> {
    let session = state.engine.directory().sign_in(payload.email.trim()).await?;
    tracing::info!("🔑 Session opened for {} ({})", session.email, session.role);
    Ok(Json(session))
}

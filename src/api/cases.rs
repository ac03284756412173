/// Case transition REST API endpoints
///
/// One endpoint per transition of the pipeline. Every handler resolves the acting
/// session first; role and precondition checks happen in the engine.

use crate::{
    api::{session_from_headers, ApiError, AppState},
    error::WorkflowError,
    workflow::{ActionForm, CasePath, CaseSnapshot, PermissionForm, RequestForm, TransitionOutcome},
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};

/// Create case routes
///
/// Cases are addressed by their requester email and generated id, mirroring
/// the stored `request/{owner}/{id}` path.
pub fn create_case_routes() -> Router<AppState> {
    Router::new()
        .route("/api/cases", post(submit_request))
        .route("/api/cases/{owner}/{id}", get(get_case).put(resubmit_request))
        .route("/api/cases/{owner}/{id}/permission", post(record_permission))
        .route("/api/cases/{owner}/{id}/approval", post(approve_permission))
        .route("/api/cases/{owner}/{id}/action", post(record_action))
        .route("/api/cases/{owner}/{id}/report", post(generate_report))
}

/// Open a new case with its Stage A request
///
/// POST /api/cases
/// Body: { "nomenclature": "...", "partNo": "...", "recipientReg": "...", ... }
async fn submit_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<RequestForm>,
) -> Result<(StatusCode, Json<TransitionOutcome>), ApiError> {
    let session = session_from_headers(&state, &headers).await?;
    let case = state.engine.open_case(&session)?;
    let outcome = state.engine.submit_request(&session, &case, form).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Resubmit Stage A of an existing case (overwrites the request)
///
/// PUT /api/cases/{owner}/{id}
async fn resubmit_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((owner, id)): Path<(String, String)>,
    Json(form): Json<RequestForm>,
) -> Result<Json<TransitionOutcome>, ApiError> {
    let session = session_from_headers(&state, &headers).await?;
    let case = CasePath::new(owner, id)?;
    Ok(Json(state.engine.submit_request(&session, &case, form).await?))
}

/// Every record of a case with its derived state
///
/// GET /api/cases/{owner}/{id}
async fn get_case(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((owner, id)): Path<(String, String)>,
) -> Result<Json<CaseSnapshot>, ApiError> {
    session_from_headers(&state, &headers).await?;
    let case = CasePath::new(owner, id)?;
    let snapshot = state.engine.load_case(&case).await?;
    if snapshot.state.is_none() {
        return Err(WorkflowError::NotFound(format!("case {}", case)).into());
    }
    Ok(Json(snapshot))
}

/// Stage B
///
/// POST /api/cases/{owner}/{id}/permission
/// Body: { "donorReg": "...", "preserved": true, "cOfAValid": true, "remarks": "...", "approvalRef": "..." }
async fn record_permission(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((owner, id)): Path<(String, String)>,
    Json(form): Json<PermissionForm>,
) -> Result<Json<TransitionOutcome>, ApiError> {
    let session = session_from_headers(&state, &headers).await?;
    let case = CasePath::new(owner, id)?;
    Ok(Json(state.engine.record_permission(&session, &case, form).await?))
}

/// Chief MOC approval of Stage B
///
/// POST /api/cases/{owner}/{id}/approval
async fn approve_permission(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((owner, id)): Path<(String, String)>,
) -> Result<Json<TransitionOutcome>, ApiError> {
    let session = session_from_headers(&state, &headers).await?;
    let case = CasePath::new(owner, id)?;
    Ok(Json(state.engine.approve_permission(&session, &case).await?))
}

/// Stage C
///
/// POST /api/cases/{owner}/{id}/action
/// Body: { "donorSection": { ... }, "recipientSection": { ... } }
async fn record_action(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((owner, id)): Path<(String, String)>,
    Json(form): Json<ActionForm>,
) -> Result<Json<TransitionOutcome>, ApiError> {
    let session = session_from_headers(&state, &headers).await?;
    let case = CasePath::new(owner, id)?;
    Ok(Json(state.engine.record_action(&session, &case, form).await?))
}

/// Stage D
///
/// POST /api/cases/{owner}/{id}/report
async fn generate_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((owner, id)): Path<(String, String)>,
) -> Result<Json<TransitionOutcome>, ApiError> {
    let session = session_from_headers(&state, &headers).await?;
    let case = CasePath::new(owner, id)?;
    Ok(Json(state.engine.generate_report(&session, &case).await?))
}

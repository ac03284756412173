mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use canniflow::directory::Role;
use canniflow::server::create_router;
use common::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn call(app: &Router, method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-email", user);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()));
    (status, value)
}

async fn app() -> (Harness, Router) {
    let h = Harness::new().await;
    let router = create_router(Arc::new(h.engine.clone()));
    (h, router)
}

fn case_uri(case: &str, suffix: &str) -> String {
    let rest = case.trim_start_matches("request/");
    format!("/api/cases/{}{}", rest, suffix)
}

#[tokio::test]
async fn health_check_answers_ok() {
    let (_h, app) = app().await;
    let (status, body) = call(&app, "GET", "/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));
}

#[tokio::test]
async fn stage_a_over_http_returns_the_case_path() {
    let (h, app) = app().await;
    let form = serde_json::to_value(brake_unit_request()).unwrap();

    let (status, body) = call(&app, "POST", "/api/cases", Some(REQUESTER), Some(form)).await;

    assert_eq!(status, StatusCode::CREATED);
    let case = body["case"].as_str().unwrap();
    assert!(case.starts_with("request/bilal@pia.com/"));
    assert_eq!(body["state"], "Created");
    assert_eq!(body["events"][0]["event"], "stage_completed");
    assert_eq!(body["events"][0]["delivery"]["status"], "delivered");
    assert_eq!(h.gateway.sent()[0].to, token(Role::RotablePlanning));

    let (status, snapshot) = call(&app, "GET", &case_uri(case, ""), Some(PLANNER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["request"]["nomenclature"], "Brake Unit");
    assert_eq!(snapshot["state"], "Created");
}

#[tokio::test]
async fn wrong_role_is_forbidden() {
    let (h, app) = app().await;
    let form = serde_json::to_value(brake_unit_request()).unwrap();

    let (status, body) = call(&app, "POST", "/api/cases", Some(PLANNER), Some(form)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "role_not_permitted");
    assert!(h.gateway.sent().is_empty());
}

#[tokio::test]
async fn missing_or_unknown_identity_is_unauthorized() {
    let (_h, app) = app().await;
    let form = serde_json::to_value(brake_unit_request()).unwrap();

    let (status, _) = call(&app, "POST", "/api/cases", None, Some(form.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(&app, "POST", "/api/cases", Some("ghost@pia.com"), Some(form)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Sign-in failed: User role not recognized.");
}

#[tokio::test]
async fn validation_and_precondition_errors_map_to_statuses() {
    let (_h, app) = app().await;

    let mut form = serde_json::to_value(brake_unit_request()).unwrap();
    form["reason"] = json!("");
    let (status, body) = call(&app, "POST", "/api/cases", Some(REQUESTER), Some(form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failure");

    let permission = serde_json::to_value(permission_form()).unwrap();
    let uri = case_uri("request/bilal@pia.com/unknown", "/permission");
    let (status, body) = call(&app, "POST", &uri, Some(PLANNER), Some(permission)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "prerequisite_missing");

    let (status, _) = call(&app, "GET", &case_uri("request/bilal@pia.com/unknown", ""), Some(PLANNER), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn full_pipeline_over_http() {
    let (h, app) = app().await;
    let form = serde_json::to_value(brake_unit_request()).unwrap();
    let (_, body) = call(&app, "POST", "/api/cases", Some(REQUESTER), Some(form)).await;
    let case = body["case"].as_str().unwrap().to_string();

    let permission = serde_json::to_value(permission_form()).unwrap();
    let (status, _) = call(&app, "POST", &case_uri(&case, "/permission"), Some(PLANNER), Some(permission)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, "POST", &case_uri(&case, "/approval"), Some(CHIEF), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "PermissionGranted");

    let action = serde_json::to_value(action_form()).unwrap();
    let (status, _) = call(&app, "POST", &case_uri(&case, "/action"), Some(REQUESTER), Some(action)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, "POST", &case_uri(&case, "/report"), Some(OFFICER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "Reported");

    let (status, body) = call(&app, "GET", "/api/reports", Some(OFFICER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reports"][0]["path"], case.as_str());
    assert_eq!(body["reports"][0]["generatedBy"], "Hina Shah");
    assert_eq!(h.gateway.sent().len(), 5);
}

#[tokio::test]
async fn notifications_are_consumed_once() {
    let (_h, app) = app().await;
    let form = serde_json::to_value(brake_unit_request()).unwrap();
    call(&app, "POST", "/api/cases", Some(REQUESTER), Some(form)).await;

    let (status, body) = call(&app, "GET", "/api/notifications", Some(PLANNER), None).await;
    assert_eq!(status, StatusCode::OK);
    let notifications = body["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["targetRole"], 1);
    let id = notifications[0]["id"].as_str().unwrap().to_string();

    // Other roles cannot consume it
    let uri = format!("/api/notifications/{}", id);
    let (status, _) = call(&app, "DELETE", &uri, Some(CHIEF), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&app, "DELETE", &uri, Some(PLANNER), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Cannibalization Request");

    let (status, _) = call(&app, "DELETE", &uri, Some(PLANNER), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sign_up_then_sign_in() {
    let (_h, app) = app().await;
    let profile = json!({
        "name": "Zara Malik",
        "profession": "Controller",
        "role": 2,
        "email": "zara@pia.com",
        "token": "ExponentPushToken[zara]"
    });

    let (status, body) = call(&app, "POST", "/api/users", None, Some(profile)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], 2);

    let (status, session) = call(&app, "POST", "/api/sessions", None, Some(json!({ "email": "zara@pia.com" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["role"], 2);
    assert_eq!(session["displayName"], "Zara Malik");

    let again = json!({
        "name": "Zara Malik",
        "profession": "Controller",
        "role": 0,
        "email": "zara@pia.com",
        "token": "ExponentPushToken[zara]"
    });
    let (status, body) = call(&app, "POST", "/api/users", None, Some(again)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "Sign-in failed: The email address is already in use by another account."
    );

    let incomplete = json!({ "name": "No Role", "profession": "x", "email": "nr@pia.com", "token": "t" });
    let (status, body) = call(&app, "POST", "/api/users", None, Some(incomplete)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failure");
}

#[tokio::test]
async fn another_requester_cannot_amend_a_case() {
    let (_h, app) = app().await;
    let profile = json!({
        "name": "Omar Farooq",
        "profession": "Technician",
        "role": 0,
        "email": "omar@pia.com",
        "token": "ExponentPushToken[omar]"
    });
    call(&app, "POST", "/api/users", None, Some(profile)).await;

    let form = serde_json::to_value(brake_unit_request()).unwrap();
    let (_, body) = call(&app, "POST", "/api/cases", Some(REQUESTER), Some(form.clone())).await;
    let case = body["case"].as_str().unwrap().to_string();

    let (status, body) = call(&app, "PUT", &case_uri(&case, ""), Some("omar@pia.com"), Some(form)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "role_not_permitted");

    let action = serde_json::to_value(action_form()).unwrap();
    let (status, _) = call(&app, "POST", &case_uri(&case, "/action"), Some("omar@pia.com"), Some(action)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

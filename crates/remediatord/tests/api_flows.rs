//! HTTP-level tests for the remediation API over the in-memory backend.

use axum::body::Body;
use axum::Router;
use http_body_util::BodyExt;
use hyper::{Request, StatusCode};
use remediatord::{build_router, build_state, DaemonConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

const HAPPY_REQUEST: &str =
    "Diagnose high CPU usage on VM-node1 and generate a mitigation script.";

fn app() -> Router {
    let state = build_state(&DaemonConfig::memory()).expect("memory state");
    build_router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn execute(app: &Router, request: &str, require_approval: bool) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/execute",
        Some(json!({ "request": request, "require_approval": require_approval })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body
}

#[tokio::test]
async fn health_is_ok() {
    let (status, body) = send(&app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn execute_without_approval_resolves() {
    let app = app();
    let body = execute(&app, HAPPY_REQUEST, false).await;

    assert_eq!(body["status"], "resolved");
    assert_eq!(body["servicenow_updated"], true);
    assert_eq!(
        body["diagnosis"]["root_cause"],
        "Wsappx process consuming abnormal CPU"
    );
    assert_eq!(body["script"]["language"], "powershell");
    assert!(body["script"]["lint_passed"].is_boolean());
    assert!(body["email_draft"]
        .as_str()
        .unwrap()
        .starts_with("Subject:"));

    let id = body["incident_sys_id"].as_str().unwrap();
    let (status, task) = send(&app, "GET", &format!("/api/v1/tasks/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["status"], "completed");
    assert_eq!(task["state"], "6");
    assert_eq!(task["state_label"], "Resolved");
    assert_eq!(task["number"], "INC0010001");
    assert_eq!(task["updates"][0]["text"], "Plan: diagnose, script, email");
    assert_eq!(task["updates"][0]["type"], "work_notes");
}

#[tokio::test]
async fn execute_defaults_require_approval_to_false() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/execute",
        Some(json!({ "request": "email summary" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "resolved");
}

#[tokio::test]
async fn approval_flow_approve() {
    let app = app();
    let pending = execute(&app, HAPPY_REQUEST, true).await;
    assert_eq!(pending["status"], "waiting_approval");
    assert_eq!(pending["plan"]["steps"][0], "Run diagnostics");
    assert_eq!(
        pending["plan"]["summary"],
        "Agentic plan prepared. Awaiting approval to execute."
    );
    let id = pending["incident_sys_id"].as_str().unwrap().to_string();

    let (_, task) = send(&app, "GET", &format!("/api/v1/tasks/{id}"), None).await;
    assert_eq!(task["status"], "waiting_approval");
    assert_eq!(task["plan"]["steps"].as_array().unwrap().len(), 4);
    assert!(task["result"].is_null());

    let (status, approved) =
        send(&app, "POST", &format!("/api/v1/plans/{id}/approve"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["incident_sys_id"], id.as_str());
    assert_eq!(approved["status"], "resolved");
    assert_eq!(approved["servicenow_updated"], true);

    let (_, task) = send(&app, "GET", &format!("/api/v1/tasks/{id}"), None).await;
    assert_eq!(task["status"], "completed");
    assert_eq!(task["result"]["status"], "resolved");

    let (status, body) = send(&app, "POST", &format!("/api/v1/plans/{id}/approve"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Plan is not awaiting approval.");
}

#[tokio::test]
async fn approval_flow_reject() {
    let app = app();
    let pending = execute(&app, HAPPY_REQUEST, true).await;
    let id = pending["incident_sys_id"].as_str().unwrap().to_string();

    let (status, rejected) =
        send(&app, "POST", &format!("/api/v1/plans/{id}/reject"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["id"], id.as_str());
    assert_eq!(rejected["status"], "manual_intervention_required");
    assert_eq!(
        rejected["message"],
        "Plan rejected. Incident flagged for manual investigation."
    );

    let (_, task) = send(&app, "GET", &format!("/api/v1/tasks/{id}"), None).await;
    assert_eq!(task["status"], "manual_intervention_required");
    assert_eq!(task["state"], "1");
    assert_eq!(
        task["updates"][0]["text"],
        "Automation was rejected. Flagged for manual investigation."
    );

    let (status, _) = send(&app, "POST", &format!("/api/v1/plans/{id}/reject"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let app = app();
    for (method, uri) in [
        ("POST", "/api/v1/plans/missing/approve"),
        ("POST", "/api/v1/plans/missing/reject"),
        ("GET", "/api/v1/tasks/missing"),
    ] {
        let (status, body) = send(&app, method, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .starts_with("Incident not found or not accessible"));
    }
}

#[tokio::test]
async fn execute_requires_request_field() {
    let (status, _) = send(&app(), "POST", "/api/v1/execute", Some(json!({}))).await;
    assert!(status.is_client_error());
}

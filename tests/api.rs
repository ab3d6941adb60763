//! API integration tests -- exercise the axum router end to end against a
//! real on-disk database.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use incidentd::api::state::AppState;
use incidentd::incident::generate::Generator;
use incidentd::incident::query::QueryEngine;
use incidentd::incident::store::IncidentStore;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Fresh seeded database plus a router over it. The TempDir must stay
/// alive for the duration of the test.
fn test_app() -> (tempfile::TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("incidents.db");
    let pool = incidentd::open_storage(db.to_str().unwrap()).unwrap();

    let state = AppState {
        store: IncidentStore::new(pool.clone()),
        query: QueryEngine::new(pool.clone(), "Dave"),
        generator: Generator::new(pool),
    };
    (dir, incidentd::api::router(state))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (_dir, app) = test_app();
    let (status, body) = get(&app, "/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_list_returns_seeded_incidents_newest_first() {
    let (_dir, app) = test_app();
    let (status, body) = get(&app, "/api/v1/incidents").await;
    assert_eq!(status, StatusCode::OK);

    let incidents = body["incidents"].as_array().unwrap();
    assert_eq!(incidents.len(), 9);
    assert_eq!(incidents[0]["number"], 32521);
    assert_eq!(incidents[8]["number"], 32509);

    // Field names and mixed-case statuses are a consumer contract
    let first = &incidents[0];
    for field in ["id", "number", "title", "service", "status", "created_at", "assigned_to"] {
        assert!(first.get(field).is_some(), "missing field {field}");
    }
    assert_eq!(first["status"], "Acknowledged");
}

#[tokio::test]
async fn test_list_with_open_and_me_filters() {
    let (_dir, app) = test_app();

    let (_, body) = get(&app, "/api/v1/incidents?status=Open").await;
    assert_eq!(body["incidents"].as_array().unwrap().len(), 9);

    let (_, body) = get(&app, "/api/v1/incidents?assigned_to=me").await;
    let mine = body["incidents"].as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["assigned_to"], "Dave");

    let (status, body) = get(&app, "/api/v1/incidents?status=Nonsense").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Nonsense"));
}

#[tokio::test]
async fn test_summary_counts() {
    let (_dir, app) = test_app();
    let (status, body) = get(&app, "/api/v1/incidents/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["triggered_count"], 8);
    assert_eq!(body["acknowledged_count"], 1);
    assert_eq!(body["resolved_count"], 0);
    assert_eq!(body["open_count"], 9);
    assert_eq!(body["total"], 9);
}

#[tokio::test]
async fn test_detail_lookup_by_number() {
    let (_dir, app) = test_app();

    let (status, body) = get(&app, "/api/v1/incidents/32519").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["incident"]["title"], "Low Appdex on DB Server");

    let (status, body) = get(&app, "/api/v1/incidents/99999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("99999"));
}

#[tokio::test]
async fn test_bulk_resolve_is_best_effort_and_visible_immediately() {
    let (_dir, app) = test_app();

    let (status, body) = post_json(
        &app,
        "/api/v1/incidents/bulk_update",
        json!({ "incident_ids": [32521, 32519, 99999], "action": "resolve" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["updated"], 2);

    let (_, body) = get(&app, "/api/v1/incidents/summary").await;
    assert_eq!(body["resolved_count"], 2);
    assert_eq!(body["open_count"], 7);
    assert_eq!(body["total"], 9);
}

#[tokio::test]
async fn test_bulk_update_validation_errors() {
    let (_dir, app) = test_app();

    let (status, body) = post_json(
        &app,
        "/api/v1/incidents/bulk_update",
        json!({ "incident_ids": [], "action": "resolve" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("incident_ids"));

    let (status, _) = post_json(
        &app,
        "/api/v1/incidents/bulk_update",
        json!({ "incident_ids": [32519] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_json(
        &app,
        "/api/v1/incidents/bulk_update",
        json!({ "incident_ids": [32519], "action": "escalate" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("escalate"));

    let (status, body) = post_json(
        &app,
        "/api/v1/incidents/bulk_update",
        json!({ "incident_ids": [32519], "action": "reassign" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("assignee"));

    // None of the failed calls wrote anything
    let (_, body) = get(&app, "/api/v1/incidents/32519").await;
    assert_eq!(body["incident"]["status"], "Triggered");
    assert_eq!(body["incident"]["assigned_to"], "--");
}

#[tokio::test]
async fn test_bulk_reassign() {
    let (_dir, app) = test_app();

    let (status, _) = post_json(
        &app,
        "/api/v1/incidents/bulk_update",
        json!({ "incident_ids": [32519, 32518], "action": "reassign", "assignee": "Priya" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get(&app, "/api/v1/incidents/32518").await;
    assert_eq!(body["incident"]["assigned_to"], "Priya");
}

#[tokio::test]
async fn test_generate_defaults_to_one() {
    let (_dir, app) = test_app();

    let (status, body) = post(&app, "/api/v1/incidents/generate").await;
    assert_eq!(status, StatusCode::OK);
    let ids = body["ids"].as_array().unwrap();
    assert_eq!(ids.len(), 1);
    assert_eq!(ids[0], 32522);

    let (_, body) = get(&app, "/api/v1/incidents/32522").await;
    let status_str = body["incident"]["status"].as_str().unwrap();
    assert!(status_str == "Triggered" || status_str == "Acknowledged");
    assert_eq!(body["incident"]["assigned_to"], "--");
}

#[tokio::test]
async fn test_generate_count_mints_consecutive_numbers() {
    let (_dir, app) = test_app();

    let (status, body) = post(&app, "/api/v1/incidents/generate?count=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Generated 3 incidents");
    assert_eq!(body["ids"], json!([32522, 32523, 32524]));

    let (_, body) = get(&app, "/api/v1/incidents/summary").await;
    assert_eq!(body["total"], 12);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (_dir, app) = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use super::common::*;
use crate::pipeline::domain::CategoryId;
use crate::pipeline::gate_router;
use crate::pipeline::service::RecordService;

fn post_json(uri: &str, body: &impl serde::Serialize) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serializes")))
        .expect("request builds")
}

fn json_body(
    body: &impl serde::Serialize,
) -> Result<axum::Json<serde_json::Value>, JsonRejection> {
    Ok(axum::Json(serde_json::to_value(body).expect("serializes")))
}

#[tokio::test]
async fn validate_route_creates_written_records() {
    let (service, store) = build_service();
    let router = gate_router(Arc::new(service));

    let response = router
        .oneshot(post_json("/api/v1/records/validate", &robot_vacuum_input()))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["path"], "evaluated");
    assert_eq!(payload["decision"]["verdict"], "WRITE");
    assert_eq!(payload["exitCode"], 0);
    assert_eq!(payload["record"]["isFallback"], false);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn validate_route_maps_repair_and_reject() {
    let (service, _) = build_service();
    let router = gate_router(Arc::new(service));
    let mut rejected = robot_vacuum_input();
    rejected.specs.remove("heightCm");

    let repair = router
        .clone()
        .oneshot(post_json("/api/v1/records/validate", &air_purifier_input()))
        .await
        .expect("route executes");
    let reject = router
        .oneshot(post_json("/api/v1/records/validate", &rejected))
        .await
        .expect("route executes");

    assert_eq!(repair.status(), StatusCode::ACCEPTED);
    assert_eq!(reject.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(reject).await;
    assert_eq!(payload["decision"]["violations"][0]["field"], "heightCm");
    assert_eq!(
        payload["decision"]["violations"][0]["kind"],
        "MISSING_REQUIRED_FIELD"
    );
}

#[tokio::test]
async fn validate_handler_maps_pipeline_errors() {
    let service = Arc::new(build_service().0);
    let mut unknown = robot_vacuum_input();
    unknown.category = CategoryId::new("toaster");
    let mut malformed = robot_vacuum_input();
    malformed.sources.clear();

    let not_found = crate::pipeline::router::validate_handler::<MemoryStore>(
        State(service.clone()),
        json_body(&unknown),
    )
    .await;
    let structural = crate::pipeline::router::validate_handler::<MemoryStore>(
        State(service),
        json_body(&malformed),
    )
    .await;

    assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
    assert_eq!(structural.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(structural).await;
    assert_eq!(payload["kind"], "STRUCTURAL_ERROR");
}

#[tokio::test]
async fn validate_handler_returns_conflict_and_internal_errors() {
    let service = Arc::new(build_service().0);
    service.submit(&robot_vacuum_input()).expect("first write");

    let conflict = crate::pipeline::router::validate_handler::<MemoryStore>(
        State(service),
        json_body(&robot_vacuum_input()),
    )
    .await;
    assert_eq!(conflict.status(), StatusCode::CONFLICT);

    let offline = Arc::new(RecordService::new(gate(), Arc::new(UnavailableStore)));
    let failure = crate::pipeline::router::validate_handler::<UnavailableStore>(
        State(offline),
        json_body(&robot_vacuum_input()),
    )
    .await;
    assert_eq!(failure.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn record_route_returns_stored_and_missing_records() {
    let (service, _) = build_service();
    let service = Arc::new(service);
    service.submit(&robot_vacuum_input()).expect("write");
    let router = gate_router(service);

    let found = router
        .clone()
        .oneshot(
            Request::get("/api/v1/records/rv-001")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    let missing = router
        .oneshot(
            Request::get("/api/v1/records/nope")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(found.status(), StatusCode::OK);
    let payload = read_json_body(found).await;
    assert_eq!(payload["id"], "rv-001");
    assert_eq!(payload["specs"]["navigationType"], "lidar");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_and_categories_routes_describe_state() {
    let (service, _) = build_service();
    let service = Arc::new(service);
    service.submit(&robot_vacuum_input()).expect("write");
    let router = gate_router(service);

    let listed = router
        .clone()
        .oneshot(
            Request::get("/api/v1/records?limit=5")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    let categories = router
        .oneshot(
            Request::get("/api/v1/categories")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    let listed = read_json_body(listed).await;
    assert_eq!(listed[0]["recordId"], "rv-001");
    assert_eq!(listed[0]["verdict"], "WRITE");
    let categories = read_json_body(categories).await;
    assert_eq!(categories.as_array().map(Vec::len), Some(3));
    assert_eq!(categories[2]["tier"], "stub");
}

#[tokio::test]
async fn legacy_route_stores_fallback_records() {
    let (service, store) = build_service();
    let router = gate_router(Arc::new(service));
    let payload = serde_json::json!({
        "id": "legacy-1",
        "category": "robot-vacuum",
        "product": { "brand": "Acme", "model": "Classic" },
        "description": "Bump navigation robot with mopping pad"
    });

    let response = router
        .oneshot(post_json("/api/v1/records/legacy", &payload))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["isFallback"], true);
    assert_eq!(body["tags"]["mopping"], true);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn record_missing_an_envelope_key_is_structural() {
    let (service, store) = build_service();
    let router = gate_router(Arc::new(service));
    let mut payload = serde_json::to_value(robot_vacuum_input()).expect("serializes");
    payload
        .as_object_mut()
        .expect("record object")
        .remove("sources");

    let response = router
        .oneshot(post_json("/api/v1/records/validate", &payload))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["kind"], "STRUCTURAL_ERROR");
    assert!(body["error"]
        .as_str()
        .is_some_and(|error| error.contains("sources")));
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn body_that_is_not_json_keeps_the_error_shape() {
    let (service, _) = build_service();
    let router = gate_router(Arc::new(service));

    let response = router
        .oneshot(
            Request::post("/api/v1/records/validate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{ not json"))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(response).await;
    assert_eq!(body["kind"], "REQUEST_ERROR");
}

#[tokio::test]
async fn validate_route_sends_legacy_records_to_the_fallback_path() {
    let (service, store) = build_service();
    let router = gate_router(Arc::new(service));
    let mut raw = robot_vacuum_input();
    raw.specs.clear();
    raw.legacy_description = Some("LiDAR robot with mopping".to_string());

    let response = router
        .oneshot(post_json("/api/v1/records/validate", &raw))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["path"], "fallback");
    assert_eq!(body["isFallback"], true);
    assert_eq!(store.len(), 1);
}

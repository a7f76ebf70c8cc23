//! Health check and general HTTP behaviour.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, get_request, StubCompletion, TestApp, MODEL_REPLY};
use sqlx::PgPool;

#[tokio::test]
async fn health_reports_degraded_without_database() {
    let app = TestApp::new(StubCompletion::replying(MODEL_REPLY));

    let response = app.send(get_request("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["db_healthy"], false);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = TestApp::new(StubCompletion::replying(MODEL_REPLY));
    let response = app.send(get_request("/this-route-does-not-exist")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let app = TestApp::new(StubCompletion::replying(MODEL_REPLY));
    let response = app.send(get_request("/health")).await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let app = TestApp::new(StubCompletion::replying(MODEL_REPLY));
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/feedback")
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "authorization,content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:5173"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn health_is_ok_with_database(pool: PgPool) {
    let app = common::TestApp::with_pool(StubCompletion::replying(MODEL_REPLY), pool);

    let response = app.send(get_request("/health")).await;
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["db_healthy"], true);
}

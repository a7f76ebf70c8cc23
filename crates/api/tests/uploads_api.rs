//! Integration tests for the upload history endpoints.
//!
//! These need the PostgreSQL instance named by `DATABASE_URL`.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, json_request, StubCompletion, TestApp, MODEL_REPLY};
use sqlx::PgPool;

const UPLOADS: &str = "/api/v1/uploads";

fn app(pool: PgPool) -> TestApp {
    TestApp::with_pool(StubCompletion::replying(MODEL_REPLY), pool)
}

#[tokio::test]
async fn uploads_require_authentication() {
    let app = TestApp::new(StubCompletion::replying(MODEL_REPLY));
    let body = serde_json::json!({ "videoUrl": "https://cdn.example/a.mp4" });

    let response = app
        .send(json_request(Method::POST, UPLOADS, &body, None, None))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn created_upload_is_listed_for_its_owner_only(pool: PgPool) {
    let app = app(pool);
    let alice = app.token("alice");
    let bob = app.token("bob");

    let body = serde_json::json!({
        "videoUrl": "https://cdn.example/rally.mp4",
        "poseSummary": "Player analysis: - Knees are properly bent.",
        "tips": ["1. Load the outside leg."]
    });
    let response = app
        .send(json_request(Method::POST, UPLOADS, &body, Some(&alice), None))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["data"]["id"].as_i64().unwrap();
    assert_eq!(created["data"]["owner_uid"], "alice");

    let response = app
        .send(json_request(Method::GET, UPLOADS, &serde_json::json!({}), Some(&alice), None))
        .await;
    let listed = body_json(response).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
    assert_eq!(listed["data"][0]["tips"][0], "1. Load the outside leg.");

    let response = app
        .send(json_request(
            Method::GET,
            &format!("{UPLOADS}/{id}"),
            &serde_json::json!({}),
            Some(&bob),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn blank_video_url_is_rejected(pool: PgPool) {
    let app = app(pool);
    let token = app.token("alice");

    let response = app
        .send(json_request(
            Method::POST,
            UPLOADS,
            &serde_json::json!({ "videoUrl": "  " }),
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

//! Integration tests for `/api/v1/campaigns`.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{body_json, build_test_app, visuals_body, wait_for_campaign};
use serde_json::json;

#[tokio::test]
async fn submit_returns_202_with_queued_jobs() {
    let app = build_test_app(Duration::ZERO);

    let response = app
        .post_json(
            "/api/v1/campaigns/spring/visuals",
            visuals_body(json!([
                { "id": "p1", "type": "text_image", "caption": "Fresh bread" },
                { "id": "p2", "type": "text_video", "caption": "Behind the oven" },
                { "id": "p3", "type": "text" },
            ])),
        )
        .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;
    let jobs = json["data"].as_array().unwrap();
    assert_eq!(jobs.len(), 3);
    assert!(jobs.iter().all(|j| j["status"] == "queued"));
    assert_eq!(jobs[0]["content_type"], "image");
    assert_eq!(jobs[2]["content_type"], "video");
    assert_eq!(jobs[2]["estimated_completion_seconds"], 120);
}

#[tokio::test]
async fn malformed_post_returns_400_and_creates_nothing() {
    let app = build_test_app(Duration::ZERO);

    let response = app
        .post_json(
            "/api/v1/campaigns/spring/visuals",
            visuals_body(json!([
                { "id": "p1", "type": "text_image" },
                { "type": "text_image" },
            ])),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let status = body_json(app.get("/api/v1/campaigns/spring/status").await).await;
    assert_eq!(status["data"]["total_jobs"], 0);
}

#[tokio::test]
async fn numeric_post_ids_are_accepted() {
    let app = build_test_app(Duration::ZERO);

    let response = app
        .post_json(
            "/api/v1/campaigns/spring/visuals",
            visuals_body(json!([{ "id": 42, "type": "text_image" }])),
        )
        .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["post_id"], "42");
}

#[tokio::test]
async fn undecodable_body_returns_400_envelope() {
    let app = build_test_app(Duration::ZERO);

    let response = app
        .post_json("/api/v1/campaigns/spring/visuals", json!({ "posts": "none" }))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    assert!(json["error"].as_str().unwrap().contains("posts"));
}

#[tokio::test]
async fn missing_body_returns_400_envelope() {
    let app = build_test_app(Duration::ZERO);

    let response = app.post_empty("/api/v1/campaigns/spring/visuals").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn unknown_campaign_reports_empty_status() {
    let app = build_test_app(Duration::ZERO);

    let response = app.get("/api/v1/campaigns/nobody/status").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["total_jobs"], 0);
    assert_eq!(json["data"]["is_complete"], true);
    assert_eq!(json["data"]["overall_progress"], 0.0);
}

#[tokio::test]
async fn campaign_completes_with_visuals() {
    let app = build_test_app(Duration::from_millis(5));
    app.engine.start_workers(2).await.unwrap();

    app.post_json(
        "/api/v1/campaigns/summer/visuals",
        visuals_body(json!([
            { "id": "p1", "type": "text_image" },
            { "id": "p2", "type": "text_video" },
        ])),
    )
    .await;
    let status = wait_for_campaign(&app, "summer").await;
    app.engine.stop_workers().await;

    assert_eq!(status["total_jobs"], 3);
    assert_eq!(status["completed_jobs"], 3);
    assert_eq!(status["overall_progress"], 1.0);
    assert!(status["posts_with_visuals"]["p1"]["image_url"].is_string());
    assert!(status["posts_with_visuals"]["p1"]["video_url"].is_null());
    assert!(status["posts_with_visuals"]["p2"]["video_url"].is_string());
}

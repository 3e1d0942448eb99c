//! HTTP router tests driven through `tower::ServiceExt::oneshot`.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::{entries, harness, Fault, VIDEO_ID, VIDEO_URL};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use vidlens::config::Settings;
use vidlens::server::{router, AppState};

fn app_with(settings: Settings, fault: Fault) -> Router {
    let h = harness(Some(entries()), fault, settings);
    router(AppState::new(h.orchestrator).unwrap()).unwrap()
}

fn app() -> Router {
    app_with(Settings::default(), Fault::None)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, value)
}

async fn process(app: &Router) -> (StatusCode, Value) {
    let (status, _, body) = send(
        app,
        Method::POST,
        "/process_video",
        Some(json!({ "youtube_url": VIDEO_URL })),
    )
    .await;
    (status, body)
}

#[tokio::test]
async fn test_health_and_root() {
    let app = app();

    let (status, _, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["rate_limiting"], true);

    let (status, _, body) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["endpoints"].as_array().unwrap().len() >= 3);
}

#[tokio::test]
async fn test_process_chat_and_info() {
    let app = app();

    let (status, body) = process(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["video_id"], VIDEO_ID);
    assert_eq!(body["processing_mode"], "transcript");
    assert_eq!(body["chunks_created"], 2);

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/chat",
        Some(json!({ "video_id": VIDEO_ID, "question": "Where is the dog?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["relevant_timestamps"][0]["timestamp"], 40.0);
    assert_eq!(body["sources_count"], 2);

    let (status, _, body) = send(&app, Method::GET, &format!("/video/{}", VIDEO_ID), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transcript_length"], 3);
    assert_eq!(body["sections"].as_array().unwrap().len(), 2);

    let (_, _, body) = send(&app, Method::GET, "/videos", None).await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_visual_search_response() {
    let app = app();
    process(&app).await;

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/visual_search",
        Some(json!({ "video_id": VIDEO_ID, "query": "a sleeping cat" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "a sleeping cat");
    assert_eq!(body["visual_index"], false);
    assert_eq!(body["matches"][0]["confidence"], "high");
    assert_eq!(body["matches"][0]["source"], "chunk");
    assert!(body["narrative"].is_string());
}

#[tokio::test]
async fn test_validation_and_not_found() {
    let app = app();

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/process_video",
        Some(json!({ "youtube_url": "https://evil.example.com/watch?v=abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_type"], "validation_error");

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/chat",
        Some(json!({ "video_id": "missing", "question": "hello?" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_type"], "not_found");

    let (status, _, _) = send(&app, Method::GET, "/video/bad%20id", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_malformed_body_is_validation_error() {
    let app = app();

    let (status, headers, body) = send(
        &app,
        Method::POST,
        "/chat",
        Some(json!({ "video_id": "abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(body["error_type"], "validation_error");
    assert!(body["message"].as_str().unwrap().contains("question"));

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/visual_search",
        Some(json!({ "video_id": "abc", "query": 42 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_type"], "validation_error");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/process_video")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error_type"], "validation_error");
}

#[tokio::test]
async fn test_integrity_failure_is_reported() {
    let app = app_with(Settings::default(), Fault::DropLast);

    let (status, body) = process(&app).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_type"], "embedding_integrity");
    assert_eq!(body["details"]["expected"], 2);
    assert_eq!(body["details"]["actual"], 1);

    let (status, _, _) = send(&app, Method::GET, &format!("/video/{}", VIDEO_ID), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rate_limit_rejects_with_retry_after() {
    let mut settings = Settings::default();
    settings.rate_limit.per_minute = 2;
    let app = app_with(settings, Fault::None);

    let question = json!({ "video_id": "missing", "question": "hello?" });
    for _ in 0..2 {
        let (status, _, _) = send(&app, Method::POST, "/chat", Some(question.clone())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    let (status, headers, body) = send(&app, Method::POST, "/chat", Some(question)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error_type"], "rate_limit_exceeded");
    assert_eq!(body["details"]["scope"], "minute");
    assert!(headers.contains_key(header::RETRY_AFTER));

    // Unlimited endpoints stay available.
    let (status, _, _) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, usage) = send(&app, Method::GET, "/rate_limit/unknown", None).await;
    assert_eq!(usage["usage"]["requests_last_minute"], 2);
    assert_eq!(usage["usage"]["minute_limit"], 2);
}

#[tokio::test]
async fn test_cache_admin() {
    let app = app();
    process(&app).await;

    let question = json!({ "video_id": VIDEO_ID, "question": "Where is the cat?" });
    send(&app, Method::POST, "/chat", Some(question.clone())).await;
    send(&app, Method::POST, "/chat", Some(question)).await;

    let (_, _, stats) = send(&app, Method::GET, "/cache/stats", None).await;
    assert_eq!(stats["size"], 1);
    assert_eq!(stats["hits"], 1);
    assert_eq!(stats["misses"], 1);

    let (status, _, body) = send(&app, Method::POST, "/cache/clear", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], 1);

    let (_, _, stats) = send(&app, Method::GET, "/cache/stats", None).await;
    assert_eq!(stats["size"], 0);
    assert_eq!(stats["hits"], 0);
}

#[tokio::test]
async fn test_cache_clear_is_rate_limited() {
    let mut settings = Settings::default();
    settings.rate_limit.per_minute = 1;
    let app = app_with(settings, Fault::None);

    let (status, _, _) = send(&app, Method::POST, "/cache/clear", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = send(&app, Method::POST, "/cache/clear", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error_type"], "rate_limit_exceeded");

    let (status, _, _) = send(&app, Method::GET, "/cache/stats", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_delete_video() {
    let app = app();
    process(&app).await;

    let uri = format!("/video/{}", VIDEO_ID);
    let (status, _, body) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);

    let (status, _, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

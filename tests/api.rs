//! API endpoint integration tests

use std::sync::Arc;

use aikya::api::{ApiServer, AppState};
use aikya::config::OcrConfig;
use aikya::ocr::OcrClient;
use axum::{
    Json, Router,
    body::Body,
    http::{Request, StatusCode, header},
    routing::post,
};
use serde_json::{Value, json};
use tower::ServiceExt;

mod common;
use common::{CountingNews, RecordingSpeech, ScriptedChat, dialog};

/// Build a test API router over scripted services
fn build_test_router(speech: Option<&Arc<RecordingSpeech>>, ocr_url: &str) -> Router {
    let chat = ScriptedChat::echo();
    let news = CountingNews::with_articles(2);
    let dialog = dialog(&chat, &news, speech);
    let ocr = OcrClient::new(&OcrConfig {
        url: ocr_url.to_string(),
        max_bytes: 1024,
    });

    let state = Arc::new(AppState::new(Arc::new(dialog), ocr));
    ApiServer::new(state, 0).router()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router(None, "http://127.0.0.1:9");

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test(start_paused = true)]
async fn test_prompt_returns_turn() {
    let app = build_test_router(None, "http://127.0.0.1:9");

    let (status, json) = send(&app, "POST", "/api/prompt", Some(json!({ "prompt": "hi" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["mode"], "ready");
    assert_eq!(json["turn"]["kind"], "chat");
    assert_eq!(json["turn"]["prompt_text"], "hi");
    assert_eq!(json["turn"]["response_markup"], "<b>Echo:</b> hi ");
}

#[tokio::test]
async fn test_empty_prompt_is_rejected() {
    let app = build_test_router(None, "http://127.0.0.1:9");

    let (status, json) = send(&app, "POST", "/api/prompt", Some(json!({ "prompt": "  " }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test(start_paused = true)]
async fn test_news_card_then_region() {
    let app = build_test_router(None, "http://127.0.0.1:9");

    let (status, json) = send(&app, "POST", "/api/cards/news", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["mode"], "awaiting_region");
    assert_eq!(json["turn"]["kind"], "region_prompt");

    let (_, conversation) = send(&app, "GET", "/api/conversation", None).await;
    assert!(conversation["pending_news_prompt"].is_string());

    let (_, json) = send(&app, "POST", "/api/prompt", Some(json!({ "prompt": "USA" }))).await;
    assert_eq!(json["mode"], "ready");
    assert_eq!(json["turn"]["kind"], "news");

    let (_, conversation) = send(&app, "GET", "/api/conversation", None).await;
    assert!(conversation["pending_news_prompt"].is_null());
    assert_eq!(conversation["history"].as_array().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_new_conversation_resets() {
    let app = build_test_router(None, "http://127.0.0.1:9");

    send(&app, "POST", "/api/prompt", Some(json!({ "prompt": "hello" }))).await;
    let (status, _) = send(&app, "POST", "/api/conversation/new", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, conversation) = send(&app, "GET", "/api/conversation", None).await;
    assert_eq!(conversation["mode"], "idle");
    assert!(conversation["current_turn"].is_null());
    assert_eq!(conversation["display"], "");

    let (_, display) = send(&app, "GET", "/api/display", None).await;
    assert_eq!(display["text"], "");
    assert_eq!(display["revealing"], false);
}

#[tokio::test(start_paused = true)]
async fn test_display_fills_after_reveal() {
    let app = build_test_router(None, "http://127.0.0.1:9");

    send(&app, "POST", "/api/prompt", Some(json!({ "prompt": "a b" }))).await;
    tokio::time::sleep(std::time::Duration::from_secs(1)).await;

    let (_, display) = send(&app, "GET", "/api/display", None).await;
    assert_eq!(display["text"], "<b>Echo:</b> a b ");
    assert_eq!(display["revealing"], false);
}

#[tokio::test]
async fn test_speech_without_backend() {
    let app = build_test_router(None, "http://127.0.0.1:9");

    let (status, json) = send(&app, "GET", "/api/speech", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["tts_available"], false);
    assert_eq!(json["status"], "idle");
    assert_eq!(json["muted"], false);
}

#[tokio::test]
async fn test_mute_and_toggle() {
    let speech = RecordingSpeech::new(std::time::Duration::from_millis(10));
    let app = build_test_router(Some(&speech), "http://127.0.0.1:9");

    let (_, json) = send(&app, "POST", "/api/speech/mute", Some(json!({ "muted": true }))).await;
    assert_eq!(json["muted"], true);
    assert_eq!(json["tts_available"], true);
    assert_eq!(json["backend"], "recording");

    let (_, json) = send(&app, "POST", "/api/speech/toggle-mute", None).await;
    assert_eq!(json["muted"], false);

    let (_, json) = send(&app, "POST", "/api/speech/stop", None).await;
    assert_eq!(json["status"], "idle");
}

#[tokio::test(start_paused = true)]
async fn test_replay_current_turn() {
    let speech = RecordingSpeech::new(std::time::Duration::from_secs(1));
    let app = build_test_router(Some(&speech), "http://127.0.0.1:9");

    let (_, json) = send(&app, "POST", "/api/speech/replay", None).await;
    assert!(json["session"].is_null());

    send(&app, "POST", "/api/prompt", Some(json!({ "prompt": "repeat me" }))).await;
    let (_, json) = send(&app, "POST", "/api/speech/replay", None).await;
    assert_eq!(json["session"]["text"], "Echo: repeat me");
}

#[tokio::test]
async fn test_voice_selection() {
    let app = build_test_router(None, "http://127.0.0.1:9");

    let (_, json) = send(&app, "GET", "/api/voices", None).await;
    assert_eq!(json["voices"].as_array().unwrap().len(), 4);
    assert_eq!(json["selected"], "en-US-AriaNeural");

    let (status, json) = send(
        &app,
        "PUT",
        "/api/voices/selected",
        Some(json!({ "voice_id": "en-US-Nobody" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "unknown_voice");

    let (status, json) = send(
        &app,
        "PUT",
        "/api/voices/selected",
        Some(json!({ "voice_id": "en-US-GuyNeural" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["selected"], "en-US-GuyNeural");
}

#[tokio::test]
async fn test_image_with_wrong_type_is_rejected() {
    let app = build_test_router(None, "http://127.0.0.1:9");

    let request = Request::builder()
        .method("POST")
        .uri("/api/image")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("not an image"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_image_too_large_is_rejected() {
    let app = build_test_router(None, "http://127.0.0.1:9");

    let request = Request::builder()
        .method("POST")
        .uri("/api/image")
        .header(header::CONTENT_TYPE, "image/png")
        .body(Body::from(vec![0_u8; 2048]))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_image_text_is_submitted() {
    let ocr = Router::new().route(
        "/extract-text",
        post(|| async { Json(json!({ "text": "Show me current news about it" })) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, ocr).await.unwrap();
    });

    let app = build_test_router(None, &format!("http://{addr}/extract-text"));
    let request = Request::builder()
        .method("POST")
        .uri("/api/image?prompt=read%20this")
        .header(header::CONTENT_TYPE, "image/jpeg")
        .body(Body::from(vec![0xff_u8, 0xd8, 0xff]))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["text"], "Show me current news about it");
    assert_eq!(json["mode"], "awaiting_region");
    assert_eq!(json["turn"]["kind"], "region_prompt");
}

//! Integration tests for the voxgate proxy
//!
//! These tests exercise both handlers end to end through the real router:
//! preflight and method handling, CORS headers, credential injection, and
//! the full proxied round trip against a recorded mock upstream.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;
use tower::util::ServiceExt; // for oneshot()
use voxgate::test_utils::MockHttpClient;
use voxgate::{AppState, ProxyConfig, build_router};

fn fully_configured() -> ProxyConfig {
    ProxyConfig::builder()
        .chat_api_key("sk-integration".to_string())
        .tts_api_key("tts-integration".to_string())
        .build()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_preflight_then_post_round_trip() {
    let upstream_body = r#"{"choices":[{"message":{"content":"{\"answer\":42}"}}]}"#;
    let mock = MockHttpClient::new(StatusCode::OK, upstream_body);
    let app = build_router(AppState::with_client(fully_configured(), mock.clone()));

    // The browser's preflight comes first
    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/chat")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(preflight).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(
        response.headers()["access-control-allow-methods"],
        "POST, OPTIONS"
    );

    // Then the real request
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_vec(&json!({
                "messages": [{"role": "user", "content": "Hello"}]
            }))
            .unwrap(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(body_string(response).await, upstream_body);

    // Exactly one outbound call, carrying the injected credential
    let requests = mock.get_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].header("authorization"),
        Some("Bearer sk-integration")
    );
}

#[tokio::test]
async fn test_tts_round_trip_injects_key_and_default_voice() {
    let upstream_body = r#"{"audioContent":"bW9jayBhdWRpbw=="}"#;
    let mock = MockHttpClient::new(StatusCode::OK, upstream_body);
    let app = build_router(AppState::with_client(fully_configured(), mock.clone()));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/tts")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_vec(&json!({
                "text": "god morgen",
                "languageCode": "nb-NO",
                "speakingRate": 1.1
            }))
            .unwrap(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, upstream_body);

    let requests = mock.get_requests();
    assert_eq!(requests.len(), 1);
    let outbound = &requests[0];

    // Key goes into the query string for this provider
    assert!(outbound.uri.contains("key=tts-integration"));
    assert_eq!(outbound.header("authorization"), None);

    let body = outbound.json_body();
    assert_eq!(body["input"]["text"], "god morgen");
    assert_eq!(body["voice"]["languageCode"], "nb-NO");
    assert_eq!(body["voice"]["name"], "nb-NO-Wavenet-E");
    assert_eq!(body["audioConfig"]["speakingRate"], 1.1);
}

#[tokio::test]
async fn test_handlers_are_independent_of_each_others_credentials() {
    // Only the TTS key is configured; chat must fail closed while TTS works.
    let config = ProxyConfig::builder()
        .tts_api_key("tts-only".to_string())
        .build();
    let mock = MockHttpClient::new(StatusCode::OK, r#"{"audioContent":"YQ=="}"#);
    let app = build_router(AppState::with_client(config, mock.clone()));

    let chat = Request::builder()
        .method(Method::POST)
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_vec(&json!({"messages": [{"role": "user", "content": "hi"}]})).unwrap(),
        ))
        .unwrap();
    let response = app.clone().oneshot(chat).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let tts = Request::builder()
        .method(Method::POST)
        .uri("/api/tts")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_vec(&json!({"text": "hi", "languageCode": "en-US"})).unwrap(),
        ))
        .unwrap();
    let response = app.oneshot(tts).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Only the TTS request went upstream
    assert_eq!(mock.get_requests().len(), 1);
}

#[tokio::test]
async fn test_upstream_error_body_is_never_forwarded() {
    let mock = MockHttpClient::new(
        StatusCode::UNAUTHORIZED,
        r#"{"error":{"message":"Incorrect API key provided: sk-integration"}}"#,
    );
    let app = build_router(AppState::with_client(fully_configured(), mock));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_vec(&json!({"messages": [{"role": "user", "content": "hi"}]})).unwrap(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_string(response).await;
    assert!(!body.contains("sk-integration"));
    assert!(body.contains("invalid API key"));
}

#[tokio::test]
async fn test_bad_input_gets_cors_headers_too() {
    let mock = MockHttpClient::new(StatusCode::OK, "{}");
    let app = build_router(AppState::with_client(fully_configured(), mock));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/tts")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"languageCode":"en-US"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(
        response.headers()["access-control-allow-headers"],
        "content-type"
    );
}

//! End-to-end tests of the comment route, driven through the full router.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use nicotrans::comments::UpstreamClient;
use nicotrans::config::ProxyConfig;
use nicotrans::http::{build_router, AppState};
use nicotrans::translation::{Passthrough, Translate, TranslateError, TranslationEngine};

mod common;

const COMMENTS: &str = r#"[{"chat":{"thread":"1","no":1,"vpos":100,"content":"こんにちは"}},{"thread":{"resultcode":0,"thread":"1"}},{"chat":{"thread":"1","no":2,"vpos":200,"content":"さようなら"}}]"#;
const CLIENT_BODY: &str = r#"[{"ping":{"content":"rs:0"}},{"thread":{"thread":"1","version":"20090904"}}]"#;

/// Replaces known phrases, counting calls.
#[derive(Default)]
struct Dictionary {
    calls: Arc<AtomicUsize>,
}

impl Translate for Dictionary {
    async fn translate(&self, text: &str) -> Result<String, TranslateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(text
            .replace("こんにちは", "안녕하세요")
            .replace("さようなら", "안녕히 가세요"))
    }
}

/// Fails every chunk that contains `world`.
struct FailOnWorld;

impl Translate for FailOnWorld {
    async fn translate(&self, text: &str) -> Result<String, TranslateError> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        if text.contains("world") {
            Err(TranslateError::Status(502))
        } else {
            Ok(text.to_uppercase())
        }
    }
}

fn router<T: Translate>(upstream: SocketAddr, translator: T, max_chunk_bytes: usize) -> Router {
    let config = ProxyConfig::default();
    let state = AppState {
        upstream: UpstreamClient::with_client(reqwest::Client::new(), format!("http://{}/api.json/", upstream)),
        engine: TranslationEngine::new(translator, max_chunk_bytes, Duration::from_secs(5)),
    };
    build_router(&config, state)
}

fn post(path: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::REFERER, "https://www.nicovideo.jp/watch/sm9")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn translates_comments_end_to_end() {
    let (upstream, captured) = common::start_mock_upstream(200, COMMENTS).await;
    let translator = Dictionary::default();
    let calls = translator.calls.clone();
    let app = router(upstream, translator, 5000);

    let response = app.oneshot(post("/api.json/", CLIENT_BODY)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json; charset=utf-8");
    assert!(response.headers().contains_key("x-request-id"));

    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    let original: serde_json::Value = serde_json::from_str(COMMENTS).unwrap();
    assert_eq!(body[0]["chat"]["content"], "안녕하세요");
    assert_eq!(body[2]["chat"]["content"], "안녕히 가세요");
    assert_eq!(body[1], original[1]);
    assert_eq!(body[0]["chat"]["vpos"], 100);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let requests = captured.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].head.starts_with("POST /api.json/"));
    assert_eq!(requests[0].header("content-type").as_deref(), Some("text/plain"));
    assert_eq!(requests[0].body, CLIENT_BODY.as_bytes());
}

#[tokio::test]
async fn one_failed_chunk_fails_the_request() {
    let records = r#"[{"chat":{"content":"hello"}},{"chat":{"content":"world"}}]"#;
    let (upstream, _) = common::start_mock_upstream(200, records).await;
    // "§0\nhello\n" is 10 bytes, so each entry gets its own chunk.
    let app = router(upstream, FailOnWorld, 10);

    let response = app.oneshot(post("/api.json/", "[]")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let body = body_string(response).await;
    assert_eq!(body, "Internal Server Error");
    assert!(!body.contains("HELLO"));
}

#[tokio::test]
async fn wrong_path_is_not_found() {
    let (upstream, captured) = common::start_mock_upstream(200, COMMENTS).await;
    let app = router(upstream, Passthrough, 5000);

    let response = app.oneshot(post("/api.json", "[]")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(captured.lock().unwrap().is_empty());
}

#[tokio::test]
async fn non_post_is_bad_request() {
    let (upstream, captured) = common::start_mock_upstream(200, COMMENTS).await;
    let app = router(upstream, Passthrough, 5000);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api.json/")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(captured.lock().unwrap().is_empty());
}

#[tokio::test]
async fn upstream_failure_is_a_generic_error() {
    let (upstream, _) = common::start_mock_upstream(503, "maintenance").await;
    let app = router(upstream, Passthrough, 5000);

    let response = app.oneshot(post("/api.json/", "[]")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, "Internal Server Error");
}

#[tokio::test]
async fn nothing_to_translate_skips_the_translator() {
    let records = r#"[{"thread":{"resultcode":0}},{"leaf":{"count":3}}]"#;
    let (upstream, _) = common::start_mock_upstream(200, records).await;
    let translator = Dictionary::default();
    let calls = translator.calls.clone();
    let app = router(upstream, translator, 5000);

    let response = app.oneshot(post("/api.json/", "[]")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, records);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn markup_is_not_escaped() {
    let records = r#"[{"chat":{"content":"<b>草</b> & 'w'"}}]"#;
    let (upstream, _) = common::start_mock_upstream(200, records).await;
    let app = router(upstream, Passthrough, 5000);

    let response = app.oneshot(post("/api.json/", "[]")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, records);
}

#[tokio::test]
async fn client_request_id_is_echoed() {
    let (upstream, _) = common::start_mock_upstream(200, "[]").await;
    let app = router(upstream, Passthrough, 5000);

    let mut request = post("/api.json/", "[]");
    request.headers_mut().insert("x-request-id", "abc-123".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "abc-123");
}

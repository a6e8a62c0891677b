//! End-to-end tests for the image generation endpoint against a mock upstream

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use gen_task_gateway::{api::routes::create_router, config::ApiCredential, config::Settings, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{any, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CREATE_PATH: &str = "/api/v1/services/aigc/image-generation/generation";
const STATUS_PATH: &str = "/api/v1/tasks/task-1";

fn test_settings(server: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.upstream.base_url = server.uri();
    settings.upstream.poll_interval_ms = 10;
    settings.relay.base_url = format!("{}/compatible-mode/v1", server.uri());
    settings
}

fn app_with(settings: Settings, credential: ApiCredential) -> Router {
    let state = AppState::new(settings, credential).unwrap();
    create_router(Arc::new(state))
}

fn app(server: &MockServer) -> Router {
    app_with(test_settings(server), ApiCredential::new("sk-test"))
}

async fn send(app: Router, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn generate(app: Router, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, "/api/generate-image", body).await
}

fn status_body(status: &str) -> Value {
    json!({
        "request_id": "req-poll",
        "output": { "task_id": "task-1", "task_status": status }
    })
}

async fn mount_task_creation(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(CREATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "req-create",
            "output": { "task_id": "task-1", "task_status": "PENDING" }
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_pending(server: &MockServer, times: u64) {
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("PENDING")))
        .up_to_n_times(times)
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_success_after_pending_polls() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CREATE_PATH))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("x-dashscope-async", "enable"))
        .and(body_partial_json(json!({
            "model": "wan2.6-t2i",
            "input": { "messages": [{ "role": "user", "content": [{ "text": "a quiet harbor" }] }] },
            "parameters": {
                "enable_interleave": true,
                "prompt_extend": true,
                "watermark": false,
                "n": 1,
                "max_images": 2,
                "size": "1280*1280"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "req-create",
            "output": { "task_id": "task-1", "task_status": "PENDING" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    mount_pending(&server, 2).await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "req-done",
            "usage": { "image_count": 2 },
            "output": {
                "task_id": "task-1",
                "task_status": "SUCCEEDED",
                "choices": [
                    { "message": { "content": [{ "type": "image", "image": "u1" }] } },
                    { "message": { "content": [{ "type": "text", "text": "done" }, { "type": "image", "image": "u2" }] } }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = generate(app(&server), json!({ "prompt": "a quiet harbor", "n": 2 })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "images": [{ "url": "u1" }, { "url": "u2" }],
            "usage": { "image_count": 2 },
            "requestId": "req-done"
        })
    );
}

#[tokio::test]
async fn test_optional_parameters_only_sent_when_supplied() {
    let server = MockServer::start().await;
    mount_task_creation(&server).await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("SUCCEEDED")))
        .mount(&server)
        .await;

    let (status, _) = generate(
        app(&server),
        json!({ "prompt": "x", "n": 0, "negativePrompt": "", "seed": null }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let requests = server.received_requests().await.unwrap();
    let submitted: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let parameters = submitted["parameters"].as_object().unwrap();
    assert_eq!(parameters["max_images"], 1);
    assert!(!parameters.contains_key("negative_prompt"));
    assert!(!parameters.contains_key("seed"));
}

#[tokio::test]
async fn test_supplied_optional_parameters_are_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CREATE_PATH))
        .and(body_partial_json(json!({
            "parameters": {
                "negative_prompt": "watermark, text",
                "seed": 42,
                "max_images": 5,
                "prompt_extend": false,
                "watermark": true,
                "size": "960*1696"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": { "task_id": "task-1" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("SUCCEEDED")))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = generate(
        app(&server),
        json!({
            "prompt": "poster",
            "n": 12,
            "size": "960*1696",
            "promptExtend": false,
            "watermark": true,
            "negativePrompt": "watermark, text",
            "seed": 42
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["images"], json!([]));
}

#[tokio::test]
async fn test_budget_exhausted_returns_resumable_handle() {
    let server = MockServer::start().await;
    mount_task_creation(&server).await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("RUNNING")))
        .expect(24)
        .mount(&server)
        .await;

    let (status, body) = generate(app(&server), json!({ "prompt": "slow job" })).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["message"], "Task still in progress");
    assert_eq!(body["taskId"], "task-1");
    assert_eq!(body["pollUrl"], format!("{}{}", server.uri(), STATUS_PATH));
}

#[tokio::test]
async fn test_failed_task_stops_polling() {
    let server = MockServer::start().await;
    mount_task_creation(&server).await;
    mount_pending(&server, 2).await;

    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "req-failed",
            "message": "Output data may contain inappropriate content.",
            "output": { "task_id": "task-1", "task_status": "FAILED" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = generate(app(&server), json!({ "prompt": "x" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({
            "error": "Image generation failed",
            "taskStatus": "FAILED",
            "message": "Output data may contain inappropriate content.",
            "requestId": "req-failed"
        })
    );
}

#[tokio::test]
async fn test_canceled_task_is_reported() {
    let server = MockServer::start().await;
    mount_task_creation(&server).await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("CANCELED")))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = generate(app(&server), json!({ "prompt": "x" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["taskStatus"], "CANCELED");
    assert_eq!(body["requestId"], "req-poll");
}

#[tokio::test]
async fn test_missing_task_id_fails_before_polling() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CREATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "req-create",
            "output": { "task_status": "PENDING" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("SUCCEEDED")))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = generate(app(&server), json!({ "prompt": "x" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "error": "Image generation failed", "detail": "No task_id in response" })
    );
}

#[tokio::test]
async fn test_upstream_error_code_on_creation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CREATE_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "request_id": "req-create",
            "code": "InvalidApiKey",
            "message": "Invalid API-key provided."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = generate(app(&server), json!({ "prompt": "x" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Invalid API-key provided.");
}

#[tokio::test]
async fn test_status_query_error_aborts_loop() {
    let server = MockServer::start().await;
    mount_task_creation(&server).await;
    mount_pending(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "Throttling.RateQuota",
            "message": "Requests rate limit exceeded"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = generate(app(&server), json!({ "prompt": "x" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Requests rate limit exceeded");
}

#[tokio::test]
async fn test_unreadable_status_body_aborts_loop() {
    let server = MockServer::start().await;
    mount_task_creation(&server).await;
    mount_pending(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>Service Unavailable</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = generate(app(&server), json!({ "prompt": "x" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Image generation failed");
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("503"), "{}", detail);
}

#[tokio::test]
async fn test_status_query_timeout_aborts_loop() {
    let server = MockServer::start().await;
    mount_task_creation(&server).await;
    mount_pending(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(status_body("SUCCEEDED"))
                .set_delay(Duration::from_secs(2)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = test_settings(&server);
    settings.upstream.timeout_ms = 200;

    let (status, body) = generate(
        app_with(settings, ApiCredential::new("sk-test")),
        json!({ "prompt": "x" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Image generation failed");
    assert!(!body["detail"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_credential_makes_no_upstream_calls() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = app_with(test_settings(&server), ApiCredential::missing());
    let (status, body) = generate(app, json!({ "prompt": "x" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Image generation failed");
    assert_eq!(body["detail"], "Missing upstream API key");
}

#[tokio::test]
async fn test_blank_prompt_rejected_without_upstream_calls() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    for body in [json!({ "prompt": "   " }), json!({}), json!({ "prompt": 7 })] {
        let (status, response) = generate(app(&server), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response, json!({ "error": "Missing or empty prompt" }));
    }
}

#[tokio::test]
async fn test_invalid_json_body_rejected() {
    let server = MockServer::start().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/generate-image")
        .body(Body::from("{\"prompt\": "))
        .unwrap();

    let response = app(&server).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_method_handling() {
    let server = MockServer::start().await;

    let (status, body) = send(app(&server), Method::GET, "/api/generate-image", Value::Null).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "error": "Only POST allowed" }));

    let (status, _) = send(app(&server), Method::PUT, "/api/generate-image", json!({})).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = send(app(&server), Method::OPTIONS, "/api/generate-image", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cors_preflight() {
    let server = MockServer::start().await;
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/generate-image")
        .header("origin", "https://app.example.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app(&server).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
}

#[tokio::test]
async fn test_request_deadline_returns_handle() {
    let server = MockServer::start().await;
    mount_task_creation(&server).await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("PENDING")))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = test_settings(&server);
    settings.upstream.poll_interval_ms = 600;
    settings.server.request_deadline_secs = Some(1);

    let (status, body) = generate(app_with(settings, ApiCredential::new("sk-test")), json!({ "prompt": "x" })).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["taskId"], "task-1");
}

#[tokio::test]
async fn test_health_reports_credential_state() {
    let server = MockServer::start().await;

    let (status, body) = send(app(&server), Method::GET, "/health", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["credentialConfigured"], true);
    assert_eq!(body["relays"], json!(["translate"]));

    let app = app_with(test_settings(&server), ApiCredential::missing());
    let (_, body) = send(app, Method::GET, "/health", Value::Null).await;
    assert_eq!(body["credentialConfigured"], false);
}

//! HTTP request handlers

use crate::api::classify::classify;
use crate::api::models::{parse_json_body, HealthResponse};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Generate images from a prompt, waiting for the upstream task to finish
#[utoipa::path(
    post,
    path = "/api/generate-image",
    tag = "Images",
    request_body = GenerateImageBody,
    responses(
        (status = 200, description = "Task succeeded", body = GenerationResult),
        (status = 202, description = "Task still running when the polling budget ran out", body = TaskInProgressResponse),
        (status = 400, description = "Missing or empty prompt", body = ErrorResponse),
        (status = 500, description = "Task failed or was canceled upstream", body = TaskFailureResponse),
    )
)]
pub async fn generate_image(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let invocation = Uuid::new_v4();
    let span = info_span!("generate_image", %invocation);

    async move {
        let body = match parse_json_body(&body) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Rejected generation request");
                return classify(Err(e));
            }
        };

        info!(
            prompt = body.get("prompt").and_then(|p| p.as_str()).unwrap_or_default(),
            "Received image generation request"
        );

        let cancel = CancellationToken::new();
        let deadline = state
            .settings
            .server
            .request_deadline_secs
            .map(|secs| cancel_after(cancel.clone(), Duration::from_secs(secs)));

        let result = state.pipeline.execute(&body, &cancel).await;

        if let Some(deadline) = deadline {
            deadline.abort();
        }

        if let Err(e) = &result {
            match e.status_code() {
                StatusCode::BAD_REQUEST => warn!(error = %e, "Rejected generation request"),
                _ => error!(kind = e.kind(), error = %e, "Image generation failed"),
            }
        }

        classify(result)
    }
    .instrument(span)
    .await
}

fn cancel_after(token: CancellationToken, after: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        token.cancel();
    })
}

/// CORS preflight without the browser headers
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Only POST allowed" })),
    )
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Gateway is up", body = HealthResponse))
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().timestamp(),
        credential_configured: state.credential.is_configured(),
        relays: state.relays.names(),
    })
}

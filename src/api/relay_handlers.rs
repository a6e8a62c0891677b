//! Chat relay handlers

use crate::api::classify::RELAY_FAILED;
use crate::api::models::{parse_json_body, RelayBody, RelayResponse};
use crate::error::{ErrorReply, Result};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

/// Translate a batch of UI strings
#[utoipa::path(
    post,
    path = "/api/translate",
    tag = "Relays",
    request_body = RelayBody,
    responses(
        (status = 200, description = "Translated strings, in input order", body = RelayResponse),
        (status = 400, description = "Missing texts or target language", body = ErrorResponse),
        (status = 500, description = "Upstream call failed", body = ErrorResponse),
    )
)]
pub async fn translate(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> std::result::Result<Json<RelayResponse>, ErrorReply> {
    run_relay(&state, "translate", &body).await
}

/// Run any configured relay by name
#[utoipa::path(
    post,
    path = "/api/relay/{name}",
    tag = "Relays",
    params(("name" = String, Path, description = "Relay name")),
    request_body = RelayBody,
    responses(
        (status = 200, description = "Relay results", body = RelayResponse),
        (status = 400, description = "Missing texts or target language", body = ErrorResponse),
        (status = 404, description = "Unknown relay", body = ErrorResponse),
        (status = 500, description = "Upstream call failed", body = ErrorResponse),
    )
)]
pub async fn relay(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> std::result::Result<Json<RelayResponse>, ErrorReply> {
    run_relay(&state, &name, &body).await
}

async fn run_relay(
    state: &AppState,
    name: &str,
    body: &[u8],
) -> std::result::Result<Json<RelayResponse>, ErrorReply> {
    match relay_once(state, name, body).await {
        Ok(results) => Ok(Json(RelayResponse { results })),
        Err(e) => {
            error!(relay = %name, kind = e.kind(), error = %e, "Relay failed");
            Err(e.titled(RELAY_FAILED))
        }
    }
}

async fn relay_once(state: &AppState, name: &str, body: &[u8]) -> Result<Value> {
    let relay = state.relays.get(name)?;
    let request = RelayBody::from_body(&parse_json_body(body)?)?;

    info!(
        relay = %name,
        texts = request.texts.len(),
        target_lang = %request.target_lang,
        "Received relay request"
    );

    let api_key = state.credential.require()?;
    relay.complete(api_key, &request.texts, &request.target_lang).await
}

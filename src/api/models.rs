//! API request and response models

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::{AppError, Result};

/// Image generation request
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageBody {
    /// Text prompt; must not be blank
    pub prompt: String,

    /// Output size as `width*height` (default `1280*1280`)
    #[serde(default)]
    pub size: Option<String>,

    /// Number of images, clamped to 1..=5 (default 1)
    #[serde(default)]
    pub n: Option<f64>,

    /// Let the upstream rewrite the prompt (default true)
    #[serde(default)]
    pub prompt_extend: Option<bool>,

    /// Add an upstream watermark (default false)
    #[serde(default)]
    pub watermark: Option<bool>,

    #[serde(default)]
    pub negative_prompt: Option<String>,

    #[serde(default)]
    pub seed: Option<i64>,
}

/// The task reached `FAILED` or `CANCELED`
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskFailureResponse {
    pub error: String,
    pub task_status: String,
    pub message: Option<String>,
    pub request_id: Option<String>,
}

/// The polling budget ran out; resume at `pollUrl`
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskInProgressResponse {
    pub message: String,
    pub task_id: String,
    pub poll_url: String,
}

/// Error body. `detail` is present for everything but bad input.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Relay (translation) request
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelayBody {
    #[schema(value_type = Vec<Object>)]
    pub texts: Vec<Value>,
    pub target_lang: String,
}

impl RelayBody {
    /// Validate a raw JSON body
    pub fn from_body(body: &Value) -> Result<Self> {
        let texts = match body.get("texts") {
            Some(Value::Array(texts)) if !texts.is_empty() => texts.clone(),
            _ => return Err(AppError::Validation("Missing texts array".to_string())),
        };

        let target_lang = match body.get("targetLang").or_else(|| body.get("target_lang")) {
            Some(Value::String(lang)) if !lang.is_empty() => lang.clone(),
            _ => return Err(AppError::Validation("Missing targetLang".to_string())),
        };

        Ok(Self { texts, target_lang })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RelayResponse {
    #[schema(value_type = Object)]
    pub results: Value,
}

/// Health check response
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: i64,
    pub credential_configured: bool,
    pub relays: Vec<String>,
}

/// Parse a request body leniently: empty means `null`, anything else must be JSON
pub fn parse_json_body(bytes: &[u8]) -> Result<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes)
        .map_err(|e| AppError::Validation(format!("Request body is not valid JSON: {}", e)))
}

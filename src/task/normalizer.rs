//! Succeeded-task payload → gateway result

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::backend::TaskResponse;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ImageRecord {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub images: Vec<ImageRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub usage: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Flatten every choice's content in order and keep the image items
pub fn normalize(payload: TaskResponse) -> GenerationResult {
    let images = payload
        .output
        .and_then(|o| o.choices)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|choice| choice.message.and_then(|m| m.content))
        .flatten()
        .filter(|item| item.kind.as_deref() == Some("image"))
        .filter_map(|item| item.image.filter(|url| !url.is_empty()))
        .map(|url| ImageRecord { url })
        .collect();

    GenerationResult {
        images,
        usage: payload.usage,
        request_id: payload.request_id,
    }
}

//! Single-call chat relay over an OpenAI-compatible endpoint
//!
//! One relay replaces each hand-written translation endpoint: it renders its
//! prompt template, issues one chat completion and decodes the JSON the model
//! answered with. No retries, no state.

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::config::RelayConfig;
use crate::error::{AppError, Result};

/// Chat message for completion requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatMessage {
    fn new(role: &str, content: String) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Chat completion request (OpenAI compatible)
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub response_format: ResponseFormat,
    pub temperature: f32,
}

/// Chat completion response, reduced to what the relay reads
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

/// A configured relay bound to its upstream endpoint
pub struct ChatRelay {
    config: RelayConfig,
    client: Client,
    url: String,
}

impl ChatRelay {
    pub fn new(config: RelayConfig, client: Client, base_url: &str) -> Self {
        let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        Self { config, client, url }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Build the upstream request for `texts` in `target_lang`
    pub fn build_request(&self, texts: &[Value], target_lang: &str) -> Result<ChatCompletionRequest> {
        let texts_json = serde_json::to_string(texts)?;
        let user_prompt = self
            .config
            .user_template
            .replace("{target_lang}", target_lang)
            .replace("{texts}", &texts_json);

        Ok(ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::new("system", self.config.system_prompt.clone()),
                ChatMessage::new("user", user_prompt),
            ],
            response_format: ResponseFormat {
                kind: "json_object".to_string(),
            },
            temperature: self.config.temperature,
        })
    }

    /// Issue one chat completion and return the decoded result array
    pub async fn complete(&self, api_key: &str, texts: &[Value], target_lang: &str) -> Result<Value> {
        let request = self.build_request(texts, target_lang)?;
        debug!(relay = %self.config.name, model = %request.model, "Sending chat completion request");

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| AppError::Config("API key contains invalid header characters".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);

        let response = self
            .client
            .post(&self.url)
            .headers(headers)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("Backend returned {}: {}", status, body)));
        }

        let completion = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!(relay = %self.config.name, error = %e, "Failed to parse chat completion response");
            AppError::MalformedResponse(format!("Failed to parse response: {}", e))
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::MalformedResponse("Completion has no message content".to_string()))?;

        extract_results(&content)
    }
}

/// Decode model output: fenced or bare JSON, then pick the result array
pub fn extract_results(content: &str) -> Result<Value> {
    let cleaned = content
        .replace("```json\n", "")
        .replace("```json", "")
        .replace("```", "");

    let parsed: Value = serde_json::from_str(cleaned.trim()).map_err(|e| {
        AppError::MalformedResponse(format!("Model returned invalid JSON: {}", e))
    })?;

    match parsed {
        Value::Array(_) => Ok(parsed),
        Value::Object(map) => {
            if let Some(translations) = map.get("translations").filter(|v| is_truthy(v)) {
                return Ok(translations.clone());
            }
            map.into_iter()
                .next()
                .map(|(_, v)| v)
                .ok_or_else(|| AppError::MalformedResponse("Model returned an empty object".to_string()))
        }
        other => Err(AppError::MalformedResponse(format!(
            "Model returned a bare value instead of results: {}",
            other
        ))),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        _ => true,
    }
}

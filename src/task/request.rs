//! Inbound generation request: validation and defaults

use serde_json::{Map, Number, Value};

use crate::error::{AppError, Result};

pub const DEFAULT_SIZE: &str = "1280*1280";
pub const DEFAULT_COUNT: f64 = 1.0;

const EMPTY_PROMPT: &str = "Missing or empty prompt";

/// A fully-defaulted generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub size: String,
    /// Desired image count as sent by the caller; clamped when the job spec is built
    pub n: f64,
    pub prompt_extend: bool,
    pub watermark: bool,
    pub negative_prompt: Option<String>,
    /// Forwarded verbatim
    pub seed: Option<Number>,
}

impl GenerationRequest {
    /// Validate a raw JSON body and apply defaults.
    ///
    /// Only the prompt can fail validation. Fields are looked up by their
    /// camelCase name first, then snake_case; an optional field that is absent,
    /// `null` or of an unusable type takes its default. A numeric string is
    /// accepted for `n`.
    pub fn from_body(body: &Value) -> Result<Self> {
        let empty = Map::new();
        let fields = body.as_object().unwrap_or(&empty);

        let prompt = match lookup(fields, "prompt", "prompt") {
            Some(Value::String(p)) if !p.trim().is_empty() => p.clone(),
            _ => return Err(AppError::Validation(EMPTY_PROMPT.to_string())),
        };

        let size = match lookup(fields, "size", "size") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => DEFAULT_SIZE.to_string(),
        };

        let n = match lookup(fields, "n", "n") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .unwrap_or(DEFAULT_COUNT);

        let prompt_extend = bool_field(fields, "promptExtend", "prompt_extend", true);
        let watermark = bool_field(fields, "watermark", "watermark", false);

        let negative_prompt = match lookup(fields, "negativePrompt", "negative_prompt") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        };

        let seed = match lookup(fields, "seed", "seed") {
            Some(Value::Number(n)) => Some(n.clone()),
            _ => None,
        };

        Ok(Self {
            prompt,
            size,
            n,
            prompt_extend,
            watermark,
            negative_prompt,
            seed,
        })
    }
}

/// A field by either spelling; `null` counts as absent
fn lookup<'a>(fields: &'a Map<String, Value>, camel: &str, snake: &str) -> Option<&'a Value> {
    fields
        .get(camel)
        .filter(|v| !v.is_null())
        .or_else(|| fields.get(snake).filter(|v| !v.is_null()))
}

fn bool_field(fields: &Map<String, Value>, camel: &str, snake: &str, default: bool) -> bool {
    match lookup(fields, camel, snake) {
        Some(Value::Bool(b)) => *b,
        _ => default,
    }
}

//! Upstream-facing job parameters derived from a generation request

use serde::Serialize;
use serde_json::Number;

use crate::task::request::GenerationRequest;

pub const MIN_IMAGES: u32 = 1;
pub const MAX_IMAGES: u32 = 5;

/// The `parameters` object of a task submission. Immutable once built.
///
/// Interleave mode is always on (pure text-to-image, no input image); in that
/// mode the job-level `n` is pinned to 1 and `max_images` carries the count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpstreamJobSpec {
    enable_interleave: bool,
    prompt_extend: bool,
    watermark: bool,
    n: u32,
    max_images: u32,
    size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<Number>,
}

impl UpstreamJobSpec {
    pub fn from_request(request: &GenerationRequest) -> Self {
        Self {
            enable_interleave: true,
            prompt_extend: request.prompt_extend,
            watermark: request.watermark,
            n: 1,
            max_images: clamp_count(request.n),
            size: request.size.clone(),
            negative_prompt: request
                .negative_prompt
                .clone()
                .filter(|p| !p.is_empty()),
            seed: request.seed.clone(),
        }
    }

    pub fn max_images(&self) -> u32 {
        self.max_images
    }

    pub fn size(&self) -> &str {
        &self.size
    }
}

/// clamp(n, 1, 5), rounded down to a whole image count.
///
/// The upstream `max_images` is an integer, so a fractional count such as 2.7
/// is sent as 2 rather than forwarded as-is.
pub fn clamp_count(n: f64) -> u32 {
    if n.is_nan() {
        return MIN_IMAGES;
    }
    n.clamp(MIN_IMAGES as f64, MAX_IMAGES as f64).floor() as u32
}

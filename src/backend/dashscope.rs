//! DashScope asynchronous task client

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Response, Url,
};
use std::time::Duration;
use tracing::{debug, error};

use crate::backend::traits::{TaskApi, TaskResponse, TaskSubmission};
use crate::config::UpstreamConfig;
use crate::error::{AppError, Result};

const ASYNC_HEADER: &str = "x-dashscope-async";

/// HTTP client for task creation and task status queries
pub struct DashScopeClient {
    client: Client,
    base_url: Url,
}

impl DashScopeClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = Url::parse(&config.base_url).map_err(|e| {
            AppError::Config(format!("Invalid upstream base URL '{}': {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "Upstream base URL '{}' cannot carry a path",
                config.base_url
            )));
        }

        Ok(Self { client, base_url })
    }

    /// Base URL with `segments` appended, each percent-encoded on its own
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn task_endpoint(&self, task_id: &str) -> Url {
        self.endpoint(&["api", "v1", "tasks", task_id])
    }

    fn headers(api_key: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| AppError::Config("API key contains invalid header characters".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }

    /// Decode an upstream envelope and surface its error code
    async fn read_envelope(response: Response) -> Result<TaskResponse> {
        let status = response.status();
        let body = response.bytes().await?;

        let envelope: TaskResponse = serde_json::from_slice(&body).map_err(|e| {
            error!(status = %status, error = %e, "Upstream returned an unreadable body");
            AppError::Upstream(format!("Upstream returned {} with unreadable body: {}", status, e))
        })?;

        if let Some(message) = envelope.error_message() {
            return Err(AppError::Upstream(message));
        }

        if !status.is_success() {
            return Err(AppError::Upstream(format!("Upstream returned {}", status)));
        }

        Ok(envelope)
    }
}

#[async_trait]
impl TaskApi for DashScopeClient {
    async fn create_task(&self, api_key: &str, submission: &TaskSubmission) -> Result<TaskResponse> {
        let url = self.endpoint(&["api", "v1", "services", "aigc", "image-generation", "generation"]);
        debug!(url = %url, model = %submission.model, "Creating upstream task");

        let mut headers = Self::headers(api_key)?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(HeaderName::from_static(ASYNC_HEADER), HeaderValue::from_static("enable"));

        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(submission)
            .send()
            .await?;

        Self::read_envelope(response).await
    }

    async fn get_task(&self, api_key: &str, task_id: &str) -> Result<TaskResponse> {
        let url = self.task_endpoint(task_id);
        debug!(url = %url, "Querying upstream task status");

        let response = self
            .client
            .get(url)
            .headers(Self::headers(api_key)?)
            .send()
            .await?;

        Self::read_envelope(response).await
    }

    fn poll_url(&self, task_id: &str) -> String {
        self.task_endpoint(task_id).to_string()
    }
}

//! Upstream task API contract and its wire types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::task::UpstreamJobSpec;

/// Body of the task-creation call
#[derive(Debug, Clone, Serialize)]
pub struct TaskSubmission {
    pub model: String,
    pub input: TaskInput,
    pub parameters: UpstreamJobSpec,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskInput {
    pub messages: Vec<InputMessage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputMessage {
    pub role: String,
    pub content: Vec<InputContent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputContent {
    pub text: String,
}

impl TaskSubmission {
    /// Single user message carrying the prompt
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, parameters: UpstreamJobSpec) -> Self {
        Self {
            model: model.into(),
            input: TaskInput {
                messages: vec![InputMessage {
                    role: "user".to_string(),
                    content: vec![InputContent {
                        text: prompt.into(),
                    }],
                }],
            },
            parameters,
        }
    }
}

/// Response envelope shared by task creation and task status
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskResponse {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub output: Option<TaskOutput>,
    /// Metering object, passed through untouched
    #[serde(default)]
    pub usage: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskOutput {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub task_status: Option<String>,
    #[serde(default)]
    pub choices: Option<Vec<OutputChoice>>,
    /// Failed tasks report their diagnostics here rather than at the top level
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputChoice {
    #[serde(default)]
    pub message: Option<OutputMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputMessage {
    #[serde(default)]
    pub content: Option<Vec<ContentItem>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl TaskResponse {
    /// Upstream error code, if one was reported (empty codes are ignored)
    pub fn error_code(&self) -> Option<&str> {
        self.code.as_deref().filter(|c| !c.is_empty())
    }

    /// Human-readable upstream failure: the message, falling back to the code
    pub fn error_message(&self) -> Option<String> {
        let code = self.error_code()?;
        Some(
            self.message
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or(code)
                .to_string(),
        )
    }

    pub fn task_id(&self) -> Option<&str> {
        self.output
            .as_ref()
            .and_then(|o| o.task_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn task_status(&self) -> Option<&str> {
        self.output.as_ref().and_then(|o| o.task_status.as_deref())
    }

    /// Diagnostic for a failed task: top-level message, else the output's
    pub fn failure_message(&self) -> Option<String> {
        self.message
            .as_deref()
            .or_else(|| self.output.as_ref().and_then(|o| o.message.as_deref()))
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    }
}

/// Trait for asynchronous task services
///
/// The credential is passed per call so the caller decides when a missing key
/// is fatal; implementations never read it from the environment.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Create a task. Fails with `Upstream` when the response carries an error code.
    async fn create_task(&self, api_key: &str, submission: &TaskSubmission) -> Result<TaskResponse>;

    /// Query a task's status. Fails with `Upstream` when the response carries an error code.
    async fn get_task(&self, api_key: &str, task_id: &str) -> Result<TaskResponse>;

    /// Address a caller can use to resume polling out-of-band
    fn poll_url(&self, task_id: &str) -> String;
}

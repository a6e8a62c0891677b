//! Task creation

use std::sync::Arc;
use tracing::{error, info};

use crate::backend::{TaskApi, TaskSubmission};
use crate::config::ApiCredential;
use crate::error::{AppError, Result};
use crate::task::job_spec::UpstreamJobSpec;
use crate::task::poller::Task;
use crate::task::request::GenerationRequest;

/// Builds the upstream job and issues the single task-creation call
pub struct TaskSubmitter {
    api: Arc<dyn TaskApi>,
    credential: ApiCredential,
    model: String,
}

impl TaskSubmitter {
    pub fn new(api: Arc<dyn TaskApi>, credential: ApiCredential, model: impl Into<String>) -> Self {
        Self {
            api,
            credential,
            model: model.into(),
        }
    }

    pub fn build_submission(&self, request: &GenerationRequest) -> TaskSubmission {
        TaskSubmission::new(
            self.model.clone(),
            request.prompt.clone(),
            UpstreamJobSpec::from_request(request),
        )
    }

    /// Create the task and hand back a fresh handle for polling
    pub async fn submit(&self, request: &GenerationRequest) -> Result<Task> {
        let api_key = self.credential.require()?;
        let submission = self.build_submission(request);

        let response = self.api.create_task(api_key, &submission).await?;

        let task_id = response.task_id().ok_or_else(|| {
            error!(request_id = ?response.request_id, "Task creation response carried no task_id");
            AppError::MalformedResponse("No task_id in response".to_string())
        })?;

        info!(
            task_id = %task_id,
            max_images = submission.parameters.max_images(),
            size = %submission.parameters.size(),
            "Upstream task created"
        );

        Ok(Task::new(task_id))
    }
}

//! One request, one task: the full generation pipeline

use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::backend::TaskApi;
use crate::config::ApiCredential;
use crate::error::{AppError, Result};
use crate::task::normalizer::normalize;
use crate::task::outcome::TerminalOutcome;
use crate::task::poller::{PollLoop, PollPolicy, PollState};
use crate::task::request::GenerationRequest;
use crate::task::submitter::TaskSubmitter;

/// Validator → submitter → poll loop → normalizer. Holds no per-request state.
pub struct GenerationPipeline {
    api: Arc<dyn TaskApi>,
    submitter: TaskSubmitter,
    poller: PollLoop,
}

impl GenerationPipeline {
    pub fn new(
        api: Arc<dyn TaskApi>,
        credential: ApiCredential,
        model: impl Into<String>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            submitter: TaskSubmitter::new(api.clone(), credential.clone(), model),
            poller: PollLoop::new(api.clone(), credential, policy),
            api,
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.poller.policy()
    }

    /// Run the pipeline for a raw request body
    pub async fn execute(&self, body: &Value, cancel: &CancellationToken) -> Result<TerminalOutcome> {
        let request = GenerationRequest::from_body(body)?;
        self.generate(&request, cancel).await
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<TerminalOutcome> {
        let mut task = self.submitter.submit(request).await?;
        let state = self.poller.run(&mut task, cancel).await?;

        let outcome = match state {
            PollState::Succeeded(payload) => TerminalOutcome::Success(normalize(payload)),
            PollState::Failed(payload) | PollState::Canceled(payload) => TerminalOutcome::Failure {
                status: task.status().as_str().to_string(),
                message: payload.failure_message(),
                request_id: payload.request_id,
            },
            PollState::BudgetExhausted | PollState::Interrupted => TerminalOutcome::InProgress {
                poll_url: self.api.poll_url(task.id()),
                task_id: task.id().to_string(),
            },
            PollState::Pending => {
                return Err(AppError::Internal(format!(
                    "Polling stopped while task {} was still pending",
                    task.id()
                )))
            }
        };

        info!(
            task_id = %task.id(),
            polls = task.poll_count(),
            outcome = outcome.label(),
            "Generation finished"
        );

        Ok(outcome)
    }
}

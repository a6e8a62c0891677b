//! The single result of one generation invocation

use crate::task::normalizer::GenerationResult;

#[derive(Debug, Clone, PartialEq)]
pub enum TerminalOutcome {
    Success(GenerationResult),
    /// The task reached `FAILED` or `CANCELED` upstream
    Failure {
        status: String,
        message: Option<String>,
        request_id: Option<String>,
    },
    /// Still running when polling stopped; the caller may resume at `poll_url`
    InProgress { task_id: String, poll_url: String },
}

impl TerminalOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            TerminalOutcome::Success(_) => "success",
            TerminalOutcome::Failure { .. } => "failure",
            TerminalOutcome::InProgress { .. } => "in_progress",
        }
    }
}

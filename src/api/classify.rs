//! Outcome and error → HTTP response

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::api::models::{TaskFailureResponse, TaskInProgressResponse};
use crate::error::Result;
use crate::task::TerminalOutcome;

pub const GENERATION_FAILED: &str = "Image generation failed";
pub const RELAY_FAILED: &str = "Batch translation failed";
pub const STILL_IN_PROGRESS: &str = "Task still in progress";

impl IntoResponse for TerminalOutcome {
    fn into_response(self) -> Response {
        match self {
            TerminalOutcome::Success(result) => (StatusCode::OK, Json(result)).into_response(),
            TerminalOutcome::Failure {
                status,
                message,
                request_id,
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(TaskFailureResponse {
                    error: GENERATION_FAILED.to_string(),
                    task_status: status,
                    message,
                    request_id,
                }),
            )
                .into_response(),
            TerminalOutcome::InProgress { task_id, poll_url } => (
                StatusCode::ACCEPTED,
                Json(TaskInProgressResponse {
                    message: STILL_IN_PROGRESS.to_string(),
                    task_id,
                    poll_url,
                }),
            )
                .into_response(),
        }
    }
}

/// Exactly one response per invocation: the outcome, or the titled error
pub fn classify(result: Result<TerminalOutcome>) -> Response {
    match result {
        Ok(outcome) => outcome.into_response(),
        Err(error) => error.titled(GENERATION_FAILED).into_response(),
    }
}

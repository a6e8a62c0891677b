//! Bounded status polling for a single task
//!
//! A [`Task`] moves through [`PollState`] one observation at a time. The loop
//! sleeps for the policy interval before every query, issues exactly one query
//! per iteration and stops at the first terminal status, at the budget, or
//! when its cancellation token fires.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backend::{TaskApi, TaskResponse};
use crate::config::{ApiCredential, UpstreamConfig, DEFAULT_MAX_POLLS, DEFAULT_POLL_INTERVAL_MS};
use crate::error::Result;

/// Upstream task status. Anything but the three terminal values is pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Succeeded,
    Failed,
    Canceled,
    /// Raw upstream value, if any
    Pending(Option<String>),
}

impl TaskStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("SUCCEEDED") => TaskStatus::Succeeded,
            Some("FAILED") => TaskStatus::Failed,
            Some("CANCELED") => TaskStatus::Canceled,
            other => TaskStatus::Pending(other.map(str::to_string)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Succeeded => "SUCCEEDED",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Canceled => "CANCELED",
            TaskStatus::Pending(Some(raw)) => raw,
            TaskStatus::Pending(None) => "PENDING",
        }
    }
}

/// Where the poll loop stands after an observation
#[derive(Debug, Clone)]
pub enum PollState {
    Pending,
    Succeeded(TaskResponse),
    Failed(TaskResponse),
    Canceled(TaskResponse),
    /// Every query in the budget came back pending
    BudgetExhausted,
    /// The cancellation hook fired while waiting
    Interrupted,
}

/// One in-flight upstream task, alive for a single request
#[derive(Debug, Clone)]
pub struct Task {
    id: String,
    poll_count: u32,
    status: TaskStatus,
}

impl Task {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            poll_count: 0,
            status: TaskStatus::Pending(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn poll_count(&self) -> u32 {
        self.poll_count
    }

    pub fn status(&self) -> &TaskStatus {
        &self.status
    }

    /// Record one status query result
    pub fn observe(&mut self, snapshot: TaskResponse) -> PollState {
        self.poll_count += 1;
        self.status = TaskStatus::parse(snapshot.task_status());

        match self.status {
            TaskStatus::Succeeded => PollState::Succeeded(snapshot),
            TaskStatus::Failed => PollState::Failed(snapshot),
            TaskStatus::Canceled => PollState::Canceled(snapshot),
            TaskStatus::Pending(_) => PollState::Pending,
        }
    }
}

/// Fixed cadence and iteration budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_polls: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_polls: DEFAULT_MAX_POLLS,
        }
    }
}

impl PollPolicy {
    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.poll_interval_ms),
            max_polls: config.max_polls,
        }
    }

    /// Longest time the loop can spend sleeping
    pub fn budget(&self) -> Duration {
        self.interval * self.max_polls
    }
}

pub struct PollLoop {
    api: Arc<dyn TaskApi>,
    credential: ApiCredential,
    policy: PollPolicy,
}

impl PollLoop {
    pub fn new(api: Arc<dyn TaskApi>, credential: ApiCredential, policy: PollPolicy) -> Self {
        Self {
            api,
            credential,
            policy,
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Drive `task` until it leaves [`PollState::Pending`].
    ///
    /// A failed status query aborts the loop with that error; it is not
    /// counted as a pending iteration.
    pub async fn run(&self, task: &mut Task, cancel: &CancellationToken) -> Result<PollState> {
        let api_key = self.credential.require()?;

        loop {
            if task.poll_count() >= self.policy.max_polls {
                warn!(
                    task_id = %task.id(),
                    polls = task.poll_count(),
                    "Polling budget exhausted, task still in progress"
                );
                return Ok(PollState::BudgetExhausted);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(task_id = %task.id(), polls = task.poll_count(), "Polling interrupted");
                    return Ok(PollState::Interrupted);
                }
                _ = sleep(self.policy.interval) => {}
            }

            let snapshot = self.api.get_task(api_key, task.id()).await.map_err(|e| {
                error!(task_id = %task.id(), poll = task.poll_count() + 1, error = %e, "Status query failed");
                e
            })?;

            match task.observe(snapshot) {
                PollState::Pending => {
                    debug!(
                        task_id = %task.id(),
                        poll = task.poll_count(),
                        status = %task.status().as_str(),
                        "Task still pending"
                    );
                }
                terminal => {
                    info!(
                        task_id = %task.id(),
                        poll = task.poll_count(),
                        status = %task.status().as_str(),
                        "Task reached terminal status"
                    );
                    return Ok(terminal);
                }
            }
        }
    }
}

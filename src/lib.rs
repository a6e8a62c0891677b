//! Gen Task Gateway
//!
//! A stateless HTTP gateway that submits long-running generation jobs to an
//! asynchronous inference API, polls them to a terminal state within a fixed
//! budget, and relays single-shot chat completions.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod task;

pub use error::{AppError, Result};

use std::sync::Arc;

use crate::backend::{DashScopeClient, RelayRegistry, TaskApi};
use crate::config::{ApiCredential, Settings};
use crate::task::{GenerationPipeline, PollPolicy};

/// Application state shared across all handlers. Read-only after startup.
pub struct AppState {
    pub settings: Arc<Settings>,
    pub credential: ApiCredential,
    pub pipeline: GenerationPipeline,
    pub relays: RelayRegistry,
}

impl AppState {
    /// Build the state, resolving the credential from the settings
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let credential = settings.credential();
        Self::new(settings, credential)
    }

    pub fn new(settings: Settings, credential: ApiCredential) -> Result<Self> {
        let api: Arc<dyn TaskApi> = Arc::new(DashScopeClient::new(&settings.upstream)?);
        Self::with_task_api(settings, credential, api)
    }

    /// Build the state around any task API implementation
    pub fn with_task_api(
        settings: Settings,
        credential: ApiCredential,
        api: Arc<dyn TaskApi>,
    ) -> Result<Self> {
        let pipeline = GenerationPipeline::new(
            api,
            credential.clone(),
            settings.upstream.image_model.clone(),
            PollPolicy::from_config(&settings.upstream),
        );
        let relays = RelayRegistry::from_settings(&settings)?;

        Ok(Self {
            settings: Arc::new(settings),
            credential,
            pipeline,
            relays,
        })
    }
}

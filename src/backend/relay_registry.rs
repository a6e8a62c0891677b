//! Registry of configured chat relays

use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::backend::relay::ChatRelay;
use crate::config::{RelayConfig, Settings};
use crate::error::{AppError, Result};

/// Read-only name → relay map, built once at startup
pub struct RelayRegistry {
    relays: HashMap<String, Arc<ChatRelay>>,
}

impl RelayRegistry {
    /// Build every relay in the settings' catalogue over one shared HTTP client
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.upstream.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::new(
            settings.relay_catalogue(),
            client,
            &settings.relay.base_url,
        ))
    }

    pub fn new(configs: Vec<RelayConfig>, client: Client, base_url: &str) -> Self {
        let mut relays = HashMap::new();
        for config in configs {
            let relay = ChatRelay::new(config, client.clone(), base_url);
            info!(relay = %relay.name(), model = %relay.model(), "Relay registered");
            relays.insert(relay.name().to_string(), Arc::new(relay));
        }
        Self { relays }
    }

    /// Get a relay by name
    pub fn get(&self, name: &str) -> Result<Arc<ChatRelay>> {
        self.relays
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Unknown relay '{}'", name)))
    }

    /// Registered relay names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.relays.keys().cloned().collect();
        names.sort();
        names
    }
}

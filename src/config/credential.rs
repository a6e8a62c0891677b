//! The upstream API credential, resolved once at startup

use std::fmt;
use std::sync::Arc;

use crate::error::{AppError, Result};

/// Read-only bearer credential shared by every outbound call.
///
/// An empty credential is a valid value: the server still starts, and each
/// operation that needs the key fails with a configuration error before any
/// network traffic.
#[derive(Clone, Default)]
pub struct ApiCredential {
    key: Option<Arc<str>>,
}

impl ApiCredential {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let key = key.trim();
        if key.is_empty() {
            return Self::missing();
        }
        Self {
            key: Some(Arc::from(key)),
        }
    }

    pub fn missing() -> Self {
        Self { key: None }
    }

    /// Literal value wins over the environment variable; blanks count as absent
    pub fn resolve(literal: Option<&str>, env_var: &str) -> Self {
        if let Some(key) = literal.filter(|k| !k.trim().is_empty()) {
            return Self::new(key);
        }
        match std::env::var(env_var) {
            Ok(key) => Self::new(key),
            Err(_) => Self::missing(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.key.is_some()
    }

    /// The key, or a configuration error naming what is missing
    pub fn require(&self) -> Result<&str> {
        self.key
            .as_deref()
            .ok_or_else(|| AppError::Config("Missing upstream API key".to_string()))
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = if self.key.is_some() { "<redacted>" } else { "<missing>" };
        f.debug_struct("ApiCredential").field("key", &shown).finish()
    }
}

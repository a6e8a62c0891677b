//! Application settings and configuration management

use crate::config::ApiCredential;
use crate::error::{AppError, Result};
use config::{Config, Environment, File, FileFormat};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_MAX_POLLS: u32 = 24;

const TRANSLATE_SYSTEM_PROMPT: &str = "You are a professional UI copy translator. I will provide an array of strings. Please translate them into the target language. Return a JSON object with a 'translations' key containing the array of translated strings in the same order.";
const TRANSLATE_USER_TEMPLATE: &str = "Target Language: {target_lang}\nTexts to translate: {texts}";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub relay: RelayEndpointConfig,
    #[serde(default)]
    pub relays: Vec<RelayConfig>,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Fires the poll loop's cancellation hook after this many seconds
    #[serde(default)]
    pub request_deadline_secs: Option<u64>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_deadline_secs: None,
        }
    }
}

/// Asynchronous inference API (task creation and task status)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_base_url")]
    pub base_url: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

fn default_upstream_base_url() -> String {
    "https://dashscope.aliyuncs.com".to_string()
}

fn default_image_model() -> String {
    "wan2.6-t2i".to_string()
}

fn default_api_key_env() -> String {
    "DASHSCOPE_API_KEY".to_string()
}

fn default_timeout() -> u64 {
    60000
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_max_polls() -> u32 {
    DEFAULT_MAX_POLLS
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_base_url(),
            image_model: default_image_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            timeout_ms: default_timeout(),
            poll_interval_ms: default_poll_interval(),
            max_polls: default_max_polls(),
        }
    }
}

/// OpenAI-compatible endpoint used by the chat relays
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayEndpointConfig {
    #[serde(default = "default_relay_base_url")]
    pub base_url: String,
}

fn default_relay_base_url() -> String {
    "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string()
}

impl Default for RelayEndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_relay_base_url(),
        }
    }
}

/// One single-call chat relay, parameterized by model and prompt template.
///
/// `user_template` may reference `{target_lang}` and `{texts}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    pub name: String,
    pub model: String,
    pub system_prompt: String,
    #[serde(default = "default_user_template")]
    pub user_template: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_user_template() -> String {
    TRANSLATE_USER_TEMPLATE.to_string()
}

fn default_temperature() -> f32 {
    0.1
}

impl RelayConfig {
    /// The relay behind `/api/translate`
    pub fn builtin_translate() -> Self {
        Self {
            name: "translate".to_string(),
            model: "qwen-plus".to_string(),
            system_prompt: TRANSLATE_SYSTEM_PROMPT.to_string(),
            user_template: default_user_template(),
            temperature: default_temperature(),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// YAML relay catalogue file structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RelaysFile {
    #[serde(default)]
    pub relays: Vec<RelayConfig>,
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_paths("config/gateway.yaml", Some("config/relays.yaml"))
    }

    /// Load settings from YAML (or TOML) configuration files
    pub fn load_from_paths<P: AsRef<Path>>(
        gateway_config: P,
        relays_config: Option<P>,
    ) -> Result<Self> {
        let gateway_path = gateway_config.as_ref();

        let format = if gateway_path
            .extension()
            .map_or(false, |ext| ext == "yaml" || ext == "yml")
        {
            FileFormat::Yaml
        } else {
            FileFormat::Toml
        };

        let mut config_builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("upstream.base_url", default_upstream_base_url())?
            .set_default("upstream.image_model", default_image_model())?
            .set_default("upstream.api_key_env", default_api_key_env())?
            .set_default("upstream.timeout_ms", default_timeout() as i64)?
            .set_default("upstream.poll_interval_ms", default_poll_interval() as i64)?
            .set_default("upstream.max_polls", default_max_polls() as i64)?
            .set_default("relay.base_url", default_relay_base_url())?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?;

        if gateway_path.exists() {
            config_builder = config_builder.add_source(File::from(gateway_path).format(format));
        }

        config_builder = config_builder.add_source(
            Environment::with_prefix("GEN_TASK_GATEWAY")
                .separator("__")
                .try_parsing(true),
        );

        let config = config_builder.build()?;
        let mut settings: Settings = config.try_deserialize()?;

        if let Some(relays_path) = relays_config {
            let relays_path = relays_path.as_ref();
            if relays_path.exists() {
                let file = Self::load_relays_file(relays_path)?;
                settings.relays.extend(file.relays);
            }
        }

        Ok(settings)
    }

    /// Load the relay catalogue from a YAML file
    pub fn load_relays_file<P: AsRef<Path>>(path: P) -> Result<RelaysFile> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AppError::Settings(config::ConfigError::Message(format!(
                "Failed to read relays config: {}",
                e
            )))
        })?;

        serde_yaml::from_str(&content).map_err(|e| {
            AppError::Settings(config::ConfigError::Message(format!(
                "Failed to parse relays config: {}",
                e
            )))
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("Server port cannot be 0"));
        }

        if self.upstream.max_polls == 0 {
            return Err(invalid("upstream.max_polls must be at least 1"));
        }

        for (key, url) in [
            ("upstream.base_url", &self.upstream.base_url),
            ("relay.base_url", &self.relay.base_url),
        ] {
            if Url::parse(url).is_err() {
                return Err(invalid(&format!("{} is not a valid URL: '{}'", key, url)));
            }
        }

        let mut seen = HashSet::new();
        for relay in &self.relays {
            if relay.name.trim().is_empty() {
                return Err(invalid("Relay name cannot be empty"));
            }
            if relay.model.trim().is_empty() {
                return Err(invalid(&format!("Relay '{}' must name a model", relay.name)));
            }
            if !seen.insert(relay.name.as_str()) {
                return Err(invalid(&format!("Duplicate relay name '{}'", relay.name)));
            }
        }

        Ok(())
    }

    /// Configured relays plus the built-in translator unless one overrides it
    pub fn relay_catalogue(&self) -> Vec<RelayConfig> {
        let mut relays = self.relays.clone();
        let builtin = RelayConfig::builtin_translate();
        if !relays.iter().any(|r| r.name == builtin.name) {
            relays.push(builtin);
        }
        relays
    }

    /// Resolve the upstream credential from the literal key or its env variable
    pub fn credential(&self) -> ApiCredential {
        ApiCredential::resolve(self.upstream.api_key.as_deref(), &self.upstream.api_key_env)
    }
}

fn invalid(message: &str) -> AppError {
    AppError::Settings(config::ConfigError::Message(message.to_string()))
}

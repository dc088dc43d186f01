//! Process configuration read from the environment at startup.
//!
//! Every required key is checked here, once, before anything else is
//! built. A missing key is fatal at launch and never surfaces at request
//! time.

use std::time::Duration;

use crate::llm::config::LlmConfig;
use crate::llm::types::LlmError;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BACKEND_BASE_URL: &str = "https://backend.composio.dev/api/v1";
pub const DEFAULT_REMOTE_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_REMOTE_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DISPATCH_DEADLINE_SECS: u64 = 180;
pub const DEFAULT_AGENT_MAX_TOOL_ITERATIONS: usize = 10;
pub const DEFAULT_AGENT_MAX_TOKENS: u32 = 4096;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("LLM config: {0}")]
    Llm(#[from] LlmError),
}

impl crate::error::ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Missing(_) => "E_CONFIG_MISSING",
            Self::Invalid { .. } => "E_CONFIG_INVALID",
            Self::Llm(_) => "E_CONFIG_LLM",
        }
    }
}

/// Automation backend connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: String,
    pub api_key: String,
    pub integration_id: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

/// Bounds applied to one agent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentLimits {
    pub max_tool_iterations: usize,
    pub max_tokens: u32,
}

impl Default for AgentLimits {
    fn default() -> Self {
        Self { max_tool_iterations: DEFAULT_AGENT_MAX_TOOL_ITERATIONS, max_tokens: DEFAULT_AGENT_MAX_TOKENS }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub bot_auth_token: String,
    pub database_url: String,
    pub backend: BackendConfig,
    pub llm: LlmConfig,
    pub agent: AgentLimits,
    pub dispatch_deadline: Duration,
}

impl AppConfig {
    /// Read the full configuration from the environment.
    ///
    /// Required: `BOT_AUTH_TOKEN`, `INTEGRATION_ID`, `COMPOSIO_API_KEY`,
    /// `DATABASE_URL`, and the LLM key (see [`LlmConfig::from_env`]).
    ///
    /// # Errors
    ///
    /// Returns the first missing or malformed key.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|e| ConfigError::Invalid { key: "PORT", reason: e.to_string() })?,
            Err(_) => DEFAULT_PORT,
        };

        let backend = BackendConfig {
            base_url: std::env::var("COMPOSIO_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BACKEND_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: required("COMPOSIO_API_KEY")?,
            integration_id: required("INTEGRATION_ID")?,
            request_timeout: Duration::from_secs(env_parse(
                "REMOTE_REQUEST_TIMEOUT_SECS",
                DEFAULT_REMOTE_REQUEST_TIMEOUT_SECS,
            )),
            connect_timeout: Duration::from_secs(env_parse(
                "REMOTE_CONNECT_TIMEOUT_SECS",
                DEFAULT_REMOTE_CONNECT_TIMEOUT_SECS,
            )),
        };

        Ok(Self {
            port,
            bot_auth_token: required("BOT_AUTH_TOKEN")?,
            database_url: required("DATABASE_URL")?,
            backend,
            llm: LlmConfig::from_env()?,
            agent: AgentLimits {
                max_tool_iterations: env_parse("AGENT_MAX_TOOL_ITERATIONS", DEFAULT_AGENT_MAX_TOOL_ITERATIONS),
                max_tokens: env_parse("AGENT_MAX_TOKENS", DEFAULT_AGENT_MAX_TOKENS),
            },
            dispatch_deadline: Duration::from_secs(env_parse("DISPATCH_DEADLINE_SECS", DEFAULT_DISPATCH_DEADLINE_SECS)),
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key)),
    }
}

/// Parse an optional numeric env var, falling back to `default` when unset
/// or unparsable.
pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Serializes tests that mutate process-wide environment variables.
#[cfg(test)]
pub(crate) fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

//! Remote action client - the single wire contract with the automation backend.
//!
//! ARCHITECTURE
//! ============
//! Capability tools never speak HTTP themselves. They hand an app, an action
//! slug and an [`ActionInput`] to [`RemoteActions::execute`] and get back an
//! [`Envelope`]. Transport problems are folded into a failure envelope here,
//! so a tool has exactly one failure path to handle.
//!
//! The same backend provisions account links (`connectedAccounts`), exposed
//! through [`AccountProvisioner`].

pub mod envelope;
pub mod input;

use std::fmt;

use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::config::BackendConfig;
pub use envelope::{Envelope, Outcome};
pub use input::{ActionInput, Param};

// =============================================================================
// APPS
// =============================================================================

/// Backend app names. Fixed by the backend; also the action slug prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum App {
    GoogleCalendar,
    Gmail,
    Github,
    Slack,
}

impl App {
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::GoogleCalendar => "googlecalendar",
            Self::Gmail => "gmail",
            Self::Github => "github",
            Self::Slack => "slack",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::GoogleCalendar => "Google Calendar",
            Self::Gmail => "Gmail",
            Self::Github => "GitHub",
            Self::Slack => "Slack",
        }
    }
}

impl fmt::Display for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Errors from provisioning calls. Action calls never return these; see
/// [`Envelope::transport_failure`].
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("backend request failed: {0}")]
    Transport(String),
    #[error("backend returned status {status}")]
    Status { status: u16, body: String },
    #[error("backend response parse failed: {0}")]
    Parse(String),
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl crate::error::ErrorCode for RemoteError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E_REMOTE_TRANSPORT",
            Self::Status { .. } => "E_REMOTE_STATUS",
            Self::Parse(_) => "E_REMOTE_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// TRAITS
// =============================================================================

/// Execute one remote action. Exactly one network call per invocation.
#[async_trait::async_trait]
pub trait RemoteActions: Send + Sync {
    async fn execute(&self, connection_id: &str, app: App, action: &str, input: ActionInput) -> Envelope;
}

/// A freshly initiated account link awaiting out-of-band authorization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionRequest {
    #[serde(rename = "connectedAccountId")]
    pub connection_id: String,
    #[serde(rename = "redirectUrl")]
    pub redirect_url: String,
}

#[async_trait::async_trait]
pub trait AccountProvisioner: Send + Sync {
    /// Start a new connection for the configured integration.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or a
    /// body without `connectedAccountId`/`redirectUrl`.
    async fn initiate(&self) -> Result<ConnectionRequest, RemoteError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    integration_id: String,
}

impl BackendClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| RemoteError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            integration_id: config.integration_id.clone(),
        })
    }

    fn action_url(&self, app: App, action: &str) -> String {
        format!("{}/actions/{}_{}/execute", self.base_url, app.slug(), action)
    }

    async fn post(&self, url: &str, body: &serde_json::Value) -> Result<(u16, String), RemoteError> {
        let response = self
            .http
            .post(url)
            .header("X-API-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok((status, text))
    }
}

#[async_trait::async_trait]
impl RemoteActions for BackendClient {
    async fn execute(&self, connection_id: &str, app: App, action: &str, input: ActionInput) -> Envelope {
        info!(%app, action, "remote: executing action");
        let body = json!({
            "connectedAccountId": connection_id,
            "appName": app.slug(),
            "input": input.into_value(),
        });

        match self.post(&self.action_url(app, action), &body).await {
            Ok((status, text)) => {
                let envelope = envelope::parse_envelope(status, &text);
                if !envelope.executed {
                    warn!(
                        %app,
                        action,
                        status,
                        code = ?envelope.error_code(),
                        message = envelope.error_message().unwrap_or(""),
                        "remote: action not executed"
                    );
                }
                envelope
            }
            Err(e) => {
                warn!(%app, action, error = %e, "remote: transport failure");
                Envelope::transport_failure(e.to_string())
            }
        }
    }
}

#[async_trait::async_trait]
impl AccountProvisioner for BackendClient {
    async fn initiate(&self) -> Result<ConnectionRequest, RemoteError> {
        info!("remote: initiating account connection");
        let url = format!("{}/connectedAccounts", self.base_url);
        let (status, text) = self
            .post(&url, &json!({ "integrationId": self.integration_id }))
            .await?;
        parse_connection_request(status, &text)
    }
}

pub(crate) fn parse_connection_request(status: u16, body: &str) -> Result<ConnectionRequest, RemoteError> {
    if !(200..300).contains(&status) {
        return Err(RemoteError::Status { status, body: body.to_string() });
    }
    serde_json::from_str(body).map_err(|e| RemoteError::Parse(e.to_string()))
}

#[cfg(test)]
#[path = "remote_test.rs"]
mod tests;

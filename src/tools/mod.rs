//! Capability tools - typed wrappers over single remote actions.
//!
//! ARCHITECTURE
//! ============
//! Every tool follows the same four steps: deserialize the model's JSON
//! arguments into a params struct, build an [`ActionInput`] (optional keys
//! only when provided), execute exactly one remote action, and map the
//! envelope to a user-facing string. The mapping is uniform:
//!
//! - executed: an action-specific success string
//! - not executed, code 401: [`reauth_message`] for the tool's app
//! - anything else: [`failure_message`] naming the operation
//!
//! Tools are grouped per domain in closed enums; [`ToolSet`] is the subset a
//! single dispatch may use.

pub mod calendar;
pub mod code_hosting;
pub mod mail;
pub mod messaging;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::info;

use crate::llm::types::Tool;
use crate::remote::{App, Envelope, Outcome, RemoteActions};
pub use calendar::CalendarTool;
pub use code_hosting::CodeHostingTool;
pub use mail::MailTool;
pub use messaging::MessagingTool;

// =============================================================================
// ERRORS
// =============================================================================

/// Errors a tool reports back to the model instead of to the user.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("invalid input for {tool}: {reason}")]
    InvalidInput { tool: &'static str, reason: String },
    #[error("tool not available: {0}")]
    NotAvailable(String),
}

impl crate::error::ErrorCode for ToolError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "E_TOOL_INPUT",
            Self::NotAvailable(_) => "E_TOOL_NOT_AVAILABLE",
        }
    }
}

// =============================================================================
// CAPABILITY TOOL
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityTool {
    Calendar(CalendarTool),
    Mail(MailTool),
    CodeHosting(CodeHostingTool),
    Messaging(MessagingTool),
}

impl CapabilityTool {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Calendar(t) => t.name(),
            Self::Mail(t) => t.name(),
            Self::CodeHosting(t) => t.name(),
            Self::Messaging(t) => t.name(),
        }
    }

    #[must_use]
    pub fn app(self) -> App {
        match self {
            Self::Calendar(_) => App::GoogleCalendar,
            Self::Mail(_) => App::Gmail,
            Self::CodeHosting(_) => App::Github,
            Self::Messaging(_) => App::Slack,
        }
    }

    /// LLM-facing definition. The connection id is never part of the schema.
    #[must_use]
    pub fn definition(self) -> Tool {
        let (description, input_schema) = match self {
            Self::Calendar(t) => (t.description(), t.input_schema()),
            Self::Mail(t) => (t.description(), t.input_schema()),
            Self::CodeHosting(t) => (t.description(), t.input_schema()),
            Self::Messaging(t) => (t.description(), t.input_schema()),
        };
        Tool { name: self.name().into(), description: description.into(), input_schema }
    }

    /// Run the tool against `connection_id` with model-supplied `args`.
    ///
    /// # Errors
    ///
    /// Only argument errors surface as `Err`; every remote outcome, including
    /// failures, is an `Ok` string.
    pub async fn run(self, remote: &dyn RemoteActions, connection_id: &str, args: &Value) -> Result<String, ToolError> {
        info!(tool = self.name(), app = %self.app(), "tool: run");
        match self {
            Self::Calendar(t) => t.run(remote, connection_id, args).await,
            Self::Mail(t) => t.run(remote, connection_id, args).await,
            Self::CodeHosting(t) => t.run(remote, connection_id, args).await,
            Self::Messaging(t) => t.run(remote, connection_id, args).await,
        }
    }
}

// =============================================================================
// TOOL SET
// =============================================================================

/// The tools one agent run may call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSet {
    tools: Vec<CapabilityTool>,
}

impl ToolSet {
    #[must_use]
    pub fn new(tools: Vec<CapabilityTool>) -> Self {
        Self { tools }
    }

    #[must_use]
    pub fn calendar() -> Self {
        Self::new(CalendarTool::ALL.iter().copied().map(CapabilityTool::Calendar).collect())
    }

    #[must_use]
    pub fn mail() -> Self {
        Self::new(MailTool::ALL.iter().copied().map(CapabilityTool::Mail).collect())
    }

    #[must_use]
    pub fn code_hosting() -> Self {
        Self::new(CodeHostingTool::ALL.iter().copied().map(CapabilityTool::CodeHosting).collect())
    }

    #[must_use]
    pub fn messaging() -> Self {
        Self::new(MessagingTool::ALL.iter().copied().map(CapabilityTool::Messaging).collect())
    }

    #[must_use]
    pub fn all() -> Self {
        let mut tools = Self::calendar().tools;
        tools.extend(Self::mail().tools);
        tools.extend(Self::code_hosting().tools);
        tools.extend(Self::messaging().tools);
        Self::new(tools)
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<CapabilityTool> {
        self.tools.iter().copied().find(|t| t.name() == name)
    }

    #[must_use]
    pub fn definitions(&self) -> Vec<Tool> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.tools.len()
    }
}

// =============================================================================
// SHARED HELPERS
// =============================================================================

/// Re-authorization instruction for an expired link.
#[must_use]
pub fn reauth_message(app: App) -> String {
    format!(
        "Your {} authentication credentials have expired. Please re-authenticate using the `!authenticate` command.",
        app.display_name()
    )
}

/// Generic failure string for everything that is not a 401.
#[must_use]
pub fn failure_message(operation: &str) -> String {
    format!("Something went wrong while {operation}.")
}

/// Map an envelope to the user string, calling `on_success` with the
/// response body when the action executed.
pub(crate) fn finish(envelope: &Envelope, app: App, operation: &str, on_success: impl FnOnce(&Value) -> String) -> String {
    match envelope.outcome() {
        Outcome::Executed(response) => on_success(response),
        Outcome::Unauthorized => reauth_message(app),
        Outcome::Failed => failure_message(operation),
    }
}

pub(crate) fn parse_args<T: DeserializeOwned>(tool: &'static str, args: &Value) -> Result<T, ToolError> {
    // Models sometimes send `null` instead of `{}` for argument-less tools.
    let args = if args.is_null() { json!({}) } else { args.clone() };
    serde_json::from_value(args).map_err(|e| ToolError::InvalidInput { tool, reason: e.to_string() })
}

/// Render at most `cap` items, one per line, under `header`.
///
/// Items that `render` rejects are skipped before the cap applies. Returns
/// `empty` when nothing renders, and appends `(showing N of L)` with the
/// rendered count when the collection had more than `cap` items.
pub(crate) fn render_list(
    items: Option<&Vec<Value>>,
    cap: usize,
    header: &str,
    empty: &str,
    separator: &str,
    render: impl Fn(&Value) -> Option<String>,
) -> String {
    let items = items.map_or(&[][..], Vec::as_slice);
    let lines: Vec<String> = items.iter().filter_map(render).take(cap).collect();
    if lines.is_empty() {
        return empty.to_string();
    }
    let mut out = format!("{header}\n{}", lines.join(separator));
    if items.len() > cap {
        out.push_str(&format!("\n\n(showing {} of {})", lines.len(), items.len()));
    }
    out
}

/// First `n` characters of `s`.
#[must_use]
pub fn preview(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// String field lookup with a fallback.
pub(crate) fn str_field<'a>(value: &'a Value, key: &str, default: &'a str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or(default)
}

/// JSON schema object with the given properties and required keys.
pub(crate) fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
#[path = "tools_test.rs"]
mod tests;

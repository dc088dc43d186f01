//! Dispatcher - select a tool set, compose a task, run the agent once.
//!
//! ARCHITECTURE
//! ============
//! `dispatch` is a straight pipeline with no retries:
//!
//! 1. Select: the caller parses the service name into [`Service`] with
//!    `FromStr`. An unknown name yields [`InvalidService`], whose message
//!    is the user-facing reply, before any agent or network work.
//! 2. Compose: build a [`TaskBundle`] from the request, today's date, the
//!    local offset, the connection id and per-domain extraction hints.
//! 3. Execute: hand the tool set and bundle to [`Agent::choose_and_execute`]
//!    exactly once, under an overall deadline.
//! 4. Finalize: non-empty text is returned verbatim; anything else becomes
//!    [`FALLBACK_REPLY`].
//!
//! Creation requests are not deduplicated: dispatching the same request
//! twice performs the remote side effect twice.

pub mod agent;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use time::{Date, OffsetDateTime, UtcOffset};
use tracing::{info, warn};

pub use agent::{Agent, AgentError, LlmAgent};
use crate::error::ErrorCode;
use crate::tools::ToolSet;

/// Returned whenever the agent produced nothing usable.
pub const FALLBACK_REPLY: &str = "Something went wrong. Please try again.";

// =============================================================================
// SERVICE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Calendar,
    Mail,
    CodeHosting,
    Messaging,
    All,
}

/// Unknown service name; `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid service '{0}'. Please use 'calendar', 'mail', 'code-hosting', 'messaging', or 'all'.")]
pub struct InvalidService(pub String);

impl FromStr for Service {
    type Err = InvalidService;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "calendar" => Ok(Self::Calendar),
            "mail" | "gmail" => Ok(Self::Mail),
            "code-hosting" | "code_hosting" | "github" => Ok(Self::CodeHosting),
            "messaging" | "slack" => Ok(Self::Messaging),
            "all" | "ai" => Ok(Self::All),
            _ => Err(InvalidService(s.to_string())),
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Service {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Mail => "mail",
            Self::CodeHosting => "code-hosting",
            Self::Messaging => "messaging",
            Self::All => "all",
        }
    }

    /// The fixed tool subset for this service. `All` is the union.
    #[must_use]
    pub fn tool_set(self) -> ToolSet {
        match self {
            Self::Calendar => ToolSet::calendar(),
            Self::Mail => ToolSet::mail(),
            Self::CodeHosting => ToolSet::code_hosting(),
            Self::Messaging => ToolSet::messaging(),
            Self::All => ToolSet::all(),
        }
    }

    fn persona(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Self::Calendar => (
                "Google Calendar Agent",
                "Take action on Google Calendar on the user's behalf.",
                "You manage the user's Google Calendar. Use the tools you are given to look up, create, change and remove events.",
            ),
            Self::Mail => (
                "Gmail Agent",
                "Manage Gmail: send email, search the inbox, check unread mail and create drafts.",
                "You manage the user's Gmail mailbox with the tools you are given.",
            ),
            Self::CodeHosting => (
                "GitHub Agent",
                "Manage GitHub: issues, pull requests, repository search and stars.",
                "You manage the user's GitHub account with the tools you are given.",
            ),
            Self::Messaging => (
                "Slack Agent",
                "Manage Slack: messages, channels, status and direct messages.",
                "You act in the user's Slack workspace with the tools you are given.",
            ),
            Self::All => (
                "Multi-Service Agent",
                "Handle requests across Google Calendar, Gmail, GitHub and Slack.",
                "You manage several services for the user. Pick the service and tools that fit the request.",
            ),
        }
    }

    fn hints(self) -> &'static [&'static str] {
        const CALENDAR: &str = "Schedule relative to today's date and use the timezone above for all datetimes.";
        const MAIL: &str = "Make sure email addresses are properly formatted.";
        const CODE_HOSTING: &str = "Extract the repository owner and name from the request.";
        const MESSAGING: &str = "Identify the channel or user correctly.";
        match self {
            Self::Calendar => &[CALENDAR],
            Self::Mail => &[MAIL],
            Self::CodeHosting => &[CODE_HOSTING],
            Self::Messaging => &[MESSAGING],
            Self::All => &[CALENDAR, MAIL, CODE_HOSTING, MESSAGING],
        }
    }
}

// =============================================================================
// CONTEXT & TASK
// =============================================================================

/// Everything one dispatch knows. Built fresh per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchContext {
    pub service: Service,
    pub connection_id: String,
    pub request: String,
    pub today: Date,
    pub utc_offset: UtcOffset,
}

impl DispatchContext {
    #[must_use]
    pub fn at(service: Service, connection_id: &str, request: &str, now: OffsetDateTime) -> Self {
        Self {
            service,
            connection_id: connection_id.to_string(),
            request: request.to_string(),
            today: now.date(),
            utc_offset: now.offset(),
        }
    }
}

/// Instructions for one agent run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskBundle {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub description: String,
    pub expected_output: String,
    /// Bound into every tool call by the agent; never taken from the model.
    pub connection_id: String,
}

impl TaskBundle {
    #[must_use]
    pub fn compose(ctx: &DispatchContext) -> Self {
        let (role, goal, backstory) = ctx.service.persona();
        let mut description = format!(
            "Handle the following {} request:\n<user_request>\n{}\n</user_request>\n\n\
             Today's date is {} and the timezone is {}.\n\
             The connected account ID is {}.",
            ctx.service,
            ctx.request,
            ctx.today,
            format_offset(ctx.utc_offset),
            ctx.connection_id,
        );
        for hint in ctx.service.hints() {
            description.push('\n');
            description.push_str(hint);
        }
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            description,
            expected_output: format!(
                "A short, friendly confirmation of what was done for the {} task, or what went wrong.",
                ctx.service
            ),
            connection_id: ctx.connection_id.clone(),
        }
    }
}

/// `UTC+05:30` style rendering.
fn format_offset(offset: UtcOffset) -> String {
    let (h, m, _) = offset.as_hms();
    let sign = if offset.is_negative() { '-' } else { '+' };
    format!("UTC{sign}{:02}:{:02}", h.unsigned_abs(), m.unsigned_abs())
}

// =============================================================================
// DISPATCHER
// =============================================================================

pub struct Dispatcher {
    agent: Arc<dyn Agent>,
    deadline: Duration,
    utc_offset: UtcOffset,
}

impl Dispatcher {
    /// Falls back to UTC when the local offset cannot be read, which is the
    /// usual case once the runtime has started threads. `main` reads it
    /// before that and passes it to [`Dispatcher::with_utc_offset`].
    #[must_use]
    pub fn new(agent: Arc<dyn Agent>, deadline: Duration) -> Self {
        let utc_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
        Self { agent, deadline, utc_offset }
    }

    #[must_use]
    pub fn with_utc_offset(mut self, utc_offset: UtcOffset) -> Self {
        self.utc_offset = utc_offset;
        self
    }

    /// Run one request against `service`. Always returns a user-facing
    /// string.
    pub async fn dispatch(&self, connection_id: &str, service: Service, request: &str) -> String {
        let now = OffsetDateTime::now_utc().to_offset(self.utc_offset);
        let ctx = DispatchContext::at(service, connection_id, request, now);
        let task = TaskBundle::compose(&ctx);
        let tools = service.tool_set();
        info!(%service, tools = tools.len(), request_len = request.len(), "dispatch: start");

        let outcome = tokio::time::timeout(self.deadline, self.agent.choose_and_execute(&tools, &task)).await;
        finalize(outcome)
    }
}

fn finalize(outcome: Result<Result<String, AgentError>, tokio::time::error::Elapsed>) -> String {
    match outcome {
        Ok(Ok(text)) if !text.trim().is_empty() => {
            info!(reply_len = text.len(), "dispatch: complete");
            text
        }
        Ok(Ok(_)) => {
            warn!("dispatch: agent returned empty output");
            FALLBACK_REPLY.to_string()
        }
        Ok(Err(e)) => {
            warn!(code = e.error_code(), retryable = e.retryable(), error = %e, "dispatch: agent failed");
            FALLBACK_REPLY.to_string()
        }
        Err(_) => {
            warn!("dispatch: deadline exceeded");
            FALLBACK_REPLY.to_string()
        }
    }
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;

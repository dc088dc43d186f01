//! Chat commands - account flows, service requests, menus and help.
//!
//! DESIGN
//! ======
//! Every command ends in a [`Reply`]; nothing here returns an error to the
//! front end. Service commands resolve the owner's connection through the
//! [`Gateway`](crate::accounts::Gateway) and then run one dispatch. Calendar
//! commands (free-form, `upcoming` and the calendar quick actions) may
//! promote a pending link; other domains only accept confirmed links.

use serde::Serialize;
use tracing::{info, warn};

use crate::accounts::AccountError;
use crate::dispatch::{FALLBACK_REPLY, Service};
use crate::error::ErrorCode;
use crate::state::AppState;

pub const DEFAULT_UPCOMING_COUNT: u32 = 10;

const NO_ACCOUNT: &str = "You don't have an account yet. Please create one using `!create_account`.";
const ALREADY_LINKED: &str = "You already have an account! Use `!dashboard` to access all features.";

// =============================================================================
// COMMAND
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    UpcomingEvents,
    TodayEvents,
    UnreadMail,
}

impl QuickAction {
    fn service(self) -> Service {
        match self {
            Self::UpcomingEvents | Self::TodayEvents => Service::Calendar,
            Self::UnreadMail => Service::Mail,
        }
    }

    fn prompt(self) -> String {
        match self {
            Self::UpcomingEvents => upcoming_prompt(DEFAULT_UPCOMING_COUNT),
            Self::TodayEvents => "Show me all events today".into(),
            Self::UnreadMail => "Check my unread emails count".into(),
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::UpcomingEvents => "Your Upcoming Events",
            Self::TodayEvents => "Today's Events",
            Self::UnreadMail => "Gmail Status",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    GettingStarted,
    Calendar,
    Mail,
    CodeHosting,
    Messaging,
    All,
}

impl HelpTopic {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "getting_started" | "getting-started" | "start" => Some(Self::GettingStarted),
            "calendar" => Some(Self::Calendar),
            "gmail" | "mail" => Some(Self::Mail),
            "github" | "code-hosting" | "code_hosting" => Some(Self::CodeHosting),
            "slack" | "messaging" => Some(Self::Messaging),
            "ai" | "all" => Some(Self::All),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateAccount,
    Authenticate,
    /// Free-form request; `service` is parsed at handling time so unknown
    /// names get the invalid-service reply.
    Service { service: String, text: String },
    Upcoming { count: u32 },
    QuickAction(QuickAction),
    Help { topic: Option<HelpTopic> },
    Dashboard,
    CalendarMenu,
    ServiceMenu,
}

impl Command {
    /// Build a command from its wire name and optional fields. Any name that
    /// is not a fixed command is taken as a service name.
    #[must_use]
    pub fn from_parts(name: &str, text: Option<String>, count: Option<u32>, topic: Option<&str>) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "create_account" => Self::CreateAccount,
            "authenticate" => Self::Authenticate,
            "upcoming" => Self::Upcoming { count: count.unwrap_or(DEFAULT_UPCOMING_COUNT) },
            "upcoming_events" => Self::QuickAction(QuickAction::UpcomingEvents),
            "today_events" => Self::QuickAction(QuickAction::TodayEvents),
            "unread_mail" => Self::QuickAction(QuickAction::UnreadMail),
            "help" => Self::Help { topic: topic.and_then(HelpTopic::parse) },
            "dashboard" => Self::Dashboard,
            "calendar_menu" => Self::CalendarMenu,
            "service_menu" => Self::ServiceMenu,
            _ => Self::Service { service: name.trim().to_string(), text: text.unwrap_or_default() },
        }
    }
}

// =============================================================================
// REPLY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub label: String,
    pub url: String,
}

/// What the chat front end renders for one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
    pub tone: Tone,
}

impl Reply {
    fn new(title: impl Into<String>, description: impl Into<String>, tone: Tone) -> Self {
        Self { title: title.into(), description: description.into(), link: None, tone }
    }

    fn with_link(mut self, label: &str, url: String) -> Self {
        self.link = Some(Link { label: label.into(), url });
        self
    }

    fn no_account() -> Self {
        Self::new("No Account", NO_ACCOUNT, Tone::Error)
    }

    fn fallback() -> Self {
        Self::new("Error", FALLBACK_REPLY, Tone::Error)
    }
}

// =============================================================================
// HANDLER
// =============================================================================

/// Run one command for `owner_id`.
pub async fn handle(state: &AppState, owner_id: &str, command: Command) -> Reply {
    info!(%owner_id, ?command, "command: start");
    match command {
        Command::CreateAccount => create_account(state, owner_id).await,
        Command::Authenticate => authenticate(state, owner_id).await,
        Command::Service { service, text } => service_request(state, owner_id, &service, &text).await,
        Command::Upcoming { count } => {
            let count = count.max(1);
            let title = format!("Your Next {count} Events");
            run(state, owner_id, Service::Calendar, &upcoming_prompt(count), &title).await
        }
        Command::QuickAction(action) => run(state, owner_id, action.service(), &action.prompt(), action.title()).await,
        Command::Help { topic } => help(topic),
        Command::Dashboard => linked_only(state, owner_id, dashboard).await,
        Command::CalendarMenu => linked_only(state, owner_id, calendar_menu).await,
        Command::ServiceMenu => linked_only(state, owner_id, service_menu).await,
    }
}

fn upcoming_prompt(count: u32) -> String {
    format!("List my next {count} upcoming events")
}

fn account_failure(owner_id: &str, err: &AccountError) -> Reply {
    match err {
        AccountError::NoAccount => Reply::no_account(),
        AccountError::AlreadyLinked => Reply::new("Account Status", ALREADY_LINKED, Tone::Info),
        AccountError::Provision(_) | AccountError::Database(_) => {
            warn!(%owner_id, code = err.error_code(), retryable = err.retryable(), error = %err, "command: account operation failed");
            Reply::fallback()
        }
    }
}

async fn create_account(state: &AppState, owner_id: &str) -> Reply {
    match state.gateway.create_account(owner_id).await {
        Ok(url) => Reply::new(
            "Account Creation",
            "Welcome! Let's get you set up.\n\n\
             **Step 1:** Open the link below to connect your accounts\n\
             **Step 2:** Authorize the services you want to use\n\
             **Step 3:** Return here and start using the bot!\n\n\
             After setup, use `!dashboard` for quick access to all features.",
            Tone::Success,
        )
        .with_link("Connect Services", url),
        Err(e) => account_failure(owner_id, &e),
    }
}

async fn authenticate(state: &AppState, owner_id: &str) -> Reply {
    match state.gateway.reauthenticate(owner_id).await {
        Ok(url) => Reply::new(
            "Re-authentication",
            "Let's reconnect your services.\n\nOpen the link below to re-authenticate:",
            Tone::Warning,
        )
        .with_link("Reconnect Services", url),
        Err(AccountError::NoAccount) => Reply::new("No Account Found", NO_ACCOUNT, Tone::Error),
        Err(e) => account_failure(owner_id, &e),
    }
}

async fn service_request(state: &AppState, owner_id: &str, name: &str, text: &str) -> Reply {
    let service = match name.parse::<Service>() {
        Ok(service) => service,
        Err(invalid) => {
            info!(%owner_id, service = name, "command: invalid service");
            return Reply::new("Invalid Service", invalid.to_string(), Tone::Error);
        }
    };
    if text.trim().is_empty() {
        return Reply::new("Missing Request", format!("Usage: `!{name} <message>`"), Tone::Warning);
    }
    run(state, owner_id, service, text, &result_title(service)).await
}

fn result_title(service: Service) -> String {
    match service {
        Service::Calendar => "Calendar Result".into(),
        Service::Mail => "Gmail Result".into(),
        Service::CodeHosting => "GitHub Result".into(),
        Service::Messaging => "Slack Result".into(),
        Service::All => "AI Result".into(),
    }
}

async fn run(state: &AppState, owner_id: &str, service: Service, request: &str, title: &str) -> Reply {
    let connection_id = match state.gateway.resolve(owner_id, service).await {
        Ok(id) => id,
        Err(e) => return account_failure(owner_id, &e),
    };
    let text = state
        .dispatcher
        .dispatch(&connection_id, service, request)
        .await;
    let tone = if text == FALLBACK_REPLY { Tone::Error } else { Tone::Info };
    Reply::new(title, text, tone)
}

async fn linked_only(state: &AppState, owner_id: &str, render: fn() -> Reply) -> Reply {
    match state.gateway.is_linked(owner_id).await {
        Ok(true) => render(),
        Ok(false) => Reply::no_account(),
        Err(e) => account_failure(owner_id, &e),
    }
}

// =============================================================================
// STATIC REPLIES
// =============================================================================

fn dashboard() -> Reply {
    Reply::new(
        "Your Dashboard",
        "Quick access to your services.\n\n\
         **Quick actions:** `upcoming_events`, `today_events`, `unread_mail`\n\n\
         **Services:**\n\
         • `!calendar <message>` - Calendar\n\
         • `!gmail <message>` - Gmail\n\
         • `!github <message>` - GitHub: create or list issues, search repositories, create pull requests, star repositories\n\
         • `!slack <message>` - Slack: send messages, create or list channels, set status, send direct messages\n\
         • `!ai <message>` - AI assistant that decides which services to use",
        Tone::Info,
    )
}

fn calendar_menu() -> Reply {
    Reply::new(
        "Calendar Quick Actions",
        "Choose a quick action or use `!calendar <message>` for natural language commands.\n\n\
         **Quick actions:**\n\
         • `upcoming_events` - View upcoming events\n\
         • `today_events` - See today's schedule\n\
         • `!upcoming [count]` - List a specific number of upcoming events",
        Tone::Info,
    )
}

fn service_menu() -> Reply {
    Reply::new(
        "Service Selection",
        "Pick a service and send your request with its command:\n\n\
         **Calendar** `!calendar` - Manage events and schedules\n\
         **Gmail** `!gmail` - Send and manage emails\n\
         **GitHub** `!github` - Manage repositories and issues\n\
         **Slack** `!slack` - Team messaging and channels\n\
         **AI** `!ai` - Multi-service AI assistant",
        Tone::Info,
    )
}

fn help(topic: Option<HelpTopic>) -> Reply {
    let (title, body) = match topic {
        None => (
            "Help",
            "Welcome to your multi-service AI assistant!\n\n\
             **Dashboard & menus:**\n\
             • `!dashboard` - Dashboard with quick actions\n\
             • `!calendar_menu` - Calendar quick actions\n\
             • `!service_menu` - Choose a service\n\n\
             **Account Management:**\n\
             • `!create_account` - Create and connect services\n\
             • `!authenticate` - Re-authenticate services\n\n\
             **Services:**\n\
             • `!calendar <msg>` - Calendar management\n\
             • `!gmail <msg>` - Email management\n\
             • `!github <msg>` - GitHub operations\n\
             • `!slack <msg>` - Slack messaging\n\
             • `!ai <msg>` - AI multi-service\n\n\
             Ask for `help` with a topic (getting_started, calendar, gmail, github, slack, ai) for details.",
        ),
        Some(HelpTopic::GettingStarted) => (
            "Getting Started",
            "**Setup Commands:**\n\
             • `!create_account` - Create a new account and connect to services\n\
             • `!authenticate` - Re-authenticate if credentials expire\n\
             • `!dashboard` - Open your dashboard\n\n\
             **First Steps:**\n\
             1. Run `!create_account` and follow the link\n\
             2. Connect the services you want to use\n\
             3. Start using commands or the dashboard!",
        ),
        Some(HelpTopic::Calendar) => (
            "Calendar Commands",
            "**Commands:**\n\
             • `!calendar <message>` - Natural language calendar management\n\
             • `!upcoming [count]` - List upcoming events\n\
             • `!calendar_menu` - Calendar quick actions\n\n\
             **Examples:**\n\
             • Create a meeting tomorrow at 2pm\n\
             • Find all events this week\n\
             • Delete the meeting called 'Team Sync'",
        ),
        Some(HelpTopic::Mail) => (
            "Gmail Commands",
            "**Command:**\n\
             • `!gmail <message>` - Manage your Gmail\n\n\
             **Examples:**\n\
             • Send an email to john@example.com with subject 'Meeting'\n\
             • Search for emails from sarah@example.com\n\
             • Create a draft email\n\
             • Check my unread emails",
        ),
        Some(HelpTopic::CodeHosting) => (
            "GitHub Commands",
            "**Command:**\n\
             • `!github <message>` - Manage GitHub\n\n\
             **Examples:**\n\
             • Create an issue in owner/repo with title 'Bug fix'\n\
             • List open issues in facebook/react\n\
             • Search for machine learning repositories\n\
             • Create a pull request in owner/repo",
        ),
        Some(HelpTopic::Messaging) => (
            "Slack Commands",
            "**Command:**\n\
             • `!slack <message>` - Manage Slack\n\n\
             **Examples:**\n\
             • Send 'Hello team!' to #general\n\
             • List all channels\n\
             • Create a channel called project-alpha\n\
             • Set my status to 'In a meeting'",
        ),
        Some(HelpTopic::All) => (
            "AI Multi-Service Assistant",
            "**Command:**\n\
             • `!ai <message>` - AI with access to ALL services\n\n\
             **Examples:**\n\
             • Schedule a meeting and notify team on Slack\n\
             • Create GitHub issue and send email about it\n\
             • Check calendar and send summary via email\n\
             • Find events this week and post to Slack",
        ),
    };
    Reply::new(title, body, Tone::Info)
}

#[cfg(test)]
#[path = "commands_test.rs"]
mod tests;

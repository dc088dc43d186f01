//! Mail tools (`gmail` app).

use serde::Deserialize;
use serde_json::{Value, json};

use super::{ToolError, finish, object_schema, parse_args, preview, render_list, str_field};
use crate::remote::{ActionInput, App, Param, RemoteActions};

const APP: App = App::Gmail;

pub const SEARCH_CAP: usize = 10;
pub const DEFAULT_SEARCH_RESULTS: u32 = 10;
const SNIPPET_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MailTool {
    SendEmail,
    SearchEmails,
    GetUnreadCount,
    CreateDraft,
}

#[derive(Deserialize)]
struct SendArgs {
    to_email: String,
    subject: String,
    body: String,
    #[serde(default)]
    cc: Param<String>,
    #[serde(default)]
    bcc: Param<String>,
}

#[derive(Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    max_results: Param<u32>,
}

#[derive(Deserialize)]
struct DraftArgs {
    to_email: String,
    subject: String,
    body: String,
}

impl MailTool {
    pub const ALL: [Self; 4] = [Self::SendEmail, Self::SearchEmails, Self::GetUnreadCount, Self::CreateDraft];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::SendEmail => "send_email",
            Self::SearchEmails => "search_emails",
            Self::GetUnreadCount => "get_unread_count",
            Self::CreateDraft => "create_draft",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::SendEmail => "Send an email via Gmail.",
            Self::SearchEmails => "Search the Gmail inbox using Gmail search syntax (e.g. 'from:sam is:unread').",
            Self::GetUnreadCount => "Check the mailbox for unread email.",
            Self::CreateDraft => "Save a draft email in Gmail without sending it.",
        }
    }

    #[must_use]
    pub fn input_schema(self) -> Value {
        match self {
            Self::SendEmail => object_schema(
                json!({
                    "to_email": { "type": "string" },
                    "subject": { "type": "string" },
                    "body": { "type": "string" },
                    "cc": { "type": "string" },
                    "bcc": { "type": "string" },
                }),
                &["to_email", "subject", "body"],
            ),
            Self::SearchEmails => object_schema(
                json!({
                    "query": { "type": "string" },
                    "max_results": { "type": "integer", "default": DEFAULT_SEARCH_RESULTS },
                }),
                &["query"],
            ),
            Self::GetUnreadCount => object_schema(json!({}), &[]),
            Self::CreateDraft => object_schema(
                json!({
                    "to_email": { "type": "string" },
                    "subject": { "type": "string" },
                    "body": { "type": "string" },
                }),
                &["to_email", "subject", "body"],
            ),
        }
    }

    /// # Errors
    ///
    /// Returns [`ToolError::InvalidInput`] when `args` do not match the schema.
    pub async fn run(self, remote: &dyn RemoteActions, connection_id: &str, args: &Value) -> Result<String, ToolError> {
        let name = self.name();
        let text = match self {
            Self::SendEmail => {
                let a: SendArgs = parse_args(name, args)?;
                let to = a.to_email.clone();
                let input = ActionInput::new()
                    .required("to_email", a.to_email)
                    .required("subject", a.subject)
                    .required("body", a.body)
                    .optional("cc", &a.cc)
                    .optional("bcc", &a.bcc);
                let env = remote.execute(connection_id, APP, "send_email", input).await;
                finish(&env, APP, "sending the email", |_| format!("Email sent successfully to {to}."))
            }
            Self::SearchEmails => {
                let a: SearchArgs = parse_args(name, args)?;
                let input = ActionInput::new()
                    .required("query", a.query)
                    .required("max_results", a.max_results.unwrap_or(DEFAULT_SEARCH_RESULTS));
                let env = remote.execute(connection_id, APP, "search_emails", input).await;
                finish(&env, APP, "searching emails", |r| {
                    let messages = r.get("messages").and_then(Value::as_array);
                    render_list(
                        messages,
                        SEARCH_CAP,
                        "**Search Results:**",
                        "No emails found matching your search.",
                        "\n\n",
                        |m| {
                            Some(format!(
                                "- **From:** {}\n  **Subject:** {}\n  **Preview:** {}...",
                                str_field(m, "from", "Unknown"),
                                str_field(m, "subject", "No Subject"),
                                preview(str_field(m, "snippet", ""), SNIPPET_PREVIEW_CHARS)
                            ))
                        },
                    )
                })
            }
            Self::GetUnreadCount => {
                let env = remote
                    .execute(connection_id, APP, "get_profile", ActionInput::new())
                    .await;
                finish(&env, APP, "fetching mailbox information", |r| {
                    let address = str_field(r, "emailAddress", "your account");
                    match r.get("messagesUnread").and_then(Value::as_u64) {
                        Some(count) => format!("You have {count} unread emails in {address}."),
                        None => format!("You have unread emails in {address}. Use search to find specific emails."),
                    }
                })
            }
            Self::CreateDraft => {
                let a: DraftArgs = parse_args(name, args)?;
                let input = ActionInput::new()
                    .required("to_email", a.to_email)
                    .required("subject", a.subject)
                    .required("body", a.body);
                let env = remote.execute(connection_id, APP, "create_draft", input).await;
                finish(&env, APP, "creating the draft", |_| {
                    "Draft email created successfully. You can review and send it from Gmail.".to_string()
                })
            }
        };
        Ok(text)
    }
}

#[cfg(test)]
#[path = "mail_test.rs"]
mod tests;

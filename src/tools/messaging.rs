//! Team messaging tools (`slack` app).

use serde::Deserialize;
use serde_json::{Value, json};

use super::{ToolError, finish, object_schema, parse_args, render_list, str_field};
use crate::remote::{ActionInput, App, Param, RemoteActions};

const APP: App = App::Slack;

pub const CHANNEL_LIST_CAP: usize = 20;
pub const DEFAULT_STATUS_EMOJI: &str = ":speech_balloon:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessagingTool {
    SendMessage,
    ListChannels,
    CreateChannel,
    SetStatus,
    SendDirectMessage,
}

#[derive(Deserialize)]
struct MessageArgs {
    channel: String,
    text: String,
}

#[derive(Deserialize)]
struct CreateChannelArgs {
    name: String,
    #[serde(default)]
    is_private: Param<bool>,
}

#[derive(Deserialize)]
struct StatusArgs {
    status_text: String,
    #[serde(default)]
    status_emoji: Param<String>,
}

#[derive(Deserialize)]
struct DirectMessageArgs {
    user: String,
    text: String,
}

impl MessagingTool {
    pub const ALL: [Self; 5] = [
        Self::SendMessage,
        Self::ListChannels,
        Self::CreateChannel,
        Self::SetStatus,
        Self::SendDirectMessage,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::SendMessage => "send_message",
            Self::ListChannels => "list_channels",
            Self::CreateChannel => "create_channel",
            Self::SetStatus => "set_status",
            Self::SendDirectMessage => "send_direct_message",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::SendMessage => "Post a message to a Slack channel (name like '#general' or channel ID).",
            Self::ListChannels => "List channels in the Slack workspace.",
            Self::CreateChannel => "Create a Slack channel.",
            Self::SetStatus => "Set the user's Slack status text and emoji.",
            Self::SendDirectMessage => "Send a direct message to a Slack user (user ID or @handle).",
        }
    }

    #[must_use]
    pub fn input_schema(self) -> Value {
        match self {
            Self::SendMessage => object_schema(
                json!({ "channel": { "type": "string" }, "text": { "type": "string" } }),
                &["channel", "text"],
            ),
            Self::ListChannels => object_schema(json!({}), &[]),
            Self::CreateChannel => object_schema(
                json!({
                    "name": { "type": "string", "description": "Lowercase, no spaces." },
                    "is_private": { "type": "boolean", "default": false },
                }),
                &["name"],
            ),
            Self::SetStatus => object_schema(
                json!({
                    "status_text": { "type": "string" },
                    "status_emoji": { "type": "string", "default": DEFAULT_STATUS_EMOJI },
                }),
                &["status_text"],
            ),
            Self::SendDirectMessage => object_schema(
                json!({ "user": { "type": "string" }, "text": { "type": "string" } }),
                &["user", "text"],
            ),
        }
    }

    /// # Errors
    ///
    /// Returns [`ToolError::InvalidInput`] when `args` do not match the schema.
    pub async fn run(self, remote: &dyn RemoteActions, connection_id: &str, args: &Value) -> Result<String, ToolError> {
        let name = self.name();
        let text = match self {
            Self::SendMessage => {
                let a: MessageArgs = parse_args(name, args)?;
                let channel = a.channel.clone();
                let input = ActionInput::new()
                    .required("channel", a.channel)
                    .required("text", a.text);
                let env = remote.execute(connection_id, APP, "send_message", input).await;
                finish(&env, APP, "sending the Slack message", |_| format!("Message sent to {channel} successfully."))
            }
            Self::ListChannels => {
                let env = remote
                    .execute(connection_id, APP, "list_channels", ActionInput::new())
                    .await;
                finish(&env, APP, "listing channels", |r| {
                    let channels = r.get("channels").and_then(Value::as_array);
                    render_list(channels, CHANNEL_LIST_CAP, "**Slack Channels:**", "No channels found.", "\n", |c| {
                        let member = if c.get("is_member").and_then(Value::as_bool).unwrap_or(false) { "x" } else { " " };
                        Some(format!("[{member}] **#{}** (`{}`)", str_field(c, "name", "Unknown"), str_field(c, "id", "")))
                    })
                })
            }
            Self::CreateChannel => {
                let a: CreateChannelArgs = parse_args(name, args)?;
                let requested = a.name.clone();
                let input = ActionInput::new()
                    .required("name", a.name)
                    .required("is_private", a.is_private.unwrap_or(false));
                let env = remote.execute(connection_id, APP, "create_channel", input).await;
                finish(&env, APP, "creating the channel", |r| {
                    let created = r
                        .get("channel")
                        .and_then(|c| c.get("name"))
                        .and_then(Value::as_str)
                        .unwrap_or(&requested);
                    format!("Channel #{created} created successfully.")
                })
            }
            Self::SetStatus => {
                let a: StatusArgs = parse_args(name, args)?;
                let emoji = a.status_emoji.unwrap_or(DEFAULT_STATUS_EMOJI.to_string());
                let status = format!("{emoji} {}", a.status_text);
                let input = ActionInput::new()
                    .required("status_text", a.status_text)
                    .required("status_emoji", emoji);
                let env = remote.execute(connection_id, APP, "set_user_status", input).await;
                finish(&env, APP, "setting the Slack status", |_| format!("Slack status updated to: {status}"))
            }
            Self::SendDirectMessage => {
                let a: DirectMessageArgs = parse_args(name, args)?;
                let user = a.user.clone();
                let input = ActionInput::new()
                    .required("user", a.user)
                    .required("text", a.text);
                let env = remote
                    .execute(connection_id, APP, "send_direct_message", input)
                    .await;
                finish(&env, APP, "sending the direct message", |_| {
                    format!("Direct message sent to {user} successfully.")
                })
            }
        };
        Ok(text)
    }
}

#[cfg(test)]
#[path = "messaging_test.rs"]
mod tests;

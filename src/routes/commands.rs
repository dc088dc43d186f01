//! Command route - bearer-checked entry point for the chat front end.

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;

use crate::commands::{self, Command, Reply};
use crate::error::ErrorCode;
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("missing or invalid bot token")]
    Unauthorized,
    #[error("owner_id must not be empty")]
    MissingOwner,
}

impl ErrorCode for RouteError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::MissingOwner => "E_BAD_REQUEST",
        }
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MissingOwner => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "code": self.error_code(), "message": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct CommandBody {
    pub owner_id: String,
    pub command: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub topic: Option<String>,
}

fn bearer_matches(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| !expected.is_empty() && token.trim() == expected)
}

/// `POST /api/commands` - run one chat command and return its reply.
pub async fn run_command(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CommandBody>,
) -> Result<Json<Reply>, RouteError> {
    if !bearer_matches(&headers, &state.bot_token) {
        return Err(RouteError::Unauthorized);
    }
    let owner_id = body.owner_id.trim();
    if owner_id.is_empty() {
        return Err(RouteError::MissingOwner);
    }

    let command = Command::from_parts(&body.command, body.text, body.count, body.topic.as_deref());
    Ok(Json(commands::handle(&state, owner_id, command).await))
}

//! Response envelope returned by every remote action.
//!
//! Wire shape: `{executed: bool, response: {...} | {error: {code, message}}}`.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Error code that means the linked account's authorization expired.
pub const UNAUTHORIZED_CODE: i64 = 401;

/// Code used for envelopes synthesized after a transport failure.
pub const TRANSPORT_ERROR_CODE: &str = "transport";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub executed: bool,
    #[serde(default)]
    pub response: Value,
}

/// How a tool should treat an envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome<'a> {
    Executed(&'a Value),
    Unauthorized,
    Failed,
}

impl Envelope {
    #[must_use]
    pub fn executed(response: Value) -> Self {
        Self { executed: true, response }
    }

    #[must_use]
    pub fn failed(code: impl Into<Value>, message: impl Into<String>) -> Self {
        Self { executed: false, response: json!({ "error": { "code": code.into(), "message": message.into() } }) }
    }

    /// Locally synthesized failure for calls that never produced an envelope.
    #[must_use]
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self::failed(TRANSPORT_ERROR_CODE, message)
    }

    /// Numeric `response.error.code`, accepting numbers and numeric strings.
    #[must_use]
    pub fn error_code(&self) -> Option<i64> {
        match self.response.get("error")?.get("code")? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.response
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome<'_> {
        if self.executed {
            Outcome::Executed(&self.response)
        } else if self.error_code() == Some(UNAUTHORIZED_CODE) {
            Outcome::Unauthorized
        } else {
            Outcome::Failed
        }
    }
}

/// Interpret an HTTP response from the action endpoint.
///
/// A body that parses as an envelope wins regardless of status; anything
/// else becomes a failure envelope so callers have a single failure path.
pub(crate) fn parse_envelope(status: u16, body: &str) -> Envelope {
    match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) => envelope,
        Err(e) if (200..300).contains(&status) => Envelope::transport_failure(format!("malformed envelope: {e}")),
        Err(_) => Envelope::failed(format!("http_{status}"), truncate_body(body)),
    }
}

fn truncate_body(body: &str) -> String {
    body.chars().take(200).collect()
}

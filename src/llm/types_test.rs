use super::*;
use crate::error::ErrorCode;

// =============================================================================
// LlmError
// =============================================================================

#[test]
fn error_codes_are_stable() {
    assert_eq!(LlmError::ConfigParse("bad".into()).error_code(), "E_CONFIG_PARSE");
    assert_eq!(LlmError::MissingApiKey { var: "KEY".into() }.error_code(), "E_MISSING_API_KEY");
    assert_eq!(LlmError::ApiRequest("timeout".into()).error_code(), "E_API_REQUEST");
    assert_eq!(LlmError::ApiResponse { status: 500, body: String::new() }.error_code(), "E_API_RESPONSE");
    assert_eq!(LlmError::ApiParse("json".into()).error_code(), "E_API_PARSE");
    assert_eq!(LlmError::HttpClientBuild("tls".into()).error_code(), "E_HTTP_CLIENT_BUILD");
}

#[test]
fn retryable_on_transport_and_server_errors() {
    assert!(LlmError::ApiRequest("conn refused".into()).retryable());
    assert!(LlmError::ApiResponse { status: 429, body: String::new() }.retryable());
    assert!(LlmError::ApiResponse { status: 503, body: String::new() }.retryable());
}

#[test]
fn not_retryable_on_client_errors() {
    assert!(!LlmError::ApiResponse { status: 400, body: String::new() }.retryable());
    assert!(!LlmError::ApiResponse { status: 401, body: String::new() }.retryable());
    assert!(!LlmError::ApiParse("eof".into()).retryable());
    assert!(!LlmError::MissingApiKey { var: "KEY".into() }.retryable());
}

// =============================================================================
// ContentBlock serde
// =============================================================================

#[test]
fn tool_use_block_deserializes() {
    let json = r#"{"type":"tool_use","id":"tu_1","name":"send_email","input":{"to_email":"a@example.com"}}"#;
    let block: ContentBlock = serde_json::from_str(json).unwrap();
    assert!(matches!(block, ContentBlock::ToolUse { ref name, .. } if name == "send_email"));
}

#[test]
fn tool_result_omits_absent_error_flag() {
    let block = ContentBlock::ToolResult { tool_use_id: "tu_1".into(), content: "ok".into(), is_error: None };
    let json = serde_json::to_value(&block).unwrap();
    assert_eq!(json["type"], "tool_result");
    assert!(json.get("is_error").is_none());
}

#[test]
fn unknown_block_type_maps_to_unknown() {
    let block: ContentBlock = serde_json::from_str(r#"{"type":"server_tool_use"}"#).unwrap();
    assert!(matches!(block, ContentBlock::Unknown));
}

// =============================================================================
// ChatResponse::text
// =============================================================================

fn response(content: Vec<ContentBlock>) -> ChatResponse {
    ChatResponse { content, model: "m".into(), stop_reason: "end_turn".into(), input_tokens: 0, output_tokens: 0 }
}

#[test]
fn text_joins_text_blocks() {
    let resp = response(vec![
        ContentBlock::Text { text: "first".into() },
        ContentBlock::Thinking { thinking: "hidden".into() },
        ContentBlock::Text { text: "second".into() },
    ]);
    assert_eq!(resp.text().as_deref(), Some("first\nsecond"));
}

#[test]
fn text_is_none_for_tool_only_turn() {
    let resp = response(vec![ContentBlock::ToolUse {
        id: "tu_1".into(),
        name: "list_channels".into(),
        input: serde_json::json!({}),
    }]);
    assert!(resp.text().is_none());
}

#[test]
fn text_ignores_whitespace_only_blocks() {
    let resp = response(vec![ContentBlock::Text { text: "  \n".into() }]);
    assert!(resp.text().is_none());
}

#[test]
fn user_text_message_has_user_role() {
    let msg = Message::user_text("hello");
    assert_eq!(msg.role, "user");
    assert!(matches!(msg.content, Content::Text(ref t) if t == "hello"));
}

use serde_json::json;

use super::*;
use crate::remote::Envelope;
use crate::tools::testing::RecordingRemote;
use crate::tools::{failure_message, reauth_message};

fn channels(n: usize) -> Envelope {
    let list: Vec<Value> = (0..n)
        .map(|i| json!({ "name": format!("chan{i}"), "id": format!("C{i}"), "is_member": i % 2 == 0 }))
        .collect();
    Envelope::executed(json!({ "channels": list }))
}

#[tokio::test]
async fn send_message_sends_channel_and_text() {
    let remote = RecordingRemote::ok();
    let out = MessagingTool::SendMessage
        .run(&remote, "ca_3", &json!({ "channel": "#general", "text": "hi" }))
        .await
        .unwrap();
    assert_eq!(out, "Message sent to #general successfully.");
    let call = remote.only_call();
    assert_eq!(call.app, App::Slack);
    assert_eq!(call.action, "send_message");
    assert_eq!(call.input.keys(), vec!["channel", "text"]);
}

#[tokio::test]
async fn list_channels_renders_membership() {
    let remote = RecordingRemote::replying(channels(2));
    let out = MessagingTool::ListChannels
        .run(&remote, "ca_3", &json!({}))
        .await
        .unwrap();
    assert!(out.contains("[x] **#chan0** (`C0`)"));
    assert!(out.contains("[ ] **#chan1** (`C1`)"));
    assert!(!out.contains("showing"));
}

#[tokio::test]
async fn list_channels_exactly_at_cap_has_no_suffix() {
    let remote = RecordingRemote::replying(channels(20));
    let out = MessagingTool::ListChannels
        .run(&remote, "ca_3", &json!({}))
        .await
        .unwrap();
    assert!(out.contains("**#chan19**"));
    assert!(!out.contains("showing"));
}

#[tokio::test]
async fn list_channels_over_cap_has_suffix() {
    let remote = RecordingRemote::replying(channels(30));
    let out = MessagingTool::ListChannels
        .run(&remote, "ca_3", &json!({}))
        .await
        .unwrap();
    assert!(!out.contains("**#chan20**"));
    assert!(out.ends_with("(showing 20 of 30)"));
}

#[tokio::test]
async fn list_channels_empty() {
    let remote = RecordingRemote::replying(channels(0));
    let out = MessagingTool::ListChannels
        .run(&remote, "ca_3", &json!({}))
        .await
        .unwrap();
    assert_eq!(out, "No channels found.");
}

#[tokio::test]
async fn create_channel_defaults_public() {
    let remote = RecordingRemote::replying(Envelope::executed(json!({ "channel": { "name": "launch" } })));
    let out = MessagingTool::CreateChannel
        .run(&remote, "ca_3", &json!({ "name": "Launch" }))
        .await
        .unwrap();
    assert_eq!(out, "Channel #launch created successfully.");
    assert_eq!(remote.only_call().input.get("is_private"), Some(&json!(false)));
}

#[tokio::test]
async fn set_status_defaults_emoji() {
    let remote = RecordingRemote::ok();
    let out = MessagingTool::SetStatus
        .run(&remote, "ca_3", &json!({ "status_text": "In a meeting" }))
        .await
        .unwrap();
    assert_eq!(out, "Slack status updated to: :speech_balloon: In a meeting");
    let call = remote.only_call();
    assert_eq!(call.action, "set_user_status");
    assert_eq!(call.input.get("status_emoji"), Some(&json!(DEFAULT_STATUS_EMOJI)));
}

#[tokio::test]
async fn direct_message_401_is_slack_reauth() {
    let remote = RecordingRemote::replying(Envelope::failed(401, "invalid_auth"));
    let out = MessagingTool::SendDirectMessage
        .run(&remote, "ca_3", &json!({ "user": "U1", "text": "yo" }))
        .await
        .unwrap();
    assert_eq!(out, reauth_message(App::Slack));
}

#[tokio::test]
async fn direct_message_other_failure() {
    let remote = RecordingRemote::replying(Envelope::failed(404, "user_not_found"));
    let out = MessagingTool::SendDirectMessage
        .run(&remote, "ca_3", &json!({ "user": "U1", "text": "yo" }))
        .await
        .unwrap();
    assert_eq!(out, failure_message("sending the direct message"));
}

use std::collections::HashSet;

use serde_json::json;

use super::*;
use crate::tools::testing::RecordingRemote;

#[test]
fn domain_sets_have_expected_sizes() {
    assert_eq!(ToolSet::calendar().len(), 11);
    assert_eq!(ToolSet::mail().len(), 4);
    assert_eq!(ToolSet::code_hosting().len(), 5);
    assert_eq!(ToolSet::messaging().len(), 5);
    assert_eq!(ToolSet::all().len(), 25);
}

#[test]
fn tool_names_are_unique_across_all_domains() {
    let names = ToolSet::all().names();
    let unique: HashSet<_> = names.iter().collect();
    assert_eq!(unique.len(), names.len());
}

#[test]
fn find_only_sees_tools_in_the_set() {
    let mail = ToolSet::mail();
    assert_eq!(mail.find("send_email"), Some(CapabilityTool::Mail(MailTool::SendEmail)));
    assert_eq!(mail.find("create_event"), None);
    assert!(ToolSet::all().find("create_event").is_some());
}

#[test]
fn definitions_match_names() {
    let set = ToolSet::messaging();
    let defs = set.definitions();
    assert_eq!(defs.len(), set.len());
    for (def, name) in defs.iter().zip(set.names()) {
        assert_eq!(def.name, name);
        assert!(!def.description.is_empty());
        assert_eq!(def.input_schema["type"], "object");
    }
}

#[test]
fn app_follows_domain() {
    assert_eq!(CapabilityTool::Calendar(CalendarTool::ListCalendars).app(), App::GoogleCalendar);
    assert_eq!(CapabilityTool::CodeHosting(CodeHostingTool::StarRepository).app(), App::Github);
}

#[test]
fn reauth_message_names_domain_and_command() {
    for app in [App::GoogleCalendar, App::Gmail, App::Github, App::Slack] {
        let msg = reauth_message(app);
        assert!(msg.contains(app.display_name()));
        assert!(msg.contains("`!authenticate`"));
    }
}

#[test]
fn render_list_boundaries() {
    let items: Vec<Value> = (0..3).map(|i| json!(i)).collect();
    let render = |v: &Value| Some(v.to_string());

    assert_eq!(render_list(None, 2, "H", "none", "\n", render), "none");
    assert_eq!(render_list(Some(&Vec::new()), 2, "H", "none", "\n", render), "none");
    assert_eq!(render_list(Some(&items), 3, "H", "none", "\n", render), "H\n0\n1\n2");
    assert_eq!(render_list(Some(&items), 2, "H", "none", "\n", render), "H\n0\n1\n\n(showing 2 of 3)");
}

#[test]
fn render_list_skips_unrenderable_before_capping() {
    let items: Vec<Value> = (0..6).map(|i| json!(i)).collect();
    let odd_only = |v: &Value| v.as_i64().filter(|i| i % 2 == 1).map(|i| i.to_string());

    assert_eq!(render_list(Some(&items), 2, "H", "none", "\n", odd_only), "H\n1\n3\n\n(showing 2 of 6)");
    assert_eq!(render_list(Some(&items), 5, "H", "none", "\n", odd_only), "H\n1\n3\n5\n\n(showing 3 of 6)");
    assert_eq!(render_list(Some(&items), 10, "H", "none", "\n", odd_only), "H\n1\n3\n5");
}

#[test]
fn render_list_with_nothing_renderable_is_empty() {
    let items = vec![json!({ "id": "a" }), json!({ "id": "b" })];
    let out = render_list(Some(&items), 10, "H", "none", "\n", |v| v.get("summary").and_then(Value::as_str).map(String::from));
    assert_eq!(out, "none");
}

#[test]
fn preview_counts_characters_not_bytes() {
    assert_eq!(preview("héllo wörld", 7), "héllo w");
    assert_eq!(preview("short", 50), "short");
}

#[tokio::test]
async fn capability_run_dispatches_to_domain() {
    let remote = RecordingRemote::ok();
    let tool = ToolSet::all().find("star_repository").unwrap();
    tool.run(&remote, "ca_7", &json!({ "owner": "o", "repo": "r" }))
        .await
        .unwrap();
    let call = remote.only_call();
    assert_eq!(call.connection_id, "ca_7");
    assert_eq!(call.action, "star_repository");
}

#[tokio::test]
async fn null_args_parse_as_empty_object() {
    let remote = RecordingRemote::ok();
    let out = CapabilityTool::Calendar(CalendarTool::FindEvents)
        .run(&remote, "ca_7", &Value::Null)
        .await
        .unwrap();
    assert_eq!(out, "No events found.");
}

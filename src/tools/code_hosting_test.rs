use serde_json::json;

use super::*;
use crate::remote::Envelope;
use crate::tools::testing::RecordingRemote;
use crate::tools::reauth_message;

#[tokio::test]
async fn create_issue_reports_number_and_link() {
    let remote = RecordingRemote::replying(Envelope::executed(
        json!({ "number": 42, "html_url": "https://github.com/acme/api/issues/42" }),
    ));
    let out = CodeHostingTool::CreateIssue
        .run(&remote, "ca_2", &json!({ "owner": "acme", "repo": "api", "title": "Bug" }))
        .await
        .unwrap();

    assert_eq!(out, "Issue #42 created successfully!\nhttps://github.com/acme/api/issues/42");
    let call = remote.only_call();
    assert_eq!(call.app, App::Github);
    assert_eq!(call.input.keys(), vec!["owner", "repo", "title"]);
}

#[tokio::test]
async fn create_issue_without_number_omits_hash() {
    let remote = RecordingRemote::ok();
    let out = CodeHostingTool::CreateIssue
        .run(&remote, "ca_2", &json!({ "owner": "acme", "repo": "api", "title": "Bug" }))
        .await
        .unwrap();
    assert_eq!(out, "Issue created successfully!");
}

#[tokio::test]
async fn pull_request_string_number_renders_bare() {
    let remote = RecordingRemote::replying(Envelope::executed(json!({ "number": "7" })));
    let out = CodeHostingTool::CreatePullRequest
        .run(&remote, "ca_2", &json!({ "owner": "acme", "repo": "api", "title": "Fix", "head": "fix", "base": "main" }))
        .await
        .unwrap();
    assert_eq!(out, "Pull request #7 created successfully!");
}

#[tokio::test]
async fn create_issue_forwards_labels_list() {
    let remote = RecordingRemote::ok();
    CodeHostingTool::CreateIssue
        .run(&remote, "ca_2", &json!({ "owner": "acme", "repo": "api", "title": "Bug", "labels": ["bug", "p1"] }))
        .await
        .unwrap();
    assert_eq!(remote.only_call().input.get("labels"), Some(&json!(["bug", "p1"])));
}

#[tokio::test]
async fn list_issues_defaults_state_and_page_size() {
    let remote = RecordingRemote::replying(Envelope::executed(json!([
        { "number": 1, "title": "First", "state": "open" },
        { "number": 2, "title": "Second", "state": "closed" }
    ])));
    let out = CodeHostingTool::ListIssues
        .run(&remote, "ca_2", &json!({ "owner": "acme", "repo": "api" }))
        .await
        .unwrap();

    assert!(out.starts_with("**Issues in acme/api:**"));
    assert!(out.contains("[open] **#1:** First"));
    assert!(out.contains("[closed] **#2:** Second"));
    let call = remote.only_call();
    assert_eq!(call.input.get("state"), Some(&json!("open")));
    assert_eq!(call.input.get("per_page"), Some(&json!(10)));
}

#[tokio::test]
async fn list_issues_renders_numbers_without_quotes() {
    let remote = RecordingRemote::replying(Envelope::executed(json!([
        { "number": "7", "title": "t", "state": "open" },
        { "title": "untracked", "state": "open" }
    ])));
    let out = CodeHostingTool::ListIssues
        .run(&remote, "ca_2", &json!({ "owner": "acme", "repo": "api" }))
        .await
        .unwrap();

    assert!(out.contains("[open] **#7:** t"));
    assert!(out.contains("[open] untracked"));
    assert!(!out.contains('"'));
    assert!(!out.contains("**#:**"));
}

#[tokio::test]
async fn list_issues_empty_names_state_and_repo() {
    let remote = RecordingRemote::replying(Envelope::executed(json!([])));
    let out = CodeHostingTool::ListIssues
        .run(&remote, "ca_2", &json!({ "owner": "acme", "repo": "api", "state": "closed" }))
        .await
        .unwrap();
    assert_eq!(out, "No closed issues found in acme/api.");
}

#[tokio::test]
async fn list_issues_caps_with_suffix() {
    let issues: Vec<Value> = (1..=11)
        .map(|n| json!({ "number": n, "title": format!("T{n}"), "state": "open" }))
        .collect();
    let remote = RecordingRemote::replying(Envelope::executed(Value::Array(issues)));
    let out = CodeHostingTool::ListIssues
        .run(&remote, "ca_2", &json!({ "owner": "acme", "repo": "api" }))
        .await
        .unwrap();
    assert!(out.contains("**#10:** T10"));
    assert!(!out.contains("**#11:**"));
    assert!(out.ends_with("(showing 10 of 11)"));
}

#[tokio::test]
async fn search_repositories_previews_description() {
    let long = "d".repeat(100);
    let remote = RecordingRemote::replying(Envelope::executed(json!({
        "items": [
            { "full_name": "acme/api", "stargazers_count": 7, "description": long },
            { "full_name": "acme/web", "description": null }
        ]
    })));
    let out = CodeHostingTool::SearchRepositories
        .run(&remote, "ca_2", &json!({ "query": "acme" }))
        .await
        .unwrap();

    assert!(out.contains("**acme/api** (7 stars)"));
    assert!(out.contains(&format!("  {}...", "d".repeat(60))));
    assert!(!out.contains(&"d".repeat(61)));
    assert!(out.contains("**acme/web** (0 stars)\n  No description..."));
    let call = remote.only_call();
    assert_eq!(call.input.keys(), vec!["per_page", "q"]);
}

#[tokio::test]
async fn pull_request_401_is_github_reauth() {
    let remote = RecordingRemote::replying(Envelope::failed(401, "bad credentials"));
    let out = CodeHostingTool::CreatePullRequest
        .run(
            &remote,
            "ca_2",
            &json!({ "owner": "acme", "repo": "api", "title": "Feat", "head": "feat", "base": "main" }),
        )
        .await
        .unwrap();
    assert_eq!(out, reauth_message(App::Github));
    assert_eq!(remote.only_call().input.keys(), vec!["base", "head", "owner", "repo", "title"]);
}

#[tokio::test]
async fn star_repository_names_slug() {
    let remote = RecordingRemote::ok();
    let out = CodeHostingTool::StarRepository
        .run(&remote, "ca_2", &json!({ "owner": "rust-lang", "repo": "rust" }))
        .await
        .unwrap();
    assert_eq!(out, "Successfully starred rust-lang/rust.");
}

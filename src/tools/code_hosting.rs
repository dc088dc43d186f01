//! Code-hosting tools (`github` app).

use serde::Deserialize;
use serde_json::{Value, json};

use super::{ToolError, finish, object_schema, parse_args, preview, render_list, str_field};
use crate::remote::{ActionInput, App, Param, RemoteActions};

const APP: App = App::Github;

pub const LIST_CAP: usize = 10;
pub const DEFAULT_PER_PAGE: u32 = 10;
pub const DEFAULT_ISSUE_STATE: &str = "open";
const DESCRIPTION_PREVIEW_CHARS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeHostingTool {
    CreateIssue,
    ListIssues,
    SearchRepositories,
    CreatePullRequest,
    StarRepository,
}

#[derive(Deserialize)]
struct CreateIssueArgs {
    owner: String,
    repo: String,
    title: String,
    #[serde(default)]
    body: Param<String>,
    #[serde(default)]
    labels: Param<Vec<String>>,
}

#[derive(Deserialize)]
struct ListIssuesArgs {
    owner: String,
    repo: String,
    #[serde(default)]
    state: Param<String>,
    #[serde(default)]
    max_results: Param<u32>,
}

#[derive(Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    max_results: Param<u32>,
}

#[derive(Deserialize)]
struct PullRequestArgs {
    owner: String,
    repo: String,
    title: String,
    head: String,
    base: String,
    #[serde(default)]
    body: Param<String>,
}

#[derive(Deserialize)]
struct RepoArgs {
    owner: String,
    repo: String,
}

impl CodeHostingTool {
    pub const ALL: [Self; 5] = [
        Self::CreateIssue,
        Self::ListIssues,
        Self::SearchRepositories,
        Self::CreatePullRequest,
        Self::StarRepository,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::CreateIssue => "create_issue",
            Self::ListIssues => "list_issues",
            Self::SearchRepositories => "search_repositories",
            Self::CreatePullRequest => "create_pull_request",
            Self::StarRepository => "star_repository",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::CreateIssue => "Open a new issue in a GitHub repository.",
            Self::ListIssues => "List issues in a GitHub repository.",
            Self::SearchRepositories => "Search GitHub repositories.",
            Self::CreatePullRequest => "Open a pull request from `head` into `base`.",
            Self::StarRepository => "Star a GitHub repository.",
        }
    }

    #[must_use]
    pub fn input_schema(self) -> Value {
        let owner = json!({ "type": "string", "description": "Repository owner (user or organization)." });
        let repo = json!({ "type": "string", "description": "Repository name without the owner." });
        match self {
            Self::CreateIssue => object_schema(
                json!({
                    "owner": owner,
                    "repo": repo,
                    "title": { "type": "string" },
                    "body": { "type": "string" },
                    "labels": { "type": "array", "items": { "type": "string" } },
                }),
                &["owner", "repo", "title"],
            ),
            Self::ListIssues => object_schema(
                json!({
                    "owner": owner,
                    "repo": repo,
                    "state": { "type": "string", "enum": ["open", "closed", "all"], "default": "open" },
                    "max_results": { "type": "integer", "default": DEFAULT_PER_PAGE },
                }),
                &["owner", "repo"],
            ),
            Self::SearchRepositories => object_schema(
                json!({
                    "query": { "type": "string" },
                    "max_results": { "type": "integer", "default": DEFAULT_PER_PAGE },
                }),
                &["query"],
            ),
            Self::CreatePullRequest => object_schema(
                json!({
                    "owner": owner,
                    "repo": repo,
                    "title": { "type": "string" },
                    "head": { "type": "string", "description": "Branch with the changes." },
                    "base": { "type": "string", "description": "Branch to merge into." },
                    "body": { "type": "string" },
                }),
                &["owner", "repo", "title", "head", "base"],
            ),
            Self::StarRepository => object_schema(json!({ "owner": owner, "repo": repo }), &["owner", "repo"]),
        }
    }

    /// # Errors
    ///
    /// Returns [`ToolError::InvalidInput`] when `args` do not match the schema.
    pub async fn run(self, remote: &dyn RemoteActions, connection_id: &str, args: &Value) -> Result<String, ToolError> {
        let name = self.name();
        let text = match self {
            Self::CreateIssue => {
                let a: CreateIssueArgs = parse_args(name, args)?;
                let input = ActionInput::new()
                    .required("owner", a.owner)
                    .required("repo", a.repo)
                    .required("title", a.title)
                    .optional("body", &a.body)
                    .optional("labels", &a.labels);
                let env = remote.execute(connection_id, APP, "create_issue", input).await;
                finish(&env, APP, "creating the issue", |r| created("Issue", r))
            }
            Self::ListIssues => {
                let a: ListIssuesArgs = parse_args(name, args)?;
                let state = a.state.unwrap_or(DEFAULT_ISSUE_STATE.to_string());
                let slug = format!("{}/{}", a.owner, a.repo);
                let input = ActionInput::new()
                    .required("owner", a.owner)
                    .required("repo", a.repo)
                    .required("state", state.clone())
                    .required("per_page", a.max_results.unwrap_or(DEFAULT_PER_PAGE));
                let env = remote.execute(connection_id, APP, "list_issues", input).await;
                finish(&env, APP, "listing issues", |r| {
                    render_list(
                        r.as_array(),
                        LIST_CAP,
                        &format!("**Issues in {slug}:**"),
                        &format!("No {state} issues found in {slug}."),
                        "\n",
                        |issue| {
                            let marker = if str_field(issue, "state", "") == "open" { "open" } else { "closed" };
                            let title = str_field(issue, "title", "No Title");
                            Some(match number_of(issue) {
                                Some(number) => format!("[{marker}] **#{number}:** {title}"),
                                None => format!("[{marker}] {title}"),
                            })
                        },
                    )
                })
            }
            Self::SearchRepositories => {
                let a: SearchArgs = parse_args(name, args)?;
                let input = ActionInput::new()
                    .required("q", a.query)
                    .required("per_page", a.max_results.unwrap_or(DEFAULT_PER_PAGE));
                let env = remote
                    .execute(connection_id, APP, "search_repositories", input)
                    .await;
                finish(&env, APP, "searching repositories", |r| {
                    let items = r.get("items").and_then(Value::as_array);
                    render_list(
                        items,
                        LIST_CAP,
                        "**Search Results:**",
                        "No repositories found matching your search.",
                        "\n\n",
                        |repo| {
                            let stars = repo
                                .get("stargazers_count")
                                .and_then(Value::as_u64)
                                .unwrap_or(0);
                            Some(format!(
                                "**{}** ({stars} stars)\n  {}...",
                                str_field(repo, "full_name", "Unknown"),
                                preview(str_field(repo, "description", "No description"), DESCRIPTION_PREVIEW_CHARS)
                            ))
                        },
                    )
                })
            }
            Self::CreatePullRequest => {
                let a: PullRequestArgs = parse_args(name, args)?;
                let input = ActionInput::new()
                    .required("owner", a.owner)
                    .required("repo", a.repo)
                    .required("title", a.title)
                    .required("head", a.head)
                    .required("base", a.base)
                    .optional("body", &a.body);
                let env = remote
                    .execute(connection_id, APP, "create_pull_request", input)
                    .await;
                finish(&env, APP, "creating the pull request", |r| created("Pull request", r))
            }
            Self::StarRepository => {
                let a: RepoArgs = parse_args(name, args)?;
                let slug = format!("{}/{}", a.owner, a.repo);
                let input = ActionInput::new()
                    .required("owner", a.owner)
                    .required("repo", a.repo);
                let env = remote.execute(connection_id, APP, "star_repository", input).await;
                finish(&env, APP, "starring the repository", |_| format!("Successfully starred {slug}."))
            }
        };
        Ok(text)
    }
}

/// `number` as plain digits, whether the backend sent a number or a string.
fn number_of(value: &Value) -> Option<String> {
    match value.get("number")? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Success line for issue/PR creation: `#number` and `html_url` when present.
fn created(kind: &str, response: &Value) -> String {
    let mut out = match number_of(response) {
        Some(number) => format!("{kind} #{number} created successfully!"),
        None => format!("{kind} created successfully!"),
    };
    if let Some(url) = response.get("html_url").and_then(Value::as_str) {
        out.push('\n');
        out.push_str(url);
    }
    out
}

#[cfg(test)]
#[path = "code_hosting_test.rs"]
mod tests;

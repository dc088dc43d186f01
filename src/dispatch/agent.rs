//! Reasoning agent - one task, one bounded tool-calling loop.
//!
//! Each iteration sends the conversation to the model, runs every
//! `tool_use` block in emission order, and feeds the results back. The loop
//! ends when a turn carries no tool calls or the iteration limit is hit.
//! Only the text of a turn without tool calls is the answer; narration that
//! accompanies tool calls is never returned.
//! Tool names outside the task's [`ToolSet`] are answered with an error
//! result and never executed.

use std::sync::Arc;

use tracing::{info, warn};

use super::TaskBundle;
use crate::config::AgentLimits;
use crate::error::ErrorCode;
use crate::llm::types::{Content, ContentBlock, LlmChat, LlmError, Message};
use crate::remote::RemoteActions;
use crate::tools::{ToolError, ToolSet};

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

impl ErrorCode for AgentError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Llm(_) => "E_AGENT_LLM",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Llm(e) => e.retryable(),
        }
    }
}

/// Picks tools for a task and returns the final answer text.
#[async_trait::async_trait]
pub trait Agent: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when the model cannot be reached. Tool failures are
    /// not errors; they become strings the model sees.
    async fn choose_and_execute(&self, tools: &ToolSet, task: &TaskBundle) -> Result<String, AgentError>;
}

pub struct LlmAgent {
    llm: Arc<dyn LlmChat>,
    remote: Arc<dyn RemoteActions>,
    limits: AgentLimits,
}

impl LlmAgent {
    #[must_use]
    pub fn new(llm: Arc<dyn LlmChat>, remote: Arc<dyn RemoteActions>, limits: AgentLimits) -> Self {
        Self { llm, remote, limits }
    }
}

pub(crate) fn build_system_prompt(task: &TaskBundle) -> String {
    format!(
        "You are the {}.\n\nGoal: {}\n\n{}\n\n\
         Only use the tools provided. Never invent identifiers; look them up with a tool first. \
         When you are done, answer the user directly.\n\nExpected output: {}",
        task.role, task.goal, task.backstory, task.expected_output
    )
}

#[async_trait::async_trait]
impl Agent for LlmAgent {
    async fn choose_and_execute(&self, tools: &ToolSet, task: &TaskBundle) -> Result<String, AgentError> {
        let system = build_system_prompt(task);
        let definitions = tools.definitions();
        let mut messages = vec![Message::user_text(task.description.clone())];
        let mut final_text: Option<String> = None;

        for iteration in 0..self.limits.max_tool_iterations {
            let response = self
                .llm
                .chat(self.limits.max_tokens, &system, &messages, Some(&definitions))
                .await?;

            info!(
                iteration,
                stop_reason = %response.stop_reason,
                input_tokens = response.input_tokens,
                output_tokens = response.output_tokens,
                "agent: LLM response"
            );

            let tool_calls: Vec<(String, String, serde_json::Value)> = response
                .content
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::ToolUse { id, name, input } => Some((id.clone(), name.clone(), input.clone())),
                    _ => None,
                })
                .collect();

            if tool_calls.is_empty() {
                final_text = response.text();
                break;
            }

            messages.push(Message { role: "assistant".into(), content: Content::Blocks(response.content) });

            let mut tool_results = Vec::with_capacity(tool_calls.len());
            for (tool_id, tool_name, input) in &tool_calls {
                let result = match tools.find(tool_name) {
                    Some(tool) => {
                        info!(iteration, tool = %tool_name, "agent: executing tool");
                        tool.run(self.remote.as_ref(), &task.connection_id, input)
                            .await
                    }
                    None => Err(ToolError::NotAvailable(tool_name.clone())),
                };
                let (content, is_error) = match result {
                    Ok(msg) => {
                        info!(iteration, tool = %tool_name, result_len = msg.len(), "agent: tool ok");
                        (msg, None)
                    }
                    Err(e) => {
                        warn!(iteration, tool = %tool_name, code = e.error_code(), error = %e, "agent: tool error");
                        (e.to_string(), Some(true))
                    }
                };
                tool_results.push(ContentBlock::ToolResult { tool_use_id: tool_id.clone(), content, is_error });
            }

            messages.push(Message { role: "user".into(), content: Content::Blocks(tool_results) });

            if response.stop_reason != "tool_use" {
                break;
            }
        }

        info!(has_text = final_text.is_some(), "agent: task complete");
        Ok(final_text.unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "agent_test.rs"]
mod tests;

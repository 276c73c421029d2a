//! Query dispatch loop.
//!
//! One call to [`QuerySession::process_query`] is one full dispatch cycle:
//! fetch the live tool catalog, consult the model, execute at most one tool
//! call, fold the result back into the conversation, and produce the final
//! answer. Conversation state lives on the stack of that one call; nothing
//! carries over between queries.

use crate::catalog;
use crate::error::{Error, Result};
use crate::ollama::{ChatBackend, ChatMessage, ChatRequest, ToolCall};
use mcp::{CallToolResult, Tool, ToolContent};
use serde_json::Value;
use std::future::Future;

/// Client side of the session transport, as seen by the dispatch loop.
pub trait ToolTransport: Send + Sync {
    fn list_tools(&self) -> impl Future<Output = mcp::Result<Vec<Tool>>> + Send;
    fn call_tool(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> impl Future<Output = mcp::Result<CallToolResult>> + Send;
}

impl ToolTransport for mcp::Client {
    async fn list_tools(&self) -> mcp::Result<Vec<Tool>> {
        mcp::Client::list_tools(self).await
    }

    async fn call_tool(&self, name: &str, arguments: Option<Value>) -> mcp::Result<CallToolResult> {
        mcp::Client::call_tool(self, name, arguments).await
    }
}

/// Dispatch policy for multi-call responses: every requested call is recorded
/// in the output trace, but only the final call is executed and its result
/// threaded back into the conversation.
fn dispatched_call(calls: &[ToolCall]) -> Option<&ToolCall> {
    calls.last()
}

fn call_marker(call: &ToolCall) -> String {
    format!(
        "[Calling tool {} with args {}]",
        call.function.name, call.function.arguments
    )
}

/// Extract the conversation content for a tool result, preferring the
/// structured payload over text content blocks. A result with neither is a
/// protocol violation.
fn tool_result_text(result: &CallToolResult) -> Result<String> {
    if let Some(structured) = &result.structured_content {
        let value = structured.get("result").unwrap_or(structured);
        return Ok(match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
    }
    match result.content.first() {
        Some(ToolContent::Text { text }) => Ok(text.clone()),
        _ => Err(Error::UnsupportedToolResult),
    }
}

/// One connected session: a tool transport and a chat backend.
pub struct QuerySession<T, B> {
    transport: T,
    backend: B,
}

impl<T: ToolTransport, B: ChatBackend> QuerySession<T, B> {
    pub fn new(transport: T, backend: B) -> Self {
        Self { transport, backend }
    }

    /// Run one full dispatch cycle for a single user query.
    pub async fn process_query(&self, query: &str) -> Result<String> {
        let mut messages = vec![ChatMessage::user(query)];

        let tools = catalog::catalog(&self.transport.list_tools().await?);

        let response = self
            .backend
            .chat(ChatRequest {
                messages: &messages,
                tools: Some(&tools),
            })
            .await?;

        let mut final_text = Vec::new();
        let message = response.message;

        if !message.content.is_empty() {
            // Direct text wins over any tool calls in the same response.
            final_text.push(message.content);
        } else if let Some(call) = dispatched_call(&message.tool_calls) {
            for requested in &message.tool_calls {
                final_text.push(call_marker(requested));
            }

            let result = self
                .transport
                .call_tool(&call.function.name, Some(call.function.arguments.clone()))
                .await?;

            messages.push(ChatMessage::tool(
                tool_result_text(&result)?,
                call.function.name.clone(),
            ));

            // Follow-up goes out without the catalog; the model only needs
            // to phrase the answer.
            let follow_up = self
                .backend
                .chat(ChatRequest {
                    messages: &messages,
                    tools: None,
                })
                .await?;
            final_text.push(follow_up.message.content);
        }

        Ok(final_text.join("\n"))
    }
}

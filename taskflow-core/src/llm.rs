//! LLM provider abstraction.
//!
//! Defines the `LlmProvider` trait for model-agnostic completions and a
//! mock implementation for tests and offline development.

use crate::error::LlmError;
use crate::types::{CompletionRequest, CompletionResponse, Content, Message, Role, ToolCall};
use async_trait::async_trait;

/// Trait for LLM providers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Perform a full completion and return the response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Return whether this provider supports tool/function calling.
    fn supports_tools(&self) -> bool;

    /// Return the model name.
    fn model_name(&self) -> &str;
}

/// The system prompt for the todo assistant.
pub const SYSTEM_PROMPT: &str = r#"You are AI Todo Assistant, a helpful assistant for managing a personal todo list.

Tool selection rules:
- To create a task: call create_task with the title, optionally description, due_date (YYYY-MM-DD), and priority (high, medium, low).
- To list tasks: call get_tasks, optionally filtered by status or priority.
- To change an existing task: call update_task with a task_identifier naming the task and an updates object with only the fields to change. Never create a new task when the user wants to change an existing one.
- To remove a task: call delete_task. To flip completion: call toggle_task_completion.

Other behaviors:
- When the user states something they need to do, treat it as a task to create.
- Keep replies short and friendly. Never invent task contents the user did not state."#;

/// A mock LLM provider for testing and offline development.
///
/// Responses are queued and returned in order; once the queue is drained
/// a canned text response is returned instead of an error.
pub struct MockLlmProvider {
    model: String,
    responses: std::sync::Mutex<Vec<CompletionResponse>>,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            responses: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that always returns the given text.
    ///
    /// Queues multiple copies so it can serve several calls.
    pub fn with_response(text: &str) -> Self {
        let provider = Self::new();
        for _ in 0..20 {
            provider.queue_response(Self::text_response(text));
        }
        provider
    }

    /// Queue a response to be returned by the next `complete` call.
    pub fn queue_response(&self, response: CompletionResponse) {
        self.responses.lock().unwrap().push(response);
    }

    /// Create a simple text response for testing.
    pub fn text_response(text: &str) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant(text),
            model: "mock-model".to_string(),
            finish_reason: Some("stop".to_string()),
        }
    }

    /// Create a tool call response for testing.
    pub fn tool_call_response(tool_name: &str, arguments: serde_json::Value) -> CompletionResponse {
        CompletionResponse {
            message: Message {
                role: Role::Assistant,
                content: Content::ToolCalls {
                    calls: vec![ToolCall::new(tool_name, arguments)],
                },
            },
            model: "mock-model".to_string(),
            finish_reason: Some("tool_calls".to_string()),
        }
    }
}

impl Default for MockLlmProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(MockLlmProvider::text_response(
                "I'm a mock LLM. No queued responses available.",
            ))
        } else {
            Ok(responses.remove(0))
        }
    }

    fn supports_tools(&self) -> bool {
        true
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_default_response() {
        let provider = MockLlmProvider::new();
        let response = provider
            .complete(CompletionRequest::default())
            .await
            .unwrap();
        assert!(response.message.content.as_text().is_some());
    }

    #[tokio::test]
    async fn test_mock_provider_queued_responses() {
        let provider = MockLlmProvider::new();
        provider.queue_response(MockLlmProvider::text_response("first"));
        provider.queue_response(MockLlmProvider::text_response("second"));

        let r1 = provider
            .complete(CompletionRequest::default())
            .await
            .unwrap();
        assert_eq!(r1.message.content.as_text(), Some("first"));

        let r2 = provider
            .complete(CompletionRequest::default())
            .await
            .unwrap();
        assert_eq!(r2.message.content.as_text(), Some("second"));
    }

    #[test]
    fn test_mock_tool_call_response() {
        let response = MockLlmProvider::tool_call_response(
            "create_task",
            serde_json::json!({"title": "Buy groceries"}),
        );
        let calls = response.message.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "create_task");
        assert_eq!(calls[0].arguments["title"], "Buy groceries");
    }

    #[test]
    fn test_system_prompt_names_the_tools() {
        assert!(SYSTEM_PROMPT.contains("create_task"));
        assert!(SYSTEM_PROMPT.contains("update_task"));
        assert!(SYSTEM_PROMPT.contains("toggle_task_completion"));
    }
}

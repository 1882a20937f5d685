//! The chat agent — ties the classifier, dispatcher, and model together.
//!
//! Each message is handled in one pass: cheap intent heuristics run
//! first and short-circuit without touching the model; only unclassified
//! messages cost a completion. Every reply is derived from fresh store
//! state, never from conversation memory.

use crate::classifier::IntentClassifier;
use crate::config::ChatConfig;
use crate::dispatch::{DispatchOutcome, ToolDispatcher};
use crate::error::{DispatchError, Result};
use crate::formatter;
use crate::lexicon::Lexicon;
use crate::llm::{LlmProvider, SYSTEM_PROMPT};
use crate::parser::{change_to_patch, parse_update_request};
use crate::resolver::resolve_task_reference;
use crate::store::TaskStore;
use crate::tools::tool_definitions;
use crate::types::{CompletionRequest, Intent, Message, StatusFilter, Task};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Handles one chat message end to end.
pub struct ChatAgent {
    classifier: IntentClassifier,
    dispatcher: ToolDispatcher,
    provider: Arc<dyn LlmProvider>,
    config: ChatConfig,
}

impl ChatAgent {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        store: Arc<dyn TaskStore>,
        lexicon: Lexicon,
        config: ChatConfig,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(lexicon.clone()),
            dispatcher: ToolDispatcher::new(store, lexicon),
            provider,
            config,
        }
    }

    /// Handle one message on behalf of `owner` and return the reply text.
    pub async fn handle_message(&self, message: &str, owner: Uuid) -> Result<String> {
        if message.chars().count() > self.config.max_message_chars {
            return Ok(formatter::message_too_long_reply(
                self.config.max_message_chars,
            ));
        }

        let intent = self.classifier.classify(message);
        debug!(?intent, "classified message");

        match intent {
            Intent::Abusive => {
                warn!(%owner, "abusive or probing message rejected");
                Ok(formatter::ABUSE_REPLY.to_string())
            }
            Intent::Gratitude => Ok(formatter::GRATITUDE_REPLY.to_string()),
            Intent::ProhibitedTitle => Ok(formatter::PROHIBITED_REPLY.to_string()),
            Intent::ViewRequest => {
                let tasks = self.list_tasks(owner).await?;
                Ok(formatter::format_task_table(&tasks))
            }
            Intent::UpdateRequest { message } => self.handle_update(&message, owner).await,
            Intent::Unclassified => self.handle_with_model(message, owner).await,
        }
    }

    async fn list_tasks(&self, owner: Uuid) -> Result<Vec<Task>> {
        let tasks = self
            .dispatcher
            .store()
            .list(
                Some(owner),
                StatusFilter::All,
                None,
                self.config.default_list_limit,
            )
            .await
            .map_err(DispatchError::from)?;
        Ok(tasks)
    }

    /// Handle an update-style sentence without involving the model.
    ///
    /// Every failure recovers into a reply that shows the current list so
    /// the user can rephrase against what actually exists.
    async fn handle_update(&self, message: &str, owner: Uuid) -> Result<String> {
        let tasks = self.list_tasks(owner).await?;
        if tasks.is_empty() {
            return Ok(formatter::NO_TASKS_TO_UPDATE_REPLY.to_string());
        }

        let Some(parsed) = parse_update_request(message, self.classifier.lexicon()) else {
            return Ok(formatter::unparseable_update_with_list(&tasks));
        };
        let patch = change_to_patch(&parsed.change);
        if patch.is_empty() {
            return Ok(formatter::unparseable_update_with_list(&tasks));
        }
        let Some(target) = resolve_task_reference(&parsed.reference, &tasks) else {
            return Ok(formatter::task_not_found_with_list(&parsed.reference, &tasks));
        };

        let updated = self
            .dispatcher
            .store()
            .update(target.id, patch)
            .await
            .map_err(DispatchError::from)?;
        info!(task_id = %updated.id, "task updated via chat");
        Ok(formatter::update_confirmation(&updated.title))
    }

    /// Hand the message to the model with the tool menu attached.
    ///
    /// Only the first tool call of the response is executed; the reply is
    /// always regenerated from store state rather than model text when a
    /// tool ran.
    async fn handle_with_model(&self, message: &str, owner: Uuid) -> Result<String> {
        let request = CompletionRequest {
            messages: vec![Message::system(SYSTEM_PROMPT), Message::user(message)],
            tools: Some(tool_definitions()),
            ..Default::default()
        };
        let response = match self.provider.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "model call failed");
                return Ok(
                    "I'm having trouble thinking right now. Please try again in a moment."
                        .to_string(),
                );
            }
        };

        let calls = response.message.tool_calls();
        let Some(call) = calls.first() else {
            let text = response.message.content.as_text().unwrap_or("").trim();
            if text.is_empty() {
                return Ok(formatter::PROHIBITED_REPLY.to_string());
            }
            return Ok(text.to_string());
        };
        if calls.len() > 1 {
            debug!(dropped = calls.len() - 1, "executing only the first tool call");
        }

        match self.dispatcher.dispatch(call, owner).await {
            Ok(outcome) => self.render_outcome(outcome, owner).await,
            Err(err) => Ok(Self::render_dispatch_error(err)),
        }
    }

    async fn render_outcome(&self, outcome: DispatchOutcome, owner: Uuid) -> Result<String> {
        Ok(match outcome {
            DispatchOutcome::Created(task) => formatter::create_confirmation(&task.title),
            DispatchOutcome::Listed(tasks) => formatter::format_task_table(&tasks),
            DispatchOutcome::Updated { task, .. } => formatter::update_confirmation(&task.title),
            DispatchOutcome::Deleted { task } => formatter::delete_confirmation(&task.title),
            DispatchOutcome::Toggled(task) => {
                formatter::toggle_confirmation(&task.title, task.status)
            }
            DispatchOutcome::NoMatch { reference } => {
                let tasks = self.list_tasks(owner).await?;
                formatter::task_not_found_with_list(&reference, &tasks)
            }
        })
    }

    /// Dispatch failures become replies, not transport errors: the chat
    /// surface should degrade into guidance, and only infrastructure
    /// failures bubble up.
    fn render_dispatch_error(err: DispatchError) -> String {
        match err {
            DispatchError::InvalidArguments { reason, .. } => {
                format!("I couldn't do that: {reason}.")
            }
            DispatchError::NotFound { .. } => "I couldn't find that task.".to_string(),
            DispatchError::AccessDenied { .. } => {
                "You don't have access to that task.".to_string()
            }
            DispatchError::UnknownTool { .. } => {
                "I can't help with that yet, but I can add, update, or delete tasks.".to_string()
            }
            DispatchError::Store { .. } => {
                warn!(error = %err, "store failure during chat dispatch");
                "Something went wrong while working on your tasks. Please try again.".to_string()
            }
        }
    }
}

//! Tool dispatch — validates model-issued tool calls and runs them
//! against the task store.
//!
//! Every call is scoped to the acting user: a task owned by someone else
//! is reported as access denied, never as missing, so the two cases stay
//! distinguishable upstream. `create_task` calls whose title reads like
//! an update sentence are rerouted to `update_task` instead of polluting
//! the list with a bogus task.

use crate::error::DispatchError;
use crate::lexicon::Lexicon;
use crate::parser::{change_to_patch, parse_update_request};
use crate::resolver::resolve_task_reference;
use crate::store::TaskStore;
use crate::tools::ToolName;
use crate::types::{NewTask, Priority, StatusFilter, Task, TaskPatch, TaskStatus, ToolCall};
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

const MAX_TITLE_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 1000;
const DEFAULT_LIST_LIMIT: usize = 100;

/// Substrings in a `create_task` title that suggest the model misrouted
/// an update. Verbs carry a trailing space so "updated report" does not
/// fire; prepositions are padded on both sides.
const REROUTE_MARKERS: &[&str] = &[
    "update ", "change ", "modify ", "adjust ", "set ", "make ", "turn ", "switch ", " to ",
    " as ", " into ",
];

/// Words naming a task attribute; a misrouted update mentions one.
const ATTRIBUTE_MARKERS: &[&str] = &[
    "high",
    "medium",
    "low",
    "priority",
    "completed",
    "done",
    "pending",
];

/// The result of a successfully dispatched tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Created(Task),
    Listed(Vec<Task>),
    Updated {
        task: Task,
        /// True when a misrouted `create_task` call was rerouted here.
        intercepted: bool,
    },
    Deleted {
        task: Task,
    },
    Toggled(Task),
    /// `update_task` parsed fine but no stored task matched the
    /// reference. Recoverable: the caller shows the list.
    NoMatch {
        reference: String,
    },
}

/// Validates and executes tool calls against the store.
pub struct ToolDispatcher {
    store: Arc<dyn TaskStore>,
    lexicon: Lexicon,
}

impl ToolDispatcher {
    pub fn new(store: Arc<dyn TaskStore>, lexicon: Lexicon) -> Self {
        Self { store, lexicon }
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    /// Dispatch one tool call on behalf of `owner`.
    pub async fn dispatch(
        &self,
        call: &ToolCall,
        owner: Uuid,
    ) -> Result<DispatchOutcome, DispatchError> {
        let tool = ToolName::parse(&call.name).ok_or_else(|| DispatchError::UnknownTool {
            name: call.name.clone(),
        })?;
        debug!(tool = call.name.as_str(), %owner, "dispatching tool call");

        match tool {
            ToolName::CreateTask => self.create_task(&call.arguments, owner).await,
            ToolName::GetTasks => self.get_tasks(&call.arguments, owner).await,
            ToolName::UpdateTask => self.update_task(&call.arguments, owner).await,
            ToolName::DeleteTask => self.delete_task(&call.arguments, owner).await,
            ToolName::ToggleTaskCompletion => self.toggle_task(&call.arguments, owner).await,
        }
    }

    async fn create_task(
        &self,
        args: &Value,
        owner: Uuid,
    ) -> Result<DispatchOutcome, DispatchError> {
        let title = require_string(args, "title", "create_task")?;
        let title = title.trim();
        if title.is_empty() {
            return Err(invalid("create_task", "title must not be empty"));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(invalid("create_task", "title exceeds 200 characters"));
        }
        self.check_title_language(title, "create_task")?;

        if let Some(outcome) = self.try_reroute_update(title, owner).await? {
            return Ok(outcome);
        }

        let description = optional_string(args, "description");
        if let Some(ref d) = description {
            if d.chars().count() > MAX_DESCRIPTION_CHARS {
                return Err(invalid("create_task", "description exceeds 1000 characters"));
            }
        }
        let due_date = parse_due_date(args, "create_task")?;
        let priority = parse_priority_arg(args, "create_task")?.unwrap_or_default();

        let task = self
            .store
            .create(
                owner,
                NewTask {
                    title: title.to_string(),
                    description,
                    priority,
                    due_date,
                },
            )
            .await?;
        info!(task_id = %task.id, "task created");
        Ok(DispatchOutcome::Created(task))
    }

    /// Reroute a `create_task` whose title is really an update sentence.
    ///
    /// Fires only when the title carries both an update-verb marker and an
    /// attribute word, and the sentence parses, resolves to a stored task,
    /// and yields a concrete change. Any miss falls back to a plain create.
    async fn try_reroute_update(
        &self,
        title: &str,
        owner: Uuid,
    ) -> Result<Option<DispatchOutcome>, DispatchError> {
        let lower = title.to_lowercase();
        let has_verb = REROUTE_MARKERS.iter().any(|m| lower.contains(m));
        let has_attribute = lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|w| ATTRIBUTE_MARKERS.contains(&w));
        if !has_verb || !has_attribute {
            return Ok(None);
        }

        let Some(parsed) = parse_update_request(title, &self.lexicon) else {
            return Ok(None);
        };
        let patch = change_to_patch(&parsed.change);
        if patch.is_empty() {
            return Ok(None);
        }

        let tasks = self
            .store
            .list(Some(owner), StatusFilter::All, None, DEFAULT_LIST_LIMIT)
            .await?;
        let Some(target) = resolve_task_reference(&parsed.reference, &tasks) else {
            return Ok(None);
        };

        info!(
            task_id = %target.id,
            reference = parsed.reference.as_str(),
            "rerouting create_task call that reads like an update"
        );
        let task = self.store.update(target.id, patch).await?;
        Ok(Some(DispatchOutcome::Updated {
            task,
            intercepted: true,
        }))
    }

    async fn get_tasks(&self, args: &Value, owner: Uuid) -> Result<DispatchOutcome, DispatchError> {
        let status = match optional_string(args, "status") {
            Some(s) => StatusFilter::parse(&s)
                .ok_or_else(|| invalid("get_tasks", "status must be all, pending, or completed"))?,
            None => StatusFilter::All,
        };
        let priority = parse_priority_arg(args, "get_tasks")?;
        let limit = match args.get("limit") {
            Some(v) => {
                let n = v
                    .as_u64()
                    .ok_or_else(|| invalid("get_tasks", "limit must be an integer"))?;
                if n < 1 || n > DEFAULT_LIST_LIMIT as u64 {
                    return Err(invalid("get_tasks", "limit must be between 1 and 100"));
                }
                n as usize
            }
            None => DEFAULT_LIST_LIMIT,
        };

        let tasks = self.store.list(Some(owner), status, priority, limit).await?;
        Ok(DispatchOutcome::Listed(tasks))
    }

    async fn update_task(
        &self,
        args: &Value,
        owner: Uuid,
    ) -> Result<DispatchOutcome, DispatchError> {
        let reference = require_string(args, "task_identifier", "update_task")?;
        let updates = args
            .get("updates")
            .and_then(|u| u.as_object())
            .ok_or_else(|| invalid("update_task", "updates object is required"))?;

        let mut patch = TaskPatch::default();
        if let Some(title) = updates.get("title").and_then(|v| v.as_str()) {
            let title = title.trim();
            if title.is_empty() || title.chars().count() > MAX_TITLE_CHARS {
                return Err(invalid("update_task", "title must be 1 to 200 characters"));
            }
            self.check_title_language(title, "update_task")?;
            patch.title = Some(title.to_string());
        }
        if let Some(description) = updates.get("description").and_then(|v| v.as_str()) {
            if description.chars().count() > MAX_DESCRIPTION_CHARS {
                return Err(invalid("update_task", "description exceeds 1000 characters"));
            }
            patch.description = Some(description.to_string());
        }
        if let Some(priority) = updates.get("priority").and_then(|v| v.as_str()) {
            patch.priority = Some(
                Priority::parse(priority)
                    .ok_or_else(|| invalid("update_task", "priority must be high, medium, or low"))?,
            );
        }
        if let Some(status) = updates.get("status").and_then(|v| v.as_str()) {
            patch.status = Some(
                TaskStatus::parse(status)
                    .ok_or_else(|| invalid("update_task", "status must be pending or completed"))?,
            );
        }
        if let Some(completed) = updates.get("completed").and_then(|v| v.as_bool()) {
            patch.status = Some(if completed {
                TaskStatus::Completed
            } else {
                TaskStatus::Pending
            });
        }
        if let Some(due) = updates.get("due_date").and_then(|v| v.as_str()) {
            patch.due_date = Some(parse_date_str(due, "update_task")?);
        }
        if patch.is_empty() {
            return Err(invalid("update_task", "updates carries no recognized field"));
        }

        let tasks = self
            .store
            .list(Some(owner), StatusFilter::All, None, DEFAULT_LIST_LIMIT)
            .await?;
        let Some(target) = resolve_task_reference(&reference, &tasks) else {
            return Ok(DispatchOutcome::NoMatch { reference });
        };

        let task = self.store.update(target.id, patch).await?;
        info!(task_id = %task.id, "task updated");
        Ok(DispatchOutcome::Updated {
            task,
            intercepted: false,
        })
    }

    async fn delete_task(
        &self,
        args: &Value,
        owner: Uuid,
    ) -> Result<DispatchOutcome, DispatchError> {
        let id = require_task_id(args, "delete_task")?;
        let task = self.fetch_owned(id, owner).await?;
        self.store.delete(id).await?;
        info!(task_id = %id, "task deleted");
        Ok(DispatchOutcome::Deleted { task })
    }

    async fn toggle_task(
        &self,
        args: &Value,
        owner: Uuid,
    ) -> Result<DispatchOutcome, DispatchError> {
        let id = require_task_id(args, "toggle_task_completion")?;
        let task = self.fetch_owned(id, owner).await?;
        let toggled = self
            .store
            .update(id, TaskPatch::status(task.status.toggled()))
            .await?;
        Ok(DispatchOutcome::Toggled(toggled))
    }

    /// Reject titles carrying insult vocabulary before they reach the store.
    fn check_title_language(&self, title: &str, tool: &str) -> Result<(), DispatchError> {
        if Lexicon::any_match(&title.to_lowercase(), &self.lexicon.inappropriate_title_terms) {
            return Err(invalid(tool, "title contains inappropriate language"));
        }
        Ok(())
    }

    /// Fetch a task and verify ownership. Missing and foreign-owned
    /// tasks fail differently on purpose.
    async fn fetch_owned(&self, id: Uuid, owner: Uuid) -> Result<Task, DispatchError> {
        let task = self
            .store
            .get(id)
            .await?
            .ok_or(DispatchError::NotFound { id })?;
        if task.owner_id != owner {
            return Err(DispatchError::AccessDenied { id });
        }
        Ok(task)
    }
}

fn invalid(tool: &str, reason: &str) -> DispatchError {
    DispatchError::InvalidArguments {
        tool: tool.to_string(),
        reason: reason.to_string(),
    }
}

fn require_string(args: &Value, field: &str, tool: &str) -> Result<String, DispatchError> {
    args.get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| invalid(tool, &format!("{field} is required")))
}

fn optional_string(args: &Value, field: &str) -> Option<String> {
    args.get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn require_task_id(args: &Value, tool: &str) -> Result<Uuid, DispatchError> {
    let raw = require_string(args, "task_id", tool)?;
    raw.parse()
        .map_err(|_| invalid(tool, "task_id is not a valid id"))
}

fn parse_due_date(args: &Value, tool: &str) -> Result<Option<NaiveDate>, DispatchError> {
    match optional_string(args, "due_date") {
        Some(raw) => Ok(Some(parse_date_str(&raw, tool)?)),
        None => Ok(None),
    }
}

fn parse_date_str(raw: &str, tool: &str) -> Result<NaiveDate, DispatchError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| invalid(tool, "due_date must be in YYYY-MM-DD format"))
}

fn parse_priority_arg(args: &Value, tool: &str) -> Result<Option<Priority>, DispatchError> {
    match optional_string(args, "priority") {
        Some(raw) => Priority::parse(&raw)
            .map(Some)
            .ok_or_else(|| invalid(tool, "priority must be high, medium, or low")),
        None => Ok(None),
    }
}

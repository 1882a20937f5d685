//! Tool menu exposed to the model.

use crate::types::ToolDefinition;
use serde_json::json;

/// The tools the assistant can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    CreateTask,
    GetTasks,
    UpdateTask,
    DeleteTask,
    ToggleTaskCompletion,
}

impl ToolName {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "create_task" => Some(ToolName::CreateTask),
            "get_tasks" => Some(ToolName::GetTasks),
            "update_task" => Some(ToolName::UpdateTask),
            "delete_task" => Some(ToolName::DeleteTask),
            "toggle_task_completion" => Some(ToolName::ToggleTaskCompletion),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::CreateTask => "create_task",
            ToolName::GetTasks => "get_tasks",
            ToolName::UpdateTask => "update_task",
            ToolName::DeleteTask => "delete_task",
            ToolName::ToggleTaskCompletion => "toggle_task_completion",
        }
    }
}

/// Build the full tool menu sent with every model request.
///
/// `update_task` deliberately takes a free-text `task_identifier` instead
/// of an id: the model names the task the way the user did, and the
/// dispatcher resolves it against the stored titles.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "create_task".to_string(),
            description: "Create a new todo task for the user.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "The task title"},
                    "description": {"type": "string", "description": "Optional details"},
                    "due_date": {"type": "string", "description": "Due date in YYYY-MM-DD format"},
                    "priority": {"type": "string", "enum": ["high", "medium", "low"]}
                },
                "required": ["title"]
            }),
        },
        ToolDefinition {
            name: "get_tasks".to_string(),
            description: "List the user's tasks, optionally filtered.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "status": {"type": "string", "enum": ["all", "pending", "completed"]},
                    "priority": {"type": "string", "enum": ["high", "medium", "low"]},
                    "limit": {"type": "integer", "minimum": 1, "maximum": 100}
                }
            }),
        },
        ToolDefinition {
            name: "update_task".to_string(),
            description:
                "Update an existing task. Identify it by name, and supply only the fields to change."
                    .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "task_identifier": {
                        "type": "string",
                        "description": "Name or partial title of the task to update"
                    },
                    "updates": {
                        "type": "object",
                        "properties": {
                            "title": {"type": "string"},
                            "description": {"type": "string"},
                            "priority": {"type": "string", "enum": ["high", "medium", "low"]},
                            "status": {"type": "string", "enum": ["pending", "completed"]},
                            "due_date": {"type": "string", "description": "YYYY-MM-DD"},
                            "completed": {"type": "boolean"}
                        }
                    }
                },
                "required": ["task_identifier", "updates"]
            }),
        },
        ToolDefinition {
            name: "delete_task".to_string(),
            description: "Delete a task by its id.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "task_id": {"type": "string", "description": "The task id"}
                },
                "required": ["task_id"]
            }),
        },
        ToolDefinition {
            name: "toggle_task_completion".to_string(),
            description: "Flip a task between pending and completed.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "task_id": {"type": "string", "description": "The task id"}
                },
                "required": ["task_id"]
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_name_roundtrip() {
        for def in tool_definitions() {
            let parsed = ToolName::parse(&def.name).unwrap();
            assert_eq!(parsed.as_str(), def.name);
        }
        assert_eq!(ToolName::parse("shell_exec"), None);
    }

    #[test]
    fn test_menu_has_all_five_tools() {
        let defs = tool_definitions();
        assert_eq!(defs.len(), 5);
        assert!(defs.iter().all(|d| !d.description.is_empty()));
    }

    #[test]
    fn test_update_task_schema_shape() {
        let defs = tool_definitions();
        let update = defs.iter().find(|d| d.name == "update_task").unwrap();
        let required = update.parameters["required"].as_array().unwrap();
        assert!(required.contains(&serde_json::json!("task_identifier")));
        assert!(required.contains(&serde_json::json!("updates")));
    }
}

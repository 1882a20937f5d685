//! Rendering of chat replies.
//!
//! Fixed replies and the plain-text task table live here so the agent
//! and the dispatcher never build user-facing strings inline.

use crate::types::{Priority, Task, TaskStatus};

/// Reply for gratitude messages.
pub const GRATITUDE_REPLY: &str = "You're welcome! I'm glad I was able to help you.";

/// Reply for abusive or probing messages.
pub const ABUSE_REPLY: &str =
    "I maintain a professional environment. Please use respectful language so I can assist you with your tasks.";

/// Reply when the message matches a title the assistant refuses to act on.
pub const PROHIBITED_REPLY: &str =
    "I am AI Todo Assistant, you can add, update, or delete tasks by telling me what you'd like to do!";

/// Reply when the task list is empty.
pub const EMPTY_LIST_REPLY: &str = "📭 You don't have any tasks yet.\n\n💡 *You can add a new task by telling me what you'd like to do!*";

/// Reply when an update was requested but the user has no tasks at all.
pub const NO_TASKS_TO_UPDATE_REPLY: &str =
    "You don't have any tasks to update. First create a task, then I can help you update it.";

/// Reply when the incoming message exceeds the configured length limit.
pub fn message_too_long_reply(limit: usize) -> String {
    format!("That message is too long for me to process. Please keep it under {limit} characters.")
}

fn status_cell(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Completed => "✅ Completed",
        TaskStatus::Pending => "⏳ Pending",
    }
}

fn priority_cell(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "🔴 High",
        Priority::Medium => "🟡 Medium",
        Priority::Low => "🟢 Low",
    }
}

/// Render tasks as a fixed-width table inside a code fence.
///
/// Titles longer than 23 characters are truncated with an ellipsis so the
/// columns stay aligned. An empty slice yields the empty-list reply
/// instead of a headerless table.
pub fn format_task_table(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return EMPTY_LIST_REPLY.to_string();
    }

    let mut out = String::from("📋 *Here are your tasks:*\n\n```\n");
    out.push_str(&format!(
        "{:<3} {:<25} {:<12} {:<10} {:<12}\n",
        "#", "Title", "Status", "Priority", "Due Date"
    ));
    out.push_str(&"-".repeat(65));
    out.push('\n');

    for (i, task) in tasks.iter().enumerate() {
        let title: String = if task.title.chars().count() > 25 {
            let truncated: String = task.title.chars().take(23).collect();
            format!("{truncated}..")
        } else {
            task.title.clone()
        };
        let due = task
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "None".to_string());
        out.push_str(&format!(
            "{:<3} {:<25} {:<12} {:<10} {:<12}\n",
            i + 1,
            title,
            status_cell(task.status),
            priority_cell(task.priority),
            due
        ));
    }

    out.push_str("```\n\n💡 *Tip: You can ask me to update, complete, or delete any of these tasks!*");
    out
}

/// Confirmation after a successful update.
pub fn update_confirmation(title: &str) -> String {
    format!("✅ Successfully updated task '{title}'.")
}

/// Confirmation after a successful create.
pub fn create_confirmation(title: &str) -> String {
    format!("✅ Created task '{title}'.")
}

/// Confirmation after a successful delete.
pub fn delete_confirmation(title: &str) -> String {
    format!("✅ Deleted task '{title}'.")
}

/// Confirmation after toggling completion.
pub fn toggle_confirmation(title: &str, status: TaskStatus) -> String {
    match status {
        TaskStatus::Completed => format!("✅ Marked task '{title}' as completed."),
        TaskStatus::Pending => format!("⏳ Marked task '{title}' as pending."),
    }
}

/// Recovery reply when the referenced task was not found: name the failed
/// reference, then show the list so the user can try again.
pub fn task_not_found_with_list(reference: &str, tasks: &[Task]) -> String {
    format!(
        "I couldn't find a task matching '{reference}'. Here are your tasks:\n\n{}",
        format_task_table(tasks)
    )
}

/// Recovery reply when the update sentence could not be parsed.
pub fn unparseable_update_with_list(tasks: &[Task]) -> String {
    format!(
        "I couldn't determine which task to update. Here are your tasks:\n\n{}",
        format_task_table(tasks)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewTask;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn task(title: &str) -> Task {
        Task::from_new(Uuid::new_v4(), NewTask::new(title))
    }

    #[test]
    fn test_empty_list_uses_empty_reply() {
        assert_eq!(format_task_table(&[]), EMPTY_LIST_REPLY);
    }

    #[test]
    fn test_table_has_header_fence_and_tip() {
        let tasks = vec![task("Buy groceries")];
        let table = format_task_table(&tasks);
        assert!(table.starts_with("📋 *Here are your tasks:*"));
        assert!(table.contains("```\n"));
        assert!(table.contains("Title"));
        assert!(table.contains("Buy groceries"));
        assert!(table.contains("⏳ Pending"));
        assert!(table.contains("🟡 Medium"));
        assert!(table.ends_with("delete any of these tasks!*"));
    }

    #[test]
    fn test_long_title_is_truncated() {
        let tasks = vec![task("A very long title that will not fit in the column")];
        let table = format_task_table(&tasks);
        assert!(table.contains("A very long title that .."));
        assert!(!table.contains("will not fit"));
    }

    #[test]
    fn test_due_date_and_none_cells() {
        let mut with_date = task("dated");
        with_date.due_date = NaiveDate::from_ymd_opt(2026, 9, 1);
        let table = format_task_table(&[with_date, task("undated")]);
        assert!(table.contains("2026-09-01"));
        assert!(table.contains("None"));
    }

    #[test]
    fn test_rows_are_numbered_in_order() {
        let table = format_task_table(&[task("first"), task("second")]);
        let first_pos = table.find("first").unwrap();
        let second_pos = table.find("second").unwrap();
        assert!(first_pos < second_pos);
        assert!(table.contains("1  "));
        assert!(table.contains("2  "));
    }

    #[test]
    fn test_table_output_is_deterministic() {
        let mut dated = task("Client meeting");
        dated.due_date = NaiveDate::from_ymd_opt(2026, 9, 1);
        let tasks = vec![dated, task("Buy groceries")];
        assert_eq!(format_task_table(&tasks), format_task_table(&tasks));
    }

    #[test]
    fn test_recovery_replies_embed_the_table() {
        let tasks = vec![task("Buy groceries")];
        let not_found = task_not_found_with_list("gym", &tasks);
        assert!(not_found.starts_with("I couldn't find a task matching 'gym'."));
        assert!(not_found.contains("Buy groceries"));

        let unparseable = unparseable_update_with_list(&tasks);
        assert!(unparseable.starts_with("I couldn't determine which task to update."));
        assert!(unparseable.contains("Buy groceries"));
    }
}

//! Matching free-text task references against stored tasks.

use crate::types::Task;

/// Find the task a free-text fragment refers to.
///
/// Matching is case-insensitive and runs substring checks in both
/// directions, so "client meeting" finds "Client meeting with Acme" and
/// "the quarterly client meeting prep" finds "client meeting". The first
/// match in list order wins. An empty fragment never matches.
pub fn resolve_task_reference<'a>(fragment: &str, tasks: &'a [Task]) -> Option<&'a Task> {
    let needle = fragment.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    tasks.iter().find(|task| {
        let title = task.title.to_lowercase();
        title.contains(&needle) || needle.contains(&title)
    })
}

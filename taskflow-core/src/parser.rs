//! Parsing of update-style sentences.
//!
//! "Update Client meeting to high priority" splits at the first update
//! verb and the literal "to" that follows it: the words in between are
//! the task reference, the words after "to" describe the change. The
//! change fragment then maps onto concrete field changes.

use crate::lexicon::Lexicon;
use crate::types::{Priority, TaskPatch, TaskStatus};

/// The two fragments extracted from an update-style sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUpdate {
    /// Free-text reference to the task being changed, original casing kept.
    pub reference: String,
    /// Description of the requested change.
    pub change: String,
}

/// Split `message` into reference and change fragments.
///
/// Returns `None` when no update verb is present, or no "to" follows it —
/// the caller should fall back to showing the task list rather than
/// guessing.
pub fn parse_update_request(message: &str, lexicon: &Lexicon) -> Option<ParsedUpdate> {
    let words: Vec<&str> = message.split_whitespace().collect();

    let mut verb_index = None;
    for (i, word) in words.iter().enumerate() {
        let lower = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if lexicon.update_verbs.iter().any(|v| *v == lower) {
            verb_index = Some(i);
            break;
        }
    }
    let verb_index = verb_index?;

    let to_index = words
        .iter()
        .enumerate()
        .skip(verb_index + 1)
        .find(|(_, w)| w.to_lowercase() == "to")
        .map(|(i, _)| i)?;

    let reference = words[verb_index + 1..to_index].join(" ").trim().to_string();
    let change = words[to_index + 1..].join(" ").trim().to_string();
    Some(ParsedUpdate { reference, change })
}

/// Map a change fragment onto field changes.
///
/// Returns an empty patch when nothing is recognized; the caller treats
/// that as ambiguous and surfaces the task list instead of guessing.
pub fn change_to_patch(change: &str) -> TaskPatch {
    let lower = change.to_lowercase();

    let mentions_priority = lower.contains("priority");
    let bare_level = Priority::parse(&lower);
    if mentions_priority || bare_level.is_some() {
        // Whichever level appears first in the fragment wins.
        let first = ["high", "medium", "low"]
            .iter()
            .filter_map(|level| lower.find(level).map(|pos| (pos, *level)))
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, level)| level);
        if let Some(level) = first.and_then(Priority::parse) {
            return TaskPatch::priority(level);
        }
        // "priority" mentioned but no level named.
        return TaskPatch::default();
    }

    if lower.contains("completed") || (lower.contains("done") && !lower.contains("not done")) {
        return TaskPatch::status(TaskStatus::Completed);
    }
    if lower.contains("pending") || lower.contains("not done") {
        return TaskPatch::status(TaskStatus::Pending);
    }

    TaskPatch::default()
}

//! Phrase and keyword lists used by the intent classifier.
//!
//! Kept as plain configuration data rather than hardcoded match arms so
//! deployments can tune them (the lists are deliberately brittle — a word
//! like "admin" inside a legitimate title will trip the probe check, and
//! that trade-off belongs in config, not code). `Lexicon::default()`
//! carries the stock lists; a custom lexicon can be deserialized from the
//! config file.

use serde::{Deserialize, Serialize};

/// The word and phrase lists consulted during classification.
///
/// Single-word entries match whole words; entries containing a space
/// match as a case-insensitive substring phrase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    /// Profanity and insults.
    pub profanity: Vec<String>,
    /// Security-probe vocabulary (injection, credential fishing, shell terms).
    pub probe_terms: Vec<String>,
    /// Thanks expressions.
    pub gratitude: Vec<String>,
    /// Canonical view phrases matched exactly against the whole message.
    pub view_phrases: Vec<String>,
    /// Verbs that signal a view request when combined with a task noun.
    pub view_verbs: Vec<String>,
    /// Nouns that signal the message is about the task list.
    pub task_nouns: Vec<String>,
    /// Verbs that open an update-style sentence.
    pub update_verbs: Vec<String>,
    /// Attribute/value words that make an "update ... to ..." reading likely.
    pub attribute_words: Vec<String>,
    /// Titles the assistant refuses to create verbatim.
    pub prohibited_titles: Vec<String>,
    /// Terms that disqualify a task title outright.
    pub inappropriate_title_terms: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            profanity: strings(&[
                "fuck", "shit", "damn", "bitch", "asshole", "stupid", "dumb", "idiot", "crap",
                "bullshit", "moron", "cunt", "dick", "piss", "wanker", "prick", "slut", "whore",
                "bastard", "dumbass", "jackass", "loser", "pathetic", "worthless", "mental",
                "psycho", "lunatic", "duffer", "dummy", "jerk", "you idiot", "you stupid",
                "you fool", "you crazy", "you nuts", "waste of time",
            ]),
            probe_terms: strings(&[
                "hacker", "hack", "exploit", "sql", "inject", "injection", "javascript",
                "iframe", "onload", "onclick", "onerror", "admin", "root", "password",
                "credentials", "token", "secret", "config", "database", "shell", "cmd",
                "exec", "execute", "eval", "subprocess", "sudo", "shutdown",
            ]),
            gratitude: strings(&[
                "thank you", "thanks", "thank you so much", "thanks for your help",
                "thank you for helping", "appreciate it", "you're awesome", "grateful",
                "many thanks", "much appreciated", "cheers", "thnx", "thanx",
            ]),
            view_phrases: strings(&[
                "show me my tasks", "view task list", "show all tasks",
                "what tasks do i have?", "list my tasks", "display my todo list",
                "see my tasks", "check my tasks", "get my tasks", "show my to-do list",
                "view my tasks", "show task list", "view all tasks",
                "what do i have to do?", "show me tasks", "list tasks", "show my tasks",
                "view tasks", "show tasks", "see tasks", "check tasks",
            ]),
            view_verbs: strings(&[
                "show", "view", "list", "see", "check", "get", "display", "what",
            ]),
            task_nouns: strings(&["tasks", "task", "to-do", "todo", "list", "my"]),
            update_verbs: strings(&[
                "update", "change", "modify", "adjust", "set", "make", "turn", "switch",
                "alter", "revise", "upgrade", "improve", "enhance",
            ]),
            attribute_words: strings(&[
                "high", "medium", "low", "priority", "completed", "pending", "today",
                "tomorrow", "date", "due",
            ]),
            prohibited_titles: strings(&[
                "show me my tasks", "view task list", "show all tasks",
                "what tasks do i have?", "list my tasks", "display my todo list",
                "see my tasks", "check my tasks", "get my tasks", "show my to-do list",
                "view my tasks", "show task list", "view all tasks",
                "what do i have to do?", "show me tasks", "list tasks", "show my tasks",
                "view tasks", "show tasks", "see tasks", "check tasks", "thanks",
                "thank you", "thank you so much", "thanks for your help",
                "thank you for helping", "appreciate it", "you're awesome", "grateful",
                "many thanks", "much appreciated", "cheers", "update", "change", "modify",
                "adjust", "set",
            ]),
            inappropriate_title_terms: strings(&[
                "duffer", "idiot", "stupid", "dummy", "fool", "moron", "jerk", "asshole",
                "dumb",
            ]),
        }
    }
}

impl Lexicon {
    /// Whether `message` (already lowercased) contains `entry`.
    ///
    /// Multi-word entries match as substrings; single words match on word
    /// boundaries so "admin" does not fire inside "administered cream".
    pub fn entry_matches(message: &str, entry: &str) -> bool {
        if entry.contains(' ') {
            return message.contains(entry);
        }
        message
            .split(|c: char| !c.is_alphanumeric() && c != '\'' && c != '-')
            .any(|word| word == entry)
    }

    /// Whether any entry in `list` matches `message` (already lowercased).
    pub fn any_match(message: &str, list: &[String]) -> bool {
        list.iter().any(|entry| Self::entry_matches(message, entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_word_matches_on_boundaries() {
        assert!(Lexicon::entry_matches("you are an idiot", "idiot"));
        assert!(!Lexicon::entry_matches("idiomatic rust", "idiot"));
        assert!(Lexicon::entry_matches("reset the admin panel", "admin"));
        assert!(!Lexicon::entry_matches("administered the vaccine", "admin"));
    }

    #[test]
    fn test_phrase_matches_as_substring() {
        assert!(Lexicon::entry_matches("ok thank you so much!", "thank you"));
        assert!(!Lexicon::entry_matches("thankful for this", "thank you"));
    }

    #[test]
    fn test_default_lists_are_populated() {
        let lex = Lexicon::default();
        assert!(lex.profanity.len() > 10);
        assert!(lex.probe_terms.contains(&"inject".to_string()));
        assert!(lex.view_phrases.contains(&"show me my tasks".to_string()));
        assert!(lex.update_verbs.contains(&"switch".to_string()));
        // Prohibited titles cover both the view phrases and the gratitude set.
        assert!(lex.prohibited_titles.contains(&"list my tasks".to_string()));
        assert!(lex.prohibited_titles.contains(&"thank you".to_string()));
    }

    #[test]
    fn test_lexicon_deserializes_with_partial_override() {
        let toml_str = r#"gratitude = ["merci"]"#;
        let lex: Lexicon = toml::from_str(toml_str).unwrap();
        assert_eq!(lex.gratitude, vec!["merci".to_string()]);
        // Unspecified lists fall back to the defaults.
        assert!(!lex.view_phrases.is_empty());
    }
}

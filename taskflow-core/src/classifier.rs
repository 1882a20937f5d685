//! Layered intent classification for incoming chat messages.
//!
//! Classification runs cheap deterministic checks before any model call:
//! exact-phrase matches, then keyword co-occurrence, then positional
//! checks. Precedence is strict and first-match-wins — the categories
//! overlap (a message can contain both an insult and task vocabulary),
//! and the abuse check must shadow everything else.

use crate::lexicon::Lexicon;
use crate::types::Intent;

/// Classifies a message into an [`Intent`] using the configured lexicon.
///
/// A pure function of the message text; never consults the store and
/// never fails — unmatched input degrades to `Intent::Unclassified`.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    lexicon: Lexicon,
}

impl IntentClassifier {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Classify `message`. Order of checks is load-bearing.
    pub fn classify(&self, message: &str) -> Intent {
        let lower = message.trim().to_lowercase();
        if lower.is_empty() {
            return Intent::Unclassified;
        }

        // 1. Abuse and security probes shadow every other category.
        if Lexicon::any_match(&lower, &self.lexicon.profanity)
            || Lexicon::any_match(&lower, &self.lexicon.probe_terms)
        {
            return Intent::Abusive;
        }

        // 2. Gratitude.
        if Lexicon::any_match(&lower, &self.lexicon.gratitude) {
            return Intent::Gratitude;
        }

        // 3. View request: canonical phrase, or view-verb + task-noun in a
        // short message. Long messages with both word classes are usually
        // something else ("show the client what tasks remain on the...").
        if self.is_view_request(&lower) {
            return Intent::ViewRequest;
        }

        // 4. Update request.
        if self.is_update_request(&lower) {
            return Intent::UpdateRequest {
                message: message.trim().to_string(),
            };
        }

        // 5. Safety net for exact prohibited titles that slipped past the
        // earlier checks (bare verbs like "update", insult words that
        // double as titles).
        if self.lexicon.prohibited_titles.iter().any(|t| t == &lower) {
            return Intent::ProhibitedTitle;
        }

        Intent::Unclassified
    }

    fn is_view_request(&self, lower: &str) -> bool {
        if self.lexicon.view_phrases.iter().any(|p| p == lower) {
            return true;
        }
        let word_count = lower.split_whitespace().count();
        word_count <= 6
            && Lexicon::any_match(lower, &self.lexicon.view_verbs)
            && Lexicon::any_match(lower, &self.lexicon.task_nouns)
    }

    fn is_update_request(&self, lower: &str) -> bool {
        let words: Vec<&str> = lower.split_whitespace().collect();

        // An update verb with the literal "to" within the next four words:
        // "update <task words...> to <value>".
        for (i, word) in words.iter().enumerate() {
            let stripped = word.trim_matches(|c: char| !c.is_alphanumeric());
            if self.lexicon.update_verbs.iter().any(|v| v == stripped) {
                let window_end = (i + 5).min(words.len());
                if words[i + 1..window_end].iter().any(|w| *w == "to") {
                    return true;
                }
            }
        }

        // Fallback: "update" and "to" anywhere, plus an attribute word
        // ("Update the due date of Client meeting to tomorrow").
        if Lexicon::entry_matches(lower, "update")
            && Lexicon::entry_matches(lower, "to")
            && Lexicon::any_match(lower, &self.lexicon.attribute_words)
        {
            return true;
        }

        false
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(Lexicon::default())
    }
}

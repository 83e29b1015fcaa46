//! Structured fields carried inside fact text.
//!
//! FAQ facts are stored as plain text with line markers:
//!
//! ```text
//! [CATEGORY] card
//! Q: How do I change my PIN?
//! A: Open the app and pick "Change PIN".
//! ALIASES: change pin, new pin
//! ```
//!
//! Markers are case-insensitive, may be indented, and the first matching
//! line wins. A missing marker yields an empty field, never an error.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static QUESTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*Q:[ \t]*(.+)$").unwrap());
static ANSWER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*A:[ \t]*(.+)$").unwrap());
static CATEGORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*\[CATEGORY\][ \t]*(.+)$").unwrap());
static ALIASES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*ALIASES:[ \t]*(.+)$").unwrap());

/// Fields recovered from one fact's text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FactFields {
    /// Text after `Q:`, or empty.
    pub question: String,
    /// Text after `A:`, or the whole trimmed fact text.
    pub answer: String,
    /// Text after `[CATEGORY]`.
    pub category: Option<String>,
    /// Comma-separated values after `ALIASES:`, trimmed, empties dropped.
    pub aliases: Vec<String>,
}

impl FactFields {
    pub fn parse(text: &str) -> Self {
        Self {
            question: capture(&QUESTION_RE, text).unwrap_or_default(),
            answer: capture(&ANSWER_RE, text).unwrap_or_else(|| text.trim().to_string()),
            category: capture(&CATEGORY_RE, text),
            aliases: capture(&ALIASES_RE, text)
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|a| !a.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// `Some(question)` unless the fact carries no `Q:` line.
    pub fn matched_question(&self) -> Option<&str> {
        (!self.question.is_empty()).then_some(self.question.as_str())
    }

    /// Whether `normalized_query` (already trimmed and lowercased) equals
    /// the question or one of the aliases, ignoring case and surrounding
    /// whitespace.
    pub fn exact_match(&self, normalized_query: &str) -> bool {
        if normalized_query.is_empty() {
            return false;
        }
        self.question.trim().to_lowercase() == normalized_query
            || self
                .aliases
                .iter()
                .any(|a| a.to_lowercase() == normalized_query)
    }
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAQ: &str = "[CATEGORY] card\n\
                       Q: Jak zmienić PIN do karty?\n\
                       A: PIN zmienisz w aplikacji.\n\
                       ALIASES: Zmiana PIN,  nowy pin , ,Reset PIN\n\
                       TAGS: pin, karta";

    #[test]
    fn parses_all_markers() {
        let f = FactFields::parse(FAQ);
        assert_eq!(f.category.as_deref(), Some("card"));
        assert_eq!(f.question, "Jak zmienić PIN do karty?");
        assert_eq!(f.answer, "PIN zmienisz w aplikacji.");
        assert_eq!(f.aliases, vec!["Zmiana PIN", "nowy pin", "Reset PIN"]);
    }

    #[test]
    fn markers_are_case_insensitive_and_may_be_indented() {
        let f = FactFields::parse("   q:  lower question\n\t[category] misc\naliases: one");
        assert_eq!(f.question, "lower question");
        assert_eq!(f.category.as_deref(), Some("misc"));
        assert_eq!(f.aliases, vec!["one"]);
    }

    #[test]
    fn marker_must_start_the_line() {
        let f = FactFields::parse("see Q: inline is not a marker");
        assert_eq!(f.question, "");
    }

    #[test]
    fn missing_markers_yield_empty_fields() {
        let f = FactFields::parse("USER: hello there");
        assert_eq!(f.question, "");
        assert!(f.category.is_none());
        assert!(f.aliases.is_empty());
        assert!(f.matched_question().is_none());
    }

    #[test]
    fn answer_falls_back_to_whole_text() {
        let f = FactFields::parse("  ASSISTANT: call the hotline \n");
        assert_eq!(f.answer, "ASSISTANT: call the hotline");
    }

    #[test]
    fn first_marker_wins() {
        let f = FactFields::parse("Q: first\nQ: second");
        assert_eq!(f.question, "first");
    }

    // ── exact_match ──────────────────────────────────────────────────────────

    #[test]
    fn exact_match_on_question_ignores_case() {
        let f = FactFields::parse(FAQ);
        assert!(f.exact_match("jak zmienić pin do karty?"));
    }

    #[test]
    fn exact_match_on_alias() {
        let f = FactFields::parse(FAQ);
        assert!(f.exact_match("reset pin"));
    }

    #[test]
    fn partial_text_is_not_an_exact_match() {
        let f = FactFields::parse(FAQ);
        assert!(!f.exact_match("zmienić pin"));
    }

    #[test]
    fn empty_query_never_matches() {
        let f = FactFields::parse("no question here");
        assert!(!f.exact_match(""));
    }
}

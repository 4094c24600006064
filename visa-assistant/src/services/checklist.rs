//! Pull required-document markers out of an answer.
//!
//! The model is told to wrap every required document in square brackets,
//! e.g. `[Work ID]`. Each bracketed span without inner brackets names one
//! checklist item. The displayed answer has every bracket character removed,
//! whether or not it belonged to a marker.

use crate::models::Checklist;
use regex::Regex;
use std::sync::OnceLock;

static MARKER_PATTERN: OnceLock<Regex> = OnceLock::new();

fn marker_pattern() -> &'static Regex {
    MARKER_PATTERN.get_or_init(|| Regex::new(r"\[([^\[\]]+)\]").expect("marker pattern is valid"))
}

/// Answer after checklist derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedAnswer {
    /// Answer with every `[` and `]` removed.
    pub cleaned: String,

    /// Labels added to the checklist by this answer, in order.
    pub added: Vec<String>,
}

/// Labels of every marker in `raw`, in order of appearance, repeats included.
/// Empty brackets produce nothing.
pub fn extract_markers(raw: &str) -> Vec<&str> {
    marker_pattern()
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Remove every bracket character.
pub fn strip_brackets(raw: &str) -> String {
    raw.chars().filter(|c| *c != '[' && *c != ']').collect()
}

/// Merge the answer's markers into `checklist` and return the display text.
pub fn derive_checklist(raw: &str, checklist: &mut Checklist) -> DerivedAnswer {
    let added = extract_markers(raw)
        .into_iter()
        .filter(|label| checklist.insert(label))
        .map(str::to_string)
        .collect();

    DerivedAnswer {
        cleaned: strip_brackets(raw),
        added,
    }
}

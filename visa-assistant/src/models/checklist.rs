//! The running list of documents the visitor has to gather.

use serde::{Deserialize, Serialize};

/// Items every consultation starts with.
pub const DEFAULT_CHECKLIST: [&str; 2] = ["Passport (Valid 6+ months)", "Recent Photograph"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistEntry {
    pub label: String,

    /// Ticked off by the visitor. Display state only.
    #[serde(default)]
    pub completed: bool,
}

/// Insertion-ordered, duplicate-free document labels. Labels compare by
/// exact, case-sensitive text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    entries: Vec<ChecklistEntry>,
}

impl Checklist {
    /// A checklist holding only [`DEFAULT_CHECKLIST`].
    pub fn seeded() -> Self {
        Self::from_labels(DEFAULT_CHECKLIST)
    }

    /// Build from labels, dropping repeats after their first occurrence.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut checklist = Self {
            entries: Vec::new(),
        };
        for label in labels {
            checklist.insert(label.as_ref());
        }
        checklist
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.iter().any(|e| e.label == label)
    }

    /// Append `label` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, label: &str) -> bool {
        if self.contains(label) {
            return false;
        }
        self.entries.push(ChecklistEntry {
            label: label.to_string(),
            completed: false,
        });
        true
    }

    /// Flip the completed flag of `label`, returning the new value, or `None`
    /// when the label is not on the list.
    pub fn toggle(&mut self, label: &str) -> Option<bool> {
        let entry = self.entries.iter_mut().find(|e| e.label == label)?;
        entry.completed = !entry.completed;
        Some(entry.completed)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    pub fn entries(&self) -> &[ChecklistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Checklist {
    fn default() -> Self {
        Self::seeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_checklist_has_defaults_in_order() {
        let checklist = Checklist::seeded();
        let labels: Vec<&str> = checklist.labels().collect();
        assert_eq!(labels, DEFAULT_CHECKLIST);
    }

    #[test]
    fn insert_ignores_exact_duplicates() {
        let mut checklist = Checklist::seeded();
        assert!(checklist.insert("Bank Statement"));
        assert!(!checklist.insert("Bank Statement"));
        assert_eq!(checklist.len(), 3);
    }

    #[test]
    fn labels_are_case_sensitive() {
        let mut checklist = Checklist::from_labels(["visa fee receipt"]);
        assert!(checklist.insert("Visa Fee Receipt"));
        assert_eq!(checklist.len(), 2);
    }

    #[test]
    fn from_labels_keeps_first_occurrence_order() {
        let checklist = Checklist::from_labels(["B", "A", "B", "C", "A"]);
        let labels: Vec<&str> = checklist.labels().collect();
        assert_eq!(labels, ["B", "A", "C"]);
    }

    #[test]
    fn toggle_flips_known_items_only() {
        let mut checklist = Checklist::seeded();
        assert_eq!(checklist.toggle("Recent Photograph"), Some(true));
        assert_eq!(checklist.toggle("Recent Photograph"), Some(false));
        assert_eq!(checklist.toggle("Birth Certificate"), None);
    }

    #[test]
    fn toggled_items_still_deduplicate() {
        let mut checklist = Checklist::seeded();
        checklist.toggle("Recent Photograph");
        assert!(!checklist.insert("Recent Photograph"));
        assert!(checklist.entries()[1].completed);
    }
}

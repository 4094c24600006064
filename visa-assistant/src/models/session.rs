//! Per-visitor consultation state.

use super::checklist::Checklist;
use super::conversation::{ConversationTurn, Message};
use serde::{Deserialize, Serialize};

/// Display theme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Everything one visitor's consultation owns: the transcript shown to the
/// visitor, the history sent to the model, the checklist, and the theme.
///
/// Transcript and history grow in lockstep, one entry each per turn. The only
/// time they differ is after a user turn whose answer has not arrived (or
/// failed); the user message stays visible so it can be resubmitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    transcript: Vec<Message>,
    history: Vec<ConversationTurn>,
    checklist: Checklist,
    #[serde(default)]
    theme: Theme,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            transcript: Vec::new(),
            history: Vec::new(),
            checklist: Checklist::seeded(),
            theme: Theme::default(),
        }
    }

    /// Record the visitor's question in both logs.
    pub fn append_user_turn(&mut self, text: &str) {
        self.transcript.push(Message::user(text));
        self.history.push(ConversationTurn::user(text));
    }

    /// Record an answer: cleaned text for display, raw text for the model.
    pub fn append_assistant_turn(&mut self, cleaned: &str, raw: &str) {
        self.transcript.push(Message::assistant(cleaned));
        self.history.push(ConversationTurn::model(raw));
    }

    /// Clear both logs and reseed the checklist. The theme is kept.
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.history.clear();
        self.checklist = Checklist::seeded();
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn checklist(&self) -> &Checklist {
        &self.checklist
    }

    pub fn checklist_mut(&mut self) -> &mut Checklist {
        &mut self.checklist
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, TurnRole, DEFAULT_CHECKLIST};

    #[test]
    fn assistant_turn_keeps_raw_text_in_history() {
        let mut state = SessionState::new();
        state.append_user_turn("What do I need for Japan?");
        state.append_assistant_turn("Bring your Passport.", "Bring your [Passport].");

        assert_eq!(state.transcript().len(), state.history().len());
        assert_eq!(state.transcript()[1].role, Role::Assistant);
        assert_eq!(state.transcript()[1].content, "Bring your Passport.");
        assert_eq!(state.history()[1].role, TurnRole::Model);
        assert_eq!(state.history()[1].text(), "Bring your [Passport].");
    }

    #[test]
    fn reset_restores_defaults_and_is_idempotent() {
        let mut state = SessionState::new();
        state.append_user_turn("hi");
        state.append_assistant_turn("hello", "hello");
        state.checklist_mut().insert("Work ID");
        state.toggle_theme();

        state.reset();
        state.reset();

        assert!(state.transcript().is_empty());
        assert!(state.history().is_empty());
        let labels: Vec<&str> = state.checklist().labels().collect();
        assert_eq!(labels, DEFAULT_CHECKLIST);
        assert_eq!(state.theme(), Theme::Dark);
    }

    #[test]
    fn state_survives_serde_round_trip() {
        let mut state = SessionState::new();
        state.append_user_turn("Schengen visa?");
        state.checklist_mut().insert("Travel Insurance");

        let json = serde_json::to_value(&state).unwrap();
        let restored: SessionState = serde_json::from_value(json).unwrap();

        assert_eq!(restored.transcript().len(), 1);
        assert_eq!(restored.history(), state.history());
        assert_eq!(restored.checklist(), state.checklist());
    }
}

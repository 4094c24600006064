//! Consultation turn pipeline.
//!
//! A turn is: record the question, ask the model with the whole history,
//! derive checklist items from the raw answer, collect citations, record the
//! answer. Retrying a failed turn is the visitor submitting again; nothing
//! here retries on its own, so history never gains duplicate entries.

use crate::models::{Citation, ConversationTurn, SessionState};
use crate::services::checklist::derive_checklist;
use crate::services::citations::{extract_citations, search_queries, search_suggestion};
use crate::services::metrics;
use crate::services::providers::{GenerationParams, ProviderError, ProviderResponse, TextProvider};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Persona and marker convention sent with every consultation turn.
pub const VISA_ASSISTANT_DIRECTIVE: &str = "You are a professional Visa Assistant. \
Always enclose required documents in [brackets] like [Work ID]. \
Be clear, concise, and helpful.";

/// Appended as a user turn when summarizing.
pub const SUMMARY_INSTRUCTION: &str = "Summarize the visa consultation above into a concise, \
professional one-paragraph travel plan.";

/// Returned by `summarize` when there is nothing to summarize.
pub const NO_HISTORY_MESSAGE: &str = "No conversation history to summarize.";

/// What the visitor sees after a successful turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    /// Answer with markers stripped.
    pub answer: String,
    pub citations: Vec<Citation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_suggestion: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub search_queries: Vec<String>,
    /// Checklist labels first seen in this answer.
    pub added_items: Vec<String>,
}

#[derive(Clone)]
pub struct ConversationService {
    provider: Arc<dyn TextProvider>,
}

impl ConversationService {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self { provider }
    }

    fn consultation_params() -> GenerationParams {
        GenerationParams {
            system_instruction: Some(VISA_ASSISTANT_DIRECTIVE.to_string()),
            web_search: true,
            ..Default::default()
        }
    }

    /// Record the visitor's question. Must happen before the model call so a
    /// failed call still leaves the question visible.
    pub fn begin_turn(&self, state: &mut SessionState, text: &str) {
        state.append_user_turn(text);
    }

    /// Ask the model to answer the last turn of `history`.
    #[tracing::instrument(skip(self, history), fields(turns = history.len()))]
    pub async fn request_answer(
        &self,
        history: &[ConversationTurn],
    ) -> Result<ProviderResponse, ProviderError> {
        self.call_provider(history, &Self::consultation_params(), "consultation")
            .await
    }

    /// Fold a model response into the session and build the visitor's view.
    pub fn complete_turn(&self, state: &mut SessionState, response: ProviderResponse) -> TurnOutcome {
        let raw = response.answer().to_string();
        let derived = derive_checklist(&raw, state.checklist_mut());
        let grounding = response.grounding.as_ref();
        let citations = extract_citations(grounding);

        state.append_assistant_turn(&derived.cleaned, &raw);

        metrics::record_turn("answered");
        metrics::record_answer_yield(derived.added.len(), citations.len());

        tracing::info!(
            items_added = derived.added.len(),
            citations = citations.len(),
            checklist_len = state.checklist().len(),
            "Consultation turn completed"
        );

        TurnOutcome {
            answer: derived.cleaned,
            citations,
            search_suggestion: search_suggestion(grounding),
            search_queries: search_queries(grounding),
            added_items: derived.added,
        }
    }

    /// Run a whole turn. On failure the question stays in the session and the
    /// error is returned for the caller to show.
    pub async fn ask(
        &self,
        state: &mut SessionState,
        text: &str,
    ) -> Result<TurnOutcome, ProviderError> {
        self.begin_turn(state, text);
        let response = self.request_answer(state.history()).await?;
        Ok(self.complete_turn(state, response))
    }

    /// One-paragraph summary of the consultation. Read-only: the session is
    /// not changed. Failures come back as text rather than errors.
    pub async fn summarize(&self, state: &SessionState) -> String {
        if state.history().is_empty() {
            return NO_HISTORY_MESSAGE.to_string();
        }

        let mut contents = state.history().to_vec();
        contents.push(ConversationTurn::user(SUMMARY_INSTRUCTION));

        match self
            .call_provider(&contents, &GenerationParams::default(), "summary")
            .await
        {
            Ok(response) => response.answer().to_string(),
            Err(e) => format!("Summary failed: {}", e),
        }
    }

    /// Start a new consultation.
    pub fn reset(&self, state: &mut SessionState) {
        state.reset();
        tracing::info!("Consultation reset");
    }

    async fn call_provider(
        &self,
        history: &[ConversationTurn],
        params: &GenerationParams,
        operation: &str,
    ) -> Result<ProviderResponse, ProviderError> {
        let provider = self.provider.name();
        let model = self.provider.model().to_string();
        let start = Instant::now();

        let result = self.provider.generate(history, params).await;

        metrics::record_provider_latency(provider, &model, operation, start.elapsed().as_secs_f64());

        match &result {
            Ok(response) => {
                metrics::record_tokens(&model, response.input_tokens, response.output_tokens);
                tracing::debug!(
                    operation,
                    finish_reason = response.finish_reason.as_str(),
                    input_tokens = response.input_tokens,
                    output_tokens = response.output_tokens,
                    "Provider call succeeded"
                );
            }
            Err(e) => {
                metrics::record_provider_error(provider, e.kind());
                if operation == "consultation" {
                    metrics::record_turn("failed");
                }
                tracing::warn!(operation, error = %e, "Provider call failed");
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GroundingChunk, GroundingMetadata, Role, TurnRole, WebSource};
    use crate::services::providers::mock::MockTextProvider;

    fn service(provider: MockTextProvider) -> (ConversationService, Arc<MockTextProvider>) {
        let provider = Arc::new(provider);
        (ConversationService::new(provider.clone()), provider)
    }

    fn grounded(text: &str, uris: &[(&str, &str)]) -> ProviderResponse {
        ProviderResponse {
            text: Some(text.to_string()),
            grounding: Some(GroundingMetadata {
                grounding_chunks: Some(
                    uris.iter()
                        .map(|(uri, title)| GroundingChunk {
                            web: Some(WebSource::new(*uri, Some(*title))),
                        })
                        .collect(),
                ),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn turn_updates_transcript_history_and_checklist() {
        let (service, provider) = service(MockTextProvider::new(true).with_responses([Ok(
            grounded(
                "Bring your [Passport] and [Bank Statement].",
                &[("https://embassy.example", "Embassy"), ("https://embassy.example", "Again")],
            ),
        )]));
        let mut state = SessionState::new();

        let outcome = service.ask(&mut state, "Tourist visa for Italy?").await.unwrap();

        assert_eq!(outcome.answer, "Bring your Passport and Bank Statement.");
        assert_eq!(outcome.added_items, ["Passport", "Bank Statement"]);
        assert_eq!(outcome.citations.len(), 1);
        assert_eq!(outcome.citations[0].title, "Embassy");

        assert_eq!(state.transcript().len(), 2);
        assert_eq!(state.history().len(), 2);
        assert_eq!(state.transcript()[1].role, Role::Assistant);
        assert_eq!(state.transcript()[1].content, outcome.answer);
        assert_eq!(
            state.history()[1].text(),
            "Bring your [Passport] and [Bank Statement]."
        );
        assert_eq!(state.checklist().len(), 4);

        let call = &provider.calls()[0];
        assert!(call.web_search);
        assert_eq!(
            call.system_instruction.as_deref(),
            Some(VISA_ASSISTANT_DIRECTIVE)
        );
        assert_eq!(call.history, vec![ConversationTurn::user("Tourist visa for Italy?")]);
    }

    #[tokio::test]
    async fn follow_up_sends_raw_markers_back_to_model() {
        let (service, provider) = service(MockTextProvider::new(true).with_responses([
            Ok(ProviderResponse::text("You need a [Work ID].")),
            Ok(ProviderResponse::text("Also a [Work ID] copy.")),
        ]));
        let mut state = SessionState::new();

        service.ask(&mut state, "Work visa?").await.unwrap();
        let outcome = service.ask(&mut state, "Anything else?").await.unwrap();

        assert!(outcome.added_items.is_empty());
        let second_call = &provider.calls()[1];
        assert_eq!(second_call.history.len(), 3);
        assert_eq!(second_call.history[1].role, TurnRole::Model);
        assert_eq!(second_call.history[1].text(), "You need a [Work ID].");
    }

    #[tokio::test]
    async fn failed_turn_keeps_question_and_checklist() {
        let (service, _) = service(
            MockTextProvider::new(true)
                .with_responses([Err(ProviderError::NetworkError("timeout".to_string()))]),
        );
        let mut state = SessionState::new();

        let result = service.ask(&mut state, "Student visa?").await;

        assert!(matches!(result, Err(ProviderError::NetworkError(_))));
        assert_eq!(state.transcript().len(), 1);
        assert_eq!(state.transcript()[0].content, "Student visa?");
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.checklist().len(), 2);
    }

    #[tokio::test]
    async fn resubmitting_after_failure_appends_a_new_turn() {
        let (service, provider) = service(MockTextProvider::new(true).with_responses([
            Err(ProviderError::RateLimited),
            Ok(ProviderResponse::text("Answer")),
        ]));
        let mut state = SessionState::new();

        assert!(service.ask(&mut state, "Q").await.is_err());
        service.ask(&mut state, "Q").await.unwrap();

        assert_eq!(provider.call_count(), 2);
        assert_eq!(state.transcript().len(), 3);
        assert_eq!(state.history().len(), 3);
    }

    #[tokio::test]
    async fn empty_answer_is_recorded_as_empty_turn() {
        let (service, _) = service(
            MockTextProvider::new(true).with_responses([Ok(ProviderResponse::default())]),
        );
        let mut state = SessionState::new();

        let outcome = service.ask(&mut state, "Hello?").await.unwrap();

        assert_eq!(outcome.answer, "");
        assert!(outcome.citations.is_empty());
        assert_eq!(state.transcript().len(), 2);
    }

    #[tokio::test]
    async fn summarize_without_history_makes_no_call() {
        let (service, provider) = service(MockTextProvider::new(true));
        let state = SessionState::new();

        assert_eq!(service.summarize(&state).await, NO_HISTORY_MESSAGE);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn summarize_appends_instruction_without_touching_state() {
        let (service, provider) = service(MockTextProvider::new(true).with_responses([
            Ok(ProviderResponse::text("Bring your [Passport].")),
            Ok(ProviderResponse::text("Plan: apply in March.")),
        ]));
        let mut state = SessionState::new();
        service.ask(&mut state, "Japan?").await.unwrap();

        let summary = service.summarize(&state).await;

        assert_eq!(summary, "Plan: apply in March.");
        assert_eq!(state.history().len(), 2);
        assert_eq!(state.transcript().len(), 2);

        let call = &provider.calls()[1];
        assert_eq!(call.history.len(), 3);
        assert_eq!(call.history[2], ConversationTurn::user(SUMMARY_INSTRUCTION));
        assert!(call.system_instruction.is_none());
        assert!(!call.web_search);
    }

    #[tokio::test]
    async fn summarize_failure_is_reported_as_text() {
        let (service, _) = service(MockTextProvider::new(true).with_responses([
            Ok(ProviderResponse::text("ok")),
            Err(ProviderError::ApiError("quota exceeded".to_string())),
        ]));
        let mut state = SessionState::new();
        service.ask(&mut state, "Q").await.unwrap();

        let summary = service.summarize(&state).await;

        assert_eq!(summary, "Summary failed: API error: quota exceeded");
    }

    #[tokio::test]
    async fn reset_clears_logs_and_reseeds_checklist() {
        let (service, _) = service(
            MockTextProvider::new(true)
                .with_responses([Ok(ProviderResponse::text("Need [Visa Form]."))]),
        );
        let mut state = SessionState::new();
        service.ask(&mut state, "Q").await.unwrap();

        service.reset(&mut state);

        assert!(state.transcript().is_empty());
        assert!(state.history().is_empty());
        assert_eq!(state.checklist(), &crate::models::Checklist::seeded());
    }
}

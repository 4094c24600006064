//! Mock provider implementation for tests and offline runs.

use super::{GenerationParams, ProviderError, ProviderResponse, TextProvider};
use crate::models::ConversationTurn;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// One recorded call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub history: Vec<ConversationTurn>,
    pub system_instruction: Option<String>,
    pub web_search: bool,
}

/// Mock text provider. Replays scripted results in order, then falls back
/// to echoing the last user turn.
pub struct MockTextProvider {
    enabled: bool,
    scripted: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    call_count: AtomicUsize,
}

impl MockTextProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            scripted: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Queue results to return from the next calls, in order.
    pub fn with_responses(
        self,
        responses: impl IntoIterator<Item = Result<ProviderResponse, ProviderError>>,
    ) -> Self {
        self.scripted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(responses);
        self
    }

    /// Number of `generate` calls received.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every `generate` call received, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        history: &[ConversationTurn],
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                history: history.to_vec(),
                system_instruction: params.system_instruction.clone(),
                web_search: params.web_search,
            });

        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ));
        }

        let scripted = self
            .scripted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        if let Some(result) = scripted {
            return result;
        }

        let prompt = history.last().map(ConversationTurn::text).unwrap_or_default();
        Ok(ProviderResponse {
            text: Some(format!("Mock response for: {}", prompt)),
            input_tokens: prompt.len() as i32 / 4,
            output_tokens: 10,
            ..Default::default()
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ))
        }
    }
}

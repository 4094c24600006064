//! Model provider abstractions and implementations.
//!
//! The consultation pipeline talks to the model service only through
//! [`TextProvider`], so the Gemini backend can be swapped for the mock in tests.

pub mod gemini;
pub mod mock;

use crate::models::{ConversationTurn, GroundingMetadata};
use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations. Any of these is a failed generation
/// for the turn that triggered it.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError(_) => "api_error",
            ProviderError::InvalidRequest(_) => "invalid_request",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::ContentFiltered => "content_filtered",
            ProviderError::NetworkError(_) => "network_error",
        }
    }
}

/// Result of a provider call.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    /// Answer text. `None` when the model produced no text parts.
    pub text: Option<String>,

    /// Grounding metadata of the first candidate, if the provider sent any.
    pub grounding: Option<GroundingMetadata>,

    /// Input tokens consumed.
    pub input_tokens: i32,

    /// Output tokens generated.
    pub output_tokens: i32,

    /// Finish reason.
    pub finish_reason: FinishReason,
}

impl ProviderResponse {
    /// Plain answer without grounding.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Answer text, empty when absent.
    pub fn answer(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FinishReason {
    #[default]
    Complete,
    Length,
    ContentFilter,
    Error,
}

impl FinishReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::Complete => "complete",
            FinishReason::Length => "length",
            FinishReason::ContentFilter => "content_filter",
            FinishReason::Error => "error",
        }
    }
}

/// Generation parameters for a model call.
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    /// System instruction sent with the request.
    pub system_instruction: Option<String>,

    /// Let the model ground its answer with live web search.
    pub web_search: bool,
}

/// Trait for text generation providers (e.g., Gemini).
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate an answer for the conversation so far. The last turn of
    /// `history` is the one being answered.
    async fn generate(
        &self,
        history: &[ConversationTurn],
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Short provider name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Model identifier for logs and metrics.
    fn model(&self) -> &str;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}

//! Gemini provider implementation.
//!
//! Calls the `generateContent` REST method with the full conversation, an
//! optional system instruction and, when asked, the Google Search tool so the
//! answer comes back with grounding metadata.

use super::{FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider};
use crate::models::{ConversationTurn, GroundingMetadata};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gemini API base URL.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

/// Gemini text provider.
pub struct GeminiTextProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiTextProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        if config.api_key.expose_secret().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Build the API URL for the given model method.
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model,
            method
        )
    }
}

/// Translate the conversation and parameters into a request body.
fn build_request(history: &[ConversationTurn], params: &GenerationParams) -> GenerateContentRequest {
    let contents = history
        .iter()
        .map(|turn| Content {
            role: Some(turn.role.as_str().to_string()),
            parts: turn
                .parts
                .iter()
                .map(|text| Part {
                    text: Some(text.clone()),
                })
                .collect(),
        })
        .collect();

    let system_instruction = params.system_instruction.as_ref().map(|text| Content {
        role: None,
        parts: vec![Part {
            text: Some(text.clone()),
        }],
    });

    let tools = if params.web_search {
        vec![Tool {
            google_search: GoogleSearch {},
        }]
    } else {
        Vec::new()
    };

    GenerateContentRequest {
        contents,
        system_instruction,
        tools,
    }
}

fn parse_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("STOP") => FinishReason::Complete,
        Some("MAX_TOKENS") => FinishReason::Length,
        Some("SAFETY") | Some("PROHIBITED_CONTENT") | Some("BLOCKLIST") => {
            FinishReason::ContentFilter
        }
        _ => FinishReason::Complete,
    }
}

/// Reduce an API response to what the pipeline needs. Only the first
/// candidate counts; a missing candidate, content or grounding block is not
/// an error.
fn into_provider_response(
    api_response: GenerateContentResponse,
) -> Result<ProviderResponse, ProviderError> {
    let usage = api_response.usage_metadata.unwrap_or_default();
    let candidate = api_response.candidates.into_iter().next();

    let finish_reason = candidate
        .as_ref()
        .map(|c| parse_finish_reason(c.finish_reason.as_deref()))
        .unwrap_or(FinishReason::Complete);

    if finish_reason == FinishReason::ContentFilter {
        return Err(ProviderError::ContentFiltered);
    }

    let (text, grounding) = match candidate {
        Some(candidate) => {
            let texts: Vec<String> = candidate
                .content
                .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
                .unwrap_or_default();
            let text = if texts.is_empty() {
                None
            } else {
                Some(texts.concat())
            };
            (text, candidate.grounding_metadata)
        }
        None => (None, None),
    };

    Ok(ProviderResponse {
        text,
        grounding,
        input_tokens: usage.prompt_token_count.unwrap_or(0),
        output_tokens: usage.candidates_token_count.unwrap_or(0),
        finish_reason,
    })
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    async fn generate(
        &self,
        history: &[ConversationTurn],
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        if history.is_empty() {
            return Err(ProviderError::InvalidRequest(
                "conversation history is empty".to_string(),
            ));
        }

        let request = build_request(history, params);
        let url = self.api_url("generateContent");

        tracing::debug!(
            model = %self.config.model,
            turns = history.len(),
            web_search = params.web_search,
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        into_provider_response(api_response)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        let url = format!(
            "{}/models/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::ApiError(format!(
                "Health check failed: {}",
                response.status()
            )))
        }
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

/// A content part. Non-text parts deserialize with `text: None` and are
/// skipped.
#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}

//! Turn provider grounding metadata into displayable sources.
//!
//! All functions here are total: absent metadata at any level means "no
//! sources this turn".

use crate::models::{Citation, GroundingMetadata};
use std::collections::HashSet;

/// Cited web sources, deduplicated by URI in first-seen order. Chunks
/// without a URI are skipped; a missing title falls back to the URI.
pub fn extract_citations(metadata: Option<&GroundingMetadata>) -> Vec<Citation> {
    let Some(chunks) = metadata.and_then(|m| m.grounding_chunks.as_deref()) else {
        return Vec::new();
    };

    let mut seen_uris: HashSet<&str> = HashSet::new();
    let mut citations = Vec::new();

    for web in chunks.iter().filter_map(|chunk| chunk.web.as_ref()) {
        let Some(uri) = web.uri.as_deref().filter(|uri| !uri.is_empty()) else {
            continue;
        };
        if !seen_uris.insert(uri) {
            continue;
        }
        let title = web
            .title
            .as_deref()
            .filter(|title| !title.is_empty())
            .unwrap_or(uri);
        citations.push(Citation {
            title: title.to_string(),
            uri: uri.to_string(),
        });
    }

    citations
}

/// Pre-rendered search suggestion markup, passed through untouched.
pub fn search_suggestion(metadata: Option<&GroundingMetadata>) -> Option<String> {
    metadata
        .and_then(|m| m.search_entry_point.as_ref())
        .and_then(|entry| entry.rendered_content.as_ref())
        .filter(|content| !content.is_empty())
        .cloned()
}

/// Queries the provider ran while grounding the answer.
pub fn search_queries(metadata: Option<&GroundingMetadata>) -> Vec<String> {
    metadata
        .and_then(|m| m.web_search_queries.clone())
        .unwrap_or_default()
}

//! Grounding metadata returned alongside a search-augmented answer.
//!
//! Every level is optional: the provider may omit the whole block, the chunk
//! list, the web reference of a chunk, or any field of that reference.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub search_entry_point: Option<SearchEntryPoint>,
    #[serde(default)]
    pub grounding_chunks: Option<Vec<GroundingChunk>>,
    #[serde(default)]
    pub web_search_queries: Option<Vec<String>>,
}

/// Pre-rendered search suggestion widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntryPoint {
    #[serde(default)]
    pub rendered_content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSource {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl WebSource {
    pub fn new(uri: impl Into<String>, title: Option<&str>) -> Self {
        Self {
            uri: Some(uri.into()),
            title: title.map(str::to_string),
        }
    }
}

/// A cited source, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub uri: String,
}

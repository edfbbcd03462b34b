use async_trait::async_trait;
use scout_common::{Result, SearchResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How hard the provider should search. Tavily bills `advanced` higher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    Basic,
    #[default]
    Advanced,
}

impl SearchDepth {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchDepth::Basic => "basic",
            SearchDepth::Advanced => "advanced",
        }
    }
}

impl FromStr for SearchDepth {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(SearchDepth::Basic),
            "advanced" => Ok(SearchDepth::Advanced),
            other => Err(format!("unknown search depth: {other}")),
        }
    }
}

/// One query as handed to a [`SearchProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub result_count: u32,
    /// Restrict hits to these domains; empty means unrestricted.
    pub include_domains: Vec<String>,
    pub search_depth: SearchDepth,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, result_count: u32) -> Self {
        Self {
            query: query.into(),
            result_count,
            include_domains: Vec::new(),
            search_depth: SearchDepth::default(),
        }
    }
}

/// A web search backend.
///
/// Implementations return hits in provider rank order and report failures
/// as [`scout_common::ScoutError::Provider`] so callers can skip the query.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>>;
}

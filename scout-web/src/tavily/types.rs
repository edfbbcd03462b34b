use scout_common::SearchResult;
use serde::{Deserialize, Deserializer, Serialize};

/// Request body for `POST /search`.
#[derive(Debug, Clone, Serialize)]
pub struct TavilySearchRequest<'a> {
    pub query: &'a str,

    /// "basic" | "advanced"
    pub search_depth: &'static str,

    pub max_results: u32,

    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    pub include_domains: &'a [String],

    /// We never use the generated answer, only the hit list.
    pub include_answer: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TavilySearchResponse {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub results: Vec<TavilyHit>,
    #[serde(default)]
    pub response_time: Option<f64>,
}

/// One hit. Missing or `null` text fields decode as empty so a sparse hit
/// is rejected later by the scorer rather than failing the whole page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TavilyHit {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub published_date: Option<String>,
}

impl From<TavilyHit> for SearchResult {
    fn from(hit: TavilyHit) -> Self {
        SearchResult {
            url: hit.url,
            title: hit.title,
            content: hit.content,
            provider_score: hit.score,
        }
    }
}

fn null_as_empty<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

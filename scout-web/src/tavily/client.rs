use super::types::{TavilySearchRequest, TavilySearchResponse};
use crate::provider::{SearchProvider, SearchRequest};
use async_trait::async_trait;
use scout_common::{Result, ScoutError, SearchResult};
use scout_http::{Auth, HttpClient, HttpError, RequestOpts};
use std::time::{Duration, Instant};

pub const DEFAULT_ENDPOINT: &str = "https://api.tavily.com";

/// Minimal client for the Tavily search API.
#[derive(Clone)]
pub struct TavilyApi {
    http: HttpClient,
    api_key: String,
}

impl TavilyApi {
    /// Fails with [`ScoutError::Config`] on a blank or unexpanded key or a
    /// malformed endpoint.
    pub fn new(endpoint: &str, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        scout_common::check_api_key("search.api_key", &api_key)?;
        let http = HttpClient::new(endpoint)
            .map_err(|e| ScoutError::Config(format!("search.endpoint {endpoint:?}: {e}")))?
            .with_timeout(Duration::from_secs(30));
        Ok(Self { http, api_key })
    }

    /// Single page of hits for one query.
    pub async fn search_page(
        &self,
        request: &SearchRequest,
    ) -> std::result::Result<TavilySearchResponse, HttpError> {
        let body = TavilySearchRequest {
            query: &request.query,
            search_depth: request.search_depth.as_str(),
            max_results: request.result_count,
            include_domains: &request.include_domains,
            include_answer: false,
        };
        let opts = RequestOpts {
            auth: Some(Auth::Bearer(&self.api_key)),
            ..Default::default()
        };
        self.http.post_json_opts("search", &body, opts).await
    }
}

#[async_trait]
impl SearchProvider for TavilyApi {
    fn name(&self) -> &'static str {
        "tavily"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let started = Instant::now();
        let resp = self
            .search_page(request)
            .await
            .map_err(|e| ScoutError::Provider {
                query: request.query.clone(),
                message: e.to_string(),
            })?;

        tracing::info!(
            target: "web.tavily",
            query = %request.query,
            hit_count = resp.results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            provider_ms = ?resp.response_time.map(|s| (s * 1000.0) as u64),
            "tavily.search.page"
        );

        Ok(resp.results.into_iter().map(SearchResult::from).collect())
    }
}

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use scout_common::{Result, ScoutError};
use scout_http::{HttpClient, HttpError, RequestOpts};
use std::time::Duration;

/// Fetches detail pages for extraction.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Raw HTML of `url`, or [`ScoutError::Fetch`].
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String>;
}

/// [`PageFetcher`] over the shared HTTP client: browser user-agent, no retries.
#[derive(Clone)]
pub struct HttpPageFetcher {
    http: HttpClient,
}

impl HttpPageFetcher {
    pub fn new(user_agent: &str) -> std::result::Result<Self, HttpError> {
        let http = HttpClient::unanchored()?
            .with_retries(0)
            .with_header("user-agent", user_agent)?;
        Ok(Self { http })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        let opts = RequestOpts {
            timeout: Some(timeout),
            retries: Some(0),
            headers: Some(headers),
            allow_absolute: true,
            ..Default::default()
        };

        let resp = self
            .http
            .get_text(url, opts)
            .await
            .map_err(|e| ScoutError::Fetch {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !resp.looks_like_html() {
            return Err(ScoutError::Fetch {
                url: url.to_string(),
                message: format!(
                    "unexpected content type {}",
                    resp.content_type.as_deref().unwrap_or("-")
                ),
            });
        }

        tracing::debug!(
            target: "web.fetch",
            url = %url,
            final_url = %resp.url,
            bytes = resp.body.len(),
            "fetch.page.ok"
        );
        Ok(resp.body)
    }
}

use crate::dedup::{deduplicate, DedupPolicy};
use crate::extract::DetailExtractor;
use crate::query::synthesize_queries;
use crate::rate::QueryPacer;
use crate::score::{Scorer, ScoringRules, Verdict};
use chrono::Datelike;
use futures::stream::{self, StreamExt};
use scout_common::{CandidateEvent, Result, ScoutError, SearchResult, VendorProfile};
use scout_config::{DiscoveryConfig, SearchConfig};
use scout_web::{PageFetcher, SearchDepth, SearchProvider, SearchRequest};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Search-side knobs for one discovery run.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub results_per_query: u32,
    pub include_domains: Vec<String>,
    pub search_depth: SearchDepth,
    pub query_qps: f64,
    pub query_burst: u32,
    pub fetch_concurrency: usize,
}

impl SearchSettings {
    /// Fails with [`ScoutError::Config`] on a missing API key, so a run can
    /// never start without credentials.
    pub fn from_config(search: &SearchConfig, discovery: &DiscoveryConfig) -> Result<Self> {
        search.check_credentials()?;
        Ok(Self {
            results_per_query: search.results_per_query,
            include_domains: search.include_domains.clone(),
            search_depth: search
                .search_depth
                .parse()
                .map_err(|e: String| ScoutError::Config(format!("search.search_depth: {e}")))?,
            query_qps: discovery.query_qps,
            query_burst: discovery.query_burst,
            fetch_concurrency: discovery.fetch_concurrency.max(1),
        })
    }
}

/// The query → score → extract → dedup pipeline.
///
/// Built once from configuration and shared behind `Arc`; each
/// [`discover`](Self::discover) call owns its own pacer and buffers.
pub struct EventDiscovery {
    provider: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn PageFetcher>,
    scorer: Scorer,
    extractor: DetailExtractor,
    dedup: DedupPolicy,
    settings: SearchSettings,
    reference_year: Option<i32>,
}

impl EventDiscovery {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn PageFetcher>,
        search: &SearchConfig,
        discovery: &DiscoveryConfig,
    ) -> Result<Self> {
        Ok(Self {
            provider,
            fetcher,
            scorer: Scorer::new(ScoringRules::from_config(discovery)),
            extractor: DetailExtractor::from_config(discovery)?,
            dedup: DedupPolicy::from_config(discovery),
            settings: SearchSettings::from_config(search, discovery)?,
            reference_year: None,
        })
    }

    /// Pin the year used for query text and the recency bonus.
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    fn year(&self) -> i32 {
        self.reference_year
            .unwrap_or_else(|| chrono::Local::now().year())
    }

    /// Find event opportunities for `vendor`.
    ///
    /// Individual query or page failures are logged and skipped; only an
    /// invalid profile or cancellation fails the call.
    pub async fn discover(
        &self,
        vendor: &VendorProfile,
        radius_km: u32,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<CandidateEvent>> {
        vendor.validate()?;
        let started = Instant::now();
        let year = self.year();
        let queries = synthesize_queries(vendor, radius_km, year);

        tracing::info!(
            vendor_id = %vendor.id,
            query_count = queries.len(),
            radius_km,
            max_results,
            "discovery.start"
        );

        if max_results == 0 {
            return Ok(Vec::new());
        }

        let pacer = QueryPacer::new(self.settings.query_qps, self.settings.query_burst);
        let mut accepted: Vec<(SearchResult, u32)> = Vec::new();

        for query in queries {
            if cancel.is_cancelled() {
                return Err(ScoutError::Cancelled);
            }
            pacer.acquire(cancel).await?;

            let request = SearchRequest {
                query,
                result_count: self.settings.results_per_query,
                include_domains: self.settings.include_domains.clone(),
                search_depth: self.settings.search_depth,
            };
            tracing::debug!(query = %request.query, "discovery.query.start");

            let hits = tokio::select! {
                _ = cancel.cancelled() => return Err(ScoutError::Cancelled),
                res = self.provider.search(&request) => res,
            };
            let hits = match hits {
                Ok(hits) => hits,
                Err(err) => {
                    tracing::warn!(
                        query = %request.query,
                        provider = self.provider.name(),
                        error = %err,
                        "discovery.query.error"
                    );
                    continue;
                }
            };

            let hit_count = hits.len();
            let before = accepted.len();
            for hit in hits {
                let verdict = self.scorer.score(&hit, vendor, year);
                match self.scorer.accept(&verdict) {
                    Some(score) => accepted.push((hit, score)),
                    None => match verdict {
                        Verdict::Rejected(reason) => tracing::debug!(
                            url = %hit.url,
                            reason = %reason,
                            "discovery.result.rejected"
                        ),
                        Verdict::Scored(score) => tracing::debug!(
                            url = %hit.url,
                            score,
                            threshold = self.scorer.threshold(),
                            "discovery.result.below_threshold"
                        ),
                    },
                }
            }
            tracing::debug!(
                query = %request.query,
                hit_count,
                accepted = accepted.len() - before,
                "discovery.query.done"
            );
        }

        let candidates = accepted.len();
        let extractor = &self.extractor;
        let fetcher = self.fetcher.as_ref();
        let enrich = stream::iter(accepted)
            .map(|(hit, score)| extractor.extract(fetcher, hit, score))
            .buffered(self.settings.fetch_concurrency)
            .collect::<Vec<_>>();

        let events = tokio::select! {
            _ = cancel.cancelled() => return Err(ScoutError::Cancelled),
            events = enrich => events,
        };

        let out = deduplicate(events, vendor, max_results, self.dedup);
        tracing::info!(
            vendor_id = %vendor.id,
            candidates,
            returned = out.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "discovery.complete"
        );
        Ok(out)
    }

    /// [`discover`](Self::discover) bounded by `deadline`.
    pub async fn discover_within(
        &self,
        vendor: &VendorProfile,
        radius_km: u32,
        max_results: usize,
        deadline: Duration,
        cancel: &CancellationToken,
    ) -> Result<Vec<CandidateEvent>> {
        match tokio::time::timeout(deadline, self.discover(vendor, radius_km, max_results, cancel)).await {
            Ok(res) => res,
            Err(_) => {
                tracing::warn!(
                    vendor_id = %vendor.id,
                    deadline_ms = deadline.as_millis() as u64,
                    "discovery.timeout"
                );
                Err(ScoutError::Timeout)
            }
        }
    }
}

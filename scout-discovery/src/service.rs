//! Cache-first event lookup on top of [`EventDiscovery`] and an [`EventStore`].

use crate::pipeline::EventDiscovery;
use async_trait::async_trait;
use scout_common::{CandidateEvent, Result, StoredEvent, VendorProfile};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Persistence for discovered events, keyed by `(vendor_id, source_url)`.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert unless this vendor already has an event with the same
    /// `source_url`. Returns whether a row was written.
    async fn insert_if_absent(&self, vendor_id: &str, event: &CandidateEvent) -> Result<bool>;

    /// All events stored for the vendor, oldest first.
    async fn events_for_vendor(&self, vendor_id: &str) -> Result<Vec<StoredEvent>>;

    /// Events for the vendor whose location contains `needle`, case-insensitively.
    async fn events_matching_location(
        &self,
        vendor_id: &str,
        needle: &str,
    ) -> Result<Vec<StoredEvent>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    Cache,
    Discovery,
}

#[derive(Debug, Clone)]
pub struct FoundEvents {
    pub source: EventSource,
    pub events: Vec<CandidateEvent>,
    /// Rows written by this call.
    pub inserted: usize,
}

pub struct VendorEventService {
    discovery: Arc<EventDiscovery>,
    store: Arc<dyn EventStore>,
}

impl VendorEventService {
    pub fn new(discovery: Arc<EventDiscovery>, store: Arc<dyn EventStore>) -> Self {
        Self { discovery, store }
    }

    /// Stored events relevant to `vendor`, else a fresh discovery run whose
    /// results are persisted.
    pub async fn find_events(
        &self,
        vendor: &VendorProfile,
        radius_km: u32,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> Result<FoundEvents> {
        vendor.validate()?;

        let location = vendor.location_lower();
        let business = vendor.business_lower();
        let mut cached: Vec<CandidateEvent> = self
            .store
            .events_for_vendor(&vendor.id)
            .await?
            .into_iter()
            .map(|stored| stored.event)
            .filter(|ev| {
                ev.location.to_lowercase().contains(&location)
                    || ev.description.to_lowercase().contains(&business)
            })
            .collect();

        if !cached.is_empty() {
            cached.truncate(max_results);
            tracing::info!(
                vendor_id = %vendor.id,
                returned = cached.len(),
                "service.cache.hit"
            );
            return Ok(FoundEvents {
                source: EventSource::Cache,
                events: cached,
                inserted: 0,
            });
        }

        tracing::info!(vendor_id = %vendor.id, "service.cache.miss");
        self.refresh(vendor, radius_km, max_results, cancel).await
    }

    /// Always run discovery and persist what it finds.
    pub async fn refresh(
        &self,
        vendor: &VendorProfile,
        radius_km: u32,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> Result<FoundEvents> {
        let events = self
            .discovery
            .discover(vendor, radius_km, max_results, cancel)
            .await?;

        let mut inserted = 0;
        for event in &events {
            if self.store.insert_if_absent(&vendor.id, event).await? {
                inserted += 1;
            }
        }
        tracing::info!(
            vendor_id = %vendor.id,
            discovered = events.len(),
            inserted,
            "service.persist"
        );

        Ok(FoundEvents {
            source: EventSource::Discovery,
            events,
            inserted,
        })
    }
}

/// Stored events for `vendor_id`, narrowed by location unless it is blank.
pub async fn stored_events(
    store: &dyn EventStore,
    vendor_id: &str,
    location: Option<&str>,
) -> Result<Vec<StoredEvent>> {
    match location.map(str::trim).filter(|l| !l.is_empty()) {
        Some(needle) => store.events_matching_location(vendor_id, needle).await,
        None => store.events_for_vendor(vendor_id).await,
    }
}

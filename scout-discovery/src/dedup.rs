//! Near-duplicate removal and location filtering of enriched events.

use scout_common::{CandidateEvent, VendorProfile};
use scout_config::{DiscoveryConfig, EventOrdering};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupPolicy {
    /// Names closer than this many characters in length may be duplicates.
    pub name_length_bound: usize,
    pub ordering: EventOrdering,
}

impl DedupPolicy {
    pub fn from_config(cfg: &DiscoveryConfig) -> Self {
        Self {
            name_length_bound: cfg.name_length_bound,
            ordering: cfg.ordering,
        }
    }
}

impl Default for DedupPolicy {
    fn default() -> Self {
        Self::from_config(&DiscoveryConfig::default())
    }
}

struct AcceptedName {
    lower: String,
    len: usize,
}

fn near_duplicate(name_lower: &str, name_len: usize, seen: &AcceptedName, bound: usize) -> bool {
    name_len.abs_diff(seen.len) < bound
        && (seen.lower.contains(name_lower) || name_lower.contains(&seen.lower))
}

/// Drop repeated URLs and near-duplicate names, keep events located near
/// the vendor, order per `policy` and cap at `max_results`.
///
/// Only events that pass the location filter count as seen, so a far-away
/// duplicate never shadows a local one.
pub fn deduplicate(
    events: Vec<CandidateEvent>,
    vendor: &VendorProfile,
    max_results: usize,
    policy: DedupPolicy,
) -> Vec<CandidateEvent> {
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut seen_names: Vec<AcceptedName> = Vec::new();
    let mut unique = Vec::new();

    for event in events {
        if seen_urls.contains(&event.source_url) {
            continue;
        }
        let lower = event.event_name.to_lowercase();
        let len = event.event_name.chars().count();
        if seen_names
            .iter()
            .any(|seen| near_duplicate(&lower, len, seen, policy.name_length_bound))
        {
            continue;
        }
        if !vendor.location_matches(&event.location.to_lowercase()) {
            continue;
        }

        seen_urls.insert(event.source_url.clone());
        seen_names.push(AcceptedName { lower, len });
        unique.push(event);
    }

    if policy.ordering == EventOrdering::Score {
        unique.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
    }
    unique.truncate(max_results);
    unique
}

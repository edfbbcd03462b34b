//! Vendor event discovery.
//!
//! One discovery run flows strictly forward:
//!
//! 1. [`query`]: search queries from the vendor's location and business
//! 2. [`rate`]: paced, sequential calls to the search provider
//! 3. [`score`]: blocklist and additive relevance scoring per hit
//! 4. [`extract`]: detail page fetch and pattern extraction, degrading to
//!    snippet-only records when a page is unreachable
//! 5. [`dedup`]: repeated URLs, near-duplicate names and far-away events
//!    removed, list capped
//!
//! [`EventDiscovery`] wires the steps together; [`VendorEventService`] adds
//! the cache-first lookup over an [`EventStore`].

pub mod dedup;
pub mod extract;
pub mod pipeline;
pub mod query;
pub mod rate;
pub mod score;
pub mod service;

pub use dedup::{deduplicate, DedupPolicy};
pub use extract::DetailExtractor;
pub use pipeline::{EventDiscovery, SearchSettings};
pub use query::{synthesize_queries, DEFAULT_RADIUS_KM};
pub use rate::QueryPacer;
pub use score::{RejectReason, Scorer, ScoringRules, Verdict};
pub use service::{stored_events, EventSource, EventStore, FoundEvents, VendorEventService};

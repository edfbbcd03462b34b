//! Common types and utilities shared across the Vendor Scout crates.
//!
//! This crate defines the domain records that flow through the discovery
//! pipeline, the shared error type, and observability helpers. It stays
//! dependency-light so every crate in the workspace can depend on it.
//!
//! # Overview
//!
//! - [`VendorProfile`]: read-only input describing who we search for
//! - [`SearchResult`]: one hit returned by a search provider
//! - [`CandidateEvent`]: a scored, enriched event opportunity
//! - [`StoredEvent`]: a persisted [`CandidateEvent`]
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`ScoutError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use scout_common::VendorProfile;
//!
//! let vendor = VendorProfile::new("v-1", "Mumbai, Maharashtra", "vada pav street food stall");
//! assert_eq!(vendor.location_lower(), "mumbai, maharashtra");
//! assert_eq!(vendor.location_segments(), vec!["mumbai", "maharashtra"]);
//! ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod observability;

/// Date sentinel used when no date could be extracted.
pub const UNKNOWN_DATE: &str = "Check website for dates";
/// Location sentinel used when no location could be extracted.
pub const UNKNOWN_LOCATION: &str = "Location details on website";
/// Stall info used when the detail page could not be fetched.
pub const FALLBACK_STALL_INFO: &str = "Contact organizer for vendor registration details";

/// The location/business pair that drives query generation and scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorProfile {
    pub id: String,
    /// Free text, usually `"City, State"`.
    pub location: String,
    /// Free-text description of what the vendor sells.
    pub business_info: String,
}

impl VendorProfile {
    pub fn new(
        id: impl Into<String>,
        location: impl Into<String>,
        business_info: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            location: location.into(),
            business_info: business_info.into(),
        }
    }

    pub fn location_lower(&self) -> String {
        self.location.trim().to_lowercase()
    }

    pub fn business_lower(&self) -> String {
        self.business_info.trim().to_lowercase()
    }

    /// Lowercased, trimmed, non-empty comma segments of the location.
    pub fn location_segments(&self) -> Vec<String> {
        self.location
            .to_lowercase()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// True when `haystack` (already lowercased) mentions the vendor's
    /// location verbatim or any of its comma segments.
    pub fn location_matches(&self, haystack_lower: &str) -> bool {
        let full = self.location_lower();
        if !full.is_empty() && haystack_lower.contains(&full) {
            return true;
        }
        self.location_segments()
            .iter()
            .any(|seg| haystack_lower.contains(seg.as_str()))
    }

    /// Both text fields must carry content for scoring to mean anything.
    pub fn validate(&self) -> Result<()> {
        if self.location.trim().is_empty() {
            return Err(ScoutError::Validation(format!(
                "vendor {} has an empty location",
                self.id
            )));
        }
        if self.business_info.trim().is_empty() {
            return Err(ScoutError::Validation(format!(
                "vendor {} has an empty business description",
                self.id
            )));
        }
        Ok(())
    }
}

/// One ranked hit from a web-search provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    pub content: String,
    /// Provider-side relevance, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_score: Option<f64>,
}

impl SearchResult {
    pub fn new(url: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            content: content.into(),
            provider_score: None,
        }
    }
}

/// A search result that passed relevance scoring and was enriched with
/// extracted fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEvent {
    pub event_name: String,
    pub description: String,
    pub location: String,
    pub contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    pub stall_info: String,
    pub event_date: String,
    pub source_url: String,
    /// Heuristic score; never persisted.
    #[serde(skip)]
    pub relevance_score: u32,
}

/// A [`CandidateEvent`] as held by the event store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: i64,
    pub vendor_id: String,
    #[serde(flatten)]
    pub event: CandidateEvent,
    pub created_at: DateTime<Utc>,
}

/// Error types used across the Vendor Scout system.
#[derive(thiserror::Error, Debug)]
pub enum ScoutError {
    /// A single search query failed at the provider.
    #[error("search provider error for query {query:?}: {message}")]
    Provider { query: String, message: String },

    /// A detail page could not be fetched or was not HTML.
    #[error("fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Input was malformed (search hit without url/title, empty vendor profile).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration was incomplete or invalid. Always fatal.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The event store rejected a read or write.
    #[error("Store error: {0}")]
    Store(String),

    /// The caller cancelled the discovery run.
    #[error("Discovery cancelled")]
    Cancelled,

    /// Operation exceeded the caller's deadline.
    #[error("Timeout occurred")]
    Timeout,
}

/// Convenient alias for results that use [`ScoutError`].
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Reject a blank credential or one still holding an unexpanded `${VAR}`.
///
/// `setting` names the config key in the error message.
pub fn check_api_key(setting: &str, key: &str) -> Result<()> {
    let key = key.trim();
    if key.is_empty() {
        return Err(ScoutError::Config(format!("{setting} is empty")));
    }
    if key.contains("${") {
        return Err(ScoutError::Config(format!(
            "{setting} has an unresolved placeholder: {key}"
        )));
    }
    Ok(())
}

//! Structured field extraction from event detail pages.

use regex::Regex;
use scout_common::{
    CandidateEvent, Result, ScoutError, SearchResult, FALLBACK_STALL_INFO, UNKNOWN_DATE,
    UNKNOWN_LOCATION,
};
use scout_config::DiscoveryConfig;
use scout_web::extract::html_to_text;
use scout_web::PageFetcher;
use std::time::Duration;

const PHONE_PATTERN: &str = r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}";
const EMAIL_PATTERN: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";

const DATE_PATTERNS: &[&str] = &[
    r"(?i)\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4}",
    r"\b\d{1,2}/\d{1,2}/\d{4}",
    r"\b\d{1,2}-\d{1,2}-\d{4}",
    r"\b\d{4}-\d{2}-\d{2}",
];

const STREET_PATTERN: &str =
    r"(?i)\b\d+\s+[\w ]{1,40}?\b(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Circle|Cir)\b";
const CITY_STATE_ZIP_PATTERN: &str = r"\b[\w ]{1,40},\s*[A-Z]{2}\s*\d{5}\b";

/// Ordered stall-info rules over lowercased text: all needles must appear.
const STALL_RULES: &[(&[&str], &str)] = &[
    (
        &["vendor", "registration"],
        "Vendor registration open - apply via website",
    ),
    (
        &["stall", "booking"],
        "Stall booking required - contact organizer",
    ),
    (
        &["food", "vendor"],
        "Food vendors welcome - check website for details",
    ),
];
const FEE_MARKERS: &[&str] = &["₹", "rs.", "fee", "cost"];
const FEE_STALL_INFO: &str = "Vendor fees apply - see website for pricing";
const DEFAULT_STALL_INFO: &str = "Contact event organizer for vendor opportunities";

/// Builds [`CandidateEvent`]s from accepted hits, fetching detail pages
/// when possible and degrading to snippet-only records when not.
#[derive(Debug, Clone)]
pub struct DetailExtractor {
    phone: Regex,
    email: Regex,
    dates: Vec<Regex>,
    locations: Vec<Regex>,
    description_budget: usize,
    fetch_timeout: Duration,
}

impl DetailExtractor {
    pub fn new(gazetteer: &[String], description_budget: usize, fetch_timeout: Duration) -> Result<Self> {
        let mut locations = vec![compile(STREET_PATTERN)?, compile(CITY_STATE_ZIP_PATTERN)?];
        let cities: Vec<String> = gazetteer
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(regex::escape)
            .collect();
        if !cities.is_empty() {
            let alternation = cities.join("|");
            locations.push(compile(&format!(r"(?i)\b[\w ]{{1,40}},\s*(?:{alternation})\b"))?);
            locations.push(compile(&format!(r"(?i)\b(?:{alternation})\b"))?);
        }

        Ok(Self {
            phone: compile(PHONE_PATTERN)?,
            email: compile(EMAIL_PATTERN)?,
            dates: DATE_PATTERNS
                .iter()
                .map(|p| compile(p))
                .collect::<Result<_>>()?,
            locations,
            description_budget,
            fetch_timeout,
        })
    }

    pub fn from_config(cfg: &DiscoveryConfig) -> Result<Self> {
        Self::new(
            &cfg.gazetteer,
            cfg.description_budget,
            Duration::from_secs(cfg.fetch_timeout_secs),
        )
    }

    /// Fetch the hit's page and extract fields from it. Never fails: an
    /// unreachable page yields [`Self::degraded`].
    pub async fn extract(
        &self,
        fetcher: &dyn PageFetcher,
        hit: SearchResult,
        relevance_score: u32,
    ) -> CandidateEvent {
        match fetcher.fetch(&hit.url, self.fetch_timeout).await {
            Ok(html) => {
                let page_text = html_to_text(&html);
                self.from_page(hit, &page_text, relevance_score)
            }
            Err(err) => {
                tracing::warn!(
                    url = %hit.url,
                    error = %err,
                    "discovery.fetch.degraded"
                );
                self.degraded(hit, relevance_score)
            }
        }
    }

    /// Full record from the page's visible text.
    pub fn from_page(&self, hit: SearchResult, page_text: &str, relevance_score: u32) -> CandidateEvent {
        let location = self.extract_location(&hit.content, page_text);
        let stall_info = stall_info(page_text, &hit.content).to_string();
        CandidateEvent {
            event_name: hit.title,
            description: truncate_description(&hit.content, self.description_budget),
            location,
            contact_phone: self.extract_phone(page_text),
            contact_email: self.extract_email(page_text),
            stall_info,
            event_date: self.extract_date(page_text),
            source_url: hit.url,
            relevance_score,
        }
    }

    /// Snippet-only record used when the page could not be fetched.
    pub fn degraded(&self, hit: SearchResult, relevance_score: u32) -> CandidateEvent {
        CandidateEvent {
            event_name: hit.title,
            description: truncate_description(&hit.content, self.description_budget),
            location: self.extract_location(&hit.content, ""),
            contact_phone: None,
            contact_email: None,
            stall_info: FALLBACK_STALL_INFO.to_string(),
            event_date: UNKNOWN_DATE.to_string(),
            source_url: hit.url,
            relevance_score,
        }
    }

    pub fn extract_phone(&self, text: &str) -> Option<String> {
        self.phone.find(text).map(|m| m.as_str().to_string())
    }

    pub fn extract_email(&self, text: &str) -> Option<String> {
        self.email.find(text).map(|m| m.as_str().to_string())
    }

    pub fn extract_date(&self, text: &str) -> String {
        self.dates
            .iter()
            .find_map(|re| re.find(text))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| UNKNOWN_DATE.to_string())
    }

    pub fn extract_location(&self, content: &str, page_text: &str) -> String {
        let text = format!("{content} {page_text}");
        self.locations
            .iter()
            .find_map(|re| re.find(&text))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ScoutError::Config(format!("bad pattern: {e}")))
}

/// First matching stall-info rule over `page_text + content`.
pub fn stall_info(page_text: &str, content: &str) -> &'static str {
    let text = format!("{page_text} {content}").to_lowercase();
    STALL_RULES
        .iter()
        .find(|(needles, _)| needles.iter().all(|n| text.contains(n)))
        .map(|(_, info)| *info)
        .or_else(|| {
            FEE_MARKERS
                .iter()
                .any(|m| text.contains(m))
                .then_some(FEE_STALL_INFO)
        })
        .unwrap_or(DEFAULT_STALL_INFO)
}

/// `content` cut to `budget` characters, with `...` appended only when cut.
pub fn truncate_description(content: &str, budget: usize) -> String {
    match content.char_indices().nth(budget) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

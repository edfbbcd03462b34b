//! Relevance scoring of raw search hits against a vendor profile.

use scout_common::{SearchResult, VendorProfile};
use scout_config::{DiscoveryConfig, ScoreWeights};
use std::collections::HashSet;
use std::fmt;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    MissingUrl,
    MissingTitle,
    InvalidUrl,
    BlockedDomain(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingUrl => f.write_str("missing url"),
            RejectReason::MissingTitle => f.write_str("missing title"),
            RejectReason::InvalidUrl => f.write_str("not an absolute http(s) url"),
            RejectReason::BlockedDomain(d) => write!(f, "blocked domain {d}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Rejected(RejectReason),
    Scored(u32),
}

/// Keyword lists, weights and threshold for [`Scorer`].
#[derive(Debug, Clone)]
pub struct ScoringRules {
    pub vendor_keywords: Vec<String>,
    pub event_keywords: Vec<String>,
    pub blocked_domains: Vec<String>,
    pub weights: ScoreWeights,
    pub threshold: u32,
}

impl ScoringRules {
    pub fn from_config(cfg: &DiscoveryConfig) -> Self {
        let lower = |xs: &[String]| {
            xs.iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        };
        Self {
            vendor_keywords: lower(&cfg.vendor_keywords),
            event_keywords: lower(&cfg.event_keywords),
            blocked_domains: lower(&cfg.blocked_domains),
            weights: cfg.weights,
            threshold: cfg.threshold,
        }
    }
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self::from_config(&DiscoveryConfig::default())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scorer {
    rules: ScoringRules,
}

impl Scorer {
    pub fn new(rules: ScoringRules) -> Self {
        Self { rules }
    }

    pub fn threshold(&self) -> u32 {
        self.rules.threshold
    }

    /// Score `result` for `vendor`. `year` anchors the recency bonus.
    pub fn score(&self, result: &SearchResult, vendor: &VendorProfile, year: i32) -> Verdict {
        if result.url.trim().is_empty() {
            return Verdict::Rejected(RejectReason::MissingUrl);
        }
        if result.title.trim().is_empty() {
            return Verdict::Rejected(RejectReason::MissingTitle);
        }
        let host = match Url::parse(result.url.trim()) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => match u.host_str() {
                Some(h) => h.to_ascii_lowercase(),
                None => return Verdict::Rejected(RejectReason::InvalidUrl),
            },
            _ => return Verdict::Rejected(RejectReason::InvalidUrl),
        };
        if let Some(blocked) = self
            .rules
            .blocked_domains
            .iter()
            .find(|d| host == **d || host.ends_with(&format!(".{d}")))
        {
            return Verdict::Rejected(RejectReason::BlockedDomain(blocked.clone()));
        }

        let text = format!("{} {}", result.title, result.content).to_lowercase();
        Verdict::Scored(self.score_text(&text, vendor, year))
    }

    /// Accepted score, or `None` when rejected or under the threshold.
    pub fn accept(&self, verdict: &Verdict) -> Option<u32> {
        match verdict {
            Verdict::Scored(n) if *n >= self.rules.threshold => Some(*n),
            _ => None,
        }
    }

    fn score_text(&self, text: &str, vendor: &VendorProfile, year: i32) -> u32 {
        let w = &self.rules.weights;
        let mut score = 0;

        score += w.vendor_keyword * count_present(&self.rules.vendor_keywords, text);
        score += w.event_keyword * count_present(&self.rules.event_keywords, text);

        let location = vendor.location_lower();
        if !location.is_empty() && text.contains(&location) {
            score += w.exact_location;
        } else if vendor
            .location_segments()
            .iter()
            .any(|seg| text.contains(seg.as_str()))
        {
            score += w.partial_location;
        }

        let business = vendor.business_lower();
        let mut seen = HashSet::new();
        let business_hits = business
            .split_whitespace()
            .filter(|word| word.chars().count() > 3)
            .filter(|word| seen.insert(*word))
            .filter(|word| text.contains(*word))
            .count() as u32;
        score += w.business_word * business_hits;

        if year_tokens(text).any(|y| (year..=year + 2).contains(&y)) {
            score += w.recency;
        }

        score
    }
}

/// Standalone four-digit numbers in `text`.
fn year_tokens(text: &str) -> impl Iterator<Item = i32> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|tok| tok.len() == 4 && tok.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|tok| tok.parse().ok())
}

fn count_present(keywords: &[String], text: &str) -> u32 {
    keywords.iter().filter(|k| text.contains(k.as_str())).count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mumbai_vendor() -> VendorProfile {
        VendorProfile::new("v1", "Mumbai, Maharashtra", "vada pav street food")
    }

    #[test]
    fn ganeshotsav_hit_is_accepted() {
        let scorer = Scorer::default();
        let hit = SearchResult::new(
            "https://allevents.in/mumbai/ganeshotsav-food-festival",
            "Ganeshotsav Food Festival Mumbai 2025",
            "Vendor stall registration open for food vendors",
        );
        // vendor, stall, food vendor, registration: 4 * 6
        // festival, fest: 2 * 4
        // "mumbai" segment: 8
        // "food" is the only business word present: 3
        // 2025: 5
        let verdict = scorer.score(&hit, &mumbai_vendor(), 2025);
        assert_eq!(verdict, Verdict::Scored(24 + 8 + 8 + 3 + 5));
        assert!(scorer.accept(&verdict).is_some());

        let stall_vendor = VendorProfile::new("v2", "Mumbai, Maharashtra", "vada pav street food stall");
        let hit = SearchResult::new(
            "https://allevents.in/mumbai/ganeshotsav-street-food",
            "Ganeshotsav Street Food Festival — Vendor Registration Open",
            "Mumbai, 2025. Vendor registration open for street food stalls.",
        );
        // vendor, stall, registration: 3 * 6
        // festival, fest: 2 * 4
        // "mumbai" segment: 8
        // street, food, stall: 3 * 3
        // 2025: 5
        let verdict = scorer.score(&hit, &stall_vendor, 2025);
        assert_eq!(verdict, Verdict::Scored(18 + 8 + 8 + 9 + 5));
        assert!(scorer.accept(&verdict).is_some());
    }

    #[test]
    fn repeated_business_word_counts_once() {
        let scorer = Scorer::default();
        let hit = SearchResult::new("https://meetup.com/pune", "Juice juice juice", "");
        let once = VendorProfile::new("v", "Nagpur", "juice");
        let twice = VendorProfile::new("v", "Nagpur", "juice juice");
        assert_eq!(scorer.score(&hit, &once, 2025), Verdict::Scored(3));
        assert_eq!(scorer.score(&hit, &twice, 2025), Verdict::Scored(3));
    }

    #[test]
    fn unrelated_conference_is_rejected() {
        let scorer = Scorer::default();
        let hit = SearchResult::new(
            "https://10times.com/it-summit",
            "IT Conference Bangalore",
            "Enterprise software talks and networking.",
        );
        let verdict = scorer.score(&hit, &mumbai_vendor(), 2025);
        assert_eq!(verdict, Verdict::Scored(0));
        assert_eq!(scorer.accept(&verdict), None);
    }

    #[test]
    fn blocked_domains_and_subdomains() {
        let scorer = Scorer::default();
        let vendor = mumbai_vendor();
        for url in [
            "https://facebook.com/events/1",
            "https://m.facebook.com/events/1",
            "https://www.instagram.com/p/abc",
            "https://x.com/mela",
        ] {
            let hit = SearchResult::new(url, "Mumbai food festival", "vendor stalls");
            assert!(
                matches!(
                    scorer.score(&hit, &vendor, 2025),
                    Verdict::Rejected(RejectReason::BlockedDomain(_))
                ),
                "{url}"
            );
        }
        // a host merely containing a blocked name is fine
        let hit = SearchResult::new("https://notfacebook.com.in/e", "Mumbai food fest", "");
        assert!(matches!(scorer.score(&hit, &vendor, 2025), Verdict::Scored(_)));
    }

    #[test]
    fn malformed_hits_are_rejected() {
        let scorer = Scorer::default();
        let vendor = mumbai_vendor();
        let cases = [
            (SearchResult::new("", "t", "c"), RejectReason::MissingUrl),
            (SearchResult::new("https://a.in", "  ", "c"), RejectReason::MissingTitle),
            (SearchResult::new("/relative", "t", "c"), RejectReason::InvalidUrl),
            (SearchResult::new("ftp://a.in/x", "t", "c"), RejectReason::InvalidUrl),
        ];
        for (hit, reason) in cases {
            assert_eq!(scorer.score(&hit, &vendor, 2025), Verdict::Rejected(reason));
        }
    }

    #[test]
    fn exact_location_beats_partial() {
        let scorer = Scorer::default();
        let vendor = mumbai_vendor();
        let exact = SearchResult::new("https://a.in", "Held in Mumbai, Maharashtra", "");
        let partial = SearchResult::new("https://a.in", "Held in Mumbai", "");
        assert_eq!(scorer.score(&exact, &vendor, 2025), Verdict::Scored(15));
        assert_eq!(scorer.score(&partial, &vendor, 2025), Verdict::Scored(8));
    }

    #[test]
    fn recency_window_and_token_boundaries() {
        let scorer = Scorer::default();
        let vendor = VendorProfile::new("v", "Nagpur", "tea");
        let score = |title: &str| scorer.score(&SearchResult::new("https://a.in", title, ""), &vendor, 2025);
        assert_eq!(score("Edition 2027"), Verdict::Scored(5));
        assert_eq!(score("Edition 2028"), Verdict::Scored(0));
        assert_eq!(score("Edition 2024"), Verdict::Scored(0));
        assert_eq!(score("Ref 120255"), Verdict::Scored(0));
    }

    #[test]
    fn business_words_are_counted_once() {
        let scorer = Scorer::default();
        let vendor = VendorProfile::new("v", "Nagpur", "fresh juice fresh juice bar");
        let hit = SearchResult::new("https://a.in", "Fresh juice stand", "");
        // "fresh", "juice"; "bar" is too short
        assert_eq!(scorer.score(&hit, &vendor, 2025), Verdict::Scored(6));
    }

    #[test]
    fn scoring_is_deterministic() {
        let scorer = Scorer::default();
        let vendor = mumbai_vendor();
        let hit = SearchResult::new(
            "https://meetup.com/e/1",
            "Street food market Mumbai",
            "booth application 2026",
        );
        let first = scorer.score(&hit, &vendor, 2025);
        for _ in 0..10 {
            assert_eq!(scorer.score(&hit, &vendor, 2025), first);
        }
    }
}

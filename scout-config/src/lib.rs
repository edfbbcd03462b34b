//! Loader for workspace configuration with YAML + environment overlays.
//!
//! Sources are merged in this order, later ones winning:
//!
//! 1. struct defaults (every section is optional),
//! 2. YAML files and inline YAML snippets, in the order they were added,
//! 3. `SCOUT__`-prefixed environment variables, `__` separating path
//!    segments (`SCOUT__DISCOVERY__THRESHOLD=10`).
//!
//! After merging, every string is run through `${VAR}` expansion (recursive,
//! depth-capped) so secrets can stay out of the file:
//!
//! ```yaml
//! search:
//!   api_key: "${TAVILY_API_KEY}"
//! ```
//!
//! An unresolved placeholder is left verbatim; [`ScoutConfig::validate`]
//! rejects it.
use config::{Config, ConfigError, Environment, File};
use scout_common::observability::LogFormat;
use scout_common::{Result as ScoutResult, ScoutError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "SCOUT";

/// Slowest pacing accepted for search calls (one query every ~17 minutes).
pub const MIN_QUERY_QPS: f64 = 0.001;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScoutConfig {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProviderKind {
    #[default]
    Tavily,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    pub provider: SearchProviderKind,
    pub api_key: String,
    pub endpoint: String,
    /// `basic` or `advanced`.
    pub search_depth: String,
    pub results_per_query: u32,
    pub include_domains: Vec<String>,
}

impl SearchConfig {
    /// The API key is set and has no unexpanded `${VAR}` left in it.
    pub fn check_credentials(&self) -> ScoutResult<()> {
        scout_common::check_api_key("search.api_key", &self.api_key)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: SearchProviderKind::Tavily,
            api_key: String::new(),
            endpoint: "https://api.tavily.com".into(),
            search_depth: "advanced".into(),
            results_per_query: 5,
            include_domains: strings(&[
                "eventbrite.com",
                "meetup.com",
                "timeout.com",
                "allevents.in",
                "10times.com",
                "eventful.com",
                "localevents.com",
                "citygov.com",
            ]),
        }
    }
}

/// How the final event list is ordered before truncation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOrdering {
    /// Order in which queries and their results were produced.
    #[default]
    Discovery,
    /// Stable sort by descending relevance score.
    Score,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub vendor_keyword: u32,
    pub event_keyword: u32,
    pub exact_location: u32,
    pub partial_location: u32,
    pub business_word: u32,
    pub recency: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            vendor_keyword: 6,
            event_keyword: 4,
            exact_location: 15,
            partial_location: 8,
            business_word: 3,
            recency: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub threshold: u32,
    pub fetch_timeout_secs: u64,
    pub fetch_concurrency: usize,
    pub description_budget: usize,
    pub name_length_bound: usize,
    pub query_qps: f64,
    pub query_burst: u32,
    pub ordering: EventOrdering,
    pub user_agent: String,
    pub blocked_domains: Vec<String>,
    pub vendor_keywords: Vec<String>,
    pub event_keywords: Vec<String>,
    pub gazetteer: Vec<String>,
    pub weights: ScoreWeights,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            threshold: 8,
            fetch_timeout_secs: 8,
            fetch_concurrency: 5,
            description_budget: 250,
            name_length_bound: 8,
            query_qps: 2.0,
            query_burst: 1,
            ordering: EventOrdering::Discovery,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
            blocked_domains: strings(&["facebook.com", "instagram.com", "twitter.com", "x.com"]),
            vendor_keywords: strings(&[
                "vendor",
                "stall",
                "booth",
                "food vendor",
                "registration",
                "application",
            ]),
            event_keywords: strings(&["festival", "fair", "celebration", "fest", "market", "event"]),
            gazetteer: strings(&[
                "Mumbai",
                "Delhi",
                "Bangalore",
                "Chennai",
                "Kolkata",
                "Pune",
                "Hyderabad",
                "Ahmedabad",
                "Jaipur",
                "Lucknow",
            ]),
            weights: ScoreWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://vendor-scout.db".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
    /// `text` or `json`.
    pub format: String,
    pub stderr: bool,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            format: "text".into(),
            stderr: true,
            dir: None,
        }
    }
}

impl LoggingConfig {
    pub fn log_format(&self) -> ScoutResult<LogFormat> {
        self.format
            .parse()
            .map_err(|e: String| ScoutError::Config(format!("logging.format: {e}")))
    }
}

impl ScoutConfig {
    /// Reject configurations that cannot drive a discovery run.
    ///
    /// ```
    /// use scout_config::ScoutConfigLoader;
    ///
    /// let cfg = ScoutConfigLoader::new()
    ///     .with_yaml_str("search:\n  api_key: \"${SCOUT_DOCTEST_UNSET_KEY}\"")
    ///     .load()
    ///     .unwrap();
    /// assert!(cfg.validate().is_err());
    /// ```
    pub fn validate(&self) -> ScoutResult<()> {
        self.search.check_credentials()?;
        if self.search.endpoint.trim().is_empty() {
            return Err(ScoutError::Config("search.endpoint is empty".into()));
        }
        if !matches!(self.search.search_depth.as_str(), "basic" | "advanced") {
            return Err(ScoutError::Config(format!(
                "search.search_depth must be basic or advanced, got {:?}",
                self.search.search_depth
            )));
        }

        let d = &self.discovery;
        for (name, value) in [
            ("search.results_per_query", self.search.results_per_query as u64),
            ("discovery.fetch_timeout_secs", d.fetch_timeout_secs),
            ("discovery.fetch_concurrency", d.fetch_concurrency as u64),
            ("discovery.description_budget", d.description_budget as u64),
            ("discovery.query_burst", d.query_burst as u64),
        ] {
            if value == 0 {
                return Err(ScoutError::Config(format!("{name} must be greater than zero")));
            }
        }
        if d.query_qps.is_nan() {
            return Err(ScoutError::Config("discovery.query_qps is not a number".into()));
        }
        if d.query_qps > 0.0 && d.query_qps < MIN_QUERY_QPS {
            return Err(ScoutError::Config(format!(
                "discovery.query_qps must be 0 (unpaced) or at least {MIN_QUERY_QPS}, got {}",
                d.query_qps
            )));
        }

        if self.store.database_url.trim().is_empty() {
            return Err(ScoutError::Config("store.database_url is empty".into()));
        }
        self.logging.log_format()?;
        Ok(())
    }

    /// Render the effective configuration, with the API key masked.
    pub fn to_redacted_yaml(&self) -> ScoutResult<String> {
        let mut copy = self.clone();
        if !copy.search.api_key.is_empty() {
            copy.search.api_key = "<redacted>".into();
        }
        serde_yaml::to_string(&copy).map_err(|e| ScoutError::Config(e.to_string()))
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct ScoutConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for ScoutConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoutConfigLoader {
    /// Start from defaults; `SCOUT__` env overrides are applied at load time.
    ///
    /// ```
    /// use scout_config::{EventOrdering, ScoutConfigLoader};
    ///
    /// let config = ScoutConfigLoader::new()
    ///     .with_yaml_str("version: '1'\ndiscovery:\n  threshold: 3\n  ordering: score")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.discovery.threshold, 3);
    /// assert_eq!(config.discovery.ordering, EventOrdering::Score);
    /// assert_eq!(config.discovery.fetch_concurrency, 5);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; the `config` crate
    /// infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`Self::with_file`], but a missing file is skipped so headless
    /// deployments can rely purely on environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly
    /// typed config.
    pub fn load(self) -> Result<ScoutConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> ScoutConfig {
        let mut cfg = ScoutConfig::default();
        cfg.search.api_key = "tvly-test".into();
        cfg
    }

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("SCOUT_TEST_FOO", Some("bar"), || {
            let mut v = json!("prefix-${SCOUT_TEST_FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars(
            [("SCOUT_TEST_CITY", Some("Pune")), ("SCOUT_TEST_STATE", Some("MH"))],
            || {
                let mut v = json!([
                    "hello-$SCOUT_TEST_CITY",
                    { "loc": "${SCOUT_TEST_CITY}-${SCOUT_TEST_STATE}" },
                    42,
                    true,
                    null
                ]);
                expand_env_in_value(&mut v);
                assert_eq!(
                    v,
                    json!(["hello-Pune", { "loc": "Pune-MH" }, 42, true, null])
                );
            },
        );
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("SCOUT_TEST_BAZ", Some("qux")),
                ("SCOUT_TEST_BAR", Some("mid-${SCOUT_TEST_BAZ}")),
                ("SCOUT_TEST_TOP", Some("start-${SCOUT_TEST_BAR}-end")),
            ],
            || {
                let mut v = json!("X=${SCOUT_TEST_TOP}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars(
            [("SCOUT_TEST_A", Some("${SCOUT_TEST_B}")), ("SCOUT_TEST_B", Some("${SCOUT_TEST_A}"))],
            || {
                let mut v = json!("x=${SCOUT_TEST_A}-y");
                expand_env_in_value(&mut v);
                let s = v.as_str().unwrap();
                assert!(s.starts_with("x=") && s.ends_with("-y"));
                assert!(s.contains("${"));
            },
        );
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${SCOUT_TEST_DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${SCOUT_TEST_DOES_NOT_EXIST}"));
    }

    #[test]
    fn defaults_match_reference_deployment() {
        let cfg = ScoutConfig::default();
        assert_eq!(cfg.discovery.threshold, 8);
        assert_eq!(cfg.discovery.weights.exact_location, 15);
        assert_eq!(cfg.discovery.gazetteer.len(), 10);
        assert_eq!(cfg.search.include_domains.len(), 8);
        assert_eq!(cfg.search.results_per_query, 5);
        assert_eq!(cfg.discovery.ordering, EventOrdering::Discovery);
    }

    #[test]
    fn validate_accepts_defaults_with_key() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_or_placeholder_key() {
        let mut cfg = valid();
        cfg.search.api_key = "  ".into();
        assert!(matches!(cfg.validate(), Err(ScoutError::Config(_))));

        cfg.search.api_key = "${TAVILY_API_KEY}".into();
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("unresolved placeholder"), "{err}");
    }

    #[test]
    fn validate_rejects_vanishing_qps() {
        let mut cfg = valid();
        cfg.discovery.query_qps = 1e-20;
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("discovery.query_qps"), "{err}");

        cfg.discovery.query_qps = 0.0;
        assert!(cfg.validate().is_ok());
        cfg.discovery.query_qps = MIN_QUERY_QPS;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_knobs() {
        let mut cfg = valid();
        cfg.discovery.fetch_concurrency = 0;
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("discovery.fetch_concurrency"), "{err}");

        let mut cfg = valid();
        cfg.discovery.description_budget = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = valid();
        cfg.search.search_depth = "deep".into();
        assert!(cfg.validate().is_err());

        let mut cfg = valid();
        cfg.logging.format = "xml".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn redacted_yaml_hides_key() {
        let yaml = valid().to_redacted_yaml().unwrap();
        assert!(yaml.contains("<redacted>"));
        assert!(!yaml.contains("tvly-test"));
    }
}

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use scout_common::observability::{LogConfig, LogFormat};
use scout_common::{CandidateEvent, Result, SearchResult, StoredEvent};
use scout_config::{DiscoveryConfig, SearchConfig};
use scout_discovery::EventStore;
use scout_web::{SearchProvider, SearchRequest};

static INIT_PATH: OnceLock<Option<PathBuf>> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "scout-tests",
            file: false,
            emit_stderr: true,
            format: if std::env::var("SCOUT_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug".into(),
            ..LogConfig::default()
        };

        scout_common::observability::init_logging(config).unwrap_or_default()
    });
}

/// Discovery settings with pacing disabled so tests run at full speed.
pub fn fast_config() -> (SearchConfig, DiscoveryConfig) {
    let search = SearchConfig {
        api_key: "tvly-test".into(),
        ..SearchConfig::default()
    };
    let discovery = DiscoveryConfig {
        query_qps: 0.0,
        fetch_timeout_secs: 1,
        ..DiscoveryConfig::default()
    };
    (search, discovery)
}

type Responder = Box<dyn Fn(usize, &str) -> Result<Vec<SearchResult>> + Send + Sync>;

/// Search provider answering from a closure of `(call index, query)`.
pub struct ScriptedProvider {
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
    delay: Option<Duration>,
    respond: Responder,
}

impl ScriptedProvider {
    pub fn new(
        respond: impl Fn(usize, &str) -> Result<Vec<SearchResult>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
            delay: None,
            respond: Box::new(respond),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(request.query.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.respond)(idx, &request.query)
    }
}

/// Vec-backed [`EventStore`] with the same per-vendor URL uniqueness as SQLite.
#[derive(Default)]
pub struct MemoryEventStore {
    rows: Mutex<Vec<StoredEvent>>,
}

impl MemoryEventStore {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert_if_absent(&self, vendor_id: &str, event: &CandidateEvent) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|r| r.vendor_id == vendor_id && r.event.source_url == event.source_url)
        {
            return Ok(false);
        }
        let id = rows.len() as i64 + 1;
        rows.push(StoredEvent {
            id,
            vendor_id: vendor_id.to_string(),
            event: event.clone(),
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn events_for_vendor(&self, vendor_id: &str) -> Result<Vec<StoredEvent>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.vendor_id == vendor_id)
            .cloned()
            .collect())
    }

    async fn events_matching_location(
        &self,
        vendor_id: &str,
        needle: &str,
    ) -> Result<Vec<StoredEvent>> {
        let needle = needle.to_lowercase();
        Ok(self
            .events_for_vendor(vendor_id)
            .await?
            .into_iter()
            .filter(|r| r.event.location.to_lowercase().contains(&needle))
            .collect())
    }
}

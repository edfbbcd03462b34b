use anyhow::{Context, Result};
use scout_config::{ScoutConfig, SearchConfig, SearchProviderKind};
use scout_discovery::{EventDiscovery, VendorEventService};
use scout_store::SqliteEventStore;
use scout_web::{HttpPageFetcher, PageFetcher, SearchProvider, TavilyApi};
use std::sync::Arc;

/// Cache-first discovery over the configured store, built once from config.
pub struct Tether {
    pub service: VendorEventService,
}

pub async fn open_store(cfg: &ScoutConfig) -> Result<Arc<SqliteEventStore>> {
    let store = SqliteEventStore::connect(&cfg.store.database_url)
        .await
        .with_context(|| format!("opening event store at {}", cfg.store.database_url))?;
    Ok(Arc::new(store))
}

/// Search pipeline only; touches no database.
pub fn build_discovery(cfg: &ScoutConfig) -> Result<Arc<EventDiscovery>> {
    cfg.validate()?;

    let provider = build_provider(&cfg.search)?;
    let fetcher: Arc<dyn PageFetcher> =
        Arc::new(HttpPageFetcher::new(&cfg.discovery.user_agent)?);
    Ok(Arc::new(EventDiscovery::new(
        provider,
        fetcher,
        &cfg.search,
        &cfg.discovery,
    )?))
}

pub async fn build_from_config(cfg: &ScoutConfig) -> Result<Tether> {
    let discovery = build_discovery(cfg)?;
    let store = open_store(cfg).await?;
    let service = VendorEventService::new(discovery, store);

    tracing::info!(
        provider = ?cfg.search.provider,
        database_url = %cfg.store.database_url,
        threshold = cfg.discovery.threshold,
        "app.wired"
    );
    Ok(Tether { service })
}

fn build_provider(search: &SearchConfig) -> Result<Arc<dyn SearchProvider>> {
    match search.provider {
        SearchProviderKind::Tavily => {
            let client = TavilyApi::new(&search.endpoint, search.api_key.clone())?;
            Ok(Arc::new(client))
        }
    }
}

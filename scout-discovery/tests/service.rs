mod common;

use common::{fast_config, MemoryEventStore, ScriptedProvider};
use scout_common::{CandidateEvent, SearchResult, VendorProfile};
use scout_discovery::{stored_events, EventDiscovery, EventSource, EventStore, VendorEventService};
use scout_web::HttpPageFetcher;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn vendor() -> VendorProfile {
    VendorProfile::new("vendor-7", "Pune", "fresh juice stall")
}

async fn setup() -> (MockServer, Arc<ScriptedProvider>, Arc<MemoryEventStore>, VendorEventService) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    "<p>Koregaon Park, Pune. Juice vendors registration open.</p>",
                    "text/html",
                ),
        )
        .mount(&server)
        .await;

    let uri = server.uri();
    let provider = Arc::new(ScriptedProvider::new(move |idx, _| {
        Ok(match idx {
            0 => vec![SearchResult::new(
                format!("{uri}/summer-fest"),
                "Pune Summer Festival 2025",
                "Juice and beverage vendor stalls, registration open in Pune.",
            )],
            1 => vec![SearchResult::new(
                format!("{uri}/campus-fest"),
                "College Fest Pune Food Stall Booking",
                "Fresh juice stall booking for vendors at the campus fest, Pune 2025.",
            )],
            _ => vec![],
        })
    }));

    let (search, disc) = fast_config();
    let fetcher = Arc::new(HttpPageFetcher::new("scout-test").unwrap());
    let discovery = EventDiscovery::new(provider.clone(), fetcher, &search, &disc)
        .unwrap()
        .with_reference_year(2025);
    let store = Arc::new(MemoryEventStore::default());
    let service = VendorEventService::new(Arc::new(discovery), store.clone());
    (server, provider, store, service)
}

#[tokio::test]
async fn first_lookup_discovers_then_cache_serves() {
    common::init_test_tracing();
    let (_server, provider, store, service) = setup().await;
    let cancel = CancellationToken::new();

    let first = service.find_events(&vendor(), 50, 10, &cancel).await.unwrap();
    assert_eq!(first.source, EventSource::Discovery);
    assert_eq!(first.events.len(), 2);
    assert_eq!(first.inserted, 2);
    assert_eq!(store.len(), 2);
    let calls_after_first = provider.calls();

    let second = service.find_events(&vendor(), 50, 10, &cancel).await.unwrap();
    assert_eq!(second.source, EventSource::Cache);
    assert_eq!(second.events.len(), 2);
    assert_eq!(second.inserted, 0);
    assert_eq!(provider.calls(), calls_after_first);
}

#[tokio::test]
async fn cache_hits_are_capped() {
    common::init_test_tracing();
    let (_server, _provider, _store, service) = setup().await;
    let cancel = CancellationToken::new();

    service.find_events(&vendor(), 50, 10, &cancel).await.unwrap();
    let capped = service.find_events(&vendor(), 50, 1, &cancel).await.unwrap();
    assert_eq!(capped.source, EventSource::Cache);
    assert_eq!(capped.events.len(), 1);
}

#[tokio::test]
async fn refresh_does_not_duplicate_stored_urls() {
    common::init_test_tracing();
    let (_server, _provider, store, service) = setup().await;
    let cancel = CancellationToken::new();

    let first = service.refresh(&vendor(), 50, 10, &cancel).await.unwrap();
    assert_eq!(first.inserted, 2);

    let again = service.refresh(&vendor(), 50, 10, &cancel).await.unwrap();
    assert_eq!(again.source, EventSource::Discovery);
    assert_eq!(again.events.len(), 2);
    assert_eq!(again.inserted, 0);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn unrelated_cached_rows_fall_through_to_discovery() {
    common::init_test_tracing();
    let (_server, _provider, store, service) = setup().await;

    let stale = CandidateEvent {
        event_name: "Chennai Music Season".into(),
        description: "Carnatic concerts".into(),
        location: "Chennai".into(),
        contact_phone: None,
        contact_email: None,
        stall_info: "Contact event organizer for vendor opportunities".into(),
        event_date: "December 15, 2025".into(),
        source_url: "https://allevents.in/chennai/music-season".into(),
        relevance_score: 0,
    };
    assert!(store.insert_if_absent("vendor-7", &stale).await.unwrap());

    let found = service
        .find_events(&vendor(), 50, 10, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(found.source, EventSource::Discovery);
    assert_eq!(store.len(), 3);

    let pune_only = stored_events(store.as_ref(), "vendor-7", Some("pune")).await.unwrap();
    assert_eq!(pune_only.len(), 2);
    let everything = stored_events(store.as_ref(), "vendor-7", Some("  ")).await.unwrap();
    assert_eq!(everything.len(), 3);
    assert_eq!(stored_events(store.as_ref(), "vendor-7", None).await.unwrap().len(), 3);
}

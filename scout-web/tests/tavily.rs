mod common;

use scout_common::ScoutError;
use scout_web::{SearchDepth, SearchProvider, SearchRequest, TavilyApi};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> SearchRequest {
    SearchRequest {
        query: "street food events mumbai, maharashtra vendor registration".into(),
        result_count: 5,
        include_domains: vec!["eventbrite.com".into(), "allevents.in".into()],
        search_depth: SearchDepth::Advanced,
    }
}

#[tokio::test]
async fn maps_request_and_hits() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("authorization", "Bearer tvly-test"))
        .and(body_json(json!({
            "query": "street food events mumbai, maharashtra vendor registration",
            "search_depth": "advanced",
            "max_results": 5,
            "include_domains": ["eventbrite.com", "allevents.in"],
            "include_answer": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": "street food events mumbai",
            "response_time": 1.2,
            "results": [
                {
                    "title": "Ganeshotsav Food Festival Mumbai 2025",
                    "url": "https://allevents.in/mumbai/ganeshotsav-food-festival",
                    "content": "Vendor stall registration open for food vendors.",
                    "score": 0.91,
                    "published_date": null
                },
                {
                    "url": "https://eventbrite.com/e/untitled",
                    "content": "no title on this one"
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = TavilyApi::new(&server.uri(), "tvly-test").unwrap();
    let hits = api.search(&request()).await.unwrap();

    assert_eq!(api.name(), "tavily");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].title, "Ganeshotsav Food Festival Mumbai 2025");
    assert_eq!(hits[0].provider_score, Some(0.91));
    assert_eq!(hits[1].title, "");
    assert_eq!(hits[1].provider_score, None);
}

#[tokio::test]
async fn provider_errors_name_the_query() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "detail": {"error": "Query is too long."}
        })))
        .mount(&server)
        .await;

    let api = TavilyApi::new(&server.uri(), "tvly-test").unwrap();
    match api.search(&request()).await {
        Err(ScoutError::Provider { query, message }) => {
            assert_eq!(query, request().query);
            assert!(message.contains("Query is too long."), "{message}");
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_domain_list_is_omitted() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_json(json!({
            "query": "local markets pune food stalls near me",
            "search_depth": "basic",
            "max_results": 3,
            "include_answer": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let api = TavilyApi::new(&server.uri(), "tvly-test").unwrap();
    let mut req = SearchRequest::new("local markets pune food stalls near me", 3);
    req.search_depth = SearchDepth::Basic;
    assert!(api.search(&req).await.unwrap().is_empty());
}

#[tokio::test]
async fn null_fields_do_not_fail_the_page() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"url": "https://allevents.in/pune/food-carnival", "title": "Pune Food Carnival", "content": null},
                {"url": "https://meetup.com/pune-juice", "title": "Juice Makers Meetup", "content": "Stalls open"}
            ]
        })))
        .mount(&server)
        .await;

    let api = TavilyApi::new(&server.uri(), "tvly-test").unwrap();
    let hits = api.search(&request()).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].content, "");
    assert_eq!(hits[1].content, "Stalls open");
}

#[test]
fn missing_or_placeholder_key_is_a_config_error() {
    for key in ["", "  ", "${TAVILY_API_KEY}"] {
        match TavilyApi::new("https://api.tavily.com", key) {
            Err(ScoutError::Config(msg)) => assert!(msg.contains("search.api_key"), "{msg}"),
            Err(other) => panic!("expected config error for {key:?}, got {other:?}"),
            Ok(_) => panic!("key {key:?} was accepted"),
        }
    }
}

//! Built-in backends driven through the facade against a local mock server

use seekify::backends::bing::Bing;
use seekify::backends::wikipedia::Wikipedia;
use seekify::backends::BackendFactory;
use seekify::{Registry, Search, SearchError, SearchRequest, Settings};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn wikipedia_session(server: &MockServer) -> Search {
    let api_url = format!("{}/w/api.php", server.uri());
    let registry = Registry::new().with(
        "wikipedia",
        BackendFactory::new(Wikipedia::DESCRIPTOR, move |config| {
            Ok(Wikipedia::new(config)?.with_api_url(api_url.clone()))
        }),
    );
    Search::with_registry(&Settings::default(), registry)
}

fn bing_session(server: &MockServer) -> Search {
    let base_url = format!("{}/search", server.uri());
    let registry = Registry::new().with(
        "bing",
        BackendFactory::new(Bing::DESCRIPTOR, move |config| {
            Ok(Bing::new(config)?.with_base_url(base_url.clone()))
        }),
    );
    Search::with_registry(&Settings::default(), registry)
}

#[tokio::test]
async fn wikipedia_results_through_facade() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("gsrsearch", "tokio"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": {"pages": {
                "10": {"index": 2, "title": "Tokyo", "fullurl": "https://en.wikipedia.org/wiki/Tokyo", "extract": "Capital of Japan."},
                "11": {"index": 1, "title": "Tokio (software)", "fullurl": "https://en.wikipedia.org/wiki/Tokio_(software)", "extract": "An asynchronous runtime for Rust."}
            }}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let search = wikipedia_session(&server);
    let results = assert_ok!(search.text(SearchRequest::new("tokio")).await);

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].get_str("title"), Some("Tokio (software)"));
    assert_eq!(
        results[0].get_str("href"),
        Some("https://en.wikipedia.org/wiki/Tokio_(software)")
    );
}

#[tokio::test]
async fn bing_html_results_through_facade() {
    let server = MockServer::start().await;
    let page = r#"<html><body><ol id="b_results">
        <li class="b_algo"><h2><a href="https://serde.rs/">Serde</a></h2><p>Serialization for Rust.</p></li>
        <li class="b_algo"><h2><a href="https://docs.rs/serde_json">serde_json</a></h2><p>JSON support.</p></li>
    </ol></body></html>"#;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "serde"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;

    let search = bing_session(&server);
    let results = assert_ok!(search.text(SearchRequest::new("serde").with_max_results(1)).await);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].get_str("href"), Some("https://serde.rs/"));
}

#[tokio::test]
async fn rate_limited_backend_surfaces_ratelimit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let search = bing_session(&server);
    let err = assert_err!(search.text(SearchRequest::new("serde")).await);
    assert!(matches!(err, SearchError::Ratelimit(_)), "{err:?}");
}

#[tokio::test]
async fn server_error_surfaces_search_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let search = wikipedia_session(&server);
    let err = assert_err!(search.text(SearchRequest::new("tokio")).await);
    assert!(matches!(err, SearchError::Search { source: Some(_), .. }), "{err:?}");
}

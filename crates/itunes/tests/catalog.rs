//! Catalog client tests against a local mock server.

use httpmock::prelude::*;
use ipakit_errors::{Error, NetworkError, StoreError};
use ipakit_itunes::CatalogClient;
use ipakit_net::NetClient;
use ipakit_types::DeviceFamily;

const LOOKUP_BODY: &str = r#"{
    "resultCount": 1,
    "results": [{
        "trackId": 324684580,
        "bundleId": "com.spotify.client",
        "trackName": "Spotify - Music and Podcasts",
        "version": "9.0.62",
        "price": 0
    }]
}"#;

const SEARCH_BODY: &str = r#"{
    "resultCount": 2,
    "results": [
        {"trackId": 1, "bundleId": "com.example.one", "trackName": "One", "version": "1.0", "price": 0},
        {"trackId": 2, "bundleId": "com.example.two", "trackName": "Two", "version": "2.0", "price": 4.99}
    ]
}"#;

fn client(server: &MockServer) -> CatalogClient<NetClient> {
    CatalogClient::new(NetClient::with_defaults().unwrap()).with_base_url(server.base_url())
}

#[tokio::test]
async fn lookup_resolves_a_bundle_id() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/lookup")
            .query_param("media", "software")
            .query_param("bundleId", "com.spotify.client")
            .query_param("limit", "1")
            .query_param("country", "US")
            .query_param("entity", "software");
        then.status(200)
            .header("content-type", "application/json")
            .body(LOOKUP_BODY);
    });

    let app = client(&server)
        .lookup("com.spotify.client", "US", DeviceFamily::Phone)
        .await
        .unwrap();

    mock.assert();
    assert_eq!(app.id, 324_684_580);
    assert_eq!(app.bundle_id, "com.spotify.client");
    assert!(app.is_free());
}

#[tokio::test]
async fn lookup_of_a_missing_bundle_is_app_not_found() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/lookup");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"resultCount": 0, "results": []}"#);
    });

    let err = client(&server)
        .lookup("com.does.not.exist", "US", DeviceFamily::Phone)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Store(StoreError::AppNotFound)));
}

#[tokio::test]
async fn search_returns_all_results() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/search")
            .query_param("term", "example")
            .query_param("limit", "5")
            .query_param("entity", "iPadSoftware");
        then.status(200)
            .header("content-type", "application/json")
            .body(SEARCH_BODY);
    });

    let apps = client(&server)
        .search("example", 5, "US", DeviceFamily::Pad)
        .await
        .unwrap();

    mock.assert();
    assert_eq!(apps.len(), 2);
    assert_eq!(apps[0].name, "One");
    assert!(!apps[1].is_free());
}

#[tokio::test]
async fn search_with_no_matches_is_empty_not_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/search");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"resultCount": 0, "results": []}"#);
    });

    let apps = client(&server)
        .search("nothing-matches-this", 5, "US", DeviceFamily::Phone)
        .await
        .unwrap();

    assert!(apps.is_empty());
}

#[tokio::test]
async fn catalog_errors_surface_the_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/lookup");
        then.status(503).body("upstream unavailable");
    });

    let err = client(&server)
        .lookup("com.spotify.client", "US", DeviceFamily::Phone)
        .await
        .unwrap_err();

    match err {
        Error::Network(NetworkError::HttpError { status, .. }) => assert_eq!(status, 503),
        other => panic!("expected http error, got {other:?}"),
    }
}

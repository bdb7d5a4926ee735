//! HTTP executor tests against a mock server.

use serde_json::json;
use spacekit_client::{
    Client, ClientConfig, ClientError, HttpExecutor, RequestExecutor, SyncEngine,
};
use spacekit_model::Localizable;
use spacekit_protocol::{Query, Request, SyncFilter};
use spacekit_testkit::prelude::*;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENV_PATH: &str = "/spaces/cfexampleapi/environments/master";

fn config_for(server: &MockServer) -> ClientConfig {
    let host = server.uri().trim_start_matches("http://").to_string();
    ClientConfig::new("cfexampleapi", "secret-token")
        .with_host(host)
        .with_secure(false)
        .with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn sends_bearer_token_and_parameters() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{ENV_PATH}/entries")))
        .and(header("authorization", "Bearer secret-token"))
        .and(query_param("content_type", "cat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sys": { "type": "Array" },
            "total": 1, "skip": 0, "limit": 100,
            "items": [entry_json("nyancat", "cat", "Nyan Cat")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let executor = HttpExecutor::from_config(&config_for(&server)).unwrap();
    let page = executor
        .execute(&Request::entries(&Query::of_content_type("cat")))
        .await
        .unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total, Some(1));
}

#[tokio::test]
async fn api_errors_carry_request_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{ENV_PATH}/locales")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "sys": { "type": "Error", "id": "AccessTokenInvalid" },
            "message": "The access token you sent could not be found or is invalid.",
            "requestId": "req-42"
        })))
        .mount(&server)
        .await;

    let executor = HttpExecutor::from_config(&config_for(&server)).unwrap();
    let err = executor.execute(&Request::locales()).await.unwrap_err();

    match &err {
        ClientError::Api { status, error } => {
            assert_eq!(*status, 401);
            assert_eq!(error.request_id, "req-42");
            assert_eq!(error.id.as_deref(), Some("AccessTokenInvalid"));
        }
        other => panic!("expected API error, got {other:?}"),
    }
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn server_errors_are_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let executor = HttpExecutor::from_config(&config_for(&server)).unwrap();
    let err = executor.execute(&Request::locales()).await.unwrap_err();

    assert!(matches!(err, ClientError::Http { status: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn slow_responses_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "items": [] }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let config = config_for(&server).with_timeout(Duration::from_millis(50));
    let executor = HttpExecutor::from_config(&config).unwrap();
    let err = executor.execute(&Request::locales()).await.unwrap_err();

    assert!(matches!(err, ClientError::Timeout));
}

#[tokio::test]
async fn sync_pass_over_http() {
    init_tracing();
    let server = MockServer::start().await;
    let base = format!("{}{ENV_PATH}", server.uri());

    Mock::given(method("GET"))
        .and(path(format!("{ENV_PATH}/sync")))
        .and(query_param("initial", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sync_body_with_next_page(
            vec![entry_json("nyancat", "cat", "Nyan Cat")],
            &base,
            "page-2",
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{ENV_PATH}/sync")))
        .and(query_param("sync_token", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sync_body(
            vec![asset_json("doge", "Doge", "//images.example.net/doge.png")],
            &base,
            "next-sync",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let executor = HttpExecutor::from_config(&config_for(&server)).unwrap();
    let engine = SyncEngine::new(executor, cat_locales());
    let space = engine.initial_sync(SyncFilter::Everything).await.unwrap();

    assert_eq!(space.entry("nyancat").unwrap().string_at("name"), Some("Nyan Cat"));
    assert_eq!(space.asset("doge").unwrap().title(), Some("Doge"));
    assert_eq!(space.sync_token().unwrap().as_str(), "next-sync");
}

#[tokio::test]
async fn client_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{ENV_PATH}/locales")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "code": "en-US", "name": "English (United States)", "default": true, "fallbackCode": null },
                { "code": "tlh", "name": "Klingon", "default": false, "fallbackCode": "en-US" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{ENV_PATH}/entries")))
        .and(query_param("sys.id", "nyancat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1, "skip": 0, "limit": 100,
            "items": [entry_with_fields("nyancat", "cat", json!({ "name": { "en-US": "Nyan Cat" } }))]
        })))
        .mount(&server)
        .await;

    let client = Client::new(config_for(&server)).unwrap();
    let mut entry = client.fetch_entry("nyancat").await.unwrap();

    assert!(entry.set_locale("tlh"));
    assert_eq!(entry.string_at("name"), Some("Nyan Cat"));
}

//! Integration tests for the list client.

use async_trait::async_trait;
use spacekit_client::{
    CancelHandle, Client, ClientConfig, ClientError, ClientResult, MockExecutor, RequestExecutor,
    SyncState,
};
use spacekit_model::{Localizable, LocalizationContext};
use spacekit_protocol::{
    MimetypeGroup, OrderParameter, Query, QueryOperation, Request, ResponsePage, SyncFilter,
    ASSETS_PATH, ENTRIES_PATH, LOCALES_PATH, SYNC_PATH,
};
use spacekit_testkit::prelude::*;
use std::sync::Arc;

fn client(executor: MockExecutor) -> Client<MockExecutor> {
    init_tracing();
    executor.push_page(LOCALES_PATH, locales_page(&chain_locales(&["en-US", "tlh"])));
    Client::with_executor(ClientConfig::new("cfexampleapi", "token"), executor)
}

#[tokio::test]
async fn fetch_entries_sends_query_parameters() {
    let executor = MockExecutor::new();
    executor.push_page(
        ENTRIES_PATH,
        list_page(vec![
            entry_json("nyancat", "cat", "Nyan Cat"),
            entry_json("happycat", "cat", "Happy Cat"),
        ]),
    );
    let client = client(executor);

    let query = Query::of_content_type("cat")
        .filter("fields.color", QueryOperation::DoesNotEqual("gray".into()))
        .order_by(OrderParameter::new("sys.createdAt"))
        .unwrap()
        .limit(2)
        .unwrap();
    let response = client.fetch_entries(&query).await.unwrap();

    assert_eq!(response.items.len(), 2);
    assert_eq!(response.total, 2);
    assert_eq!(response.skipped, 0);
    assert_eq!(response.items[0].string_at("name"), Some("Nyan Cat"));

    let requests = client.executor().requests();
    let list = requests.iter().find(|r| r.path == "/entries").unwrap();
    assert_eq!(list.parameter("content_type"), Some("cat"));
    assert_eq!(list.parameter("fields.color[ne]"), Some("gray"));
    assert_eq!(list.parameter("order"), Some("sys.createdAt"));
    assert_eq!(list.parameter("limit"), Some("2"));
}

#[tokio::test]
async fn fetch_entries_skips_foreign_items() {
    let executor = MockExecutor::new();
    executor.push_page(
        ENTRIES_PATH,
        list_page(vec![
            entry_json("nyancat", "cat", "Nyan Cat"),
            asset_json("doge", "Doge", "//images.example.net/doge.png"),
            serde_json::json!({ "no": "sys" }),
        ]),
    );
    let client = client(executor);

    let response = client.fetch_entries(&Query::new()).await.unwrap();
    assert_eq!(response.items.len(), 1);
    assert_eq!(response.skipped, 2);
}

#[tokio::test]
async fn fetch_assets_with_mimetype_group() {
    let executor = MockExecutor::new();
    executor.push_page(
        ASSETS_PATH,
        list_page(vec![asset_json("doge", "Doge", "//images.example.net/doge.png")]),
    );
    let client = client(executor);

    let query = Query::new().mimetype_group(MimetypeGroup::Image).unwrap();
    let response = client.fetch_assets(&query).await.unwrap();

    assert_eq!(response.items[0].title(), Some("Doge"));
    assert_eq!(response.items[0].mime_type(), Some("image/png"));
    let requests = client.executor().requests();
    let list = requests.iter().find(|r| r.path == "/assets").unwrap();
    assert_eq!(list.parameter("mimetype_group"), Some("image"));
}

#[tokio::test]
async fn fetch_entry_by_id() {
    let executor = MockExecutor::new();
    executor.push_page(ENTRIES_PATH, list_page(vec![entry_json("nyancat", "cat", "Nyan Cat")]));
    executor.push_page(ENTRIES_PATH, list_page(vec![]));
    let client = client(executor);

    let entry = client.fetch_entry("nyancat").await.unwrap();
    assert_eq!(entry.id(), "nyancat");
    assert_eq!(entry.content_type_id(), Some("cat"));

    let err = client.fetch_entry("garfield").await.unwrap_err();
    assert!(matches!(err, ClientError::NoEntryFound { ref id } if id == "garfield"));

    let requests = client.executor().requests();
    let last = requests.last().unwrap();
    assert_eq!(last.parameter("sys.id"), Some("garfield"));
}

#[tokio::test]
async fn validation_errors_surface_before_sending() {
    let client = client(MockExecutor::new());

    let err = Query::new().limit(1001).unwrap_err();
    assert_eq!(ClientError::from(err).kind(), spacekit_client::ErrorKind::Validation);
    assert_eq!(client.executor().request_count(), 0);
}

#[tokio::test]
async fn initial_sync_through_the_client() {
    let executor = MockExecutor::new();
    executor.push_sync_page(final_sync_page(vec![entry_json("nyancat", "cat", "Nyan Cat")], "t1"));
    executor.push_sync_page(final_sync_page(vec![deleted_entry_json("nyancat")], "t2"));
    let client = client(executor);

    let first = client.initial_sync(SyncFilter::Everything).await.unwrap();
    assert_eq!(first.entries().len(), 1);

    let engine = client.sync_engine().await.unwrap();
    assert_eq!(engine.state(), SyncState::SyncComplete);
    assert!(Arc::ptr_eq(&engine.latest().unwrap(), &first));
    let second = engine.sync(&first).await.unwrap();
    assert!(second.entries().is_empty());
    assert!(Arc::ptr_eq(&client.sync_engine().await.unwrap(), &engine));

    // Locales were fetched once.
    let locale_requests = client
        .executor()
        .requests()
        .iter()
        .filter(|r| r.path == "/locales")
        .count();
    assert_eq!(locale_requests, 1);
}

/// Cancels the engine's pass once a sync page has been served.
struct CancelAfterSyncPage {
    inner: MockExecutor,
    handle: parking_lot::Mutex<Option<CancelHandle>>,
}

#[async_trait]
impl RequestExecutor for CancelAfterSyncPage {
    async fn execute(&self, request: &Request) -> ClientResult<ResponsePage> {
        let page = self.inner.execute(request).await;
        if request.path == SYNC_PATH {
            if let Some(handle) = self.handle.lock().as_ref() {
                handle.cancel();
            }
        }
        page
    }
}

#[tokio::test]
async fn client_sync_is_cancellable_through_its_engine() {
    let inner = MockExecutor::new();
    inner.push_page(LOCALES_PATH, locales_page(&chain_locales(&["en-US"])));
    inner.push_sync_page(next_sync_page(vec![entry_json("nyancat", "cat", "Nyan Cat")], "p2"));
    inner.push_sync_page(final_sync_page(vec![], "t1"));
    let client = Client::with_executor(
        ClientConfig::new("cfexampleapi", "token"),
        CancelAfterSyncPage {
            inner,
            handle: parking_lot::Mutex::new(None),
        },
    );

    let engine = client.sync_engine().await.unwrap();
    *client.executor().handle.lock() = Some(engine.cancel_handle());

    let err = client.initial_sync(SyncFilter::Everything).await.unwrap_err();
    assert!(matches!(err, ClientError::Cancelled));
    assert!(engine.latest().is_none());
    assert_eq!(engine.state(), SyncState::Idle);
}

#[tokio::test]
async fn preview_client_refuses_to_sync() {
    let client = Client::with_executor(ClientConfig::preview("space", "token"), MockExecutor::new())
        .with_localization_context(Arc::new(
            LocalizationContext::new(chain_locales(&["en-US"])).unwrap(),
        ));

    let err = client.initial_sync(SyncFilter::Everything).await.unwrap_err();
    assert!(matches!(err, ClientError::PreviewApiDoesNotSupportSync));
    assert_eq!(client.executor().request_count(), 0);
}

//! Test fixtures.
//!
//! JSON builders produce items in the shape the service sends them, with
//! fields keyed by locale as returned by the sync endpoint.

use serde_json::{json, Value};
use spacekit_model::{Locale, LocalizationContext};
use spacekit_protocol::ResponsePage;
use std::sync::{Arc, Once};

/// Default locale of the fixtures.
pub const DEFAULT_LOCALE: &str = "en-US";

/// A context where each code falls back to the one before it.
///
/// The first code is the default locale.
pub fn locale_chain(codes: &[&str]) -> Arc<LocalizationContext> {
    Arc::new(
        LocalizationContext::new(chain_locales(codes)).expect("Invalid locale chain fixture"),
    )
}

/// The locales of [`locale_chain`], unvalidated.
pub fn chain_locales(codes: &[&str]) -> Vec<Locale> {
    codes
        .iter()
        .enumerate()
        .map(|(i, code)| match i {
            0 => Locale::new(*code).as_default(),
            _ => Locale::new(*code).with_fallback(codes[i - 1]),
        })
        .collect()
}

/// `en-US` as default and Klingon falling back to it.
pub fn cat_locales() -> Arc<LocalizationContext> {
    locale_chain(&[DEFAULT_LOCALE, "tlh"])
}

/// Locale objects as returned by the locales endpoint.
pub fn locales_page(locales: &[Locale]) -> ResponsePage {
    let items = locales
        .iter()
        .map(|locale| serde_json::to_value(locale).expect("Locale serializes"))
        .collect();
    ResponsePage::new(items)
}

/// An entry with a single `name` field in the default locale.
pub fn entry_json(id: &str, content_type: &str, name: &str) -> Value {
    entry_with_fields(id, content_type, json!({ "name": { DEFAULT_LOCALE: name } }))
}

/// An entry with the given localized `fields` object.
pub fn entry_with_fields(id: &str, content_type: &str, fields: Value) -> Value {
    json!({
        "sys": {
            "id": id,
            "type": "Entry",
            "revision": 1,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z",
            "space": { "sys": { "type": "Link", "linkType": "Space", "id": "testspace" } },
            "contentType": { "sys": { "type": "Link", "linkType": "ContentType", "id": content_type } }
        },
        "fields": fields
    })
}

/// An asset with a title and file in the default locale.
pub fn asset_json(id: &str, title: &str, url: &str) -> Value {
    json!({
        "sys": { "id": id, "type": "Asset", "revision": 1 },
        "fields": {
            "title": { DEFAULT_LOCALE: title },
            "file": { DEFAULT_LOCALE: { "url": url, "contentType": "image/png", "fileName": "file.png" } }
        }
    })
}

/// A deleted entry marker.
pub fn deleted_entry_json(id: &str) -> Value {
    json!({ "sys": { "id": id, "type": "DeletedEntry", "deletedAt": "2024-01-02T00:00:00Z" } })
}

/// A deleted asset marker.
pub fn deleted_asset_json(id: &str) -> Value {
    json!({ "sys": { "id": id, "type": "DeletedAsset", "deletedAt": "2024-01-02T00:00:00Z" } })
}

/// A sync page with more pages after it.
pub fn next_sync_page(items: Vec<Value>, next_page_token: &str) -> ResponsePage {
    ResponsePage::new(items).with_next_page(next_page_token)
}

/// The last sync page of a pass.
pub fn final_sync_page(items: Vec<Value>, next_sync_token: &str) -> ResponsePage {
    ResponsePage::new(items).with_next_sync(next_sync_token)
}

/// A list page holding all of `items`.
pub fn list_page(items: Vec<Value>) -> ResponsePage {
    let total = items.len() as u64;
    ResponsePage::new(items).with_totals(total, 0, 100)
}

/// JSON body of a final sync page as sent over HTTP.
pub fn sync_body(items: Vec<Value>, base_url: &str, next_sync_token: &str) -> Value {
    json!({
        "sys": { "type": "Array" },
        "items": items,
        "nextSyncUrl": format!("{base_url}/sync?sync_token={next_sync_token}")
    })
}

/// JSON body of an intermediate sync page as sent over HTTP.
pub fn sync_body_with_next_page(items: Vec<Value>, base_url: &str, next_page_token: &str) -> Value {
    json!({
        "sys": { "type": "Array" },
        "items": items,
        "nextPageUrl": format!("{base_url}/sync?sync_token={next_page_token}")
    })
}

static TRACING: Once = Once::new();

/// Installs a fmt subscriber honoring `RUST_LOG`, once per process.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

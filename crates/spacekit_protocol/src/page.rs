//! One page of a list or sync response.

use crate::error::{ProtocolError, ProtocolResult};
use crate::sync::SyncToken;
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPage {
    #[serde(default)]
    items: Vec<Value>,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    skip: Option<u64>,
    #[serde(default)]
    limit: Option<u64>,
    #[serde(default)]
    next_page_url: Option<String>,
    #[serde(default)]
    next_sync_url: Option<String>,
}

/// A decoded response page.
///
/// Items stay raw JSON; turning them into resources needs the space's
/// localization context, which the page knows nothing about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponsePage {
    /// Raw items.
    pub items: Vec<Value>,
    /// Total matches of a list request.
    pub total: Option<u64>,
    /// Offset of a list request.
    pub skip: Option<u64>,
    /// Page size of a list request.
    pub limit: Option<u64>,
    /// Token of the next sync page, when more pages follow.
    pub next_page_token: Option<SyncToken>,
    /// Token for the next pass, on the final sync page.
    pub next_sync_token: Option<SyncToken>,
}

impl ResponsePage {
    /// A page holding `items` and nothing else.
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// Marks more sync pages as pending.
    pub fn with_next_page(mut self, token: impl Into<String>) -> Self {
        self.next_page_token = Some(SyncToken::new(token));
        self
    }

    /// Marks this as the final sync page.
    pub fn with_next_sync(mut self, token: impl Into<String>) -> Self {
        self.next_sync_token = Some(SyncToken::new(token));
        self
    }

    /// Sets list totals.
    pub fn with_totals(mut self, total: u64, skip: u64, limit: u64) -> Self {
        self.total = Some(total);
        self.skip = Some(skip);
        self.limit = Some(limit);
        self
    }

    /// Decodes a response body.
    ///
    /// Continuation URLs (`nextPageUrl`, `nextSyncUrl`) are reduced to the
    /// tokens they carry.
    pub fn from_json(value: &Value) -> ProtocolResult<Self> {
        let raw = RawPage::deserialize(value)
            .map_err(|e| ProtocolError::malformed_body(e.to_string()))?;

        let next_page_token = raw
            .next_page_url
            .as_deref()
            .map(SyncToken::from_url)
            .transpose()?;
        let next_sync_token = raw
            .next_sync_url
            .as_deref()
            .map(SyncToken::from_url)
            .transpose()?;

        Ok(Self {
            items: raw.items,
            total: raw.total,
            skip: raw.skip,
            limit: raw.limit,
            next_page_token,
            next_sync_token,
        })
    }

    /// Decodes a response body from bytes.
    pub fn from_slice(body: &[u8]) -> ProtocolResult<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ProtocolError::malformed_body(e.to_string()))?;
        Self::from_json(&value)
    }

    /// Returns true when another sync page follows.
    pub fn has_more_pages(&self) -> bool {
        self.next_page_token.is_some()
    }
}

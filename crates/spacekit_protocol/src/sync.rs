//! Sync protocol parameters and tokens.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// Path of the sync endpoint.
pub const SYNC_PATH: &str = "/sync";

/// Opaque position in a space's change stream.
///
/// Issued by the service and replayed verbatim. Serializes as a plain
/// string so it can be persisted and handed to a later `resume`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncToken(String);

impl SyncToken {
    /// Wraps a token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Extracts the `sync_token` query parameter of a continuation URL.
    pub fn from_url(url: &str) -> ProtocolResult<Self> {
        let parsed = Url::parse(url).map_err(|_| ProtocolError::MissingSyncToken {
            url: url.to_string(),
        })?;
        parsed
            .query_pairs()
            .find(|(key, _)| key == "sync_token")
            .map(|(_, value)| Self(value.into_owned()))
            .ok_or_else(|| ProtocolError::MissingSyncToken {
                url: url.to_string(),
            })
    }

    /// The token as sent to the service.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SyncToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What an initial sync pulls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SyncFilter {
    /// Entries, assets and deletions.
    #[default]
    Everything,
    /// Assets only.
    Assets,
    /// Entries only.
    Entries,
    /// Entries of one content type.
    EntriesOfContentType(String),
    /// Deletion markers of both kinds.
    Deletions,
    /// Deleted assets only.
    DeletedAssets,
    /// Deleted entries only.
    DeletedEntries,
}

impl SyncFilter {
    /// Value of the `type` parameter, if any.
    pub fn type_name(&self) -> Option<&'static str> {
        match self {
            Self::Everything => None,
            Self::Assets => Some("Asset"),
            Self::Entries | Self::EntriesOfContentType(_) => Some("Entry"),
            Self::Deletions => Some("Deletion"),
            Self::DeletedAssets => Some("DeletedAsset"),
            Self::DeletedEntries => Some("DeletedEntry"),
        }
    }

    /// Value of the `content_type` parameter, if any.
    pub fn content_type_id(&self) -> Option<&str> {
        match self {
            Self::EntriesOfContentType(id) => Some(id),
            _ => None,
        }
    }
}

/// One page request of a sync pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncRequest {
    /// First page of an initial pass.
    Initial(SyncFilter),
    /// Any later page, or the first page of an incremental pass.
    Continue(SyncToken),
}

impl SyncRequest {
    /// Query parameters for this page.
    ///
    /// Only the first page of an initial pass carries `initial=true` and
    /// the filter; continuation pages carry nothing but the token.
    pub fn parameters(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        match self {
            Self::Initial(filter) => {
                params.insert("initial".to_string(), "true".to_string());
                if let Some(type_name) = filter.type_name() {
                    params.insert("type".to_string(), type_name.to_string());
                }
                if let Some(content_type) = filter.content_type_id() {
                    params.insert("content_type".to_string(), content_type.to_string());
                }
            }
            Self::Continue(token) => {
                params.insert("sync_token".to_string(), token.as_str().to_string());
            }
        }
        params
    }

    /// Returns true for the first page of an initial pass.
    pub fn is_initial(&self) -> bool {
        matches!(self, Self::Initial(_))
    }
}

//! Requests handed to a request executor.

use crate::query::Query;
use crate::sync::{SyncRequest, SYNC_PATH};
use std::collections::BTreeMap;

/// Path of the entries collection.
pub const ENTRIES_PATH: &str = "/entries";

/// Path of the assets collection.
pub const ASSETS_PATH: &str = "/assets";

/// Path of the locales collection.
pub const LOCALES_PATH: &str = "/locales";

/// HTTP method. The delivery API is read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// GET.
    #[default]
    Get,
}

/// One request, relative to the environment's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Method.
    pub method: Method,
    /// Path below the environment, starting with `/`.
    pub path: String,
    /// Query parameters.
    pub parameters: BTreeMap<String, String>,
}

impl Request {
    /// A GET request with parameters.
    pub fn get(path: impl Into<String>, parameters: BTreeMap<String, String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            parameters,
        }
    }

    /// A list request for entries.
    pub fn entries(query: &Query) -> Self {
        Self::get(ENTRIES_PATH, query.parameters())
    }

    /// A list request for assets.
    pub fn assets(query: &Query) -> Self {
        Self::get(ASSETS_PATH, query.parameters())
    }

    /// The space's locales.
    pub fn locales() -> Self {
        Self::get(LOCALES_PATH, BTreeMap::new())
    }

    /// One page of a sync pass.
    pub fn sync(request: &SyncRequest) -> Self {
        Self::get(SYNC_PATH, request.parameters())
    }

    /// Returns the value of a parameter.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{SyncFilter, SyncToken};

    #[test]
    fn list_requests_carry_query_parameters() {
        let query = Query::of_content_type("cat").limit(5).unwrap();
        let request = Request::entries(&query);
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.path, "/entries");
        assert_eq!(request.parameter("content_type"), Some("cat"));
        assert_eq!(request.parameter("limit"), Some("5"));

        assert_eq!(Request::assets(&Query::new()).path, "/assets");
        assert!(Request::locales().parameters.is_empty());
    }

    #[test]
    fn sync_requests() {
        let first = Request::sync(&SyncRequest::Initial(SyncFilter::Assets));
        assert_eq!(first.path, "/sync");
        assert_eq!(first.parameter("initial"), Some("true"));
        assert_eq!(first.parameter("type"), Some("Asset"));

        let next = Request::sync(&SyncRequest::Continue(SyncToken::new("p2")));
        assert_eq!(next.parameter("sync_token"), Some("p2"));
        assert_eq!(next.parameter("initial"), None);
    }
}

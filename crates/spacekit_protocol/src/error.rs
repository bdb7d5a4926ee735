//! Error types for the protocol crate.

use thiserror::Error;

/// Result type for query construction.
pub type QueryResult<T> = Result<T, QueryError>;

/// Result type for decoding wire data.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// A query the service would reject.
///
/// Raised by the builder call that introduces the problem, never at send
/// time. Fix the query and try again; these are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A selected key path is nested too deeply.
    #[error(
        "selection for {path} is invalid: a selected key path may contain at most one '.' after its first property"
    )]
    InvalidSelection {
        /// The offending key path.
        path: String,
    },

    /// Too many key paths selected.
    #[error(
        "cannot select {count} key paths: at most 99 may be selected because 'sys' is always included"
    )]
    MaxSelectionLimitExceeded {
        /// Number of key paths requested.
        count: usize,
    },

    /// The result limit is above the service maximum.
    #[error("cannot limit results to {limit}: the limit must be less than or equal to 1000")]
    MaximumLimitExceeded {
        /// The requested limit.
        limit: u32,
    },

    /// A mimetype group was combined with a content type.
    #[error(
        "mimetype group can only be used when querying assets; the query must not restrict to a content type"
    )]
    MimetypeSpecifiedOnEntry,

    /// An order key lacks the `sys.` or `fields.` prefix.
    #[error("cannot order by {property}: prefix the property name with 'fields.' or 'sys.'")]
    InvalidOrderProperty {
        /// The offending property.
        property: String,
    },

    /// A full-text search term is too short.
    #[error("full text search term {term:?} is too short: it must have at least 2 characters")]
    TextSearchTooShort {
        /// The offending term.
        term: String,
    },
}

/// Errors decoding data received from the service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The body is not the expected JSON.
    #[error("malformed response body: {message}")]
    MalformedBody {
        /// Description of the problem.
        message: String,
    },

    /// A continuation URL does not carry a sync token.
    #[error("continuation URL has no sync_token parameter: {url}")]
    MissingSyncToken {
        /// The URL as received.
        url: String,
    },
}

impl ProtocolError {
    /// Create a malformed body error.
    pub fn malformed_body(message: impl Into<String>) -> Self {
        Self::MalformedBody {
            message: message.into(),
        }
    }
}

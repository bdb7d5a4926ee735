//! Error types for the client.

use spacekit_model::ModelError;
use spacekit_protocol::{ApiError, ProtocolError, QueryError};
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Broad category of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request was rejected before sending.
    Validation,
    /// The network failed or timed out.
    Transport,
    /// The service answered with an error or an unusable body.
    Response,
    /// An item could not be turned into a resource.
    Resolution,
    /// The caller cancelled the operation.
    Cancelled,
    /// The operation is not allowed in the engine's current state.
    State,
}

/// Errors that can occur while talking to the service.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The query would be rejected by the service.
    #[error("invalid query: {0}")]
    Query(#[from] QueryError),

    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// Non-success status without a recognizable error body.
    #[error("HTTP {status}: {message}")]
    Http {
        /// Status code.
        status: u16,
        /// Body text, possibly truncated.
        message: String,
    },

    /// Error reported by the service.
    #[error("service error (HTTP {status}): {error}")]
    Api {
        /// Status code.
        status: u16,
        /// The decoded error body.
        error: ApiError,
    },

    /// The response body could not be decoded.
    #[error("decode error: {message}")]
    Decode {
        /// Description of the problem.
        message: String,
    },

    /// A sync page carried neither a next page nor a next sync token.
    #[error("sync page has neither a next page nor a next sync token")]
    MissingContinuation,

    /// An item could not be turned into a resource.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// No entry with the id exists.
    #[error("no entry found for id {id}")]
    NoEntryFound {
        /// The requested id.
        id: String,
    },

    /// Sync was attempted against the preview host.
    #[error("the preview API does not support sync")]
    PreviewApiDoesNotSupportSync,

    /// Sync was cancelled.
    #[error("sync cancelled")]
    Cancelled,

    /// Invalid state transition.
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition {
        /// Current state.
        from: String,
        /// Attempted target state.
        to: String,
    },

    /// Timeout.
    #[error("operation timed out")]
    Timeout,
}

impl ClientError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns the error's category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Query(_) => ErrorKind::Validation,
            ClientError::Transport { .. } | ClientError::Timeout => ErrorKind::Transport,
            ClientError::Http { .. }
            | ClientError::Api { .. }
            | ClientError::Decode { .. }
            | ClientError::MissingContinuation
            | ClientError::NoEntryFound { .. } => ErrorKind::Response,
            ClientError::Model(_) => ErrorKind::Resolution,
            ClientError::Cancelled => ErrorKind::Cancelled,
            ClientError::PreviewApiDoesNotSupportSync
            | ClientError::InvalidStateTransition { .. } => ErrorKind::State,
        }
    }

    /// HTTP status of a failed response, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } | ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if this error can be retried.
    ///
    /// Rate limiting and server errors are retryable; other statuses are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport { retryable, .. } => *retryable,
            ClientError::Timeout => true,
            ClientError::Http { status, .. } | ClientError::Api { status, .. } => {
                *status == 429 || *status >= 500
            }
            _ => false,
        }
    }
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        ClientError::decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(ClientError::transport_retryable("connection reset").is_retryable());
        assert!(!ClientError::transport_fatal("invalid certificate").is_retryable());
        assert!(ClientError::Timeout.is_retryable());
        assert!(ClientError::Http {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());
        assert!(ClientError::Http {
            status: 429,
            message: "slow down".into()
        }
        .is_retryable());
        assert!(!ClientError::Http {
            status: 404,
            message: "missing".into()
        }
        .is_retryable());
        assert!(!ClientError::Cancelled.is_retryable());
        assert!(!ClientError::MissingContinuation.is_retryable());
    }

    #[test]
    fn kinds() {
        let query = ClientError::from(QueryError::MaximumLimitExceeded { limit: 1001 });
        assert_eq!(query.kind(), ErrorKind::Validation);
        assert_eq!(ClientError::Timeout.kind(), ErrorKind::Transport);
        assert_eq!(ClientError::decode("bad").kind(), ErrorKind::Response);
        assert_eq!(
            ClientError::from(ModelError::NoDefaultLocale).kind(),
            ErrorKind::Resolution
        );
        assert_eq!(ClientError::Cancelled.kind(), ErrorKind::Cancelled);
        assert_eq!(
            ClientError::PreviewApiDoesNotSupportSync.kind(),
            ErrorKind::State
        );
    }

    #[test]
    fn protocol_errors_become_decode_errors() {
        let err = ClientError::from(ProtocolError::malformed_body("eof"));
        assert!(matches!(err, ClientError::Decode { .. }));
        assert!(err.to_string().contains("eof"));
    }

    #[test]
    fn error_display() {
        let err = ClientError::NoEntryFound { id: "nyancat".into() };
        assert_eq!(err.to_string(), "no entry found for id nyancat");

        let err = ClientError::InvalidStateTransition {
            from: "InitialSyncInProgress".into(),
            to: "IncrementalSyncInProgress".into(),
        };
        assert!(err.to_string().contains("InitialSyncInProgress"));
    }
}

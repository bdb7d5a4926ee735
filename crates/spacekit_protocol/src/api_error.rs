//! Error bodies returned by the service.

use serde::Deserialize;
use std::fmt;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawApiError {
    message: Option<String>,
    request_id: Option<String>,
    #[serde(default)]
    sys: Option<RawErrorSys>,
}

#[derive(Deserialize)]
struct RawErrorSys {
    id: Option<String>,
    #[serde(rename = "type")]
    type_name: Option<String>,
}

/// An error reported by the service in a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Human readable message.
    pub message: String,
    /// Request identifier, useful for support requests.
    pub request_id: String,
    /// Error id such as `NotFound` or `RateLimitExceeded`.
    pub id: Option<String>,
    /// `sys.type` of the body, normally `Error`.
    pub error_type: Option<String>,
}

impl ApiError {
    /// Decodes an error body.
    ///
    /// Returns `None` unless the body carries both `message` and
    /// `requestId`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let raw = RawApiError::deserialize(value).ok()?;
        let (id, error_type) = match raw.sys {
            Some(sys) => (sys.id, sys.type_name),
            None => (None, None),
        };
        Some(Self {
            message: raw.message?,
            request_id: raw.request_id?,
            id,
            error_type,
        })
    }

    /// Decodes an error body from bytes.
    pub fn from_slice(body: &[u8]) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_slice(body).ok()?;
        Self::from_json(&value)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{id}: {} (request {})", self.message, self.request_id),
            None => write!(f, "{} (request {})", self.message, self.request_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_error_body() {
        let body = json!({
            "sys": { "type": "Error", "id": "NotFound" },
            "message": "The resource could not be found.",
            "requestId": "abc123"
        });
        let err = ApiError::from_json(&body).unwrap();
        assert_eq!(err.id.as_deref(), Some("NotFound"));
        assert_eq!(err.error_type.as_deref(), Some("Error"));
        assert_eq!(err.request_id, "abc123");
        assert_eq!(
            err.to_string(),
            "NotFound: The resource could not be found. (request abc123)"
        );
    }

    #[test]
    fn message_and_request_id_are_required() {
        assert!(ApiError::from_json(&json!({ "message": "oops" })).is_none());
        assert!(ApiError::from_json(&json!({ "requestId": "r" })).is_none());
        assert!(ApiError::from_slice(b"<html>").is_none());
    }
}

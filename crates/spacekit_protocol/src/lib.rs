//! # SpaceKit Protocol
//!
//! Query validation and wire types for SpaceKit.
//!
//! This crate provides:
//! - `Query`, a builder for list requests that rejects queries the
//!   service would refuse before anything is sent
//! - `SyncRequest`, `SyncFilter` and the opaque `SyncToken`
//! - `Request` and `ResponsePage`, the request-executor boundary
//! - `ApiError`, the service's error body
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod api_error;
mod error;
mod page;
mod query;
mod request;
mod sync;

pub use api_error::ApiError;
pub use error::{ProtocolError, ProtocolResult, QueryError, QueryResult};
pub use page::ResponsePage;
pub use query::{
    Bounds, FilterQuery, MimetypeGroup, OrderParameter, Query, QueryOperation, MAX_LIMIT,
    MAX_SELECTIONS, MIN_SEARCH_LENGTH,
};
pub use request::{Method, Request, ASSETS_PATH, ENTRIES_PATH, LOCALES_PATH};
pub use sync::{SyncFilter, SyncRequest, SyncToken, SYNC_PATH};

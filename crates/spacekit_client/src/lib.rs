//! # SpaceKit Client
//!
//! Sync engine and delivery client for SpaceKit.
//!
//! This crate provides:
//! - Sync state machine (idle → initial sync → complete → incremental sync)
//! - Snapshot reconciliation of creations, updates and deletions
//! - Cancellation and whole-pass retry with exponential backoff
//! - The request executor boundary, with a scripted mock for tests
//! - An HTTP executor backed by reqwest
//! - A list client for entries, assets and locales
//!
//! ## Key Invariants
//!
//! - Pages of a pass are requested strictly one after another
//! - A failed or cancelled pass never replaces the last completed snapshot
//! - Sync tokens are stored and replayed verbatim
//! - One pass per engine at a time

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod error;
mod executor;
mod http;
mod sync;

pub use client::{ArrayResponse, Client};
pub use config::{ClientConfig, RetryConfig, DEFAULT_ENVIRONMENT, DEFAULT_HOST, PREVIEW_HOST};
pub use error::{ClientError, ClientResult, ErrorKind};
pub use executor::{MockExecutor, RequestExecutor};
pub use http::{HttpClient, HttpExecutor, HttpResponse, ReqwestClient};
pub use sync::{CancelHandle, SyncChanges, SyncEngine, SyncSpace, SyncState, SyncStats};

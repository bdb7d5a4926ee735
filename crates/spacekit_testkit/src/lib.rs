//! # SpaceKit Testkit
//!
//! Test utilities for SpaceKit.
//!
//! This crate provides:
//! - Fixtures: locale chains, JSON items shaped like service responses,
//!   sync and list pages
//! - Property-based test generators using proptest
//! - Tracing setup for tests
//!
//! ## Usage
//!
//! ```
//! use spacekit_testkit::prelude::*;
//!
//! let context = locale_chain(&["en-US", "de-DE", "de-CH"]);
//! let page = final_sync_page(vec![entry_json("nyancat", "cat", "Nyan Cat")], "token");
//! assert_eq!(context.len(), 3);
//! assert_eq!(page.items.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;

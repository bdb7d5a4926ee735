//! # SpaceKit Model
//!
//! Resource model and localization for SpaceKit.
//!
//! This crate provides:
//! - `FieldValue`, the tagged value stored per field and locale
//! - `Locale` and `LocalizationContext` (the locales of one space)
//! - `Entry`, `Asset` and deletion markers built from API items
//! - The locale fallback resolver behind `Localizable::fields`
//!
//! This is a pure model crate with no I/O operations.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use spacekit_model::{Localizable, Locale, LocalizationContext, Resource};
//!
//! let context = Arc::new(
//!     LocalizationContext::new(vec![
//!         Locale::new("en-US").as_default(),
//!         Locale::new("de-DE").with_fallback("en-US"),
//!     ])
//!     .unwrap(),
//! );
//!
//! let item = serde_json::json!({
//!     "sys": { "id": "nyancat", "type": "Entry" },
//!     "fields": { "name": { "en-US": "Nyan Cat" } }
//! });
//!
//! let Resource::Entry(mut entry) = Resource::from_json(&item, &context).unwrap() else {
//!     unreachable!()
//! };
//! assert!(entry.set_locale("de-DE"));
//! assert_eq!(entry.string_at("name"), Some("Nyan Cat"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decode;
mod error;
mod locale;
mod localization;
mod resource;
mod value;

pub use decode::{normalize_fields, RawItem, RawLink, RawLinkSys, RawSys};
pub use error::{ModelError, ModelResult};
pub use locale::{FallbackChain, Locale, LocalizationContext};
pub use localization::{resolve, resolve_field, Fields, LocalizedFields};
pub use resource::{
    Asset, DeletedResource, Entry, Localizable, LocaleCursor, LocalizedContent, Resource,
    ResourceType, Sys,
};
pub use value::{FieldValue, Link, LinkType, Location};

//! Locale fallback resolution.
//!
//! Entries and assets store every field once per locale. The value a caller
//! sees for a locale is the first value found while walking that locale's
//! fallback chain. A field with no value anywhere on the chain is left out
//! of the result rather than reported as null.

use crate::locale::{Locale, LocalizationContext};
use crate::value::FieldValue;
use std::collections::BTreeMap;

/// Field name -> locale code -> value, as stored on a resource.
pub type LocalizedFields = BTreeMap<String, BTreeMap<String, FieldValue>>;

/// Field name -> effective value for one locale.
pub type Fields = BTreeMap<String, FieldValue>;

/// Computes the effective fields of `raw` as seen from `locale`.
pub fn resolve(raw: &LocalizedFields, locale: &Locale, context: &LocalizationContext) -> Fields {
    raw.iter()
        .filter_map(|(name, by_locale)| {
            resolve_field(by_locale, locale, context).map(|value| (name.clone(), value.clone()))
        })
        .collect()
}

/// Resolves a single field's per-locale values for `locale`.
pub fn resolve_field<'a>(
    by_locale: &'a BTreeMap<String, FieldValue>,
    locale: &Locale,
    context: &LocalizationContext,
) -> Option<&'a FieldValue> {
    context
        .fallback_chain(locale)
        .find_map(|candidate| by_locale.get(&candidate.code))
}

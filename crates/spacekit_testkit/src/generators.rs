//! Property-based test generators using proptest.
//!
//! Locale strategies always produce a valid context: one default locale and
//! fallbacks that only point at locales generated before them, so no chain
//! can cycle.

use proptest::prelude::*;
use spacekit_model::{FieldValue, Locale, LocalizedFields};
use std::collections::BTreeMap;

/// Strategy for generating locale codes.
pub fn locale_code_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{2}-[A-Z]{2}").expect("Invalid regex")
}

/// Strategy for generating the locales of a valid context.
///
/// The first locale is the default. Every other locale either has no
/// fallback or falls back to an earlier one.
pub fn locales_strategy() -> impl Strategy<Value = Vec<Locale>> {
    locales_with_fallback_odds(0.8)
}

/// Strategy for generating locales whose chains all end at the default.
///
/// Like [`locales_strategy`], but every non-default locale has a fallback.
pub fn rooted_locales_strategy() -> impl Strategy<Value = Vec<Locale>> {
    locales_with_fallback_odds(1.0)
}

fn locales_with_fallback_odds(odds: f64) -> impl Strategy<Value = Vec<Locale>> {
    prop::collection::btree_set(locale_code_strategy(), 1..6)
        .prop_map(|codes| codes.into_iter().collect::<Vec<_>>())
        .prop_flat_map(move |codes| {
            let n = codes.len();
            let picks = prop::collection::vec(any::<prop::sample::Index>(), n);
            let has_fallback = prop::collection::vec(prop::bool::weighted(odds), n);
            (Just(codes), picks, has_fallback)
        })
        .prop_map(|(codes, picks, has_fallback)| {
            codes
                .iter()
                .enumerate()
                .map(|(i, code)| {
                    let locale = Locale::new(code.as_str());
                    if i == 0 {
                        locale.as_default()
                    } else if has_fallback[i] {
                        locale.with_fallback(codes[picks[i].index(i)].as_str())
                    } else {
                        locale
                    }
                })
                .collect()
        })
}

/// Strategy for generating scalar field values.
pub fn field_value_strategy() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        any::<bool>().prop_map(FieldValue::Bool),
        any::<i64>().prop_map(FieldValue::Integer),
        "[a-zA-Z ]{0,16}".prop_map(FieldValue::Text),
    ]
}

/// Strategy for generating field names.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-zA-Z]{0,11}").expect("Invalid regex")
}

/// Strategy for generating per-locale fields over the given locale codes.
///
/// Each field has values for an arbitrary subset of the codes, possibly
/// none.
pub fn localized_fields_strategy(codes: Vec<String>) -> impl Strategy<Value = LocalizedFields> {
    let per_field = prop::collection::vec(prop::option::of(field_value_strategy()), codes.len())
        .prop_map(move |values| {
            codes
                .iter()
                .zip(values)
                .filter_map(|(code, value)| value.map(|v| (code.clone(), v)))
                .collect::<BTreeMap<_, _>>()
        });
    prop::collection::btree_map(field_name_strategy(), per_field, 0..6)
}

/// Strategy for generating locales together with fields over them.
pub fn localized_content_strategy() -> impl Strategy<Value = (Vec<Locale>, LocalizedFields)> {
    locales_strategy().prop_flat_map(|locales| {
        let codes = locales.iter().map(|l| l.code.clone()).collect();
        (Just(locales), localized_fields_strategy(codes))
    })
}

/// Strategy for generating dotted key paths of 1 to 5 segments.
pub fn key_path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::string::string_regex("[a-zA-Z]{1,8}").expect("Invalid regex"),
        1..6,
    )
    .prop_map(|segments| segments.join("."))
}

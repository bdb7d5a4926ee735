//! Property tests for locale resolution and query validation.

use proptest::prelude::*;
use spacekit_model::{resolve, LocalizationContext, LocalizedFields};
use spacekit_protocol::{Query, QueryError, MAX_LIMIT};
use spacekit_testkit::generators::{
    field_name_strategy, field_value_strategy, key_path_strategy, localized_content_strategy,
    rooted_locales_strategy,
};
use std::collections::BTreeMap;

/// Codes visited from `start`, following `fallback_code` until it runs out.
fn walk<'a>(context: &'a LocalizationContext, start: &'a str) -> Vec<&'a str> {
    let mut codes = vec![start];
    let mut current = context.locale(start);
    while let Some(next) = current
        .and_then(|l| l.fallback_code.as_deref())
        .and_then(|code| context.locale(code))
    {
        codes.push(&next.code);
        current = Some(next);
    }
    codes
}

proptest! {
    #[test]
    fn resolved_value_is_first_on_the_chain((locales, raw) in localized_content_strategy()) {
        let context = LocalizationContext::new(locales.clone()).unwrap();

        for locale in &locales {
            let resolved = resolve(&raw, locale, &context);
            let chain = walk(&context, &locale.code);

            for (name, by_locale) in &raw {
                let expected = chain.iter().find_map(|code| by_locale.get(*code));
                prop_assert_eq!(resolved.get(name), expected);
            }
        }
    }

    #[test]
    fn resolution_never_fabricates_values((locales, raw) in localized_content_strategy()) {
        let context = LocalizationContext::new(locales.clone()).unwrap();

        for locale in &locales {
            let resolved = resolve(&raw, locale, &context);
            let chain = walk(&context, &locale.code);

            for (name, value) in &resolved {
                let by_locale = raw.get(name);
                prop_assert!(by_locale.is_some());
                let found = chain
                    .iter()
                    .any(|code| by_locale.and_then(|m| m.get(*code)) == Some(value));
                prop_assert!(found);
            }
        }
    }

    #[test]
    fn default_only_fields_resolve_from_every_locale(
        locales in rooted_locales_strategy(),
        values in prop::collection::btree_map(field_name_strategy(), field_value_strategy(), 1..6),
    ) {
        let context = LocalizationContext::new(locales.clone()).unwrap();
        let default_code = context.default_locale().code.clone();
        let raw: LocalizedFields = values
            .iter()
            .map(|(name, value)| {
                (name.clone(), BTreeMap::from([(default_code.clone(), value.clone())]))
            })
            .collect();

        for locale in &locales {
            let resolved = resolve(&raw, locale, &context);
            prop_assert_eq!(resolved.len(), values.len());
            for (name, value) in &values {
                prop_assert_eq!(resolved.get(name), Some(value));
            }
        }
    }

    #[test]
    fn default_locale_sees_only_its_own_values((locales, raw) in localized_content_strategy()) {
        let context = LocalizationContext::new(locales).unwrap();
        let default = context.default_locale();
        let resolved = resolve(&raw, default, &context);

        let expected = raw.values().filter(|m| m.contains_key(&default.code)).count();
        prop_assert_eq!(resolved.len(), expected);
    }

    #[test]
    fn selection_depth_is_enforced(path in key_path_strategy()) {
        let depth = path.split('.').count();
        let result = Query::selecting([path.clone()]);

        if depth <= 3 {
            prop_assert!(result.is_ok());
        } else {
            prop_assert_eq!(result.unwrap_err(), QueryError::InvalidSelection { path });
        }
    }

    #[test]
    fn limit_is_enforced(limit in 0u32..5000) {
        let result = Query::new().limit(limit);
        prop_assert_eq!(result.is_ok(), limit <= MAX_LIMIT);
    }

    #[test]
    fn search_length_is_enforced(term in "[a-z]{0,4}") {
        let result = Query::new().search(term.clone());
        prop_assert_eq!(result.is_ok(), term.len() >= 2);
    }
}

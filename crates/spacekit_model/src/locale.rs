//! Locales and the per-space localization context.

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A locale configured in a space.
///
/// Deserializes from the objects returned by the locales endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Locale {
    /// Locale code, e.g. `en-US`.
    pub code: String,
    /// Human readable name.
    #[serde(default)]
    pub name: String,
    /// Whether this is the space's default locale.
    #[serde(default)]
    pub default: bool,
    /// Code of the locale consulted when this one has no value.
    #[serde(default)]
    pub fallback_code: Option<String>,
}

impl Locale {
    /// Creates a non-default locale without a fallback.
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            name: code.clone(),
            code,
            default: false,
            fallback_code: None,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the fallback locale code.
    pub fn with_fallback(mut self, code: impl Into<String>) -> Self {
        self.fallback_code = Some(code.into());
        self
    }

    /// Marks this locale as the default.
    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }
}

/// All locales of a space plus its default locale.
///
/// Construction validates the fallback graph: exactly one default, every
/// fallback code known, and no cycles. A constructed context is never
/// mutated; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizationContext {
    locales: HashMap<String, Locale>,
    default_code: String,
}

impl LocalizationContext {
    /// Builds a context from the space's locales.
    pub fn new(locales: impl IntoIterator<Item = Locale>) -> ModelResult<Self> {
        let mut by_code: HashMap<String, Locale> = HashMap::new();
        let mut default_code: Option<String> = None;

        for locale in locales {
            if locale.default {
                if let Some(first) = &default_code {
                    return Err(ModelError::MultipleDefaultLocales {
                        first: first.clone(),
                        second: locale.code.clone(),
                    });
                }
                default_code = Some(locale.code.clone());
            }
            if by_code.contains_key(&locale.code) {
                return Err(ModelError::DuplicateLocale { code: locale.code });
            }
            by_code.insert(locale.code.clone(), locale);
        }

        let default_code = default_code.ok_or(ModelError::NoDefaultLocale)?;

        for locale in by_code.values() {
            if let Some(fallback) = &locale.fallback_code {
                if !by_code.contains_key(fallback) {
                    return Err(ModelError::UnknownFallback {
                        code: locale.code.clone(),
                        fallback: fallback.clone(),
                    });
                }
            }
        }

        for locale in by_code.values() {
            let mut current = locale;
            let mut steps = 0;
            while let Some(next) = current.fallback_code.as_ref().and_then(|c| by_code.get(c)) {
                steps += 1;
                if steps > by_code.len() {
                    return Err(ModelError::FallbackCycle {
                        code: locale.code.clone(),
                    });
                }
                current = next;
            }
        }

        Ok(Self {
            locales: by_code,
            default_code,
        })
    }

    /// Returns the default locale.
    pub fn default_locale(&self) -> &Locale {
        // Present by construction.
        &self.locales[&self.default_code]
    }

    /// Looks up a locale by code.
    pub fn locale(&self, code: &str) -> Option<&Locale> {
        self.locales.get(code)
    }

    /// Returns true if the context knows `code`.
    pub fn contains(&self, code: &str) -> bool {
        self.locales.contains_key(code)
    }

    /// Iterates over all locales in no particular order.
    pub fn locales(&self) -> impl Iterator<Item = &Locale> {
        self.locales.values()
    }

    /// Returns the number of locales.
    pub fn len(&self) -> usize {
        self.locales.len()
    }

    /// Returns true if the context has no locales. Never true for a
    /// constructed context.
    pub fn is_empty(&self) -> bool {
        self.locales.is_empty()
    }

    /// Iterates `start`, then its fallback, then that one's fallback, and so on.
    pub fn fallback_chain<'a>(&'a self, start: &'a Locale) -> FallbackChain<'a> {
        FallbackChain {
            context: self,
            next: Some(start),
            remaining: self.locales.len() + 1,
        }
    }
}

/// Iterator over a locale fallback chain.
///
/// Bounded by the number of locales in the context.
#[derive(Debug, Clone)]
pub struct FallbackChain<'a> {
    context: &'a LocalizationContext,
    next: Option<&'a Locale>,
    remaining: usize,
}

impl<'a> Iterator for FallbackChain<'a> {
    type Item = &'a Locale;

    fn next(&mut self) -> Option<&'a Locale> {
        let current = self.next.take()?;
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.next = current
            .fallback_code
            .as_deref()
            .and_then(|code| self.context.locale(code));
        Some(current)
    }
}

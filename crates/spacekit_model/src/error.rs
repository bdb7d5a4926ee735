//! Error types for the model crate.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while building locales or resources.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// No locale is marked as the default.
    #[error("localization context has no default locale")]
    NoDefaultLocale,

    /// More than one locale is marked as the default.
    #[error("localization context has two default locales: {first} and {second}")]
    MultipleDefaultLocales {
        /// The first default locale seen.
        first: String,
        /// The second default locale seen.
        second: String,
    },

    /// The same locale code appears twice.
    #[error("duplicate locale code: {code}")]
    DuplicateLocale {
        /// The repeated code.
        code: String,
    },

    /// A locale falls back to a code the context does not know.
    #[error("locale {code} falls back to unknown locale {fallback}")]
    UnknownFallback {
        /// The locale declaring the fallback.
        code: String,
        /// The missing fallback code.
        fallback: String,
    },

    /// Following fallbacks from a locale never terminates.
    #[error("locale fallback chain starting at {code} contains a cycle")]
    FallbackCycle {
        /// The locale where the cycle was detected.
        code: String,
    },

    /// The item is not a valid resource.
    #[error("invalid resource: {message}")]
    InvalidResource {
        /// Description of the problem.
        message: String,
    },

    /// The item's `sys.type` is not a resource type this crate builds.
    #[error("unsupported resource type: {type_name}")]
    UnsupportedType {
        /// The type reported by the service.
        type_name: String,
    },

    /// The item's fields do not have the expected per-locale shape.
    #[error("invalid fields on {id}: {message}")]
    InvalidFields {
        /// Id of the offending resource.
        id: String,
        /// Description of the problem.
        message: String,
    },
}

impl ModelError {
    /// Create an invalid resource error.
    pub fn invalid_resource(message: impl Into<String>) -> Self {
        Self::InvalidResource {
            message: message.into(),
        }
    }

    /// Create an invalid fields error.
    pub fn invalid_fields(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFields {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported type error.
    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
        }
    }
}

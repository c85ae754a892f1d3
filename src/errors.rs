//! Unified error type for the companion bot.
//!
//! Every layer (codec, aggregator, store, API client, Discord commands) reports
//! failures through [`Error`], so callers can render a message naming the id or
//! endpoint that failed.

use thiserror::Error;

/// Application error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A chat code could not be parsed (bad base64, wrong length, unknown header or profession).
    #[error("Malformed chat code: {reason}")]
    MalformedCode {
        /// What was wrong with the code
        reason: String,
    },

    /// An id was not present in the static game data.
    #[error("No {kind} found with id {id}")]
    LookupNotFound {
        /// Kind of document looked up (profession, specialization, trait, ...)
        kind: &'static str,
        /// The id that was not found
        id: String,
    },

    /// The API key is not authorized for the endpoint.
    #[error("API key is not authorized for {endpoint}")]
    Unauthorized {
        /// Endpoint that rejected the key
        endpoint: String,
    },

    /// The API reported that the resource does not exist.
    #[error("API resource not found: {endpoint}")]
    NotFound {
        /// Endpoint that returned 404
        endpoint: String,
    },

    /// Any other non-success API response.
    #[error("API error {status} on {endpoint}")]
    Api {
        /// Endpoint that failed
        endpoint: String,
        /// HTTP status code
        status: u16,
    },

    /// The HTTP request itself failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A document or response did not have the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Environment variable error.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// The user has not registered an API key.
    #[error("No API key registered for user {user_id}")]
    MissingApiKey {
        /// Discord user id
        user_id: String,
    },

    /// A submitted API key is not shaped like one.
    #[error("Invalid API key: {reason}")]
    InvalidApiKey {
        /// What is wrong with the key
        reason: String,
    },

    /// The registered API key lacks a permission the operation needs.
    #[error("API key is missing the `{permission}` permission")]
    MissingPermission {
        /// Required permission name
        permission: String,
    },

    /// Serenity/Poise framework error.
    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),

    /// Formatting error while building a reply.
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

impl Error {
    /// Returns true for failures reported by (or on the way to) the GW2 API.
    ///
    /// These are the failures an optional sub-fetch may absorb.
    #[must_use]
    pub const fn is_api_failure(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized { .. } | Self::NotFound { .. } | Self::Api { .. } | Self::Http(_)
        )
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedCode {
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::LookupNotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::FrameworkError(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_failures_are_classified() {
        assert!(
            Error::Unauthorized {
                endpoint: "commerce/delivery".to_string()
            }
            .is_api_failure()
        );
        assert!(
            Error::Api {
                endpoint: "commerce/delivery".to_string(),
                status: 503
            }
            .is_api_failure()
        );
        assert!(!Error::malformed("bad").is_api_failure());
        assert!(!Error::not_found("skill", 5).is_api_failure());
    }

    #[test]
    fn test_lookup_not_found_names_the_id() {
        let err = Error::not_found("specialization", 42);
        assert_eq!(err.to_string(), "No specialization found with id 42");
    }
}

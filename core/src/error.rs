//! Error types for the amoCRM client core.
//!
//! # Design
//! `ApiError` covers everything that can go wrong around one HTTP exchange:
//! status interpretation, body decoding, and transport failures reported by
//! the host. `SearchError` is the boundary finders' own error and stays
//! generic over the probe's error type so callers get their own error
//! back untouched. `ConfigError` is raised while assembling `ClientConfig`.

use thiserror::Error;

/// Errors returned by `CrmClient` parse methods and by host transports.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404 for the requested collection.
    #[error("resource not found")]
    NotFound,

    /// The server returned 401; the token is missing, expired or revoked.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The server returned a non-2xx status other than 401 or 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The host could not complete the round trip at all.
    #[error("transport failed: {0}")]
    Transport(String),
}

/// Errors returned by the boundary finders.
///
/// `E` is the probe's own error type, carried through verbatim.
#[derive(Debug, Error)]
pub enum SearchError<E: std::error::Error + 'static> {
    /// The probe failed; the search was aborted and partial progress dropped.
    #[error("probe failed at page {page}: {source}")]
    Probe {
        page: u32,
        #[source]
        source: E,
    },

    /// The caller's `CancelToken` fired at a sampled checkpoint.
    #[error("boundary search cancelled")]
    Cancelled,
}

impl<E: std::error::Error + 'static> SearchError<E> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SearchError::Cancelled)
    }

    /// The page whose probe failed, if this is a probe failure.
    pub fn failed_page(&self) -> Option<u32> {
        match self {
            SearchError::Probe { page, .. } => Some(*page),
            SearchError::Cancelled => None,
        }
    }
}

/// Errors raised while building a `ClientConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

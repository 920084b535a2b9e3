//! Error types for lookups.

use thiserror::Error;

/// Failure of a single lookup operation.
///
/// Every variant ends up at the tool boundary as one failure message; the
/// variant only decides how that message reads.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Missing or inconsistent configuration (including a hole in the endpoint table).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The provider could not be reached.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The provider answered but reported a failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Bad arguments at the operation boundary. No provider was contacted.
    #[error("invalid input: {0}")]
    Input(String),
}

/// Network-level failure reaching a provider.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Connection, DNS, TLS or body read failure.
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else {
            // The request URL carries the API key in its query string.
            TransportError::Http(e.without_url())
        }
    }
}

/// Business-level failure reported by a provider.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Provider returned a non-success code.
    #[error("API response error ({code}): {message}")]
    Rejected { code: String, message: String },

    /// Body was JSON but carried no usable status code.
    #[error("failed to parse response: {0}")]
    MissingCode(String),

    /// Body was not JSON at all.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The self-IP service returned no address.
    #[error("failed to obtain the current network IP address")]
    MissingAddress,
}

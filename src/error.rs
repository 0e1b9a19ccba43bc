//! Error types.
//!
//! Three layers of failure exist in this crate:
//!
//! - [`ErrorResponse`] is the normalized failure every call resolves to. It is
//!   what callers branch on, and it never needs null-checking: there is always
//!   a status code (`0` when no HTTP status was obtained) and a message.
//! - [`Error`] covers local configuration problems found while building a
//!   client or a request (bad URL, bad header, missing credentials).
//! - [`TransportError`] is what a [`Transport`](crate::Transport) reports when
//!   it could not produce an HTTP response at all.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A normalized failed API call.
///
/// # Examples
///
/// ```no_run
/// use vultr_rest::{Client, Credentials};
///
/// # async fn example() -> Result<(), vultr_rest::Error> {
/// let client = Client::builder()
///     .credentials(Credentials::new("my-api-key"))
///     .build()?;
///
/// match client.get("instances/does-not-exist").await {
///     Ok(response) => println!("Found: {:?}", response.data),
///     Err(err) if err.status_code == 0 => eprintln!("Never reached Vultr: {}", err.error),
///     Err(err) => eprintln!("Vultr said {}: {}", err.status_code, err.error),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// The HTTP status, or `0` if the call failed before a status was received.
    pub status_code: u16,

    /// Human-readable description, provider-supplied when available.
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new `ErrorResponse`.
    pub fn new(status_code: u16, error: impl Into<String>) -> Self {
        Self {
            status_code,
            error: error.into(),
        }
    }

    /// A failure that happened before any HTTP status was obtained.
    pub fn local(error: impl Into<String>) -> Self {
        Self::new(0, error)
    }

    /// Returns `true` if the call never produced an HTTP status.
    pub fn is_local(&self) -> bool {
        self.status_code == 0
    }

    /// Returns `true` if the call failed at the network level (connection,
    /// DNS, TLS, timeout).
    pub fn is_network_error(&self) -> bool {
        self.is_local() && self.error.starts_with("Network error")
    }

    /// Returns `true` for 4xx responses.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    /// Returns `true` for 5xx responses.
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }

    /// Returns `true` if repeating the same call might succeed.
    ///
    /// Network failures, 429 and 5xx responses are considered retryable.
    /// Other local failures, 4xx responses and 2xx responses with an
    /// unreadable body are not.
    ///
    /// # Examples
    ///
    /// ```
    /// use vultr_rest::ErrorResponse;
    ///
    /// assert!(ErrorResponse::new(503, "Service Unavailable").is_retryable());
    /// assert!(ErrorResponse::new(429, "Rate limit exceeded").is_retryable());
    /// assert!(!ErrorResponse::new(400, "invalid region").is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        self.is_network_error() || self.status_code == 429 || self.is_server_error()
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {}: {}", self.status_code, self.error)
    }
}

impl std::error::Error for ErrorResponse {}

impl From<Error> for ErrorResponse {
    fn from(err: Error) -> Self {
        ErrorResponse::local(format!("Unexpected error: {}", err))
    }
}

impl From<TransportError> for ErrorResponse {
    fn from(err: TransportError) -> Self {
        if err.is_network() {
            ErrorResponse::local(format!("Network error: {}", err))
        } else {
            ErrorResponse::local(format!("Unexpected error: {}", err))
        }
    }
}

/// Local configuration errors raised while building clients and requests.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid configuration was provided, such as an invalid header name or
    /// value, or an unresolved URL placeholder.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// No usable API key was available.
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// The request body could not be serialized to JSON.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),
}

/// A specialized `Result` type for configuration steps.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a [`Transport`](crate::Transport) before an HTTP
/// response could be handed back, or while reading its body.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// Connection, DNS, TLS or protocol failure in reqwest.
    #[error("{0}")]
    Network(#[from] reqwest::Error),

    /// The call did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The call was cancelled before completing.
    #[error("request cancelled")]
    Cancelled,

    /// The response body stream failed.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The descriptor could not be turned into a wire request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Any other transport fault.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns `true` for connectivity-level failures.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            TransportError::Network(_) | TransportError::Timeout | TransportError::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_classification() {
        let err: ErrorResponse = TransportError::Timeout.into();
        assert_eq!(err, ErrorResponse::new(0, "Network error: request timed out"));

        let err: ErrorResponse = TransportError::Other("boom".to_string()).into();
        assert_eq!(err, ErrorResponse::new(0, "Unexpected error: boom"));
    }

    #[test]
    fn test_configuration_error_becomes_local_failure() {
        let err: ErrorResponse = Error::ConfigurationError("bad header".to_string()).into();
        assert!(err.is_local());
        assert_eq!(err.error, "Unexpected error: Configuration error: bad header");
    }

    #[test]
    fn test_status_predicates() {
        assert!(ErrorResponse::new(404, "not found").is_client_error());
        assert!(ErrorResponse::new(502, "bad gateway").is_server_error());
        assert!(ErrorResponse::local("Network error: refused").is_retryable());
        assert!(!ErrorResponse::local("Request method not set").is_retryable());
        assert!(!ErrorResponse::new(200, "Status 200: Failed to decode JSON response").is_retryable());
    }
}

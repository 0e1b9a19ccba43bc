//! The HTTP transport seam.
//!
//! The normalizer never talks to the network directly; it hands a
//! [`RequestDescriptor`] to a [`Transport`] and gets back something that can
//! report a status code and produce the body. [`ReqwestTransport`] is the
//! default implementation; tests and embedders can supply their own.

use std::time::Duration;

use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use http::HeaderValue;

use crate::{Error, Method, RequestDescriptor, Result, TransportError};

/// An HTTP response whose body has not been read yet.
#[async_trait]
pub trait TransportResponse: Send {
    /// The HTTP status code.
    fn status(&self) -> u16;

    /// Reads the entire body.
    async fn bytes(self: Box<Self>) -> std::result::Result<Vec<u8>, TransportError>;
}

/// Something that can execute a [`RequestDescriptor`].
///
/// Implementations must send the descriptor's URL with its query parameters,
/// its headers and, when present, its body as a JSON payload.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use vultr_rest::{Method, RequestDescriptor, Transport, TransportError, TransportResponse};
///
/// struct Offline;
///
/// #[async_trait]
/// impl Transport for Offline {
///     async fn send(
///         &self,
///         _method: Method,
///         _request: &RequestDescriptor,
///     ) -> Result<Box<dyn TransportResponse>, TransportError> {
///         Err(TransportError::Other("offline".to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and returns once the status line has been received.
    async fn send(
        &self,
        method: Method,
        request: &RequestDescriptor,
    ) -> std::result::Result<Box<dyn TransportResponse>, TransportError>;
}

#[async_trait]
impl TransportResponse for reqwest::Response {
    fn status(&self) -> u16 {
        reqwest::Response::status(self).as_u16()
    }

    async fn bytes(self: Box<Self>) -> std::result::Result<Vec<u8>, TransportError> {
        let body = reqwest::Response::bytes(*self)
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;
        Ok(body.to_vec())
    }
}

/// A [`Transport`] backed by a pooled `reqwest::Client`.
///
/// Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Creates a transport with no request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;
        Ok(Self::from_client(http_client))
    }

    /// Wraps an existing `reqwest::Client`.
    pub fn from_client(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            timeout: None,
        }
    }

    /// Sets a per-request timeout covering the whole call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        method: Method,
        request: &RequestDescriptor,
    ) -> std::result::Result<Box<dyn TransportResponse>, TransportError> {
        let mut builder = self
            .http_client
            .request(method.into(), request.query_url())
            .headers(request.headers().clone());

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(body) = request.body() {
            if !request.headers().contains_key(CONTENT_TYPE) {
                builder = builder.header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else if e.is_builder() {
                TransportError::InvalidRequest(e.to_string())
            } else {
                TransportError::Network(e)
            }
        })?;

        Ok(Box::new(response))
    }
}

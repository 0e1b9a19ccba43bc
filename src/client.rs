//! Vultr API client.
//!
//! The [`Client`] type is the main entry point for making API calls. It
//! stamps credentials and default headers onto each [`RequestDescriptor`],
//! runs it through [`execute`], and optionally retries transient failures.
//! Use [`ClientBuilder`] to configure and create clients.

use std::sync::Arc;
use std::time::Duration;

use http::header::{AUTHORIZATION, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use url::Url;

use crate::{
    endpoints::BASE_URL,
    execute,
    retry::{RetryOnRetryable, RetryPredicate, RetryStrategy},
    ApiResult, Credentials, Error, Method, ReqwestTransport, RequestBuilder,
    RequestDescriptor, Result, Transport,
};

/// A Vultr API client.
///
/// The client is designed to be reused across calls; clones share the same
/// transport and configuration.
///
/// # Examples
///
/// ```no_run
/// use serde::Serialize;
/// use std::time::Duration;
/// use vultr_rest::{endpoints, Client, Credentials, RetryStrategy};
///
/// #[derive(Serialize)]
/// struct CreateSshKey {
///     name: String,
///     ssh_key: String,
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::builder()
///     .credentials(Credentials::from_env()?)
///     .timeout(Duration::from_secs(30))
///     .retry_strategy(RetryStrategy::ExponentialBackoff {
///         initial_delay: Duration::from_millis(250),
///         max_delay: Duration::from_secs(5),
///         max_retries: 3,
///         jitter: true,
///     })
///     .build()?;
///
/// let account = client.get(endpoints::ACCOUNT.path()?).await?;
/// println!("Account: {:?}", account.data);
///
/// let key = CreateSshKey {
///     name: "deploy".to_string(),
///     ssh_key: "ssh-ed25519 AAAA... deploy@example".to_string(),
/// };
/// let created = client.post(endpoints::SSH_KEYS.path()?, &key).await?;
/// println!("Created: {:?}", created.data);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    base_url: Url,
    default_headers: HeaderMap,
    retry_strategy: RetryStrategy,
    retry_predicate: Box<dyn RetryPredicate>,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The base URL relative paths are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Starts a request for `path`, relative to the base URL.
    ///
    /// The builder already carries the client's default headers, including
    /// the `Authorization` header when credentials were configured. Further
    /// headers, query parameters and a body can be added before building.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` does not form a valid URL, or if it resolves
    /// outside the base URL (an absolute URL, or `..` segments climbing above
    /// the base path). The `Authorization` header never leaves the API host.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use vultr_rest::{endpoints, Client, Credentials, Method};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = Client::builder()
    ///     .credentials(Credentials::new("my-api-key"))
    ///     .build()?;
    ///
    /// let descriptor = client
    ///     .request(Method::Get, endpoints::INSTANCES.path()?)?
    ///     .query("per_page", 100)
    ///     .query("region", "ewr")
    ///     .build();
    ///
    /// let page = client.execute(&descriptor).await?;
    /// println!("{} instances in total", page.meta.map(|m| m.total).unwrap_or(0));
    /// # Ok(())
    /// # }
    /// ```
    pub fn request(&self, method: Method, path: impl AsRef<str>) -> Result<RequestBuilder> {
        let path = path.as_ref();
        let base_url = &self.inner.base_url;
        let url = base_url.join(path.trim_start_matches('/'))?;
        if url.origin() != base_url.origin() || !url.path().starts_with(base_url.path()) {
            return Err(Error::ConfigurationError(format!(
                "Path {:?} resolves outside of {}",
                path, base_url
            )));
        }
        Ok(RequestBuilder::new(url)
            .method(method)
            .headers(&self.inner.default_headers))
    }

    /// Executes a descriptor, retrying failures the retry predicate accepts
    /// for as long as the retry strategy allows.
    ///
    /// With the default strategy this is exactly one call to [`execute`].
    /// When retries run out, the last failure is returned.
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> ApiResult {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match execute(self.inner.transport.as_ref(), descriptor).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            if !self.inner.retry_predicate.should_retry(&error, attempt) {
                return Err(error);
            }

            let Some(delay) = self.inner.retry_strategy.delay_for_attempt(attempt) else {
                if attempt > 1 {
                    tracing::warn!(
                        attempts = attempt,
                        status = error.status_code,
                        url = %descriptor.url(),
                        "Giving up after retries"
                    );
                }
                return Err(error);
            };

            tracing::info!(
                attempt = attempt,
                delay_ms = delay.as_millis() as u64,
                status = error.status_code,
                error = %error.error,
                url = %descriptor.url(),
                "Retrying request after delay"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Builds and executes a call with an optional JSON body.
    ///
    /// Failures while building the request come back as a local
    /// [`ErrorResponse`](crate::ErrorResponse).
    pub async fn call<B>(&self, method: Method, path: impl AsRef<str>, body: Option<&B>) -> ApiResult
    where
        B: Serialize + ?Sized,
    {
        let mut builder = self.request(method, path)?;
        if let Some(body) = body {
            builder = builder.json(body)?;
        }
        self.execute(&builder.build()).await
    }

    /// Makes a GET request to `path`.
    pub async fn get(&self, path: impl AsRef<str>) -> ApiResult {
        self.call::<()>(Method::Get, path, None).await
    }

    /// Makes a DELETE request to `path`.
    pub async fn delete(&self, path: impl AsRef<str>) -> ApiResult {
        self.call::<()>(Method::Delete, path, None).await
    }

    /// Makes a POST request to `path` with a JSON body.
    pub async fn post<B>(&self, path: impl AsRef<str>, body: &B) -> ApiResult
    where
        B: Serialize + ?Sized,
    {
        self.call(Method::Post, path, Some(body)).await
    }

    /// Makes a PUT request to `path` with a JSON body.
    pub async fn put<B>(&self, path: impl AsRef<str>, body: &B) -> ApiResult
    where
        B: Serialize + ?Sized,
    {
        self.call(Method::Put, path, Some(body)).await
    }

    /// Makes a PATCH request to `path` with a JSON body.
    pub async fn patch<B>(&self, path: impl AsRef<str>, body: &B) -> ApiResult
    where
        B: Serialize + ?Sized,
    {
        self.call(Method::Patch, path, Some(body)).await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url.as_str())
            .field("retry_strategy", &self.inner.retry_strategy)
            .finish_non_exhaustive()
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use vultr_rest::{ClientBuilder, Credentials};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), vultr_rest::Error> {
/// let client = ClientBuilder::new()
///     .credentials(Credentials::new("my-api-key"))
///     .timeout(Duration::from_secs(30))
///     .user_agent("my-app/1.0")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_url: Option<Url>,
    credentials: Option<Credentials>,
    default_headers: HeaderMap,
    retry_strategy: RetryStrategy,
    retry_predicate: Option<Box<dyn RetryPredicate>>,
    timeout: Option<Duration>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            credentials: None,
            default_headers: HeaderMap::new(),
            retry_strategy: RetryStrategy::None,
            retry_predicate: None,
            timeout: None,
            transport: None,
        }
    }

    /// Overrides the API base URL (default `https://api.vultr.com/v2/`).
    ///
    /// A trailing slash is added if missing so relative paths extend it.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();
        let url = if url.ends_with('/') {
            Url::parse(url)?
        } else {
            Url::parse(&format!("{}/", url))?
        };
        self.base_url = Some(url);
        Ok(self)
    }

    /// Sets the API key sent with every request.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Shorthand for `credentials(Credentials::new(api_key))`.
    pub fn api_key(self, api_key: impl Into<String>) -> Self {
        self.credentials(Credentials::new(api_key))
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the `User-Agent` header.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a valid header value.
    pub fn user_agent(self, user_agent: impl AsRef<str>) -> Result<Self> {
        self.default_header(USER_AGENT.as_str(), user_agent)
    }

    /// Sets the retry strategy for failed calls.
    pub fn retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry_strategy = strategy;
        self
    }

    /// Sets a custom retry predicate.
    ///
    /// By default, calls are retried based on `ErrorResponse::is_retryable()`.
    pub fn retry_predicate(mut self, predicate: Box<dyn RetryPredicate>) -> Self {
        self.retry_predicate = Some(predicate);
        self
    }

    /// Sets the request timeout of the default transport.
    ///
    /// Ignored when a custom transport is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Uses a custom transport instead of the reqwest-backed default.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if the default transport cannot be created or the
    /// credentials do not form a valid header value.
    pub fn build(self) -> Result<Client> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(BASE_URL)?,
        };

        let mut default_headers = self.default_headers;
        default_headers
            .entry(USER_AGENT)
            .or_insert(HeaderValue::from_static(DEFAULT_USER_AGENT));

        if let Some(credentials) = &self.credentials {
            let mut value = HeaderValue::try_from(credentials.authorization()).map_err(|_| {
                Error::ConfigurationError("API key is not a valid header value".to_string())
            })?;
            value.set_sensitive(true);
            default_headers.insert(AUTHORIZATION, value);
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let mut transport = ReqwestTransport::new()?;
                if let Some(timeout) = self.timeout {
                    transport = transport.with_timeout(timeout);
                }
                Arc::new(transport)
            }
        };

        let retry_predicate = self
            .retry_predicate
            .unwrap_or_else(|| Box::new(RetryOnRetryable));

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport,
                base_url,
                default_headers,
                retry_strategy: self.retry_strategy,
                retry_predicate,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

const DEFAULT_USER_AGENT: &str = concat!("vultr-rest/", env!("CARGO_PKG_VERSION"));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TransportError, TransportResponse};
    use async_trait::async_trait;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn client() -> Client {
        Client::builder().api_key("secret-key").build().unwrap()
    }

    /// Fails every call with a timeout and counts the calls.
    struct TimingOut {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Transport for TimingOut {
        async fn send(
            &self,
            _method: Method,
            _request: &RequestDescriptor,
        ) -> std::result::Result<Box<dyn TransportResponse>, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(TransportError::Timeout)
        }
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture_logs(buffer: &LogBuffer) -> tracing::subscriber::DefaultGuard {
        let buffer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || buffer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    #[test]
    fn test_request_resolves_against_base_url() {
        let descriptor = client()
            .request(Method::Get, "/instances/abc")
            .unwrap()
            .build();
        assert_eq!(
            descriptor.url().as_str(),
            "https://api.vultr.com/v2/instances/abc"
        );
        assert_eq!(descriptor.method(), Some(Method::Get));
    }

    #[test]
    fn test_request_carries_credentials() {
        let descriptor = client().request(Method::Get, "account").unwrap().build();
        assert_eq!(descriptor.headers()[AUTHORIZATION], "Bearer secret-key");
        assert!(descriptor.headers()[AUTHORIZATION].is_sensitive());
        assert!(descriptor.headers().contains_key(USER_AGENT));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = Client::builder()
            .base_url("http://localhost:8080/v2")
            .unwrap()
            .build()
            .unwrap();
        let descriptor = client.request(Method::Get, "regions").unwrap().build();
        assert_eq!(descriptor.url().as_str(), "http://localhost:8080/v2/regions");
    }

    #[test]
    fn test_absolute_url_path_is_rejected() {
        let result = client().request(Method::Get, "http://127.0.0.1:9/x");
        assert!(matches!(result, Err(Error::ConfigurationError(_))));

        let result = client().request(Method::Get, "https://api.vultr.com.evil.test/v2/account");
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn test_path_cannot_climb_above_base() {
        let result = client().request(Method::Get, "../account");
        assert!(matches!(result, Err(Error::ConfigurationError(_))));

        let result = client().request(Method::Get, "instances/../../v1/account");
        assert!(matches!(result, Err(Error::ConfigurationError(_))));

        let result = client().request(Method::Get, "//other.example/v2/account");
        assert!(result.is_ok_and(|b| b.build().url().host_str() == Some("api.vultr.com")));
    }

    #[test]
    fn test_dot_segments_inside_base_are_allowed() {
        let descriptor = client()
            .request(Method::Get, "instances/../regions")
            .unwrap()
            .build();
        assert_eq!(descriptor.url().as_str(), "https://api.vultr.com/v2/regions");
    }

    #[tokio::test]
    async fn test_rejected_path_is_a_local_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = Client::builder()
            .api_key("secret-key")
            .transport(TimingOut {
                calls: calls.clone(),
            })
            .build()
            .unwrap();

        let err = client.get("https://elsewhere.example/x").await.unwrap_err();
        assert_eq!(err.status_code, 0);
        assert!(err.error.starts_with("Unexpected error: Configuration error:"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_retry_log_without_retries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = Client::builder()
            .transport(TimingOut {
                calls: calls.clone(),
            })
            .build()
            .unwrap();

        let logs = LogBuffer::default();
        let _guard = capture_logs(&logs);
        let err = client.get("account").await.unwrap_err();

        assert!(err.is_network_error());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!logs.contents().contains("Giving up after retries"));
    }

    #[tokio::test]
    async fn test_exhausted_retries_are_logged() {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = Client::builder()
            .transport(TimingOut {
                calls: calls.clone(),
            })
            .retry_strategy(RetryStrategy::Linear {
                delay: Duration::from_millis(1),
                max_retries: 2,
            })
            .build()
            .unwrap();

        let logs = LogBuffer::default();
        let _guard = capture_logs(&logs);
        let err = client.get("account").await.unwrap_err();

        assert!(err.is_network_error());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(logs.contents().contains("Giving up after retries"));
    }

    #[test]
    fn test_custom_user_agent_is_kept() {
        let client = Client::builder()
            .user_agent("my-app/2.0")
            .unwrap()
            .build()
            .unwrap();
        let descriptor = client.request(Method::Get, "regions").unwrap().build();
        assert_eq!(descriptor.headers()[USER_AGENT], "my-app/2.0");
    }
}

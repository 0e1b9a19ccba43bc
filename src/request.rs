//! Request descriptors.
//!
//! A [`RequestDescriptor`] is an immutable description of one HTTP call: the
//! fully resolved URL, the method, headers, query parameters and an optional
//! pre-serialized JSON body. Descriptors are assembled with a
//! [`RequestBuilder`].

use std::collections::BTreeMap;
use std::fmt;

use http::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use url::Url;

use crate::{Error, Result};

/// HTTP methods used by the Vultr API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    /// The uppercase method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Patch => http::Method::PATCH,
            Method::Delete => http::Method::DELETE,
            Method::Options => http::Method::OPTIONS,
        }
    }
}

/// A query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Int(n) => write!(f, "{}", n),
        }
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value.into())
    }
}

/// Everything needed to issue one HTTP call.
///
/// The descriptor is immutable once built, so it can be shared, logged and
/// executed any number of times.
///
/// # Examples
///
/// ```
/// use vultr_rest::{Method, RequestDescriptor};
///
/// # fn example() -> Result<(), vultr_rest::Error> {
/// let descriptor = RequestDescriptor::builder("https://api.vultr.com/v2/instances")?
///     .method(Method::Get)
///     .header("Authorization", "Bearer my-api-key")?
///     .query("per_page", 50)
///     .build();
///
/// assert_eq!(descriptor.method(), Some(Method::Get));
/// assert_eq!(descriptor.query_url().as_str(), "https://api.vultr.com/v2/instances?per_page=50");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    url: Url,
    method: Option<Method>,
    headers: HeaderMap,
    query_params: BTreeMap<String, ParamValue>,
    body: Option<String>,
}

impl RequestDescriptor {
    /// Starts a descriptor for the given absolute URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn builder(url: impl AsRef<str>) -> Result<RequestBuilder> {
        Ok(RequestBuilder::new(Url::parse(url.as_ref())?))
    }

    /// The resolved URL, without query parameters.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The HTTP method, if one was set.
    pub fn method(&self) -> Option<Method> {
        self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn query_params(&self) -> &BTreeMap<String, ParamValue> {
        &self.query_params
    }

    /// The pre-serialized JSON body.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// The URL with query parameters appended.
    pub fn query_url(&self) -> Url {
        let mut url = self.url.clone();
        if !self.query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query_params {
                pairs.append_pair(key, &value.to_string());
            }
        }
        url
    }
}

/// Builder for [`RequestDescriptor`].
///
/// Headers and query parameters accumulate; adding the same key twice keeps
/// the last value.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    url: Url,
    method: Option<Method>,
    headers: HeaderMap,
    query_params: BTreeMap<String, ParamValue>,
    body: Option<String>,
}

impl RequestBuilder {
    /// Creates a builder for an already parsed URL.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            method: None,
            headers: HeaderMap::new(),
            query_params: BTreeMap::new(),
            body: None,
        }
    }

    /// Sets the HTTP method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Adds every header from `headers`, replacing existing values.
    pub fn headers(mut self, headers: &HeaderMap) -> Self {
        for (name, value) in headers {
            self.headers.insert(name.clone(), value.clone());
        }
        self
    }

    /// Adds a query parameter to the request.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    /// Adds a query parameter only when `value` is present.
    pub fn query_opt(self, key: impl Into<String>, value: Option<impl Into<ParamValue>>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Sets a pre-serialized JSON body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `body` to JSON text and sets it as the body.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self> {
        let text =
            serde_json::to_string(body).map_err(|e| Error::SerializationFailed(e.to_string()))?;
        Ok(self.body(text))
    }

    /// Finishes the descriptor.
    pub fn build(self) -> RequestDescriptor {
        RequestDescriptor {
            url: self.url,
            method: self.method,
            headers: self.headers,
            query_params: self.query_params,
            body: self.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_header_write_wins() {
        let descriptor = RequestDescriptor::builder("https://api.vultr.com/v2/account")
            .unwrap()
            .header("Authorization", "Bearer old")
            .unwrap()
            .header("authorization", "Bearer new")
            .unwrap()
            .build();

        assert_eq!(descriptor.headers().len(), 1);
        assert_eq!(descriptor.headers()["authorization"], "Bearer new");
    }

    #[test]
    fn test_invalid_header_rejected() {
        let result = RequestDescriptor::builder("https://api.vultr.com/v2/account")
            .unwrap()
            .header("bad header", "x");
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn test_query_params_accumulate() {
        let descriptor = RequestDescriptor::builder("https://api.vultr.com/v2/instances")
            .unwrap()
            .query("per_page", 10)
            .query("cursor", "abc")
            .query("per_page", 25)
            .query_opt("label", None::<&str>)
            .build();

        assert_eq!(descriptor.query_params().len(), 2);
        assert_eq!(descriptor.query_params()["per_page"], ParamValue::Int(25));
        assert_eq!(
            descriptor.query_url().as_str(),
            "https://api.vultr.com/v2/instances?cursor=abc&per_page=25"
        );
    }

    #[test]
    fn test_method_unset_by_default() {
        let descriptor = RequestDescriptor::builder("https://api.vultr.com/v2/account")
            .unwrap()
            .build();
        assert_eq!(descriptor.method(), None);
        assert_eq!(descriptor.body(), None);
    }

    #[test]
    fn test_json_body() {
        let descriptor = RequestDescriptor::builder("https://api.vultr.com/v2/instances")
            .unwrap()
            .method(Method::Post)
            .json(&serde_json::json!({"region": "ewr"}))
            .unwrap()
            .build();
        assert_eq!(descriptor.body(), Some(r#"{"region":"ewr"}"#));
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            RequestDescriptor::builder("not a url"),
            Err(Error::InvalidUrl(_))
        ));
    }
}

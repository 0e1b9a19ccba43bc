//! Normalized success values.
//!
//! The [`SuccessResponse`] type carries the HTTP status, the payload with any
//! single-key envelope already stripped, and Vultr's pagination block when the
//! response had one.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ErrorResponse;

/// The outcome of one normalized call.
pub type ApiResult = std::result::Result<SuccessResponse, ErrorResponse>;

/// Pagination metadata from a Vultr list response.
///
/// Vultr lists respond with
/// `{"meta": {"total": 10, "links": {"next": "bmV4dA==", "prev": ""}}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// Total number of items across all pages.
    #[serde(default)]
    pub total: u64,

    /// Page links, keyed by direction (`next`, `prev`).
    #[serde(default)]
    pub links: BTreeMap<String, Option<String>>,
}

impl Meta {
    /// The cursor for the next page, if there is one.
    ///
    /// # Examples
    ///
    /// ```
    /// use vultr_rest::Meta;
    ///
    /// let meta: Meta = serde_json::from_str(
    ///     r#"{"total": 120, "links": {"next": "bmV4dF9fQU1T", "prev": ""}}"#,
    /// ).unwrap();
    ///
    /// assert_eq!(meta.next_cursor(), Some("bmV4dF9fQU1T"));
    /// assert_eq!(meta.prev_cursor(), None);
    /// ```
    pub fn next_cursor(&self) -> Option<&str> {
        self.link("next")
    }

    /// The cursor for the previous page, if there is one.
    pub fn prev_cursor(&self) -> Option<&str> {
        self.link("prev")
    }

    fn link(&self, name: &str) -> Option<&str> {
        self.links
            .get(name)?
            .as_deref()
            .filter(|cursor| !cursor.is_empty())
    }
}

/// A successful (2xx) API call.
///
/// `data` is always a JSON object or array when present. It is absent for
/// `204 No Content`, for a `null` body, and when the payload could not be
/// used (see [`execute`](crate::execute)).
///
/// # Examples
///
/// ```no_run
/// use serde::Deserialize;
/// use vultr_rest::{Client, Credentials};
///
/// #[derive(Deserialize)]
/// struct Instance {
///     id: String,
///     label: String,
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::builder()
///     .credentials(Credentials::new("my-api-key"))
///     .build()?;
///
/// let response = client.get("instances").await?;
/// let instances: Vec<Instance> = response.data_as()?;
/// for instance in &instances {
///     println!("{} {}", instance.id, instance.label);
/// }
///
/// if let Some(cursor) = response.meta.as_ref().and_then(|m| m.next_cursor()) {
///     println!("more at cursor {}", cursor);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessResponse {
    /// The HTTP status code.
    pub status_code: u16,

    /// The normalized payload.
    pub data: Option<Value>,

    /// Pagination metadata, present when the response carried a `meta` key.
    pub meta: Option<Meta>,
}

impl SuccessResponse {
    /// Creates a new `SuccessResponse`.
    pub fn new(status_code: u16, data: Option<Value>, meta: Option<Meta>) -> Self {
        Self {
            status_code,
            data,
            meta,
        }
    }

    /// The bodyless `204 No Content` response.
    pub fn no_content() -> Self {
        Self::new(204, None, None)
    }

    /// Returns `true` if there is no payload.
    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }

    /// Deserializes the payload into a caller-supplied type.
    ///
    /// An absent payload is presented to `T` as JSON `null`, so `Option<_>`
    /// and `()` targets accept bodyless responses.
    ///
    /// # Errors
    ///
    /// Returns the serde error if the payload does not match `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.data {
            Some(data) => T::deserialize(data),
            None => T::deserialize(Value::Null),
        }
    }
}

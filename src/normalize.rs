//! Request execution and response normalization.
//!
//! [`execute`] turns one [`RequestDescriptor`] into exactly one
//! [`SuccessResponse`] or [`ErrorResponse`]. It owns every classification
//! rule: what counts as success, how Vultr's JSON envelopes are unwrapped, and
//! which message a failure carries when the body is unusable.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{ApiResult, ErrorResponse, Meta, RequestDescriptor, SuccessResponse, Transport};

/// Characters of a non-JSON body quoted in the error message.
const NON_JSON_PREVIEW_CHARS: usize = 100;

/// Executes one request and normalizes the outcome.
///
/// Never fails by other means than the returned `Err`:
///
/// - no method on the descriptor: status `0`, `"Request method not set"`,
///   and the transport is not called;
/// - transport failure: status `0`, `"Network error: …"` or
///   `"Unexpected error: …"`;
/// - `204`: success with no data, body not read;
/// - `2xx`: success with the unwrapped payload, unless the body could not be
///   decoded, in which case the decode message is returned as an error;
/// - anything else: the decode message, the body's `"error"` field, or
///   `"API request failed with status {status}"`, in that order.
///
/// There is no retry here; see [`Client`](crate::Client) for that.
///
/// # Examples
///
/// ```no_run
/// use vultr_rest::{execute, Method, ReqwestTransport, RequestDescriptor};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = ReqwestTransport::new()?;
/// let descriptor = RequestDescriptor::builder("https://api.vultr.com/v2/regions")?
///     .method(Method::Get)
///     .build();
///
/// match execute(&transport, &descriptor).await {
///     Ok(success) => println!("{}: {:?}", success.status_code, success.data),
///     Err(failure) => eprintln!("{}: {}", failure.status_code, failure.error),
/// }
/// # Ok(())
/// # }
/// ```
pub async fn execute<T>(transport: &T, descriptor: &RequestDescriptor) -> ApiResult
where
    T: Transport + ?Sized,
{
    let url = descriptor.url();

    let Some(method) = descriptor.method() else {
        tracing::error!(url = %url, "Request method not set");
        return Err(ErrorResponse::local("Request method not set"));
    };

    tracing::debug!(
        method = %method,
        url = %url,
        query = ?descriptor.query_params(),
        has_body = descriptor.body().is_some(),
        "Sending request"
    );

    let response = match transport.send(method, descriptor).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(method = %method, url = %url, error = %e, "Request failed before a response was received");
            return Err(e.into());
        }
    };

    let status = response.status();
    tracing::debug!(method = %method, url = %url, status, "Received response");

    if status == 204 {
        tracing::info!(url = %url, status, "Request successful (no content)");
        return Ok(SuccessResponse::no_content());
    }

    let decoded = match response.bytes().await {
        Ok(body) => decode_body(status, &body),
        Err(e) => {
            tracing::error!(url = %url, status, error = %e, "Unexpected error processing response body");
            Err(format!(
                "Status {}: Unexpected error processing response body: {}",
                status, e
            ))
        }
    };

    if let Err(message) = &decoded {
        tracing::warn!(url = %url, status, error = %message, "Response body could not be decoded");
    }

    let result = classify(status, decoded);
    match &result {
        Ok(success) => tracing::info!(
            url = %url,
            status,
            has_data = success.data.is_some(),
            has_meta = success.meta.is_some(),
            "Request successful"
        ),
        Err(failure) => tracing::warn!(url = %url, status, error = %failure.error, "Request failed"),
    }
    result
}

/// Decodes a response body, regardless of its declared content type.
///
/// An empty body decodes to `null`. On failure the returned message is the
/// one reported to the caller.
pub(crate) fn decode_body(status: u16, body: &[u8]) -> Result<Value, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(value) => {
            tracing::debug!(status, body = %value, "Raw API response body");
            Ok(value)
        }
        Err(e) if looks_like_json_document(body) => {
            tracing::debug!(status, error = %e, "Failed to decode JSON response");
            Err(format!("Status {}: Failed to decode JSON response", status))
        }
        Err(_) => match std::str::from_utf8(body) {
            Ok(text) => {
                tracing::debug!(status, body = %text, "Non-JSON response body");
                let preview: String = text.chars().take(NON_JSON_PREVIEW_CHARS).collect();
                Err(format!("Status {}: Non-JSON response: {}...", status, preview))
            }
            Err(e) => {
                tracing::debug!(status, error = %e, "Non-JSON response body is not text");
                Err(format!(
                    "Status {}: Non-JSON response, unable to read text.",
                    status
                ))
            }
        },
    }
}

/// A body whose first significant byte opens an object or array is treated as
/// (possibly broken) JSON rather than as plain text.
fn looks_like_json_document(body: &[u8]) -> bool {
    matches!(
        body.iter().find(|b| !b.is_ascii_whitespace()),
        Some(b'{') | Some(b'[')
    )
}

/// Classifies a decoded response by status.
pub(crate) fn classify(status: u16, decoded: Result<Value, String>) -> ApiResult {
    if (200..300).contains(&status) {
        let raw_body = decoded.map_err(|message| ErrorResponse::new(status, message))?;
        let (data, meta) = unwrap_envelope(raw_body);
        return Ok(SuccessResponse::new(status, data, meta));
    }

    let error = match decoded {
        Err(message) => message,
        Ok(Value::Object(body)) if body.contains_key("error") => match &body["error"] {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        },
        Ok(_) => format!("API request failed with status {}", status),
    };
    Err(ErrorResponse::new(status, error))
}

/// Splits a successful body into payload and pagination metadata.
///
/// Objects lose their `meta` key; if exactly one key remains, its value is the
/// payload (Vultr's `{"instance": {...}}` envelope). Arrays pass through.
pub(crate) fn unwrap_envelope(raw_body: Value) -> (Option<Value>, Option<Meta>) {
    match raw_body {
        Value::Object(mut body) => {
            let meta = body.remove("meta").and_then(parse_meta);
            (unwrap_object(body), meta)
        }
        Value::Array(items) => (Some(Value::Array(items)), None),
        Value::Null => (None, None),
        other => {
            tracing::warn!(body = %other, "Expected an object or array as response body; dropping payload");
            (None, None)
        }
    }
}

fn unwrap_object(body: Map<String, Value>) -> Option<Value> {
    if body.len() != 1 {
        return Some(Value::Object(body));
    }

    let (key, payload) = body.into_iter().next()?;
    match payload {
        Value::Object(_) | Value::Array(_) => Some(payload),
        Value::Null => None,
        other => {
            // Single-key envelopes only ever wrap objects or arrays.
            tracing::warn!(key = %key, value = %other, "Expected an object or array under envelope key; dropping payload");
            None
        }
    }
}

fn parse_meta(value: Value) -> Option<Meta> {
    if value.is_null() {
        return None;
    }
    match Meta::deserialize(&value) {
        Ok(meta) => Some(meta),
        Err(e) => {
            tracing::warn!(error = %e, meta = %value, "Reading malformed pagination metadata field by field");
            Some(lenient_meta(&value))
        }
    }
}

/// Salvages what it can from a `meta` value of the wrong shape: a numeric or
/// numeric-string `total` (else 0) and string links (other values as JSON text).
fn lenient_meta(value: &Value) -> Meta {
    let total = match value.get("total") {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    };

    let links = value
        .get("links")
        .and_then(Value::as_object)
        .map(|links| {
            links
                .iter()
                .map(|(direction, link)| {
                    let link = match link {
                        Value::Null => None,
                        Value::String(s) => Some(s.clone()),
                        other => Some(other.to_string()),
                    };
                    (direction.clone(), link)
                })
                .collect()
        })
        .unwrap_or_default();

    Meta { total, links }
}

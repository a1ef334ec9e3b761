//! Buffered HTTP response snapshot.
//!
//! A [`Response`] is built from an executed request with
//! [`CurlRequest::to_response`](crate::CurlRequest::to_response). It holds the
//! final URL (after redirects), status code and reason, the headers of the
//! final response, and the raw body bytes.
//!
//! ## Notes
//! - The body is stored as raw `Vec<u8>`. For text responses, convert with
//!   `String::from_utf8_lossy(&resp.body)`. For JSON, parse with
//!   `serde_json::from_slice::<T>(&resp.body)`.
//! - `headers` is an `http::HeaderMap`, which is **case-insensitive** for
//!   header names.
//! - `status_text` is derived from the status code's canonical reason phrase
//!   and is `"Unknown"` for non-standard codes.
use http::{HeaderMap, StatusCode};

/// Simple structure for HTTP responses.
#[derive(Debug, Clone)]
pub struct Response {
    /// Final URL of the response (after redirects, if any).
    pub url: url::Url,

    /// Numeric HTTP status code (e.g., `200`, `404`).
    pub status: u16,

    /// Human-readable reason phrase (e.g., `"OK"`, `"Not Found"`).
    pub status_text: String,

    /// Headers of the final response.
    pub headers: HeaderMap,

    /// Raw response body bytes.
    pub body: Vec<u8>,
}

impl Response {
    /// Canonical reason phrase for `status`, or `"Unknown"`.
    pub fn reason_for(status: u16) -> String {
        StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown")
            .to_string()
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

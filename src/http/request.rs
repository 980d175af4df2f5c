//! Request inspection.
//!
//! # Responsibilities
//! - Derive the host key (Host / X-Forwarded-Host, port normalization)
//! - Derive the access key from the path
//! - Expose the raw query string and parsed query parameters
//! - Generate request IDs
//!
//! # Design Decisions
//! - All extractors are pure functions of headers and URI
//! - Extraction never fails; an unusable host yields an empty host key

use axum::http::header::{HeaderName, HOST};
use axum::http::uri::Authority;
use axum::http::{HeaderMap, HeaderValue, Request, Uri};
use percent_encoding::percent_decode_str;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Derive the host key of a request.
///
/// With `prefer_x_forwarded_host`, a non-empty `X-Forwarded-Host` is
/// returned verbatim. Otherwise the declared host is used, keeping the port
/// only when it is neither 80 nor 443.
pub fn extract_host(headers: &HeaderMap, uri: &Uri, prefer_x_forwarded_host: bool) -> String {
    if prefer_x_forwarded_host {
        let forwarded = headers
            .get(X_FORWARDED_HOST)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty());
        if let Some(forwarded) = forwarded {
            return forwarded.to_string();
        }
    }

    let declared = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.authority().map(Authority::as_str));

    let Some(declared) = declared else {
        return String::new();
    };

    match declared.parse::<Authority>() {
        Ok(authority) => match authority.port_u16() {
            Some(port) if port != 80 && port != 443 => format!("{}:{}", authority.host(), port),
            _ => authority.host().to_string(),
        },
        Err(_) => declared.to_string(),
    }
}

/// Derive the access key: the decoded path without its leading `/`.
pub fn extract_access_key(uri: &Uri) -> Option<String> {
    let path = uri.path();
    if path.is_empty() {
        return None;
    }
    let key = path.strip_prefix('/').unwrap_or(path);
    Some(percent_decode_str(key).decode_utf8_lossy().into_owned())
}

/// The query string as received, including its leading `?`; empty when absent.
pub fn raw_query_string(uri: &Uri) -> String {
    match uri.query() {
        Some(query) if !query.is_empty() => format!("?{query}"),
        _ => String::new(),
    }
}

/// Decoded query parameters, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParameters {
    pairs: Vec<(String, String)>,
}

impl QueryParameters {
    pub fn from_uri(uri: &Uri) -> Self {
        let query = uri.query().unwrap_or_default();
        Self {
            pairs: url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    /// First value of `name`, if present.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// `true` only when the first value of `name` is exactly `"1"`.
    pub fn boolean(&self, name: &str) -> bool {
        self.text(name) == Some("1")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Request ID of a request, or `"unknown"` before the ID layer ran.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Generates UUID v4 request IDs for [`tower_http::request_id::SetRequestIdLayer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

//! Response emission.
//!
//! # Responsibilities
//! - Turn management results ([`OtherResult`]) into HTTP responses
//! - Write redirects (301 permanent, 302 otherwise)
//!
//! # Design Decisions
//! - Emission has no side effects beyond the response itself
//! - Management failures are converted before reaching this module
//! - A target that cannot be a `Location` header value is reported, not sent

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::routing::RoutingError;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// Result of a management invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherResult {
    pub status_code: u16,
    pub has_content: bool,
    pub content_type: Option<String>,
    pub body: Option<String>,
}

impl OtherResult {
    /// Status only, no body.
    pub fn status(status_code: u16) -> Self {
        Self {
            status_code,
            has_content: false,
            content_type: None,
            body: None,
        }
    }

    /// The fixed result substituted for any management failure.
    pub fn internal_error() -> Self {
        Self::status(500)
    }

    pub fn text(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            has_content: true,
            content_type: Some(CONTENT_TYPE_TEXT.to_string()),
            body: Some(body.into()),
        }
    }

    /// 200 with `value` serialized as JSON.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            status_code: 200,
            has_content: true,
            content_type: Some(CONTENT_TYPE_JSON.to_string()),
            body: Some(serde_json::to_string(value)?),
        })
    }
}

impl IntoResponse for OtherResult {
    fn into_response(self) -> Response {
        emit(self)
    }
}

/// Write `result` as a response: status, then content type and body when present.
pub fn emit(result: OtherResult) -> Response {
    let status =
        StatusCode::from_u16(result.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if !result.has_content {
        return status.into_response();
    }

    let mut response = Response::new(Body::from(result.body.unwrap_or_default()));
    *response.status_mut() = status;
    if let Some(content_type) = result
        .content_type
        .and_then(|ct| HeaderValue::from_str(&ct).ok())
    {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    response
}

/// Redirect to `location`.
pub fn redirect(location: &str, permanent: bool) -> Result<Response, RoutingError> {
    let value =
        HeaderValue::from_str(location).map_err(|e| RoutingError::MalformedRedirectTarget {
            target: location.to_string(),
            reason: e.to_string(),
        })?;

    let status = if permanent {
        StatusCode::MOVED_PERMANENTLY
    } else {
        StatusCode::FOUND
    };

    Ok((status, [(LOCATION, value)]).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_emit_without_content() {
        let response = emit(OtherResult::internal_error());
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        assert_eq!(body_text(response).await, "");
    }

    #[tokio::test]
    async fn test_emit_ignores_body_without_content_flag() {
        let result = OtherResult {
            status_code: 204,
            has_content: false,
            content_type: Some(CONTENT_TYPE_TEXT.into()),
            body: Some("hidden".into()),
        };
        let response = emit(result);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(body_text(response).await, "");
    }

    #[tokio::test]
    async fn test_emit_with_content() {
        let response = emit(OtherResult::json(&serde_json::json!({ "ok": true })).unwrap());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], CONTENT_TYPE_JSON);
        assert_eq!(body_text(response).await, r#"{"ok":true}"#);
    }

    #[test]
    fn test_redirect_status_follows_permanence() {
        let temporary = redirect("https://a.test/x", false).unwrap();
        assert_eq!(temporary.status(), StatusCode::FOUND);
        assert_eq!(temporary.headers()[LOCATION], "https://a.test/x");

        let permanent = redirect("https://a.test/x?y=1", true).unwrap();
        assert_eq!(permanent.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(permanent.headers()[LOCATION], "https://a.test/x?y=1");
    }

    #[test]
    fn test_redirect_rejects_invalid_header_value() {
        assert!(matches!(
            redirect("https://a.test/\nx", false),
            Err(RoutingError::MalformedRedirectTarget { .. })
        ));
    }
}

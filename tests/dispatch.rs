//! Request dispatch tests driven through the router in-process.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::*;
use short_url::config::AppConfig;
use short_url::http::{HttpServer, OtherResult};
use short_url::management::{ManagementError, ManagementHandler, ManagementRequest};
use short_url::settings::{DomainSetting, QueryProcess, SettingsStore};
use tower::ServiceExt;

async fn send(server: &HttpServer, host: &str, path: &str) -> axum::http::Response<axum::body::Body> {
    server.router().oneshot(get(host, path)).await.unwrap()
}

#[tokio::test]
async fn test_record_redirect_with_appended_query() {
    let server = HttpServer::new(sample_config());

    let response = send(&server, "example.com", "/abc?q=1").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), Some("https://a.test/x?q=1"));
}

#[tokio::test]
async fn test_permanent_record_extends_existing_query() {
    let server = HttpServer::new(sample_config());

    let response = send(&server, "example.com", "/search?q=rust").await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&response), Some("https://a.test/x?y=1&q=rust"));
}

#[tokio::test]
async fn test_query_dropped_without_processing() {
    let server = HttpServer::new(sample_config());

    let response = send(&server, "example.com", "/plain?q=1").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), Some("https://a.test/plain"));
}

#[tokio::test]
async fn test_default_port_is_ignored() {
    let server = HttpServer::new(sample_config());

    let response = send(&server, "example.com:443", "/abc").await;
    assert_eq!(location(&response), Some("https://a.test/x"));
}

#[tokio::test]
async fn test_alias_resolves_to_domain() {
    let server = HttpServer::new(sample_config());

    let response = send(&server, "www.example.com", "/abc").await;
    assert_eq!(location(&response), Some("https://a.test/x"));
}

#[tokio::test]
async fn test_unknown_key_uses_domain_default() {
    let server = HttpServer::new(sample_config());

    for path in ["/", "/missing", "/abc/extra"] {
        let response = send(&server, "example.com", path).await;
        assert_eq!(response.status(), StatusCode::FOUND, "path {path}");
        assert_eq!(location(&response), Some("https://example.com/home"), "path {path}");
    }
}

#[tokio::test]
async fn test_unknown_host_uses_global_default() {
    let server = HttpServer::new(sample_config());

    let response = send(&server, "unknown.test", "/abc").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), Some("https://fallback.test/"));
}

#[tokio::test]
async fn test_x_forwarded_host_when_preferred() {
    let mut config = sample_config();
    config.settings.prefer_x_forwarded_host = true;
    let server = HttpServer::new(config);

    let request = axum::http::Request::builder()
        .uri("/abc")
        .header("host", "proxy.internal")
        .header("x-forwarded-host", "example.com")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = server.router().oneshot(request).await.unwrap();
    assert_eq!(location(&response), Some("https://a.test/x"));
}

#[tokio::test]
async fn test_response_carries_request_id() {
    let server = HttpServer::new(sample_config());

    let response = send(&server, "example.com", "/abc").await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_global_management_status() {
    let server = HttpServer::new(sample_config());

    let response = send(&server, "example.com", &format!("/{GLOBAL_KEY}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["domains"], 1);
}

#[tokio::test]
async fn test_global_management_respects_enabled_hosts() {
    let mut config = sample_config();
    config
        .settings
        .global_management_enabled_hosts
        .insert("admin.test".into());
    let server = HttpServer::new(config);

    // Not enabled for example.com: the key is just an unknown record.
    let response = send(&server, "example.com", &format!("/{GLOBAL_KEY}")).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), Some("https://example.com/home"));

    let response = send(&server, "admin.test", &format!("/{GLOBAL_KEY}")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_domain_management_mutation_is_visible() {
    let server = HttpServer::new(sample_config());

    let path = format!("/{DOMAIN_KEY}?operation=set-redirect&key=docs&target=https://docs.test/&permanent=1");
    let response = send(&server, "www.example.com", &path).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&server, "example.com", "/docs").await;
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&response), Some("https://docs.test/"));
}

#[tokio::test]
async fn test_domain_management_rejects_malformed_target() {
    let server = HttpServer::new(sample_config());

    let path = format!("/{DOMAIN_KEY}?operation=set-redirect&key=docs&target=not-a-url");
    let response = send(&server, "example.com", &path).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!server.settings().snapshot().domains["example.com"]
        .redirects
        .contains_key("docs"));
}

#[tokio::test]
async fn test_management_error_is_bare_500() {
    let server = HttpServer::new(sample_config());

    // `set-redirect` without `target` is an error, not a result.
    let path = format!("/{DOMAIN_KEY}?operation=set-redirect&key=docs");
    let response = send(&server, "example.com", &path).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get("content-type").is_none());
    assert_eq!(body_text(response).await, "");
}

struct FailingManagement;

impl ManagementHandler for FailingManagement {
    fn global_manage(&self, _request: &ManagementRequest) -> Result<OtherResult, ManagementError> {
        Err(ManagementError::MissingParameter("anything"))
    }

    fn domain_manage(
        &self,
        _request: &ManagementRequest,
        _host: &str,
        _domain: &DomainSetting,
    ) -> Result<OtherResult, ManagementError> {
        Err(ManagementError::InvalidParameter {
            name: "anything",
            reason: "always fails".into(),
        })
    }
}

#[tokio::test]
async fn test_custom_handler_failure_is_bare_500() {
    let config = sample_config();
    let store = Arc::new(SettingsStore::new(config.settings.clone()));
    let server = HttpServer::with_management(config, store, Arc::new(FailingManagement));

    for key in [GLOBAL_KEY, DOMAIN_KEY] {
        let response = send(&server, "example.com", &format!("/{key}")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "");
    }

    // Redirects are unaffected.
    let response = send(&server, "example.com", "/abc").await;
    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_alias_cycle_is_500() {
    let mut config = AppConfig::default();
    config.settings.default_target = target("https://fallback.test/", false, QueryProcess::None);
    config.settings.aliases.insert("a.test".into(), "b.test".into());
    config.settings.aliases.insert("b.test".into(), "a.test".into());
    let server = HttpServer::new(config);

    let response = send(&server, "a.test", "/abc").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // Hosts outside the cycle still fall back to the global default.
    let response = send(&server, "c.test", "/abc").await;
    assert_eq!(location(&response), Some("https://fallback.test/"));
}

#[tokio::test]
async fn test_domain_key_change_cannot_hide_a_record() {
    let server = HttpServer::new(sample_config());

    let path = format!("/{GLOBAL_KEY}?operation=set-domain-key&domain=example.com&key=abc");
    let response = send(&server, "example.com", &path).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(&server, "example.com", "/abc").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), Some("https://a.test/x"));
}

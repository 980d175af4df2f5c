//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use short_url::config::AppConfig;
use short_url::http::HttpServer;
use short_url::lifecycle::Shutdown;
use short_url::settings::{DomainSetting, QueryProcess, RedirectTarget, ServiceSetting};
use tokio::sync::mpsc;

pub const GLOBAL_KEY: &str = "global-secret";
pub const DOMAIN_KEY: &str = "domain-secret";

pub fn target(url: &str, permanent: bool, query_process: QueryProcess) -> RedirectTarget {
    RedirectTarget::new(url, permanent, query_process)
}

/// Settings with one domain (`example.com`), an alias and a few records.
pub fn sample_settings() -> ServiceSetting {
    let mut domain = DomainSetting {
        management_key: DOMAIN_KEY.into(),
        default_target: target("https://example.com/home", false, QueryProcess::None),
        ..Default::default()
    };
    domain.redirects.insert(
        "abc".into(),
        target("https://a.test/x", false, QueryProcess::AppendDirectly),
    );
    domain.redirects.insert(
        "search".into(),
        target(
            "https://a.test/x?y=1",
            true,
            QueryProcess::AppendRemovingLeadingQuestionMark,
        ),
    );
    domain.redirects.insert(
        "plain".into(),
        target("https://a.test/plain", false, QueryProcess::None),
    );

    let mut settings = ServiceSetting {
        global_management_key: GLOBAL_KEY.into(),
        default_target: target("https://fallback.test/", false, QueryProcess::None),
        ..Default::default()
    };
    settings.domains.insert("example.com".into(), domain);
    settings
        .aliases
        .insert("www.example.com".into(), "example.com".into());
    settings
}

pub fn sample_config() -> AppConfig {
    AppConfig {
        settings: sample_settings(),
        ..Default::default()
    }
}

/// Build a GET request for `host` and `path_and_query`.
#[allow(dead_code)]
pub fn get(host: &str, path_and_query: &str) -> Request<Body> {
    Request::builder()
        .uri(path_and_query)
        .header("host", host)
        .body(Body::empty())
        .unwrap()
}

#[allow(dead_code)]
pub fn location<B>(response: &Response<B>) -> Option<&str> {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
}

#[allow(dead_code)]
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// A running server on an ephemeral port.
#[allow(dead_code)]
pub struct RunningServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<AppConfig>,
}

/// Start a server on 127.0.0.1 with an ephemeral port.
#[allow(dead_code)]
pub async fn start_server(config: AppConfig) -> RunningServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    RunningServer {
        addr,
        shutdown,
        config_updates,
    }
}

/// An HTTP client that does not follow redirects.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

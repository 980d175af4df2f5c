//! End-to-end tests against a server bound to a real socket.

mod common;

use std::time::Duration;

use common::*;
use short_url::settings::QueryProcess;

#[tokio::test]
async fn test_redirect_over_the_wire() {
    let server = start_server(sample_config()).await;
    let client = client();

    let response = client
        .get(format!("http://{}/abc?q=1", server.addr))
        .header("host", "example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 302);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "https://a.test/x?q=1"
    );

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_settings_reload_applies_without_restart() {
    let server = start_server(sample_config()).await;
    let client = client();
    let url = format!("http://{}/new", server.addr);

    let response = client
        .get(&url)
        .header("host", "example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("location").unwrap(),
        "https://example.com/home"
    );

    let mut config = sample_config();
    config
        .settings
        .domains
        .get_mut("example.com")
        .unwrap()
        .redirects
        .insert("new".into(), target("https://new.test/", true, QueryProcess::None));
    server.config_updates.send(config).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let response = client
        .get(&url)
        .header("host", "example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 301);
    assert_eq!(response.headers().get("location").unwrap(), "https://new.test/");

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let server = start_server(sample_config()).await;
    let addr = server.addr;

    server.shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let result = client()
        .get(format!("http://{addr}/abc"))
        .timeout(Duration::from_secs(2))
        .send()
        .await;
    assert!(result.is_err());
}

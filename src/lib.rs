//! Short URL redirect service library.
//!
//! Resolves each request's (host, access key) pair into a management
//! invocation or a redirect, against a hot-swappable settings snapshot.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod management;
pub mod observability;
pub mod routing;
pub mod settings;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use settings::{DomainSetting, QueryProcess, RedirectTarget, ServiceSetting, SettingsStore};

//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatch handler on every path
//! - Wire up middleware (request ID, tracing, timeout, concurrency limit)
//! - Resolve each request against one settings snapshot
//! - Invoke management handlers behind the 500 boundary
//! - Write redirects with the merged query string
//! - Swap in settings from config reloads

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::request::{
    extract_access_key, extract_host, raw_query_string, request_id, UuidRequestId, X_REQUEST_ID,
};
use crate::http::response::{emit, redirect, OtherResult};
use crate::management::{ManagementError, ManagementHandler, ManagementRequest, SettingsManager};
use crate::observability::metrics;
use crate::routing::{compose, route, Decision};
use crate::settings::SettingsStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<SettingsStore>,
    pub management: Arc<dyn ManagementHandler>,
}

/// HTTP server for the redirect service.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    settings: Arc<SettingsStore>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and the
    /// store-backed management commands.
    pub fn new(config: AppConfig) -> Self {
        let settings = Arc::new(SettingsStore::new(config.settings.clone()));
        let management = Arc::new(SettingsManager::new(settings.clone()));
        Self::with_management(config, settings, management)
    }

    /// Create a server with a custom management handler.
    pub fn with_management(
        config: AppConfig,
        settings: Arc<SettingsStore>,
        management: Arc<dyn ManagementHandler>,
    ) -> Self {
        let state = AppState {
            settings: settings.clone(),
            management,
        };
        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            settings,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: &AppConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state)
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configs received on `config_updates` replace the settings snapshot.
    /// The server stops gracefully once `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<AppConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            domains = self.config.settings.domains.len(),
            aliases = self.config.settings.aliases.len(),
            "HTTP server starting"
        );

        let settings = self.settings.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                tracing::info!(
                    domains = config.settings.domains.len(),
                    aliases = config.settings.aliases.len(),
                    "Applying reloaded settings; listener changes need a restart"
                );
                settings.replace(config.settings);
                metrics::record_settings_reload("applied");
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get the router, e.g. to drive it in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get the shared settings store.
    pub fn settings(&self) -> Arc<SettingsStore> {
        self.settings.clone()
    }
}

/// Main dispatch handler.
/// Routes the request, then either invokes management or redirects.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let (parts, _body) = request.into_parts();
    let request_id = request_id(&parts.headers);

    let settings = state.settings.snapshot();
    let host = extract_host(&parts.headers, &parts.uri, settings.prefer_x_forwarded_host);
    let access_key = extract_access_key(&parts.uri);

    let decision = match route(&host, access_key.as_deref(), &settings) {
        Ok(decision) => decision,
        Err(e) => {
            tracing::error!(request_id = %request_id, host = %host, error = %e, "Routing failed");
            let response = emit(OtherResult::internal_error());
            metrics::record_request("routing_error", response.status().as_u16(), start_time);
            return response;
        }
    };
    let outcome = decision.outcome();

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        host = %host,
        outcome,
        "Request resolved"
    );

    let response = match decision {
        Decision::InvokeGlobalManagement => {
            let management_request = ManagementRequest::from_parts(&parts);
            let result = guard_management(
                "global",
                request_id,
                state.management.global_manage(&management_request),
            );
            emit(result)
        }
        Decision::InvokeDomainManagement { host: domain_host, domain } => {
            let management_request = ManagementRequest::from_parts(&parts);
            let result = guard_management(
                "domain",
                request_id,
                state
                    .management
                    .domain_manage(&management_request, domain_host, domain),
            );
            emit(result)
        }
        Decision::Redirect { target, .. } => {
            let location = compose(target, &raw_query_string(&parts.uri));
            match redirect(&location, target.permanent) {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(request_id = %request_id, host = %host, error = %e, "Redirect failed");
                    emit(OtherResult::internal_error())
                }
            }
        }
    };

    metrics::record_request(outcome, response.status().as_u16(), start_time);
    response
}

/// Management boundary: any handler error becomes a bare 500.
fn guard_management(
    scope: &'static str,
    request_id: &str,
    result: Result<OtherResult, ManagementError>,
) -> OtherResult {
    match result {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(request_id = %request_id, scope, error = %e, "Management command failed");
            metrics::record_management_failure(scope);
            OtherResult::internal_error()
        }
    }
}

//! Management subsystem.
//!
//! # Data Flow
//! ```text
//! Decision::InvokeGlobalManagement / InvokeDomainManagement
//!     → ManagementHandler (global.rs / domain.rs command sets)
//!     → SettingsStore::update (copy-on-write snapshot swap)
//!     → Result<OtherResult, ManagementError>
//!     → server boundary: Err(_) → fixed 500, no content
//! ```
//!
//! # Design Decisions
//! - Commands are selected by the `operation` query parameter
//! - Client mistakes the handler can name (unknown operation, conflicts)
//!   are answered with a result; anything else is an error for the boundary
//! - Mutations are validated on the copy before it is published

pub mod domain;
pub mod global;

use std::sync::Arc;

use axum::http::request::Parts;

use crate::http::request::QueryParameters;
use crate::http::response::OtherResult;
use crate::routing::check_target;
use crate::settings::{DomainSetting, QueryProcess, RedirectTarget, SettingsStore, UnknownQueryProcess};

/// Errors raised by management commands.
#[derive(Debug, thiserror::Error)]
pub enum ManagementError {
    #[error("missing required parameter `{0}`")]
    MissingParameter(&'static str),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<UnknownQueryProcess> for ManagementError {
    fn from(e: UnknownQueryProcess) -> Self {
        ManagementError::InvalidParameter {
            name: "query",
            reason: e.to_string(),
        }
    }
}

/// The parts of a request management commands may read.
#[derive(Debug, Clone)]
pub struct ManagementRequest {
    pub parameters: QueryParameters,
}

impl ManagementRequest {
    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            parameters: QueryParameters::from_uri(&parts.uri),
        }
    }

    /// Selected command; `status` when absent.
    pub fn operation(&self) -> &str {
        self.parameters.text("operation").unwrap_or("status")
    }

    /// First value of a required parameter.
    pub fn required(&self, name: &'static str) -> Result<&str, ManagementError> {
        self.parameters
            .text(name)
            .ok_or(ManagementError::MissingParameter(name))
    }

    /// First value of a required parameter that must not be empty.
    pub fn required_non_empty(&self, name: &'static str) -> Result<&str, ManagementError> {
        match self.required(name)? {
            "" => Err(ManagementError::InvalidParameter {
                name,
                reason: "must not be empty".to_string(),
            }),
            value => Ok(value),
        }
    }

    /// Redirect target from `target`, `permanent` and `query`.
    pub fn redirect_target(&self) -> Result<RedirectTarget, ManagementError> {
        let query_process = match self.parameters.text("query") {
            Some(value) => value.parse()?,
            None => QueryProcess::None,
        };
        Ok(RedirectTarget::new(
            self.required("target")?,
            self.parameters.boolean("permanent"),
            query_process,
        ))
    }
}

/// Management command handlers invoked by the dispatch handler.
///
/// Any `Err` is converted by the caller into a 500 with no content.
pub trait ManagementHandler: Send + Sync {
    fn global_manage(&self, request: &ManagementRequest) -> Result<OtherResult, ManagementError>;

    /// `host` is the resolved host key `domain` is registered under.
    fn domain_manage(
        &self,
        request: &ManagementRequest,
        host: &str,
        domain: &DomainSetting,
    ) -> Result<OtherResult, ManagementError>;
}

/// Management commands backed by the shared [`SettingsStore`].
#[derive(Debug, Clone)]
pub struct SettingsManager {
    store: Arc<SettingsStore>,
}

impl SettingsManager {
    pub fn new(store: Arc<SettingsStore>) -> Self {
        Self { store }
    }
}

impl ManagementHandler for SettingsManager {
    fn global_manage(&self, request: &ManagementRequest) -> Result<OtherResult, ManagementError> {
        global::handle(&self.store, request)
    }

    fn domain_manage(
        &self,
        request: &ManagementRequest,
        host: &str,
        domain: &DomainSetting,
    ) -> Result<OtherResult, ManagementError> {
        domain::handle(&self.store, request, host, domain)
    }
}

/// Reject a target that cannot be redirected to with a 400.
fn accept_target(target: &RedirectTarget) -> Result<(), OtherResult> {
    check_target(target).map_err(|e| OtherResult::text(400, e.to_string()))
}

fn unknown_operation(operation: &str) -> OtherResult {
    OtherResult::text(400, format!("unknown operation `{operation}`"))
}

/// Run a settings mutation whose closure may reject the change with a result.
fn mutate<F>(store: &SettingsStore, apply: F) -> Result<OtherResult, ManagementError>
where
    F: FnOnce(&mut crate::settings::ServiceSetting) -> Result<(), OtherResult>,
{
    match store.update(apply) {
        Ok(()) => Ok(OtherResult::json(&serde_json::json!({ "ok": true }))?),
        Err(rejected) => Ok(rejected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(query: &str) -> ManagementRequest {
        ManagementRequest {
            parameters: QueryParameters::from_uri(&format!("/k?{query}").parse().unwrap()),
        }
    }

    #[test]
    fn test_operation_defaults_to_status() {
        assert_eq!(request("").operation(), "status");
        assert_eq!(request("operation=list-domains").operation(), "list-domains");
    }

    #[test]
    fn test_required_parameters() {
        let req = request("domain=&key=k");
        assert_eq!(req.required("key").unwrap(), "k");
        assert!(matches!(
            req.required("alias"),
            Err(ManagementError::MissingParameter("alias"))
        ));
        assert!(matches!(
            req.required_non_empty("domain"),
            Err(ManagementError::InvalidParameter { name: "domain", .. })
        ));
    }

    #[test]
    fn test_redirect_target_parameters() {
        let req = request("target=https%3A%2F%2Fa.test%2Fx&permanent=1&query=append-directly");
        assert_eq!(
            req.redirect_target().unwrap(),
            RedirectTarget::new("https://a.test/x", true, QueryProcess::AppendDirectly)
        );

        let req = request("target=https%3A%2F%2Fa.test%2Fx&query=sideways");
        assert!(matches!(
            req.redirect_target(),
            Err(ManagementError::InvalidParameter { name: "query", .. })
        ));

        let req = request("permanent=1");
        assert!(matches!(
            req.redirect_target(),
            Err(ManagementError::MissingParameter("target"))
        ));
    }

    #[test]
    fn test_accept_target() {
        assert!(accept_target(&RedirectTarget::new("https://a.test/", false, QueryProcess::None)).is_ok());
        let rejected = accept_target(&RedirectTarget::new("nowhere", false, QueryProcess::None))
            .unwrap_err();
        assert_eq!(rejected.status_code, 400);
    }
}

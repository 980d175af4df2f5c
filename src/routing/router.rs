//! Request classification.
//!
//! # Responsibilities
//! - Decide between global management, domain management and redirect
//! - Apply host aliases before domain lookup
//! - Pick the redirect record, the domain default or the global default
//!
//! # Design Decisions
//! - Global management is matched on the literal (unaliased) host
//! - Domains are matched on the alias-resolved host
//! - Decisions borrow from the snapshot; nothing is cloned per request

use subtle::ConstantTimeEq;

use crate::routing::alias::resolve_alias;
use crate::routing::RoutingError;
use crate::settings::{DomainSetting, RedirectTarget, ServiceSetting};

/// Which rule produced a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectSource {
    /// A redirect record of the matched domain.
    Record,
    /// The matched domain's default target.
    DomainDefault,
    /// The service-wide default target.
    GlobalDefault,
}

impl RedirectSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectSource::Record => "record",
            RedirectSource::DomainDefault => "domain_default",
            RedirectSource::GlobalDefault => "global_default",
        }
    }
}

/// Outcome of routing one request.
#[derive(Debug, PartialEq)]
pub enum Decision<'a> {
    InvokeGlobalManagement,
    InvokeDomainManagement {
        /// Resolved host key the domain is registered under.
        host: &'a str,
        domain: &'a DomainSetting,
    },
    Redirect {
        target: &'a RedirectTarget,
        source: RedirectSource,
    },
}

impl Decision<'_> {
    /// Short label for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Decision::InvokeGlobalManagement => "global_management",
            Decision::InvokeDomainManagement { .. } => "domain_management",
            Decision::Redirect { source, .. } => source.as_str(),
        }
    }
}

/// Classify `(host, access_key)` against `settings`.
pub fn route<'a>(
    host: &'a str,
    access_key: Option<&str>,
    settings: &'a ServiceSetting,
) -> Result<Decision<'a>, RoutingError> {
    if keys_match(access_key, &settings.global_management_key)
        && settings.global_management_enabled_for(host)
    {
        return Ok(Decision::InvokeGlobalManagement);
    }

    let resolved = resolve_alias(host, &settings.aliases)?;

    let Some((domain_host, domain)) = settings.domains.get_key_value(resolved) else {
        return Ok(Decision::Redirect {
            target: &settings.default_target,
            source: RedirectSource::GlobalDefault,
        });
    };

    if keys_match(access_key, &domain.management_key) {
        return Ok(Decision::InvokeDomainManagement {
            host: domain_host,
            domain,
        });
    }

    match access_key.and_then(|key| domain.redirects.get(key)) {
        Some(target) => Ok(Decision::Redirect {
            target,
            source: RedirectSource::Record,
        }),
        None => Ok(Decision::Redirect {
            target: &domain.default_target,
            source: RedirectSource::DomainDefault,
        }),
    }
}

/// Exact, case-sensitive comparison. A missing key matches nothing.
fn keys_match(candidate: Option<&str>, expected: &str) -> bool {
    candidate.is_some_and(|candidate| candidate.as_bytes().ct_eq(expected.as_bytes()).into())
}

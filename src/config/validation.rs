//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every redirect target is usable with its query policy
//! - Reject alias cycles and over-long alias chains
//! - Reject keys and hosts that make a record or a domain unreachable
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::AppConfig;
use crate::routing::{check_target, resolve_alias, RoutingError};
use crate::settings::ServiceSetting;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("listener.max_connections must be greater than zero")]
    MaxConnections,

    #[error("timeouts.request_secs must be greater than zero")]
    RequestTimeout,

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),

    #[error("settings.global_management_key must not be empty")]
    EmptyGlobalManagementKey,

    #[error("domain `{0}` has an empty management_key")]
    EmptyDomainManagementKey(String),

    #[error("domain `{0}` has a redirect record under its management_key")]
    ManagementKeyShadowsRedirect(String),

    #[error("`{0}` is both an alias and a domain; the domain is unreachable")]
    AliasShadowsDomain(String),

    #[error("{location}: {source}")]
    Target {
        location: String,
        source: RoutingError,
    },

    #[error("alias `{alias}`: {source}")]
    Alias { alias: String, source: RoutingError },
}

/// Validate a whole configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::MaxConnections);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if let Err(settings_errors) = validate_settings(&config.settings) {
        errors.extend(settings_errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate redirect settings.
pub fn validate_settings(settings: &ServiceSetting) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.global_management_key.is_empty() {
        errors.push(ValidationError::EmptyGlobalManagementKey);
    }

    for (host, domain) in &settings.domains {
        if domain.management_key.is_empty() {
            errors.push(ValidationError::EmptyDomainManagementKey(host.clone()));
        }
        if domain.redirects.contains_key(&domain.management_key) {
            errors.push(ValidationError::ManagementKeyShadowsRedirect(host.clone()));
        }
        if settings.aliases.contains_key(host) {
            errors.push(ValidationError::AliasShadowsDomain(host.clone()));
        }
    }

    for (location, target) in settings.targets() {
        if let Err(source) = check_target(target) {
            errors.push(ValidationError::Target { location, source });
        }
    }

    for alias in settings.aliases.keys() {
        if let Err(source) = resolve_alias(alias, &settings.aliases) {
            errors.push(ValidationError::Alias {
                alias: alias.clone(),
                source,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

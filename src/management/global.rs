//! Global management commands.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::http::response::OtherResult;
use crate::management::{accept_target, mutate, unknown_operation, ManagementError, ManagementRequest};
use crate::routing::resolve_alias;
use crate::settings::{DomainSetting, RedirectTarget, SettingsStore};

#[derive(Serialize)]
struct ServiceStatus {
    version: &'static str,
    domains: usize,
    aliases: usize,
    enabled_hosts: usize,
}

#[derive(Serialize)]
struct DomainSummary<'a> {
    host: &'a str,
    management_key: &'a str,
    redirects: usize,
    default_target: &'a RedirectTarget,
}

pub(super) fn handle(
    store: &SettingsStore,
    request: &ManagementRequest,
) -> Result<OtherResult, ManagementError> {
    match request.operation() {
        "status" => status(store),
        "list-domains" => list_domains(store),
        "add-domain" => add_domain(store, request),
        "remove-domain" => remove_domain(store, request),
        "set-domain-key" => set_domain_key(store, request),
        "list-aliases" => list_aliases(store),
        "add-alias" => add_alias(store, request),
        "remove-alias" => remove_alias(store, request),
        "set-default" => set_default(store, request),
        "list-enabled-hosts" => list_enabled_hosts(store),
        "add-enabled-host" => add_enabled_host(store, request),
        "remove-enabled-host" => remove_enabled_host(store, request),
        other => Ok(unknown_operation(other)),
    }
}

fn status(store: &SettingsStore) -> Result<OtherResult, ManagementError> {
    let settings = store.snapshot();
    Ok(OtherResult::json(&ServiceStatus {
        version: env!("CARGO_PKG_VERSION"),
        domains: settings.domains.len(),
        aliases: settings.aliases.len(),
        enabled_hosts: settings.global_management_enabled_hosts.len(),
    })?)
}

fn list_domains(store: &SettingsStore) -> Result<OtherResult, ManagementError> {
    let settings = store.snapshot();
    let mut domains: Vec<DomainSummary<'_>> = settings
        .domains
        .iter()
        .map(|(host, domain)| DomainSummary {
            host,
            management_key: &domain.management_key,
            redirects: domain.redirects.len(),
            default_target: &domain.default_target,
        })
        .collect();
    domains.sort_by_key(|d| d.host);
    Ok(OtherResult::json(&domains)?)
}

fn add_domain(store: &SettingsStore, request: &ManagementRequest) -> Result<OtherResult, ManagementError> {
    let host = request.required_non_empty("domain")?;
    let management_key = request.required_non_empty("key")?;
    let default_target = request.redirect_target()?;

    mutate(store, |settings| {
        if settings.domains.contains_key(host) {
            return Err(OtherResult::text(409, format!("domain `{host}` already exists")));
        }
        if settings.aliases.contains_key(host) {
            return Err(OtherResult::text(
                409,
                format!("`{host}` is an alias and would hide the domain"),
            ));
        }
        accept_target(&default_target)?;
        settings.domains.insert(
            host.to_string(),
            DomainSetting {
                management_key: management_key.to_string(),
                redirects: Default::default(),
                default_target,
            },
        );
        tracing::info!(domain = %host, "Domain added");
        Ok(())
    })
}

fn remove_domain(store: &SettingsStore, request: &ManagementRequest) -> Result<OtherResult, ManagementError> {
    let host = request.required("domain")?;
    mutate(store, |settings| {
        settings
            .domains
            .remove(host)
            .ok_or_else(|| OtherResult::text(404, format!("domain `{host}` not found")))?;
        tracing::info!(domain = %host, "Domain removed");
        Ok(())
    })
}

fn set_domain_key(store: &SettingsStore, request: &ManagementRequest) -> Result<OtherResult, ManagementError> {
    let host = request.required("domain")?;
    let management_key = request.required_non_empty("key")?;
    mutate(store, |settings| {
        let domain = settings
            .domains
            .get_mut(host)
            .ok_or_else(|| OtherResult::text(404, format!("domain `{host}` not found")))?;
        if domain.redirects.contains_key(management_key) {
            return Err(OtherResult::text(
                409,
                "management key must differ from every redirect key of the domain",
            ));
        }
        domain.management_key = management_key.to_string();
        tracing::info!(domain = %host, "Domain management key changed");
        Ok(())
    })
}

fn list_aliases(store: &SettingsStore) -> Result<OtherResult, ManagementError> {
    let settings = store.snapshot();
    let aliases: BTreeMap<&str, &str> = settings
        .aliases
        .iter()
        .map(|(alias, target)| (alias.as_str(), target.as_str()))
        .collect();
    Ok(OtherResult::json(&aliases)?)
}

fn add_alias(store: &SettingsStore, request: &ManagementRequest) -> Result<OtherResult, ManagementError> {
    let alias = request.required_non_empty("alias")?;
    let target = request.required_non_empty("target")?;
    mutate(store, |settings| {
        if settings.aliases.contains_key(alias) {
            return Err(OtherResult::text(409, format!("alias `{alias}` already exists")));
        }
        if settings.domains.contains_key(alias) {
            return Err(OtherResult::text(
                409,
                format!("`{alias}` is a domain and would be hidden by the alias"),
            ));
        }
        settings.aliases.insert(alias.to_string(), target.to_string());
        // The new hop can push a chain ending at `alias` over the limit.
        for host in settings.aliases.keys() {
            if let Err(e) = resolve_alias(host, &settings.aliases) {
                return Err(OtherResult::text(409, e.to_string()));
            }
        }
        tracing::info!(alias = %alias, target = %target, "Alias added");
        Ok(())
    })
}

fn remove_alias(store: &SettingsStore, request: &ManagementRequest) -> Result<OtherResult, ManagementError> {
    let alias = request.required("alias")?;
    mutate(store, |settings| {
        settings
            .aliases
            .remove(alias)
            .ok_or_else(|| OtherResult::text(404, format!("alias `{alias}` not found")))?;
        tracing::info!(alias = %alias, "Alias removed");
        Ok(())
    })
}

fn set_default(store: &SettingsStore, request: &ManagementRequest) -> Result<OtherResult, ManagementError> {
    let target = request.redirect_target()?;
    mutate(store, |settings| {
        accept_target(&target)?;
        tracing::info!(query_process = %target.query_process, "Global default target changed");
        settings.default_target = target;
        Ok(())
    })
}

fn list_enabled_hosts(store: &SettingsStore) -> Result<OtherResult, ManagementError> {
    let settings = store.snapshot();
    let mut hosts: Vec<&str> = settings
        .global_management_enabled_hosts
        .iter()
        .map(String::as_str)
        .collect();
    hosts.sort_unstable();
    Ok(OtherResult::json(&hosts)?)
}

fn add_enabled_host(store: &SettingsStore, request: &ManagementRequest) -> Result<OtherResult, ManagementError> {
    let host = request.required_non_empty("host")?;
    mutate(store, |settings| {
        settings
            .global_management_enabled_hosts
            .insert(host.to_string());
        tracing::info!(host = %host, "Global management enabled host added");
        Ok(())
    })
}

fn remove_enabled_host(store: &SettingsStore, request: &ManagementRequest) -> Result<OtherResult, ManagementError> {
    let host = request.required("host")?;
    let force = request.parameters.boolean("force");
    mutate(store, |settings| {
        if !settings.global_management_enabled_hosts.remove(host) {
            return Err(OtherResult::text(404, format!("host `{host}` not enabled")));
        }
        if settings.global_management_enabled_hosts.is_empty() {
            // An empty list allows every host.
            if !force {
                return Err(OtherResult::text(
                    409,
                    format!("`{host}` is the last enabled host; pass force=1 to allow every host"),
                ));
            }
            tracing::warn!("Global management enabled host list is empty; every host is now allowed");
        }
        tracing::info!(host = %host, "Global management enabled host removed");
        Ok(())
    })
}

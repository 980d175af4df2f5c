//! Domain management commands.
//!
//! Commands act on the domain registered under the resolved host key. The
//! `domain` argument is the snapshot the request was routed with; mutations
//! re-read the domain from the store so concurrent changes are not lost.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::http::response::OtherResult;
use crate::management::{accept_target, mutate, unknown_operation, ManagementError, ManagementRequest};
use crate::settings::{DomainSetting, RedirectTarget, ServiceSetting, SettingsStore};

#[derive(Serialize)]
struct DomainStatus<'a> {
    host: &'a str,
    redirects: usize,
    default_target: &'a RedirectTarget,
}

pub(super) fn handle(
    store: &SettingsStore,
    request: &ManagementRequest,
    host: &str,
    domain: &DomainSetting,
) -> Result<OtherResult, ManagementError> {
    match request.operation() {
        "status" => Ok(OtherResult::json(&DomainStatus {
            host,
            redirects: domain.redirects.len(),
            default_target: &domain.default_target,
        })?),
        "list-redirects" => list_redirects(domain),
        "set-redirect" => set_redirect(store, request, host),
        "remove-redirect" => remove_redirect(store, request, host),
        "set-default" => set_default(store, request, host),
        other => Ok(unknown_operation(other)),
    }
}

fn list_redirects(domain: &DomainSetting) -> Result<OtherResult, ManagementError> {
    let redirects: BTreeMap<&str, &RedirectTarget> = domain
        .redirects
        .iter()
        .map(|(key, target)| (key.as_str(), target))
        .collect();
    Ok(OtherResult::json(&redirects)?)
}

/// The live domain for `host`, or a 404 if it was removed meanwhile.
fn live_domain<'a>(
    settings: &'a mut ServiceSetting,
    host: &str,
) -> Result<&'a mut DomainSetting, OtherResult> {
    settings
        .domains
        .get_mut(host)
        .ok_or_else(|| OtherResult::text(404, format!("domain `{host}` not found")))
}

fn set_redirect(
    store: &SettingsStore,
    request: &ManagementRequest,
    host: &str,
) -> Result<OtherResult, ManagementError> {
    let key = request.required("key")?;
    let target = request.redirect_target()?;

    mutate(store, |settings| {
        let domain = live_domain(settings, host)?;
        if key == domain.management_key {
            return Err(OtherResult::text(
                409,
                "redirect key must differ from the domain management key",
            ));
        }
        accept_target(&target)?;
        tracing::info!(
            domain = %host,
            permanent = target.permanent,
            query_process = %target.query_process,
            "Redirect record set"
        );
        domain.redirects.insert(key.to_string(), target);
        Ok(())
    })
}

fn remove_redirect(
    store: &SettingsStore,
    request: &ManagementRequest,
    host: &str,
) -> Result<OtherResult, ManagementError> {
    let key = request.required("key")?;
    mutate(store, |settings| {
        live_domain(settings, host)?
            .redirects
            .remove(key)
            .ok_or_else(|| OtherResult::text(404, "redirect record not found"))?;
        tracing::info!(domain = %host, "Redirect record removed");
        Ok(())
    })
}

fn set_default(
    store: &SettingsStore,
    request: &ManagementRequest,
    host: &str,
) -> Result<OtherResult, ManagementError> {
    let target = request.redirect_target()?;
    mutate(store, |settings| {
        accept_target(&target)?;
        let domain = live_domain(settings, host)?;
        tracing::info!(
            domain = %host,
            query_process = %target.query_process,
            "Domain default target changed"
        );
        domain.default_target = target;
        Ok(())
    })
}

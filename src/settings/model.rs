//! Redirect settings data model.
//!
//! All types derive Serde traits so the same structures are used for the
//! `[settings]` table of the config file and for management responses.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the incoming query string is merged into a redirect target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryProcess {
    /// Drop the incoming query string.
    #[default]
    None,
    /// Append the raw query string, leading `?` included.
    AppendDirectly,
    /// Append after `&`, with the leading `?` removed.
    AppendRemovingLeadingQuestionMark,
}

impl QueryProcess {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryProcess::None => "none",
            QueryProcess::AppendDirectly => "append-directly",
            QueryProcess::AppendRemovingLeadingQuestionMark => {
                "append-removing-leading-question-mark"
            }
        }
    }
}

impl fmt::Display for QueryProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown query process `{0}`")]
pub struct UnknownQueryProcess(pub String);

impl FromStr for QueryProcess {
    type Err = UnknownQueryProcess;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(QueryProcess::None),
            "append-directly" => Ok(QueryProcess::AppendDirectly),
            "append-removing-leading-question-mark" => {
                Ok(QueryProcess::AppendRemovingLeadingQuestionMark)
            }
            other => Err(UnknownQueryProcess(other.to_string())),
        }
    }
}

/// A redirect destination.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct RedirectTarget {
    /// Absolute URL sent in the `Location` header.
    pub target: String,

    /// 301 when true, 302 otherwise.
    #[serde(default)]
    pub permanent: bool,

    /// Query string merge policy.
    #[serde(default)]
    pub query_process: QueryProcess,
}

impl RedirectTarget {
    pub fn new(target: impl Into<String>, permanent: bool, query_process: QueryProcess) -> Self {
        Self {
            target: target.into(),
            permanent,
            query_process,
        }
    }
}

/// Settings of one served domain.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DomainSetting {
    /// Access key that opens domain management.
    pub management_key: String,

    /// Access key → redirect target.
    pub redirects: HashMap<String, RedirectTarget>,

    /// Target used when no redirect record matches.
    pub default_target: RedirectTarget,
}

/// Process-wide redirect settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceSetting {
    /// Access key that opens global management.
    pub global_management_key: String,

    /// Hosts allowed to open global management. Empty allows every host.
    pub global_management_enabled_hosts: HashSet<String>,

    /// Host rewrites applied before domain lookup.
    pub aliases: HashMap<String, String>,

    /// Served domains keyed by host key.
    pub domains: HashMap<String, DomainSetting>,

    /// Target used for unknown hosts.
    pub default_target: RedirectTarget,

    /// Use `X-Forwarded-Host` over `Host` when present.
    pub prefer_x_forwarded_host: bool,
}

impl ServiceSetting {
    /// Whether global management may be opened through `host` (the unaliased host key).
    pub fn global_management_enabled_for(&self, host: &str) -> bool {
        self.global_management_enabled_hosts.is_empty()
            || self.global_management_enabled_hosts.contains(host)
    }

    /// Every redirect target in the settings, labelled by where it lives.
    pub fn targets(&self) -> impl Iterator<Item = (String, &RedirectTarget)> {
        let global = std::iter::once(("settings.default_target".to_string(), &self.default_target));
        let domains = self.domains.iter().flat_map(|(host, domain)| {
            std::iter::once((format!("domain `{host}` default_target"), &domain.default_target))
                .chain(domain.redirects.iter().map(move |(key, target)| {
                    (format!("domain `{host}` redirect `{key}`"), target)
                }))
        });
        global.chain(domains)
    }
}

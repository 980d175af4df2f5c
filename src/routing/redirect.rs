//! Redirect URL composition.
//!
//! The raw query string is handled as received (`?` included) and never
//! re-encoded. Whether a target can take the merged query is checked once,
//! when settings are loaded or changed, by [`check_target`].

use std::borrow::Cow;

use url::Url;

use crate::routing::RoutingError;
use crate::settings::{QueryProcess, RedirectTarget};

/// Build the final redirect URL for `target` given the raw query string.
pub fn compose<'a>(target: &'a RedirectTarget, raw_query: &str) -> Cow<'a, str> {
    if raw_query.is_empty() {
        return Cow::Borrowed(&target.target);
    }

    match target.query_process {
        QueryProcess::None => Cow::Borrowed(&target.target),
        QueryProcess::AppendDirectly => Cow::Owned(format!("{}{}", target.target, raw_query)),
        QueryProcess::AppendRemovingLeadingQuestionMark => {
            let query = raw_query.strip_prefix('?').unwrap_or(raw_query);
            Cow::Owned(format!("{}&{}", target.target, query))
        }
    }
}

/// Verify that `target` is an absolute URL whose shape suits its query policy.
///
/// `AppendDirectly` needs a target without query or fragment;
/// `AppendRemovingLeadingQuestionMark` needs an existing query and no fragment.
pub fn check_target(target: &RedirectTarget) -> Result<(), RoutingError> {
    let malformed = |reason: &str| RoutingError::MalformedRedirectTarget {
        target: target.target.clone(),
        reason: reason.to_string(),
    };

    let url = Url::parse(&target.target).map_err(|e| malformed(&e.to_string()))?;

    match target.query_process {
        QueryProcess::None => Ok(()),
        QueryProcess::AppendDirectly if url.query().is_some() => {
            Err(malformed("append-directly target already has a query component"))
        }
        QueryProcess::AppendRemovingLeadingQuestionMark if url.query().is_none() => Err(malformed(
            "append-removing-leading-question-mark target has no query component to extend",
        )),
        _ if url.fragment().is_some() => {
            Err(malformed("query merging target must not have a fragment"))
        }
        _ => Ok(()),
    }
}

//! Host alias resolution.

use std::collections::HashMap;

use crate::routing::RoutingError;

/// Maximum number of alias rewrites followed for one host.
pub const MAX_ALIAS_HOPS: usize = 32;

/// Follow `aliases` from `host` until a key without an alias entry is reached.
///
/// Fails with [`RoutingError::AliasCycleOrTooLong`] once more than
/// [`MAX_ALIAS_HOPS`] rewrites would be needed.
pub fn resolve_alias<'a>(
    host: &'a str,
    aliases: &'a HashMap<String, String>,
) -> Result<&'a str, RoutingError> {
    let mut current = host;
    for _ in 0..MAX_ALIAS_HOPS {
        match aliases.get(current) {
            Some(next) => current = next,
            None => return Ok(current),
        }
    }

    if aliases.contains_key(current) {
        Err(RoutingError::AliasCycleOrTooLong {
            host: host.to_string(),
            limit: MAX_ALIAS_HOPS,
        })
    } else {
        Ok(current)
    }
}

//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! (host key, access key) + settings snapshot
//!     → router.rs (precedence chain)
//!         → alias.rs (bounded host rewrite, skipped for global management)
//!     → Decision: global management | domain management | redirect
//!     → redirect.rs (merge incoming query string into the target URL)
//! ```
//!
//! # Design Decisions
//! - Pure functions of their inputs; no I/O, no shared mutable state
//! - First match wins, no fallthrough once a rule matched
//! - Unknown host or key is a defined fallback, not an error
//! - Key comparison is exact and constant-time

pub mod alias;
pub mod redirect;
pub mod router;

pub use alias::{resolve_alias, MAX_ALIAS_HOPS};
pub use redirect::{check_target, compose};
pub use router::{route, Decision, RedirectSource};

/// Errors raised while resolving a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    /// Alias chain is cyclic or longer than [`MAX_ALIAS_HOPS`].
    #[error("alias chain starting at `{host}` is cyclic or longer than {limit} hops")]
    AliasCycleOrTooLong { host: String, limit: usize },

    /// A redirect target cannot be sent as-is.
    #[error("malformed redirect target `{target}`: {reason}")]
    MalformedRedirectTarget { target: String, reason: String },
}

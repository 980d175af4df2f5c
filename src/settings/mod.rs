//! Redirect settings subsystem.
//!
//! # Data Flow
//! ```text
//! config file [settings] table / management commands
//!     → model.rs (ServiceSetting, DomainSetting, RedirectTarget)
//!     → store.rs (SettingsStore, atomically swapped Arc snapshot)
//!     → one snapshot loaded per request by the dispatch handler
//! ```
//!
//! # Design Decisions
//! - Snapshots are immutable; every update builds a new value and swaps it in
//! - Writers are serialized, readers never block
//! - The routing engine only ever sees `&ServiceSetting`

pub mod model;
pub mod store;

pub use model::{DomainSetting, QueryProcess, RedirectTarget, ServiceSetting, UnknownQueryProcess};
pub use store::SettingsStore;

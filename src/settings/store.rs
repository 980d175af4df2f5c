//! Shared settings snapshot.

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;

use crate::settings::model::ServiceSetting;

/// Holds the current [`ServiceSetting`] snapshot.
///
/// Readers take an `Arc` to an immutable snapshot and keep it for the whole
/// request, so a concurrent update is never observed half-applied. Writers
/// clone the current snapshot, modify the copy and swap it in; they are
/// serialized by `write_lock` so no update is lost.
pub struct SettingsStore {
    current: ArcSwap<ServiceSetting>,
    write_lock: Mutex<()>,
}

impl SettingsStore {
    pub fn new(settings: ServiceSetting) -> Self {
        Self {
            current: ArcSwap::from_pointee(settings),
            write_lock: Mutex::new(()),
        }
    }

    /// Load the current snapshot.
    pub fn snapshot(&self) -> Arc<ServiceSetting> {
        self.current.load_full()
    }

    /// Replace the whole snapshot (config reload).
    pub fn replace(&self, settings: ServiceSetting) {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.current.store(Arc::new(settings));
    }

    /// Apply `apply` to a copy of the current snapshot and publish the copy.
    ///
    /// When `apply` returns `Err` the copy is discarded and the published
    /// snapshot is left untouched.
    pub fn update<T, E, F>(&self, apply: F) -> Result<T, E>
    where
        F: FnOnce(&mut ServiceSetting) -> Result<T, E>,
    {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut next = ServiceSetting::clone(&self.current.load());
        let output = apply(&mut next)?;
        self.current.store(Arc::new(next));
        Ok(output)
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.current.load();
        f.debug_struct("SettingsStore")
            .field("domains", &snapshot.domains.len())
            .field("aliases", &snapshot.aliases.len())
            .finish()
    }
}

//! Keyed registry of cancellable activities.
//!
//! Each key maps to at most one [`Registration`]. A registration is never
//! edited after insertion except to attach a subscription's cleanup once its
//! setup returns; supersession replaces the whole entry and hands the old one
//! back to the caller for teardown.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::AbortHandle;
use parking_lot::Mutex;

use crate::effect::{CancelFlag, CancelKey, Cleanup, EffectFamily};

/// Live entry under a cancellation key.
pub(crate) struct Registration {
    pub(crate) id: u64,
    pub(crate) family: EffectFamily,
    flag: CancelFlag,
    aborts: Vec<AbortHandle>,
    cleanup: Option<Cleanup>,
}

impl Registration {
    /// Stop the activity. Returns the subscription cleanup, if any, so the
    /// caller can run it outside the registry lock.
    pub(crate) fn teardown(mut self) -> Option<Cleanup> {
        self.flag.cancel();
        for abort in &self.aborts {
            abort.abort();
        }
        self.cleanup.take()
    }
}

/// Outcome of asking the registry to admit a new activity.
pub(crate) enum Admission {
    Registered {
        id: u64,
        flag: CancelFlag,
        superseded: Option<Registration>,
    },
    /// A throttle window is already open under the key.
    Throttled,
}

#[derive(Default)]
pub(crate) struct Registry {
    entries: Mutex<HashMap<CancelKey, Registration>>,
    next_id: AtomicU64,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert a registration for `key`, returning whatever it replaced.
    ///
    /// Throttled admissions are refused while a throttle entry holds the key.
    pub(crate) fn admit(
        &self,
        key: &CancelKey,
        family: EffectFamily,
        aborts: Vec<AbortHandle>,
    ) -> Admission {
        let mut entries = self.entries.lock();
        if family == EffectFamily::Throttled {
            if let Some(existing) = entries.get(key) {
                if existing.family == EffectFamily::Throttled {
                    return Admission::Throttled;
                }
            }
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let flag = CancelFlag::new();
        let superseded = entries.insert(
            key.clone(),
            Registration {
                id,
                family,
                flag: flag.clone(),
                aborts,
                cleanup: None,
            },
        );
        Admission::Registered {
            id,
            flag,
            superseded,
        }
    }

    pub(crate) fn remove(&self, key: &CancelKey) -> Option<Registration> {
        self.entries.lock().remove(key)
    }

    /// Remove the entry for `key` only if it is still registration `id`.
    pub(crate) fn remove_if(&self, key: &CancelKey, id: u64) -> Option<Registration> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.id == id => entries.remove(key),
            _ => None,
        }
    }

    /// Attach a subscription cleanup. Hands the cleanup back if registration
    /// `id` was superseded or cancelled while its setup ran.
    pub(crate) fn attach_cleanup(
        &self,
        key: &CancelKey,
        id: u64,
        cleanup: Cleanup,
    ) -> Result<(), Cleanup> {
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some(entry) if entry.id == id => {
                entry.cleanup = Some(cleanup);
                Ok(())
            }
            _ => Err(cleanup),
        }
    }

    pub(crate) fn drain(&self) -> Vec<(CancelKey, Registration)> {
        self.entries.lock().drain().collect()
    }

    pub(crate) fn family_of(&self, key: &str) -> Option<EffectFamily> {
        self.entries.lock().get(key).map(|entry| entry.family)
    }

    pub(crate) fn keys(&self) -> Vec<CancelKey> {
        let mut keys: Vec<_> = self.entries.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

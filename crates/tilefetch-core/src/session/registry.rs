//! Keyed session registry.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use super::SessionKey;

type Slot<S> = Arc<OnceLock<Arc<S>>>;

/// Concurrency-safe map from [`SessionKey`] to a shared session.
///
/// Each key owns a slot that is filled exactly once. The map lock is only held
/// to find or insert a slot; the session itself is built inside the slot, so a
/// slow build for one key never blocks lookups of another, and concurrent first
/// requests for the same key wait for a single build.
pub struct SessionRegistry<S> {
    slots: RwLock<HashMap<SessionKey, Slot<S>>>,
}

impl<S> Default for SessionRegistry<S> {
    fn default() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }
}

impl<S> SessionRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session for `key`, building it with `create` on first use.
    pub fn get_or_create<F>(&self, key: &SessionKey, create: F) -> Arc<S>
    where
        F: FnOnce(&SessionKey) -> S,
    {
        let slot = self.slot(key);
        let session = slot.get_or_init(|| {
            tracing::debug!(
                ca_cert_path = ?key.ca_cert_path,
                insecure = key.insecure,
                manage_cookies = key.manage_cookies,
                "creating transport session"
            );
            Arc::new(create(key))
        });
        Arc::clone(session)
    }

    /// Returns the session for `key` if one has been built.
    pub fn get(&self, key: &SessionKey) -> Option<Arc<S>> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.get(key).and_then(|slot| slot.get().cloned())
    }

    /// Number of sessions built so far.
    pub fn len(&self) -> usize {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &SessionKey) -> Slot<S> {
        {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = slots.get(key) {
                return Arc::clone(slot);
            }
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key.clone()).or_default())
    }
}

impl<S> std::fmt::Debug for SessionRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.len())
            .finish()
    }
}

//! Weak identity table: at most one live owned handle per native object.

use std::cell::RefCell;

use rustc_hash::FxHashMap;
use scriptbind_runtime::{AnyUserData, WeakUserData};

use super::handle::DeferredFinalizer;

/// Map from native object address to the weak userdata wrapping its handle.
///
/// Entries never keep a handle alive. A handle removes its own entry when it
/// is finalized; lookups also prune entries whose handle already died.
///
/// The table also queues finalizers that could not run because the host
/// held a borrow of the object when its handle died.
#[derive(Default)]
pub struct IdentityTable {
    entries: RefCell<FxHashMap<usize, WeakUserData>>,
    pending: RefCell<Vec<DeferredFinalizer>>,
}

impl IdentityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The live handle recorded for `addr`.
    pub fn get(&self, addr: usize) -> Option<AnyUserData> {
        let mut entries = self.entries.borrow_mut();
        let found = entries.get(&addr)?.upgrade();
        if found.is_none() {
            entries.remove(&addr);
        }
        found
    }

    pub fn insert(&self, addr: usize, handle: &AnyUserData) {
        self.entries.borrow_mut().insert(addr, handle.downgrade());
    }

    /// Drop the entry for `addr` unless a live handle still owns it.
    pub fn remove_if_dead(&self, addr: usize) {
        // Finalizers may run while a lookup holds the map.
        if let Ok(mut entries) = self.entries.try_borrow_mut() {
            if entries.get(&addr).is_some_and(WeakUserData::is_dead) {
                entries.remove(&addr);
            }
        }
    }

    /// Number of entries, dead ones included until pruned.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Forget entries whose handle died.
    pub fn prune(&self) {
        self.entries.borrow_mut().retain(|_, w| !w.is_dead());
    }

    pub(crate) fn defer(&self, finalizer: DeferredFinalizer) {
        self.pending.borrow_mut().push(finalizer);
    }

    /// Number of finalizers waiting for a borrow to end.
    pub fn deferred(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Run the deferred finalizers whose objects are no longer borrowed.
    ///
    /// Returns how many ran; the rest stay queued.
    pub fn run_deferred(&self) -> usize {
        let queued = std::mem::take(&mut *self.pending.borrow_mut());
        if queued.is_empty() {
            return 0;
        }
        let mut ran = 0;
        let mut still_borrowed = Vec::new();
        for pending in queued {
            match pending.try_run() {
                Ok(()) => ran += 1,
                Err(pending) => still_borrowed.push(pending),
            }
        }
        self.pending.borrow_mut().extend(still_borrowed);
        ran
    }
}

impl Drop for IdentityTable {
    fn drop(&mut self) {
        self.run_deferred();
        for pending in self.pending.get_mut().drain(..) {
            tracing::warn!(
                "dropping finalizer of '{}': object is still borrowed at teardown",
                pending.type_name()
            );
        }
    }
}

impl std::fmt::Debug for IdentityTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityTable")
            .field("entries", &self.len())
            .field("deferred", &self.deferred())
            .finish()
    }
}

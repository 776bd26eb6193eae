//! Purpose: Process-wide pool sharing one backend instance per physical file.
//! Exports: `Registry`, `Handle`.
//! Role: Guarantees at most one live backend per (kind, path) key while any
//! handle is outstanding, with reference-counted deterministic teardown.
//! Invariants: An entry exists iff its count is greater than zero.
//! Invariants: The registry lock guards only map mutation and first-time
//! construction, never steady-state backend work.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use tracing::debug;

use crate::core::backend::{Backend, BackendKind};

pub type RegistryKey = (BackendKind, PathBuf);

type SharedBackend = Arc<Mutex<Box<dyn Backend>>>;

struct Entry {
    backend: SharedBackend,
    count: usize,
}

/// Keyed instance pool. Injectable so tests can run against a fresh pool;
/// `Registry::global()` serves embedders that want the process-wide default.
pub struct Registry {
    entries: Mutex<HashMap<RegistryKey, Entry>>,
}

impl Registry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(HashMap::new()),
        })
    }

    pub fn global() -> &'static Arc<Registry> {
        static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    /// Returns a handle owning one reference-count unit for `key`.
    ///
    /// The first acquire for a key runs `factory` exactly once and publishes
    /// the fully constructed instance; racing acquirers block on the map lock
    /// and observe the finished entry.
    pub fn acquire(
        self: &Arc<Self>,
        kind: BackendKind,
        path: PathBuf,
        factory: impl FnOnce() -> Box<dyn Backend>,
    ) -> Handle {
        let key = (kind, path);
        let backend = {
            let mut entries = lock(&self.entries);
            let entry = entries.entry(key.clone()).or_insert_with(|| {
                debug!(kind = %key.0, path = %key.1.display(), "constructing shared backend");
                Entry {
                    backend: Arc::new(Mutex::new(factory())),
                    count: 0,
                }
            });
            entry.count += 1;
            Arc::clone(&entry.backend)
        };
        Handle {
            registry: Arc::clone(self),
            key,
            backend,
        }
    }

    /// Number of live shared instances; exposed for tests and diagnostics.
    pub fn instance_count(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Drops one count unit. Returns the backend for out-of-lock destruction
    /// when the count reaches zero.
    ///
    /// A release with no matching entry is a reference-count bug somewhere in
    /// the process, not a recoverable condition; it aborts loudly rather than
    /// corrupting the sharing invariant.
    fn release(&self, key: &RegistryKey) -> Option<SharedBackend> {
        let mut entries = lock(&self.entries);
        let entry = entries
            .get_mut(key)
            .expect("registry release without matching acquire");
        entry.count -= 1;
        if entry.count > 0 {
            return None;
        }
        entries.remove(key).map(|entry| entry.backend)
    }
}

/// One reference-count unit plus direct access to the shared backend.
///
/// Dropping the handle releases the unit deterministically; the last drop for
/// a key evicts the entry and closes the backend.
pub struct Handle {
    registry: Arc<Registry>,
    key: RegistryKey,
    backend: SharedBackend,
}

impl Handle {
    pub fn lock(&self) -> MutexGuard<'_, Box<dyn Backend>> {
        lock(&self.backend)
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if let Some(backend) = self.registry.release(&self.key) {
            debug!(kind = %self.key.0, path = %self.key.1.display(), "destroying shared backend");
            lock(&backend).close();
        }
    }
}

// A panicking holder must not wedge every other handle on the file.
fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

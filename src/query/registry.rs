//! Query Registry Module
//!
//! Cross-query invalidation: every query store registers an invalidate/reset
//! handle under its key, and callers broadcast invalidation over all
//! registered keys by substring match.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

// == Query Handle ==
/// Invalidate/reset callbacks for one registered query store. Handles hold
/// weak references back to the store, so a dropped store degrades to a
/// no-op rather than leaking through the registry.
pub struct QueryHandle {
    pub invalidate: Box<dyn Fn() + Send + Sync>,
    pub reset: Box<dyn Fn() + Send + Sync>,
}

// == Query Registry ==
/// Explicit registry instance, constructed at process start and injected
/// into stores; there is no process-global singleton. Stores register on
/// creation and unregister on teardown.
#[derive(Default)]
pub struct QueryRegistry {
    entries: Mutex<HashMap<String, QueryHandle>>,
}

impl QueryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, key: impl Into<String>, handle: QueryHandle) {
        let key = key.into();
        debug!(%key, "query registered");
        self.entries.lock().unwrap().insert(key, handle);
    }

    /// Removes a query's handle. Returns whether it was present.
    pub fn unregister(&self, key: &str) -> bool {
        self.entries.lock().unwrap().remove(key).is_some()
    }

    /// Invalidates every registered query whose key contains `pattern`.
    /// Returns how many queries matched.
    pub fn invalidate_matching(&self, pattern: &str) -> usize {
        let entries = self.entries.lock().unwrap();
        let mut matched = 0;
        for (key, handle) in entries.iter() {
            if key.contains(pattern) {
                (handle.invalidate)();
                matched += 1;
            }
        }
        debug!(pattern, matched, "broadcast invalidation");
        matched
    }

    /// Resets every registered query and drops all handles.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap();
        for handle in entries.values() {
            (handle.reset)();
        }
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Keys of all registered queries.
    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }
}

//! Per-key metadata: marshal mode, read-only flag, and observers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::schema::MarshalMode;

/// A change-observer callback, invoked synchronously with the new
/// application-level value after a successful `update`.
pub type Observer = Arc<dyn Fn(&Value) + Send + Sync>;

static OBSERVER_HANDLE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque handle returned by observer registration, usable for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverHandle(u64);

impl ObserverHandle {
    fn next() -> Self {
        Self(OBSERVER_HANDLE_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Metadata for one registered key.
///
/// Owned exclusively by the facade that registered the key; never
/// persisted and never shared across blackboard instances. Created on
/// `set`, destroyed on `drop` (observers cleared first) or `clear`.
pub struct MetaInfo {
    /// How values under this key are marshalled, fixed at `set` time.
    pub marshal_mode: MarshalMode,
    /// Whether `update` is rejected for this key.
    pub read_only: bool,
    observers: Vec<(ObserverHandle, Observer)>,
}

impl MetaInfo {
    /// Create metadata for a freshly registered key.
    pub fn new(marshal_mode: MarshalMode, read_only: bool) -> Self {
        Self {
            marshal_mode,
            read_only,
            observers: Vec::new(),
        }
    }

    /// Append an observer, returning its removal handle.
    pub fn add_observer(&mut self, observer: Observer) -> ObserverHandle {
        let handle = ObserverHandle::next();
        self.observers.push((handle, observer));
        handle
    }

    /// Remove the observer behind a handle. Unknown handles are a no-op.
    pub fn remove_observer(&mut self, handle: ObserverHandle) {
        self.observers.retain(|(h, _)| *h != handle);
    }

    /// Drop every observer registered for this key.
    pub fn clear_observers(&mut self) {
        self.observers.clear();
    }

    /// Invoke every observer in registration order with the new value.
    pub fn notify(&self, value: &Value) {
        for (_, observer) in &self.observers {
            observer(value);
        }
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

impl std::fmt::Debug for MetaInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaInfo")
            .field("marshal_mode", &self.marshal_mode)
            .field("read_only", &self.read_only)
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_observers_fire_in_registration_order() {
        let mut meta = MetaInfo::new(MarshalMode::None, false);
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let seen = seen.clone();
            meta.add_observer(Arc::new(move |_| seen.lock().push(tag)));
        }
        meta.notify(&Value::Null);
        assert_eq!(*seen.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_removed_observer_never_fires_again() {
        let mut meta = MetaInfo::new(MarshalMode::None, false);
        let count = Arc::new(AtomicUsize::new(0));

        let counter = count.clone();
        let handle = meta.add_observer(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        meta.notify(&Value::Null);
        meta.remove_observer(handle);
        meta.notify(&Value::Null);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // Removing an already-removed handle is a no-op, not an error.
        meta.remove_observer(handle);
    }

    #[test]
    fn test_handles_are_unique() {
        let mut meta = MetaInfo::new(MarshalMode::None, false);
        let a = meta.add_observer(Arc::new(|_| {}));
        let b = meta.add_observer(Arc::new(|_| {}));
        assert_ne!(a, b);
    }
}

//! Listener registry.
//!
//! Maps (path, event kind) to ordered callback registrations,
//! independently of cache contents. Removal is synchronous: an entry's
//! `active` flag is cleared under the registry lock, so a poll cycle that
//! already collected the entry skips it at invocation time.

use arbor_tree::{Path, Snapshot};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// The kinds of events a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The value at the path changed (or was first observed).
    Value,
    /// A child appeared under the path.
    ChildAdded,
    /// A child's value changed.
    ChildChanged,
    /// A child disappeared.
    ChildRemoved,
    /// A child's priority, and therefore its position, changed.
    ChildMoved,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Value => "value",
            EventKind::ChildAdded => "child_added",
            EventKind::ChildChanged => "child_changed",
            EventKind::ChildRemoved => "child_removed",
            EventKind::ChildMoved => "child_moved",
        };
        f.write_str(name)
    }
}

/// Unique identifier for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Handle returned by `on`, used to remove that registration again.
#[derive(Debug, Clone)]
pub struct Subscription {
    path: Path,
    kind: EventKind,
    id: ListenerId,
}

impl Subscription {
    /// Returns the listened path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the subscribed event kind.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Returns the listener's identifier.
    pub fn id(&self) -> ListenerId {
        self.id
    }
}

pub(crate) struct ListenerEntry {
    pub(crate) id: ListenerId,
    pub(crate) kind: EventKind,
    callback: Box<dyn Fn(&Snapshot) + Send + Sync>,
    active: AtomicBool,
    primed: AtomicBool,
}

impl ListenerEntry {
    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Marks the entry primed, returning whether it already was.
    pub(crate) fn mark_primed(&self) -> bool {
        self.primed.swap(true, Ordering::SeqCst)
    }

    /// Invokes the callback unless the entry was deactivated.
    pub(crate) fn invoke(&self, snapshot: &Snapshot) {
        if self.is_active() {
            (self.callback)(snapshot);
        }
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

impl fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Registry of listeners keyed by path.
///
/// Entries per path preserve registration order, which is also dispatch
/// order.
#[derive(Debug, Default)]
pub(crate) struct ListenerRegistry {
    listeners: RwLock<HashMap<Path, Vec<Arc<ListenerEntry>>>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a callback. Returns the subscription handle, the entry
    /// (for immediate synthetic dispatch), and whether this is the first
    /// listener for the path.
    pub(crate) fn add(
        &self,
        path: &Path,
        kind: EventKind,
        callback: Box<dyn Fn(&Snapshot) + Send + Sync>,
    ) -> (Subscription, Arc<ListenerEntry>, bool) {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let entry = Arc::new(ListenerEntry {
            id,
            kind,
            callback,
            active: AtomicBool::new(true),
            primed: AtomicBool::new(false),
        });

        let mut listeners = self.listeners.write();
        let entries = listeners.entry(path.clone()).or_default();
        let first = entries.is_empty();
        entries.push(Arc::clone(&entry));

        (
            Subscription {
                path: path.clone(),
                kind,
                id,
            },
            entry,
            first,
        )
    }

    /// Removes one registration. Returns true when the path has no
    /// listeners left.
    pub(crate) fn remove(&self, subscription: &Subscription) -> bool {
        self.remove_where(subscription.path(), |entry| entry.id == subscription.id)
    }

    /// Removes every registration for the path matching `kind`
    /// (all kinds when `None`). Returns true when the path has no
    /// listeners left.
    pub(crate) fn remove_matching(&self, path: &Path, kind: Option<EventKind>) -> bool {
        self.remove_where(path, |entry| kind.map_or(true, |k| entry.kind == k))
    }

    fn remove_where(&self, path: &Path, matches: impl Fn(&ListenerEntry) -> bool) -> bool {
        let mut listeners = self.listeners.write();
        let Some(entries) = listeners.get_mut(path) else {
            return true;
        };
        entries.retain(|entry| {
            if matches(entry) {
                entry.deactivate();
                false
            } else {
                true
            }
        });
        if entries.is_empty() {
            listeners.remove(path);
            true
        } else {
            false
        }
    }

    /// Returns the entries for a path in registration order.
    pub(crate) fn collect(&self, path: &Path) -> Vec<Arc<ListenerEntry>> {
        self.listeners
            .read()
            .get(path)
            .map(|entries| entries.to_vec())
            .unwrap_or_default()
    }

    /// Returns the number of listeners registered for a path.
    #[cfg(test)]
    pub(crate) fn listener_count(&self, path: &Path) -> usize {
        self.listeners
            .read()
            .get(path)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_tree::Node;
    use parking_lot::Mutex;

    fn path(raw: &str) -> Path {
        Path::parse(raw).unwrap()
    }

    fn noop() -> Box<dyn Fn(&Snapshot) + Send + Sync> {
        Box::new(|_| {})
    }

    #[test]
    fn first_listener_flag() {
        let registry = ListenerRegistry::new();
        let (_, _, first) = registry.add(&path("a"), EventKind::Value, noop());
        assert!(first);
        let (_, _, second) = registry.add(&path("a"), EventKind::ChildAdded, noop());
        assert!(!second);
        let (_, _, other_path) = registry.add(&path("b"), EventKind::Value, noop());
        assert!(other_path);
    }

    #[test]
    fn removal_by_subscription() {
        let registry = ListenerRegistry::new();
        let (sub_a, _, _) = registry.add(&path("a"), EventKind::Value, noop());
        let (_sub_b, _, _) = registry.add(&path("a"), EventKind::Value, noop());

        assert!(!registry.remove(&sub_a));
        assert_eq!(registry.listener_count(&path("a")), 1);
    }

    #[test]
    fn removal_by_kind() {
        let registry = ListenerRegistry::new();
        registry.add(&path("a"), EventKind::Value, noop());
        registry.add(&path("a"), EventKind::Value, noop());
        registry.add(&path("a"), EventKind::ChildAdded, noop());

        assert!(!registry.remove_matching(&path("a"), Some(EventKind::Value)));
        assert_eq!(registry.listener_count(&path("a")), 1);
        assert!(registry.remove_matching(&path("a"), None));
        assert_eq!(registry.listener_count(&path("a")), 0);
    }

    #[test]
    fn deactivated_entry_never_fires() {
        let registry = ListenerRegistry::new();
        let fired = Arc::new(Mutex::new(0));
        let fired_clone = Arc::clone(&fired);
        let (sub, _, _) = registry.add(
            &path("a"),
            EventKind::Value,
            Box::new(move |_| *fired_clone.lock() += 1),
        );

        // Collected before removal, invoked after: must be a no-op.
        let collected = registry.collect(&path("a"));
        registry.remove(&sub);

        let snapshot = Snapshot::new(path("a"), Some(Node::from(1i64)));
        for entry in collected {
            entry.invoke(&snapshot);
        }
        assert_eq!(*fired.lock(), 0);
    }

    #[test]
    fn dispatch_order_is_registration_order() {
        let registry = ListenerRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            registry.add(
                &path("a"),
                EventKind::Value,
                Box::new(move |_| order.lock().push(tag)),
            );
        }

        let snapshot = Snapshot::new(path("a"), Some(Node::from(1i64)));
        for entry in registry.collect(&path("a")) {
            entry.invoke(&snapshot);
        }
        assert_eq!(*order.lock(), ["first", "second", "third"]);
    }

    #[test]
    fn priming_is_per_entry() {
        let registry = ListenerRegistry::new();
        let (_, entry, _) = registry.add(&path("a"), EventKind::Value, noop());
        assert!(!entry.mark_primed());
        assert!(entry.mark_primed());
    }
}

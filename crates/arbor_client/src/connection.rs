//! Connection state simulation.
//!
//! There is no persistent connection in this client, so connectivity is
//! simulated: the flag starts false and flips to true once, after the
//! first successful fetch. It never flips back; with no connection to
//! hold, there is nothing to lose.

use arbor_tree::{Node, Path, Snapshot};
use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide (per engine) connectivity flag, surfaced at the synthetic
/// `.info/connected` path.
#[derive(Debug, Default)]
pub(crate) struct ConnectionState {
    connected: AtomicBool,
}

impl ConnectionState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Flips to connected. Returns true only for the transition, so the
    /// caller dispatches the notification exactly once.
    pub(crate) fn mark_connected(&self) -> bool {
        !self.connected.swap(true, Ordering::SeqCst)
    }

    /// Returns a snapshot of the current state at `.info/connected`.
    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot::new(Path::info_connected(), Some(Node::from(self.is_connected())))
    }
}

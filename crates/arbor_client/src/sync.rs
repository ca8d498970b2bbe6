//! The sync loop: poll scheduling, merging, and dispatch.
//!
//! Every actively-listened path gets its own cancellable worker. A cycle
//! fetches the path, merges the result into the cache (serialized by the
//! cache lock), diffs against the previous content, and dispatches to the
//! path's listeners. All callbacks for one cycle finish before the worker
//! schedules the next cycle for that path; workers for other paths are
//! unaffected.
//!
//! Fetch and parse failures are swallowed here and reported through
//! `tracing`; they never cross into listener callbacks. The failed cycle
//! leaves the cache untouched and the worker retries on its next tick.

use crate::config::ClientConfig;
use crate::connection::ConnectionState;
use crate::error::{ClientError, ClientResult};
use crate::registry::{EventKind, ListenerRegistry, Subscription};
use crate::transport::RemoteStore;
use arbor_tree::{diff_children, parse, CacheTree, Node, Path, Snapshot};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Cancellation and wake-up cell shared with one poll worker.
#[derive(Default)]
struct StopCell {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopCell {
    fn stop(&self) {
        *self.stopped.lock() = true;
        self.wake.notify_all();
    }

    fn wake_now(&self) {
        self.wake.notify_all();
    }

    fn is_stopped(&self) -> bool {
        *self.stopped.lock()
    }

    /// Sleeps until `timeout` elapses or the cell is woken. Returns true
    /// when the worker should exit.
    fn wait(&self, timeout: Duration) -> bool {
        let mut stopped = self.stopped.lock();
        if *stopped {
            return true;
        }
        self.wake.wait_for(&mut stopped, timeout);
        *stopped
    }
}

/// Owns the per-path poll workers.
///
/// Cancellation is first-class: `cancel` flags the worker's cell and the
/// worker exits at its next check instead of fetching again. Workers are
/// not joined; an in-flight fetch may complete, and listener deactivation
/// guarantees it produces no visible callback.
#[derive(Default)]
pub(crate) struct PollScheduler {
    workers: Mutex<HashMap<Path, Arc<StopCell>>>,
}

impl PollScheduler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Starts a periodic worker for `path` unless one is already running.
    /// The worker runs `cycle` immediately and then once per `interval`;
    /// a `false` return from `cycle` ends the worker.
    pub(crate) fn start(
        &self,
        path: Path,
        interval: Duration,
        cycle: Box<dyn Fn() -> bool + Send>,
    ) {
        let stop = Arc::new(StopCell::default());
        {
            let mut workers = self.workers.lock();
            if workers.contains_key(&path) {
                return;
            }
            workers.insert(path.clone(), Arc::clone(&stop));
        }

        let worker_stop = Arc::clone(&stop);
        let spawned = thread::Builder::new()
            .name(format!("arbor-poll:{path}"))
            .spawn(move || loop {
                if worker_stop.is_stopped() {
                    break;
                }
                if !cycle() {
                    break;
                }
                if worker_stop.wait(interval) {
                    break;
                }
            });

        if let Err(err) = spawned {
            warn!(%path, error = %err, "failed to spawn poll worker");
            self.workers.lock().remove(&path);
        }
    }

    /// Cancels the worker for `path`, if any.
    pub(crate) fn cancel(&self, path: &Path) {
        if let Some(stop) = self.workers.lock().remove(path) {
            stop.stop();
        }
    }

    /// Wakes the worker for `path` for an immediate cycle.
    pub(crate) fn wake(&self, path: &Path) {
        if let Some(stop) = self.workers.lock().get(path) {
            stop.wake_now();
        }
    }

    /// Cancels every worker.
    pub(crate) fn shutdown(&self) {
        for (_, stop) in self.workers.lock().drain() {
            stop.stop();
        }
    }

    /// Returns true while a worker is scheduled for `path`.
    pub(crate) fn is_polling(&self, path: &Path) -> bool {
        self.workers.lock().contains_key(path)
    }
}

/// Shared engine state behind every `Database` and `Reference` handle.
///
/// One engine exists per logical store; handles share it by `Arc`. The
/// cache is mutated only by poll cycles, the registry only by `on`/`off`.
pub(crate) struct Engine {
    config: ClientConfig,
    transport: Arc<dyn RemoteStore>,
    cache: Mutex<CacheTree>,
    registry: ListenerRegistry,
    connection: ConnectionState,
    scheduler: PollScheduler,
    closed: AtomicBool,
}

impl Engine {
    pub(crate) fn new(config: ClientConfig, transport: Arc<dyn RemoteStore>) -> Arc<Self> {
        Arc::new(Self {
            config,
            transport,
            cache: Mutex::new(CacheTree::new()),
            registry: ListenerRegistry::new(),
            connection: ConnectionState::new(),
            scheduler: PollScheduler::new(),
            closed: AtomicBool::new(false),
        })
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> ClientResult<()> {
        if self.is_closed() {
            Err(ClientError::Closed)
        } else {
            Ok(())
        }
    }

    /// Registers a listener and starts polling its path if needed.
    ///
    /// Synthetic `.info` paths are never polled; their listeners receive
    /// the current state immediately, from the caller's thread.
    pub(crate) fn subscribe(
        self: &Arc<Self>,
        path: &Path,
        kind: EventKind,
        callback: Box<dyn Fn(&Snapshot) + Send + Sync>,
    ) -> ClientResult<Subscription> {
        self.ensure_open()?;
        let (subscription, entry, first) = self.registry.add(path, kind, callback);
        debug!(%path, %kind, "listener registered");

        if path.is_info() {
            if kind == EventKind::Value {
                entry.mark_primed();
                entry.invoke(&self.info_snapshot(path));
            }
        } else if first {
            let weak = Arc::downgrade(self);
            let cycle_path = path.clone();
            self.scheduler.start(
                path.clone(),
                self.config.poll_interval,
                Box::new(move || match weak.upgrade() {
                    Some(engine) => {
                        engine.poll_cycle(&cycle_path);
                        true
                    }
                    None => false,
                }),
            );
        } else {
            // The path is already polled; pull the newcomer's initial
            // value forward instead of waiting out the interval.
            self.scheduler.wake(path);
        }

        Ok(subscription)
    }

    pub(crate) fn unsubscribe(&self, subscription: &Subscription) {
        let empty = self.registry.remove(subscription);
        self.stop_polling_if_empty(subscription.path(), empty);
    }

    pub(crate) fn unsubscribe_matching(&self, path: &Path, kind: Option<EventKind>) {
        let empty = self.registry.remove_matching(path, kind);
        self.stop_polling_if_empty(path, empty);
    }

    fn stop_polling_if_empty(&self, path: &Path, empty: bool) {
        if empty && !path.is_info() {
            debug!(%path, "last listener removed; cancelling poll worker");
            self.scheduler.cancel(path);
        }
    }

    /// Fetches `path` once and returns its snapshot.
    ///
    /// Unlike poll cycles, failures surface to the caller: there is no
    /// retry cycle behind a `once`. The fetch does not touch the cache;
    /// only the sync loop mutates it.
    pub(crate) fn once(&self, path: &Path) -> ClientResult<Snapshot> {
        self.ensure_open()?;
        if path.is_info() {
            return Ok(self.info_snapshot(path));
        }
        let body = self.transport.fetch(path)?;
        let node = parse(&body)?;
        self.note_successful_fetch();
        Ok(Snapshot::new(path.clone(), Some(node)))
    }

    /// Returns the cached content at `path` (None when never covered).
    pub(crate) fn cached_value(&self, path: &Path) -> Option<Node> {
        self.cache.lock().read(path)
    }

    /// Stops all polling and rejects further subscriptions and reads.
    pub(crate) fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("client shut down; cancelling all poll workers");
        self.scheduler.shutdown();
    }

    fn info_snapshot(&self, path: &Path) -> Snapshot {
        if *path == Path::info_connected() {
            self.connection.snapshot()
        } else {
            Snapshot::new(path.clone(), None)
        }
    }

    /// One poll cycle for `path`: fetch, merge, diff, dispatch.
    fn poll_cycle(&self, path: &Path) {
        if self.is_closed() {
            return;
        }

        let body = match self.transport.fetch(path) {
            Ok(body) => body,
            Err(err) => {
                warn!(%path, error = %err, "poll fetch failed; keeping last known good");
                return;
            }
        };
        let node = match parse(&body) {
            Ok(node) => node,
            Err(err) => {
                warn!(%path, error = %err, "malformed poll response; keeping last known good");
                return;
            }
        };

        let previous = self.cache.lock().merge(path, node.clone());
        self.note_successful_fetch();
        self.dispatch(path, previous, node);
    }

    /// Dispatches one cycle's events to the path's listeners, in
    /// registration order.
    fn dispatch(&self, path: &Path, previous: Option<Node>, current: Node) {
        let entries = self.registry.collect(path);
        if entries.is_empty() {
            return;
        }

        let changed = previous.as_ref() != Some(&current);
        let snapshot = Snapshot::new(path.clone(), Some(current));
        let diff = diff_children(previous.as_ref(), snapshot.node());
        let children: HashMap<String, Snapshot> = snapshot
            .children()
            .into_iter()
            .map(|child| (child.key().unwrap_or_default().to_string(), child))
            .collect();
        let previous_snapshot = previous.map(|node| Snapshot::new(path.clone(), Some(node)));

        for entry in entries {
            if !entry.is_active() {
                continue;
            }
            match entry.kind {
                EventKind::Value => {
                    let primed = entry.mark_primed();
                    if changed || !primed {
                        entry.invoke(&snapshot);
                    }
                }
                EventKind::ChildAdded => {
                    if entry.mark_primed() {
                        for key in &diff.added {
                            if let Some(child) = children.get(key) {
                                entry.invoke(child);
                            }
                        }
                    } else {
                        // A fresh listener sees every existing child once.
                        for child in snapshot.children() {
                            entry.invoke(&child);
                        }
                    }
                }
                EventKind::ChildChanged => {
                    if entry.mark_primed() {
                        for key in &diff.changed {
                            if let Some(child) = children.get(key) {
                                entry.invoke(child);
                            }
                        }
                    }
                }
                EventKind::ChildRemoved => {
                    if entry.mark_primed() {
                        if let Some(prev) = &previous_snapshot {
                            for key in &diff.removed {
                                if let Ok(child) = prev.child(key) {
                                    entry.invoke(&child);
                                }
                            }
                        }
                    }
                }
                EventKind::ChildMoved => {
                    if entry.mark_primed() {
                        for key in &diff.moved {
                            if let Some(child) = children.get(key) {
                                entry.invoke(child);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Records a successful fetch, flipping the simulated connection on
    /// the first one and notifying `.info/connected` listeners.
    fn note_successful_fetch(&self) {
        if !self.connection.mark_connected() {
            return;
        }
        debug!("first successful fetch; simulated connection established");
        let snapshot = self.connection.snapshot();
        for entry in self.registry.collect(&Path::info_connected()) {
            if entry.kind == EventKind::Value {
                entry.mark_primed();
                entry.invoke(&snapshot);
            }
        }
    }
}

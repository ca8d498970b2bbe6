//! Database facade and path references.

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::http::{HttpClient, RestTransport};
use crate::registry::{EventKind, Subscription};
use crate::sync::Engine;
use crate::transport::RemoteStore;
use crate::writes;
use arbor_tree::{value_json, Path, PathError, Snapshot};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Handle to one logical remote store.
///
/// A `Database` owns the engine (cache, listener registry, and poll
/// scheduler) and every [`Reference`] derived from it shares that one
/// engine. There is no hidden global state: two `Database` values opened
/// against the same URL are independent clients.
///
/// The client is read-only. Listeners observe remote data through
/// polling, and every write-style call validates its input, reports
/// success, and discards the write without contacting the remote store.
///
/// # Example
///
/// ```rust,ignore
/// use arbor_client::{ClientConfig, Database, EventKind};
///
/// let config = ClientConfig::new("https://db.example.com");
/// let db = Database::open(config, my_http_client);
///
/// let leaf = db.reference("leaf")?;
/// leaf.on(EventKind::Value, |snapshot| {
///     println!("leaf is now {}", snapshot.val());
/// })?;
/// ```
#[derive(Clone)]
pub struct Database {
    engine: Arc<Engine>,
}

impl Database {
    /// Opens a client that fetches over REST with the given HTTP client.
    pub fn open<C: HttpClient + 'static>(config: ClientConfig, client: C) -> Self {
        let transport = RestTransport::new(&config, client);
        Self::with_transport(config, transport)
    }

    /// Opens a client over an arbitrary remote store implementation.
    pub fn with_transport<T: RemoteStore + 'static>(config: ClientConfig, transport: T) -> Self {
        Self {
            engine: Engine::new(config, Arc::new(transport)),
        }
    }

    /// Returns a reference to the root of the store.
    pub fn root(&self) -> Reference {
        Reference {
            engine: Arc::clone(&self.engine),
            path: Path::root(),
        }
    }

    /// Returns a reference to the given path.
    pub fn reference(&self, path: &str) -> ClientResult<Reference> {
        Ok(Reference {
            engine: Arc::clone(&self.engine),
            path: Path::parse(path)?,
        })
    }

    /// Returns the simulated connection state.
    pub fn is_connected(&self) -> bool {
        self.engine.is_connected()
    }

    /// Stops all polling and rejects further operations.
    ///
    /// In-flight fetches may complete but dispatch nothing visible.
    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Outcome of a [`Reference::transaction`] call.
#[derive(Debug, Clone)]
pub struct TransactionResult {
    /// Whether the update function produced a value (aborting returns
    /// false, as it would against a live store).
    pub committed: bool,
    /// The content of the location after the transaction. The store
    /// discarded the write, so this is the last fetched content.
    pub snapshot: Snapshot,
}

/// Handle to one path in the store.
///
/// References are cheap to clone and all share the owning database's
/// engine.
#[derive(Clone)]
pub struct Reference {
    engine: Arc<Engine>,
    path: Path,
}

impl Reference {
    /// Returns the path this reference addresses.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the final path segment, or None at the root.
    pub fn key(&self) -> Option<&str> {
        self.path.key()
    }

    /// Returns a reference to a descendant. `relative` may contain
    /// slashes; the `.info` namespace is only reachable from the root.
    pub fn child(&self, relative: &str) -> ClientResult<Reference> {
        let relative = Path::parse(relative)?;
        if relative.is_info() && !self.path.is_root() {
            return Err(PathError::InvalidSegment {
                segment: arbor_tree::INFO_SEGMENT.to_string(),
            }
            .into());
        }
        Ok(Reference {
            engine: Arc::clone(&self.engine),
            path: self.path.join(&relative)?,
        })
    }

    /// Returns the parent reference, or None at the root.
    pub fn parent(&self) -> Option<Reference> {
        self.path.parent().map(|path| Reference {
            engine: Arc::clone(&self.engine),
            path,
        })
    }

    /// Returns a reference to the root.
    pub fn root(&self) -> Reference {
        Reference {
            engine: Arc::clone(&self.engine),
            path: Path::root(),
        }
    }

    /// Registers a listener for `kind` events at this path.
    ///
    /// The first listener on a path starts its poll worker; the listener
    /// receives the current value once known, then again on every change.
    /// Dispatch order among a path's listeners is registration order.
    pub fn on(
        &self,
        kind: EventKind,
        callback: impl Fn(&Snapshot) + Send + Sync + 'static,
    ) -> ClientResult<Subscription> {
        self.engine.subscribe(&self.path, kind, Box::new(callback))
    }

    /// Removes one listener registration.
    ///
    /// Removal is synchronous: the callback will not be invoked again,
    /// even by a poll cycle already in flight.
    pub fn off(&self, subscription: &Subscription) {
        self.engine.unsubscribe(subscription);
    }

    /// Removes every listener of `kind` at this path.
    pub fn off_kind(&self, kind: EventKind) {
        self.engine.unsubscribe_matching(&self.path, Some(kind));
    }

    /// Removes every listener at this path.
    pub fn off_all(&self) {
        self.engine.unsubscribe_matching(&self.path, None);
    }

    /// Fetches the current value once.
    ///
    /// Unlike listeners, whose poll failures are retried silently, errors
    /// here surface to the caller; there is no later cycle to recover
    /// in.
    pub fn once(&self) -> ClientResult<Snapshot> {
        self.engine.once(&self.path)
    }

    /// Writes a value. Always succeeds after validation; the write never
    /// reaches the remote store.
    pub fn set(&self, value: JsonValue) -> ClientResult<()> {
        writes::check_write_path(&self.path)?;
        writes::check_value(&value)?;
        self.discard("set");
        Ok(())
    }

    /// Writes a value with a priority. Same no-op contract as [`set`].
    ///
    /// [`set`]: Reference::set
    pub fn set_with_priority(&self, value: JsonValue, priority: JsonValue) -> ClientResult<()> {
        writes::check_write_path(&self.path)?;
        writes::check_value(&value)?;
        writes::check_priority(&priority)?;
        self.discard("set_with_priority");
        Ok(())
    }

    /// Applies a multi-path patch. Same no-op contract as [`set`].
    ///
    /// [`set`]: Reference::set
    pub fn update(&self, patch: JsonValue) -> ClientResult<()> {
        writes::check_write_path(&self.path)?;
        writes::check_update_patch(&patch)?;
        self.discard("update");
        Ok(())
    }

    /// Deletes the value. Same no-op contract as [`set`].
    ///
    /// [`set`]: Reference::set
    pub fn remove(&self) -> ClientResult<()> {
        writes::check_write_path(&self.path)?;
        self.discard("remove");
        Ok(())
    }

    /// Sets the priority of the value. Same no-op contract as [`set`].
    ///
    /// [`set`]: Reference::set
    pub fn set_priority(&self, priority: JsonValue) -> ClientResult<()> {
        writes::check_write_path(&self.path)?;
        writes::check_priority(&priority)?;
        self.discard("set_priority");
        Ok(())
    }

    /// Runs a transaction against the current cached content.
    ///
    /// `update` receives the last fetched value (null when unknown) and
    /// returns the proposed new value, or None to abort. The proposed
    /// value is validated and discarded; the result snapshot carries the
    /// store's (unchanged) content, exactly as if the store had accepted
    /// and dropped the write.
    pub fn transaction<F>(&self, update: F) -> ClientResult<TransactionResult>
    where
        F: FnOnce(JsonValue) -> Option<JsonValue>,
    {
        writes::check_write_path(&self.path)?;
        let current = self.engine.cached_value(&self.path);
        let current_json = current
            .as_ref()
            .map(value_json)
            .unwrap_or(JsonValue::Null);

        let committed = match update(current_json) {
            None => false,
            Some(proposed) => {
                writes::check_value(&proposed)?;
                self.discard("transaction");
                true
            }
        };

        Ok(TransactionResult {
            committed,
            snapshot: Snapshot::new(self.path.clone(), current),
        })
    }

    fn discard(&self, operation: &str) {
        debug!(path = %self.path, operation, "discarding write (read-only client)");
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference").field("path", &self.path).finish()
    }
}

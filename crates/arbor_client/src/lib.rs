//! # Arbor Client
//!
//! Read-only polling client emulating a realtime listener API for
//! ArborDB.
//!
//! This crate provides:
//! - `Database` / `Reference`: the listener and write API surface
//! - A poll scheduler with one cancellable worker per listened path
//! - A listener registry with synchronous removal
//! - Connection state simulation at the synthetic `.info/connected` path
//! - The no-op write sink (validate, report success, discard)
//! - Transport abstraction (`RemoteStore`, `HttpClient`) with a REST
//!   implementation
//!
//! # Architecture
//!
//! The client reconciles a pull-based, stateless transport with
//! push-style, per-path listener semantics:
//! 1. Registering the first listener for a path starts a periodic poll
//!    worker for it.
//! 2. Each cycle fetches the path, merges the result into the local
//!    cache, and diffs against the previous content.
//! 3. Differences dispatch to the path's listeners in registration
//!    order; failures are logged and retried next cycle, never thrown
//!    into callbacks.
//!
//! # Key invariants
//!
//! - Writes never reach the remote store and never alter the cache.
//! - Cache content is last-known-good: failed fetches change nothing.
//! - `off` is synchronous; an in-flight cycle dispatches nothing to a
//!   removed listener.
//! - `.info/connected` flips false→true once, after the first successful
//!   fetch, and never back.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod connection;
mod database;
mod error;
mod http;
mod registry;
mod sync;
mod transport;
mod writes;

pub use config::ClientConfig;
pub use database::{Database, Reference, TransactionResult};
pub use error::{ClientError, ClientResult};
pub use http::{HttpClient, HttpError, HttpResponse, LoopbackClient, LoopbackServer, RestTransport};
pub use registry::{EventKind, ListenerId, Subscription};
pub use transport::{MockRemote, RemoteStore};

// The data-model types callers handle through snapshots and references.
pub use arbor_tree::{Node, Path, PathError, Priority, Snapshot, Value};

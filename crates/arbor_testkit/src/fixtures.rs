//! Test fixtures and client helpers.
//!
//! Provides the canonical dataset used across the integration suite and
//! a pre-wired client/remote pair with a fast poll interval.

use crate::remote::MemoryRemote;
use arbor_client::{ClientConfig, Database, LoopbackClient};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use std::time::Duration;

/// Poll interval used by test clients. Short enough that a test waits a
/// few tens of milliseconds per cycle, long enough not to spin.
pub const FAST_POLL: Duration = Duration::from_millis(10);

/// The canonical dataset: scalars, a prioritized leaf, a plain object,
/// and lists with mixed priorities.
pub fn crawler_dataset() -> JsonValue {
    json!({
        "leaf": 42,
        "securedLeaf": "secret",
        "leafWithPriority": {".value": 42, ".priority": "pri"},
        "obj": {"a": 1, "b": 2},
        "list": {
            "10": {"name": "amy",    "age": 75, ".priority": 22},
            "20": {"name": "becky",  "age": 42, ".priority": 52},
            "30": {"name": "fred",   "age": 35, ".priority": 23},
            "40": {"name": "fred",   "age": 29, ".priority": 26},
            "50": {"name": "sally",  "age": 21, ".priority": 96},
            "60": {"name": "tom",    "age": 16, ".priority": 15},
            "70": {"name": "victor", "age": 4,  ".priority": 47},
        },
        "valueList": {
            "10": "c",
            "20": "b",
            "30": "e",
            "40": "f",
            "50": "a",
            "60": "d",
            "70": "e",
        },
    })
}

/// A client wired to an in-memory remote, polling fast.
pub struct TestClient {
    /// The client under test.
    pub db: Database,
    /// The backing remote, for remote-side mutation and request
    /// inspection.
    pub remote: Arc<MemoryRemote>,
}

impl TestClient {
    /// Creates a client over an empty remote.
    pub fn new() -> Self {
        Self::with_data(JsonValue::Null)
    }

    /// Creates a client over a remote serving `data`, connected through
    /// the in-process transport.
    pub fn with_data(data: JsonValue) -> Self {
        let remote = Arc::new(MemoryRemote::with_data(data));
        let config = ClientConfig::new("memory://remote").with_poll_interval(FAST_POLL);
        let db = Database::with_transport(config, Arc::clone(&remote));
        Self { db, remote }
    }

    /// Creates a client over a remote serving `data`, connected through
    /// the full REST transport (URL construction, status mapping) via a
    /// loopback HTTP client.
    pub fn over_rest(data: JsonValue) -> Self {
        let remote = Arc::new(MemoryRemote::with_data(data));
        let config = ClientConfig::new("https://remote.test").with_poll_interval(FAST_POLL);
        let db = Database::open(config, LoopbackClient::new(Arc::clone(&remote)));
        Self { db, remote }
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestClient {
    type Target = Database;

    fn deref(&self) -> &Database {
        &self.db
    }
}

//! Transport layer abstraction for fetches.

use crate::error::{ClientError, ClientResult};
use arbor_tree::Path;
use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;

/// A remote store handles read requests against the backing data.
///
/// This trait abstracts the network layer, allowing different
/// implementations (REST over an HTTP client, in-memory stores for
/// testing). Implementations return the raw export-form JSON document for
/// the requested path; envelope parsing happens in the engine.
pub trait RemoteStore: Send + Sync {
    /// Fetches the document at `path`.
    fn fetch(&self, path: &Path) -> ClientResult<JsonValue>;
}

impl<R: RemoteStore + ?Sized> RemoteStore for Arc<R> {
    fn fetch(&self, path: &Path) -> ClientResult<JsonValue> {
        (**self).fetch(path)
    }
}

/// A mock remote for unit tests.
///
/// Responses are scripted per path; fetching an unscripted path is a
/// transport error. All fetches are logged.
#[derive(Debug, Default)]
pub struct MockRemote {
    responses: Mutex<HashMap<Path, ClientResult<JsonValue>>>,
    log: Mutex<Vec<Path>>,
}

impl MockRemote {
    /// Creates a mock with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a successful response for `path`.
    pub fn set_response(&self, path: Path, body: JsonValue) {
        self.responses.lock().insert(path, Ok(body));
    }

    /// Scripts a failure for `path`.
    pub fn set_failure(&self, path: Path, error: ClientError) {
        self.responses.lock().insert(path, Err(error));
    }

    /// Returns every path fetched so far, in order.
    pub fn fetch_log(&self) -> Vec<Path> {
        self.log.lock().clone()
    }

    /// Returns the number of fetches issued for `path`.
    pub fn fetch_count(&self, path: &Path) -> usize {
        self.log.lock().iter().filter(|p| *p == path).count()
    }
}

impl RemoteStore for MockRemote {
    fn fetch(&self, path: &Path) -> ClientResult<JsonValue> {
        self.log.lock().push(path.clone());
        self.responses
            .lock()
            .get(path)
            .cloned()
            .unwrap_or_else(|| {
                Err(ClientError::fetch(
                    None,
                    format!("no mock response for {path}"),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(raw: &str) -> Path {
        Path::parse(raw).unwrap()
    }

    #[test]
    fn scripted_response() {
        let remote = MockRemote::new();
        remote.set_response(path("leaf"), json!(42));

        assert_eq!(remote.fetch(&path("leaf")).unwrap(), json!(42));
        assert_eq!(remote.fetch_count(&path("leaf")), 1);
    }

    #[test]
    fn unscripted_path_is_an_error() {
        let remote = MockRemote::new();
        let err = remote.fetch(&path("missing")).unwrap_err();
        assert!(matches!(err, ClientError::Fetch { status: None, .. }));
    }

    #[test]
    fn scripted_failure() {
        let remote = MockRemote::new();
        remote.set_failure(path("leaf"), ClientError::Timeout);
        assert_eq!(remote.fetch(&path("leaf")).unwrap_err(), ClientError::Timeout);
    }

    #[test]
    fn log_preserves_order() {
        let remote = MockRemote::new();
        remote.set_response(path("a"), json!(1));
        remote.set_response(path("b"), json!(2));

        remote.fetch(&path("a")).unwrap();
        remote.fetch(&path("b")).unwrap();
        remote.fetch(&path("a")).unwrap();

        assert_eq!(remote.fetch_log(), vec![path("a"), path("b"), path("a")]);
    }
}

//! In-memory remote store.
//!
//! Serves export-form JSON subtrees by path, the way the real REST
//! endpoint does, without any network. Tests mutate the backing document
//! directly (playing the "live" writer the read-only client can never
//! be) and use the request log to prove that client writes never arrive.

use arbor_client::{
    ClientError, ClientResult, HttpError, HttpResponse, LoopbackServer, Path, RemoteStore,
};
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value as JsonValue};

/// An in-memory remote store.
///
/// The backing document is one export-form JSON tree. Fetches navigate
/// into it and return the addressed subtree (null when absent). An
/// outage can be scripted to exercise failure handling.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    data: RwLock<JsonValue>,
    outage: Mutex<Option<ClientError>>,
    log: Mutex<Vec<Path>>,
}

impl MemoryRemote {
    /// Creates an empty remote (every path reads as null).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a remote serving the given document.
    pub fn with_data(data: JsonValue) -> Self {
        Self {
            data: RwLock::new(data),
            outage: Mutex::new(None),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the subtree at `path`. Writing null deletes the entry.
    ///
    /// This is the remote-side mutation hook for tests; the client under
    /// test has no way to reach it.
    pub fn put(&self, path: &Path, value: JsonValue) {
        let mut data = self.data.write();
        let document = std::mem::take(&mut *data);
        *data = splice(document, path.segments(), value);
    }

    /// Returns the whole backing document.
    pub fn data(&self) -> JsonValue {
        self.data.read().clone()
    }

    /// Returns the subtree at `path`, null when absent.
    pub fn subtree(&self, path: &Path) -> JsonValue {
        let data = self.data.read();
        let mut current = &*data;
        for segment in path.segments() {
            match current {
                JsonValue::Object(map) => match map.get(segment.as_str()) {
                    Some(child) => current = child,
                    None => return JsonValue::Null,
                },
                _ => return JsonValue::Null,
            }
        }
        current.clone()
    }

    /// Scripts an outage: every subsequent fetch fails with a clone of
    /// `error` until the outage is cleared with [`restore`].
    ///
    /// [`restore`]: MemoryRemote::restore
    pub fn black_out(&self, error: ClientError) {
        *self.outage.lock() = Some(error);
    }

    /// Clears a scripted outage.
    pub fn restore(&self) {
        *self.outage.lock() = None;
    }

    /// Returns every fetched path, in request order.
    pub fn request_log(&self) -> Vec<Path> {
        self.log.lock().clone()
    }

    /// Returns the total number of fetches served (or failed).
    pub fn request_count(&self) -> usize {
        self.log.lock().len()
    }

    /// Returns the number of fetches for one path.
    pub fn request_count_for(&self, path: &Path) -> usize {
        self.log.lock().iter().filter(|p| *p == path).count()
    }
}

impl RemoteStore for MemoryRemote {
    fn fetch(&self, path: &Path) -> ClientResult<JsonValue> {
        self.log.lock().push(path.clone());
        if let Some(error) = self.outage.lock().clone() {
            return Err(error);
        }
        Ok(self.subtree(path))
    }
}

impl LoopbackServer for MemoryRemote {
    fn handle_get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let path = path_from_url(url).map_err(HttpError::Failed)?;
        self.log.lock().push(path.clone());

        if let Some(error) = self.outage.lock().clone() {
            return match error {
                ClientError::Timeout => Err(HttpError::Timeout),
                ClientError::Auth { status, message } => {
                    Ok(HttpResponse::with_status(status, message))
                }
                ClientError::Fetch {
                    status: Some(status),
                    message,
                } => Ok(HttpResponse::with_status(status, message)),
                other => Err(HttpError::Failed(other.to_string())),
            };
        }

        let body = self.subtree(&path);
        Ok(HttpResponse::ok(body.to_string()))
    }
}

/// Extracts the tree path from a REST request URL
/// (`<base>/<path>.json?format=export`).
fn path_from_url(url: &str) -> Result<Path, String> {
    let without_query = url.split('?').next().unwrap_or(url);
    let document = without_query
        .strip_suffix(".json")
        .ok_or_else(|| format!("not a document URL: {url}"))?;
    let after_scheme = match document.find("://") {
        Some(index) => &document[index + 3..],
        None => document,
    };
    let raw_path = match after_scheme.find('/') {
        Some(index) => &after_scheme[index..],
        None => "",
    };
    Path::parse(raw_path).map_err(|err| err.to_string())
}

fn splice(document: JsonValue, segments: &[String], value: JsonValue) -> JsonValue {
    match segments.split_first() {
        None => value,
        Some((head, rest)) => {
            let mut map = match document {
                JsonValue::Object(map) => map,
                _ => Map::new(),
            };
            let existing = map.remove(head.as_str()).unwrap_or(JsonValue::Null);
            let updated = splice(existing, rest, value);
            if !updated.is_null() {
                map.insert(head.clone(), updated);
            }
            if map.is_empty() {
                JsonValue::Null
            } else {
                JsonValue::Object(map)
            }
        }
    }
}

//! REST transport over an abstract HTTP client.
//!
//! The actual HTTP stack is abstracted via a trait so different
//! implementations can be plugged in (a blocking reqwest wrapper, a
//! loopback for tests). The transport owns URL construction and status
//! mapping; token attachment is a query-parameter hook.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::transport::RemoteStore;
use arbor_tree::Path;
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;

/// An HTTP response body with its status code.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl HttpResponse {
    /// Creates a 200 response.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Creates a response with the given status.
    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Errors an HTTP client implementation can report.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    /// The request did not complete within the given bound.
    #[error("request timed out")]
    Timeout,
    /// The request failed before producing a response.
    #[error("{0}")]
    Failed(String),
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual transport. The
/// implementation is responsible for honoring `timeout`; a request that
/// outlives it must return [`HttpError::Timeout`].
pub trait HttpClient: Send + Sync {
    /// Issues a GET request and returns the response.
    fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, HttpError>;
}

/// REST-based remote store.
///
/// Fetches `<base>/<path>.json?format=export` and maps the response:
/// 2xx bodies parse as JSON documents, 401/403 become [`ClientError::Auth`],
/// any other status becomes [`ClientError::Fetch`].
pub struct RestTransport<C: HttpClient> {
    base_url: String,
    auth_token: Option<String>,
    timeout: Duration,
    client: C,
}

impl<C: HttpClient> RestTransport<C> {
    /// Creates a transport from a client configuration.
    pub fn new(config: &ClientConfig, client: C) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            timeout: config.fetch_timeout,
            client,
        }
    }

    /// Returns the request URL for `path`.
    pub fn url_for(&self, path: &Path) -> String {
        let mut url = String::from(&self.base_url);
        url.push('/');
        for (index, segment) in path.segments().iter().enumerate() {
            if index > 0 {
                url.push('/');
            }
            url.push_str(&encode_segment(segment));
        }
        url.push_str(".json?format=export");
        if let Some(token) = &self.auth_token {
            url.push_str("&auth=");
            url.push_str(&encode_segment(token));
        }
        url
    }
}

impl<C: HttpClient> RemoteStore for RestTransport<C> {
    fn fetch(&self, path: &Path) -> ClientResult<JsonValue> {
        let url = self.url_for(path);
        let response = self.client.get(&url, self.timeout).map_err(|err| match err {
            HttpError::Timeout => ClientError::Timeout,
            HttpError::Failed(message) => ClientError::fetch(None, message),
        })?;

        match response.status {
            200..=299 => serde_json::from_str(&response.body)
                .map_err(|err| ClientError::parse(err.to_string())),
            401 | 403 => Err(ClientError::Auth {
                status: response.status,
                message: response.body,
            }),
            status => Err(ClientError::fetch(Some(status), response.body)),
        }
    }
}

/// A loopback HTTP client that routes requests to an in-process handler.
///
/// Useful for testing the full transport path without network overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer> LoopbackClient<S> {
    /// Creates a loopback client over the given handler.
    pub fn new(server: S) -> Self {
        Self { server }
    }
}

/// Handlers that can serve loopback GET requests.
pub trait LoopbackServer: Send + Sync {
    /// Handles a GET for the given URL and returns the response.
    fn handle_get(&self, url: &str) -> Result<HttpResponse, HttpError>;
}

impl<S: LoopbackServer + ?Sized> LoopbackServer for std::sync::Arc<S> {
    fn handle_get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        (**self).handle_get(url)
    }
}

impl<S: LoopbackServer> HttpClient for LoopbackClient<S> {
    fn get(&self, url: &str, _timeout: Duration) -> Result<HttpResponse, HttpError> {
        self.server.handle_get(url)
    }
}

fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for ch in segment.chars() {
        match ch {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            '+' => out.push_str("%2B"),
            '=' => out.push_str("%3D"),
            other => out.push(other),
        }
    }
    out
}

//! Configuration for the client.

use std::time::Duration;

/// Configuration for a client instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the remote store (e.g. `https://db.example.com`).
    pub base_url: String,
    /// Interval between poll cycles for each actively-listened path.
    pub poll_interval: Duration,
    /// Bound on a single fetch; a slower fetch counts as a failed cycle.
    pub fetch_timeout: Duration,
    /// Optional auth token, attached to fetch URLs as a query parameter.
    pub auth_token: Option<String>,
}

impl ClientConfig {
    /// Creates a configuration for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            poll_interval: Duration::from_secs(3),
            fetch_timeout: Duration::from_secs(30),
            auth_token: None,
        }
    }

    /// Sets the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the fetch timeout.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Sets the auth token.
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("")
    }
}

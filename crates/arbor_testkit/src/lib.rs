//! # Arbor Testkit
//!
//! Test utilities for ArborDB.
//!
//! This crate provides:
//! - An in-memory remote store serving export-form documents
//! - Canonical fixtures and a pre-wired test client
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use arbor_testkit::prelude::*;
//!
//! #[test]
//! fn leaf_read_works() {
//!     let client = TestClient::with_data(crawler_dataset());
//!     let snapshot = client.reference("leaf").unwrap().once().unwrap();
//!     assert_eq!(snapshot.val(), serde_json::json!(42));
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod remote;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::remote::*;
}

pub use fixtures::{crawler_dataset, TestClient, FAST_POLL};
pub use remote::MemoryRemote;

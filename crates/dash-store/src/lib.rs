//! Tenant configuration storage
//!
//! Maps `tenant:<id>` keys onto a hosted two-table backend (tenant metadata
//! with a JSON blob, plus one layout row per page) and presents a single
//! merged document to callers.
//!
//! # Example
//!
//! ```rust
//! # tokio_test::block_on(async {
//! use std::sync::Arc;
//! use dash_store::{MemoryBackend, StorageAdapter, TenantStore};
//! use serde_json::json;
//!
//! let store = TenantStore::new(Arc::new(MemoryBackend::new()));
//! store
//!     .set("tenant:acme", json!({"name": "Acme", "layouts": {"home": []}}))
//!     .await
//!     .unwrap();
//!
//! let doc = store.get("tenant:acme").await.unwrap();
//! assert_eq!(doc["layouts"]["home"], json!([]));
//! assert_eq!(store.keys("tenant:*").await, vec!["tenant:acme"]);
//! # });
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod adapter;
pub mod backend;
pub mod error;
pub mod key;
pub mod kv;
pub mod memory;
pub mod rest;
pub mod settings;

pub use adapter::{merge_document, split_document, StorageAdapter, TenantStore};
pub use backend::{DisabledBackend, LayoutRow, TableBackend, TenantRow};
pub use error::{StoreError, StoreResult};
pub use key::{tenant_key, TenantKey, TENANT_PREFIX};
pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use memory::MemoryBackend;
pub use rest::RestBackend;
pub use settings::BackendSettings;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

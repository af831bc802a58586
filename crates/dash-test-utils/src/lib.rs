//! Testing utilities for the dashboard workspace
//!
//! Shared fixtures and backends that fail or slow down on demand.

#![allow(missing_docs)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dash_schema::{default_tenant_config, TenantConfig, WidgetInstance, WidgetPosition};
use dash_store::{
    LayoutRow, MemoryBackend, StoreError, StoreResult, TableBackend, TenantRow, TenantStore,
};
use parking_lot::Mutex;
use serde_json::Value as JsonValue;

pub fn sample_config(id: &str) -> TenantConfig {
    default_tenant_config(id, format!("{id} corp"))
}

pub fn notes_widget(id: &str, row: u32) -> WidgetInstance {
    WidgetInstance::new(id, "notes", WidgetPosition::new(row, 0, 4, 1))
}

/// Tenant store over a fresh in-memory backend
pub fn memory_store() -> (Arc<MemoryBackend>, TenantStore) {
    let backend = Arc::new(MemoryBackend::new());
    (backend.clone(), TenantStore::new(backend))
}

/// Which operations a [`FailingBackend`] rejects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailureMode {
    pub reads: bool,
    pub writes: bool,
    pub roles: bool,
}

impl FailureMode {
    pub const ALL: Self = Self {
        reads: true,
        writes: true,
        roles: true,
    };
}

/// In-memory backend that fails selected operations
#[derive(Debug, Default)]
pub struct FailingBackend {
    inner: MemoryBackend,
    mode: Mutex<FailureMode>,
}

impl FailingBackend {
    pub fn new(mode: FailureMode) -> Self {
        Self {
            inner: MemoryBackend::new(),
            mode: Mutex::new(mode),
        }
    }

    pub fn set_mode(&self, mode: FailureMode) {
        *self.mode.lock() = mode;
    }

    pub fn inner(&self) -> &MemoryBackend {
        &self.inner
    }

    fn check(&self, failing: bool, op: &str) -> StoreResult<()> {
        if failing {
            Err(StoreError::Backend(format!("injected {op} failure")))
        } else {
            Ok(())
        }
    }

    fn mode(&self) -> FailureMode {
        *self.mode.lock()
    }
}

#[async_trait]
impl TableBackend for FailingBackend {
    async fn fetch_tenant(&self, tenant_id: &str) -> StoreResult<Option<TenantRow>> {
        self.check(self.mode().reads, "read")?;
        self.inner.fetch_tenant(tenant_id).await
    }

    async fn fetch_layouts(&self, tenant_id: &str) -> StoreResult<Vec<LayoutRow>> {
        self.check(self.mode().reads, "read")?;
        self.inner.fetch_layouts(tenant_id).await
    }

    async fn upsert_tenant(&self, row: TenantRow) -> StoreResult<()> {
        self.check(self.mode().writes, "write")?;
        self.inner.upsert_tenant(row).await
    }

    async fn upsert_layouts(&self, rows: Vec<LayoutRow>) -> StoreResult<()> {
        self.check(self.mode().writes, "write")?;
        self.inner.upsert_layouts(rows).await
    }

    async fn commit(&self, tenant: TenantRow, layouts: Vec<LayoutRow>) -> StoreResult<()> {
        self.check(self.mode().writes, "write")?;
        self.inner.commit(tenant, layouts).await
    }

    async fn delete_tenant(&self, tenant_id: &str) -> StoreResult<()> {
        self.check(self.mode().writes, "write")?;
        self.inner.delete_tenant(tenant_id).await
    }

    async fn list_tenant_ids(&self) -> StoreResult<Vec<String>> {
        self.check(self.mode().reads, "read")?;
        self.inner.list_tenant_ids().await
    }

    async fn fetch_user_role(&self, user_id: &str, tenant_id: &str) -> StoreResult<Option<String>> {
        self.check(self.mode().roles, "role")?;
        self.inner.fetch_user_role(user_id, tenant_id).await
    }
}

/// In-memory backend recording commits, optionally taking time per commit
#[derive(Debug, Default)]
pub struct RecordingBackend {
    inner: MemoryBackend,
    commit_delay: Option<Duration>,
    commits: AtomicUsize,
    last_config: Mutex<Option<JsonValue>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each commit sleeps for `delay` before applying
    pub fn with_commit_delay(delay: Duration) -> Self {
        Self {
            commit_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Metadata blob of the latest commit
    pub fn last_config(&self) -> Option<JsonValue> {
        self.last_config.lock().clone()
    }

    pub fn inner(&self) -> &MemoryBackend {
        &self.inner
    }
}

#[async_trait]
impl TableBackend for RecordingBackend {
    async fn fetch_tenant(&self, tenant_id: &str) -> StoreResult<Option<TenantRow>> {
        self.inner.fetch_tenant(tenant_id).await
    }

    async fn fetch_layouts(&self, tenant_id: &str) -> StoreResult<Vec<LayoutRow>> {
        self.inner.fetch_layouts(tenant_id).await
    }

    async fn upsert_tenant(&self, row: TenantRow) -> StoreResult<()> {
        self.inner.upsert_tenant(row).await
    }

    async fn upsert_layouts(&self, rows: Vec<LayoutRow>) -> StoreResult<()> {
        self.inner.upsert_layouts(rows).await
    }

    async fn commit(&self, tenant: TenantRow, layouts: Vec<LayoutRow>) -> StoreResult<()> {
        if let Some(delay) = self.commit_delay {
            tokio::time::sleep(delay).await;
        }
        *self.last_config.lock() = Some(tenant.config.clone());
        self.commits.fetch_add(1, Ordering::SeqCst);
        self.inner.commit(tenant, layouts).await
    }

    async fn delete_tenant(&self, tenant_id: &str) -> StoreResult<()> {
        self.inner.delete_tenant(tenant_id).await
    }

    async fn list_tenant_ids(&self) -> StoreResult<Vec<String>> {
        self.inner.list_tenant_ids().await
    }

    async fn fetch_user_role(&self, user_id: &str, tenant_id: &str) -> StoreResult<Option<String>> {
        self.inner.fetch_user_role(user_id, tenant_id).await
    }
}

//! Table backend abstraction
//!
//! Logical schema of the hosted backend:
//!
//! - `tenants(id PK, name, config JSON, updated_at)`: the document minus
//!   `layouts`
//! - `layouts(tenant_id FK, page_id, widgets JSON, updated_at)`: one row per
//!   page, keyed by `(tenant_id, page_id)`, cascading on tenant delete
//! - `user_roles(user_id, tenant_id, role)`: role assignments

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::StoreResult;

/// Row of the `tenants` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantRow {
    pub id: String,
    pub name: String,
    /// Tenant document without `layouts`
    pub config: JsonValue,
    pub updated_at: DateTime<Utc>,
}

/// Row of the `layouts` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRow {
    pub tenant_id: String,
    pub page_id: String,
    /// Ordered widget instances of the page
    pub widgets: JsonValue,
    pub updated_at: DateTime<Utc>,
}

/// Access to the two configuration tables and the role assignments
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TableBackend: Send + Sync {
    /// Metadata row of a tenant
    async fn fetch_tenant(&self, tenant_id: &str) -> StoreResult<Option<TenantRow>>;

    /// Every layout row of a tenant
    async fn fetch_layouts(&self, tenant_id: &str) -> StoreResult<Vec<LayoutRow>>;

    /// Insert or update a metadata row keyed by id
    async fn upsert_tenant(&self, row: TenantRow) -> StoreResult<()>;

    /// Insert or update layout rows keyed by `(tenant_id, page_id)`
    async fn upsert_layouts(&self, rows: Vec<LayoutRow>) -> StoreResult<()>;

    /// Write a metadata row and its layout rows together
    ///
    /// Backends able to do so apply both writes atomically. The default
    /// issues the two upserts in sequence and stops at the first error.
    async fn commit(&self, tenant: TenantRow, layouts: Vec<LayoutRow>) -> StoreResult<()> {
        self.upsert_tenant(tenant).await?;
        if !layouts.is_empty() {
            self.upsert_layouts(layouts).await?;
        }
        Ok(())
    }

    /// Delete a metadata row; layout rows go with it by cascade
    async fn delete_tenant(&self, tenant_id: &str) -> StoreResult<()>;

    /// Ids of every stored tenant
    async fn list_tenant_ids(&self) -> StoreResult<Vec<String>>;

    /// Role assigned to a user within a tenant
    async fn fetch_user_role(&self, user_id: &str, tenant_id: &str) -> StoreResult<Option<String>>;
}

/// Backend used when no endpoint is configured
///
/// Reads find nothing and writes are accepted and dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledBackend;

#[async_trait]
impl TableBackend for DisabledBackend {
    async fn fetch_tenant(&self, _tenant_id: &str) -> StoreResult<Option<TenantRow>> {
        Ok(None)
    }

    async fn fetch_layouts(&self, _tenant_id: &str) -> StoreResult<Vec<LayoutRow>> {
        Ok(Vec::new())
    }

    async fn upsert_tenant(&self, row: TenantRow) -> StoreResult<()> {
        tracing::debug!(tenant_id = %row.id, "persistence disabled, dropping tenant write");
        Ok(())
    }

    async fn upsert_layouts(&self, rows: Vec<LayoutRow>) -> StoreResult<()> {
        tracing::debug!(rows = rows.len(), "persistence disabled, dropping layout write");
        Ok(())
    }

    async fn delete_tenant(&self, _tenant_id: &str) -> StoreResult<()> {
        Ok(())
    }

    async fn list_tenant_ids(&self) -> StoreResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn fetch_user_role(&self, _user_id: &str, _tenant_id: &str) -> StoreResult<Option<String>> {
        Ok(None)
    }
}

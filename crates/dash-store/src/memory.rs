//! In-process table backend

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::backend::{LayoutRow, TableBackend, TenantRow};
use crate::error::StoreResult;

#[derive(Debug, Default)]
struct Tables {
    tenants: BTreeMap<String, TenantRow>,
    /// Keyed by `(tenant_id, page_id)`
    layouts: BTreeMap<(String, String), LayoutRow>,
    /// Keyed by `(user_id, tenant_id)`
    user_roles: BTreeMap<(String, String), String>,
}

/// Table backend held in memory
///
/// `commit` applies the tenant row and its layout rows under one write
/// lock, and deleting a tenant cascades to its layout rows.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RwLock<Tables>,
}

impl MemoryBackend {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a role to a user within a tenant
    pub fn assign_role(&self, user_id: &str, tenant_id: &str, role: &str) {
        self.tables
            .write()
            .user_roles
            .insert((user_id.to_string(), tenant_id.to_string()), role.to_string());
    }

    /// Number of tenant rows
    #[must_use]
    pub fn tenant_count(&self) -> usize {
        self.tables.read().tenants.len()
    }

    /// Number of layout rows across all tenants
    #[must_use]
    pub fn layout_row_count(&self) -> usize {
        self.tables.read().layouts.len()
    }

    fn put_layouts(tables: &mut Tables, rows: Vec<LayoutRow>) {
        for row in rows {
            tables
                .layouts
                .insert((row.tenant_id.clone(), row.page_id.clone()), row);
        }
    }
}

#[async_trait]
impl TableBackend for MemoryBackend {
    async fn fetch_tenant(&self, tenant_id: &str) -> StoreResult<Option<TenantRow>> {
        Ok(self.tables.read().tenants.get(tenant_id).cloned())
    }

    async fn fetch_layouts(&self, tenant_id: &str) -> StoreResult<Vec<LayoutRow>> {
        let tables = self.tables.read();
        Ok(tables
            .layouts
            .iter()
            .filter(|((tenant, _), _)| tenant == tenant_id)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn upsert_tenant(&self, row: TenantRow) -> StoreResult<()> {
        self.tables.write().tenants.insert(row.id.clone(), row);
        Ok(())
    }

    async fn upsert_layouts(&self, rows: Vec<LayoutRow>) -> StoreResult<()> {
        Self::put_layouts(&mut self.tables.write(), rows);
        Ok(())
    }

    async fn commit(&self, tenant: TenantRow, layouts: Vec<LayoutRow>) -> StoreResult<()> {
        let mut tables = self.tables.write();
        tables.tenants.insert(tenant.id.clone(), tenant);
        Self::put_layouts(&mut tables, layouts);
        Ok(())
    }

    async fn delete_tenant(&self, tenant_id: &str) -> StoreResult<()> {
        let mut tables = self.tables.write();
        tables.tenants.remove(tenant_id);
        tables.layouts.retain(|(tenant, _), _| tenant != tenant_id);
        Ok(())
    }

    async fn list_tenant_ids(&self) -> StoreResult<Vec<String>> {
        Ok(self.tables.read().tenants.keys().cloned().collect())
    }

    async fn fetch_user_role(&self, user_id: &str, tenant_id: &str) -> StoreResult<Option<String>> {
        Ok(self
            .tables
            .read()
            .user_roles
            .get(&(user_id.to_string(), tenant_id.to_string()))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn tenant(id: &str) -> TenantRow {
        TenantRow {
            id: id.into(),
            name: id.into(),
            config: json!({}),
            updated_at: Utc::now(),
        }
    }

    fn layout(tenant: &str, page: &str) -> LayoutRow {
        LayoutRow {
            tenant_id: tenant.into(),
            page_id: page.into(),
            widgets: json!([]),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn layouts_upsert_by_composite_key() {
        let backend = MemoryBackend::new();
        backend.upsert_layouts(vec![layout("a", "home"), layout("a", "home")]).await.unwrap();
        backend.upsert_layouts(vec![layout("b", "home")]).await.unwrap();

        assert_eq!(backend.layout_row_count(), 2);
        assert_eq!(backend.fetch_layouts("a").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_cascades_layouts() {
        let backend = MemoryBackend::new();
        backend
            .commit(tenant("a"), vec![layout("a", "home"), layout("a", "reports")])
            .await
            .unwrap();
        backend.commit(tenant("b"), vec![layout("b", "home")]).await.unwrap();

        backend.delete_tenant("a").await.unwrap();

        assert_eq!(backend.tenant_count(), 1);
        assert!(backend.fetch_layouts("a").await.unwrap().is_empty());
        assert_eq!(backend.fetch_layouts("b").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn role_assignments() {
        let backend = MemoryBackend::new();
        backend.assign_role("u1", "acme", "manager");

        assert_eq!(
            backend.fetch_user_role("u1", "acme").await.unwrap().as_deref(),
            Some("manager")
        );
        assert!(backend.fetch_user_role("u1", "other").await.unwrap().is_none());
    }
}

//! Storage adapter
//!
//! Presents one logical JSON document per `tenant:<id>` key over the
//! two-table backend. Reads merge the metadata blob with the per-page
//! layout rows; writes split the document back into those rows.
//!
//! Reads never fail: a backend error or an unknown key reads as nothing.
//! Writes surface backend errors to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value as JsonValue};

use crate::backend::{DisabledBackend, LayoutRow, TableBackend, TenantRow};
use crate::error::{StoreError, StoreResult};
use crate::key::{TenantKey, TENANT_PREFIX};
use crate::settings::BackendSettings;

const LAYOUTS_FIELD: &str = "layouts";

/// Key-addressed document storage
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Document under `key`, or `None` when absent, unsupported or unreadable
    async fn get(&self, key: &str) -> Option<JsonValue>;

    /// Store a document under `key`; unsupported key families are ignored
    async fn set(&self, key: &str, document: JsonValue) -> StoreResult<()>;

    /// Remove the document under `key`; unsupported key families are ignored
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Keys matching a prefix pattern such as `tenant:` or `tenant:*`
    async fn keys(&self, pattern: &str) -> Vec<String>;
}

/// Storage adapter for tenant documents
#[derive(Clone)]
pub struct TenantStore {
    backend: Arc<dyn TableBackend>,
}

impl TenantStore {
    #[inline]
    #[must_use]
    pub fn new(backend: Arc<dyn TableBackend>) -> Self {
        Self { backend }
    }

    /// Store over the disabled backend: reads find nothing, writes are dropped
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledBackend))
    }

    /// Store over the backend described by `settings`
    ///
    /// # Errors
    /// Fails if the HTTP client cannot be constructed.
    pub fn from_settings(settings: &BackendSettings) -> StoreResult<Self> {
        Ok(Self::new(settings.connect()?))
    }

    /// Underlying table backend
    #[inline]
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn TableBackend> {
        &self.backend
    }

    async fn read(&self, tenant_id: &str) -> StoreResult<Option<JsonValue>> {
        let Some(tenant) = self.backend.fetch_tenant(tenant_id).await? else {
            return Ok(None);
        };
        let layouts = self.backend.fetch_layouts(tenant_id).await?;
        Ok(Some(merge_document(tenant, layouts)))
    }
}

impl std::fmt::Debug for TenantStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl StorageAdapter for TenantStore {
    async fn get(&self, key: &str) -> Option<JsonValue> {
        let Some(tenant) = TenantKey::parse(key) else {
            tracing::debug!(key, "unsupported key family");
            return None;
        };
        match self.read(tenant.id()).await {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(key, error = %e, "tenant read failed, treating as absent");
                None
            }
        }
    }

    async fn set(&self, key: &str, document: JsonValue) -> StoreResult<()> {
        let Some(tenant) = TenantKey::parse(key) else {
            tracing::debug!(key, "unsupported key family, ignoring write");
            return Ok(());
        };
        let (row, layouts) = split_document(tenant.id(), document, Utc::now())?;
        let pages = layouts.len();

        if let Err(e) = self.backend.commit(row, layouts).await {
            tracing::error!(tenant_id = tenant.id(), error = %e, "tenant write failed");
            return Err(e);
        }
        tracing::debug!(tenant_id = tenant.id(), pages, "tenant stored");
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let Some(tenant) = TenantKey::parse(key) else {
            return Ok(());
        };
        // Layout rows are removed by the backend's cascade.
        if let Err(e) = self.backend.delete_tenant(tenant.id()).await {
            tracing::error!(tenant_id = tenant.id(), error = %e, "tenant delete failed");
            return Err(e);
        }
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Vec<String> {
        let Some(rest) = pattern.strip_prefix(TENANT_PREFIX) else {
            return Vec::new();
        };
        let prefix = rest.trim_end_matches('*');

        match self.backend.list_tenant_ids().await {
            Ok(ids) => ids
                .into_iter()
                .filter(|id| id.starts_with(prefix))
                .map(|id| TenantKey::new(id).to_string())
                .collect(),
            Err(e) => {
                tracing::warn!(pattern, error = %e, "tenant listing failed");
                Vec::new()
            }
        }
    }
}

/// Merge a metadata row and its layout rows into one document
///
/// The result is `{id, name, ...blob, layouts}` where `layouts` is the
/// blob's layouts overlaid with the table rows, table rows winning per page.
#[must_use]
pub fn merge_document(tenant: TenantRow, rows: Vec<LayoutRow>) -> JsonValue {
    let mut document = Map::new();
    document.insert("id".into(), JsonValue::String(tenant.id));
    document.insert("name".into(), JsonValue::String(tenant.name));

    let mut layouts = Map::new();
    if let JsonValue::Object(blob) = tenant.config {
        for (field, value) in blob {
            if field == LAYOUTS_FIELD {
                if let JsonValue::Object(pages) = value {
                    layouts = pages;
                }
            } else {
                document.insert(field, value);
            }
        }
    }
    for row in rows {
        layouts.insert(row.page_id, row.widgets);
    }

    document.insert(LAYOUTS_FIELD.into(), JsonValue::Object(layouts));
    JsonValue::Object(document)
}

/// Split a document into its metadata row and one layout row per page
///
/// # Errors
/// Fails if the document or its `layouts` field is not an object.
pub fn split_document(
    tenant_id: &str,
    document: JsonValue,
    now: DateTime<Utc>,
) -> StoreResult<(TenantRow, Vec<LayoutRow>)> {
    let JsonValue::Object(mut blob) = document else {
        return Err(StoreError::InvalidDocument(format!(
            "tenant {tenant_id} document must be an object"
        )));
    };
    let pages = match blob.remove(LAYOUTS_FIELD) {
        None | Some(JsonValue::Null) => Map::new(),
        Some(JsonValue::Object(pages)) => pages,
        Some(_) => {
            return Err(StoreError::InvalidDocument(format!(
                "tenant {tenant_id} layouts must be an object"
            )))
        }
    };

    let name = blob
        .get("name")
        .and_then(JsonValue::as_str)
        .unwrap_or(tenant_id)
        .to_string();
    blob.insert(
        "updatedAt".into(),
        JsonValue::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );

    let layouts = pages
        .into_iter()
        .map(|(page_id, widgets)| LayoutRow {
            tenant_id: tenant_id.to_string(),
            page_id,
            widgets,
            updated_at: now,
        })
        .collect();
    let row = TenantRow {
        id: tenant_id.to_string(),
        name,
        config: JsonValue::Object(blob),
        updated_at: now,
    };
    Ok((row, layouts))
}

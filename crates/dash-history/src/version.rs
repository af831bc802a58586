//! Per-tenant version history
//!
//! Each tenant's versions are one JSON array under `config-version:<id>` in
//! a [`KeyValueStore`], newest first, truncated to the store's capacity.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dash_schema::TenantConfig;
use dash_store::KeyValueStore;
use serde::{Deserialize, Serialize};

use crate::error::HistoryResult;

/// Key prefix of version lists
pub const VERSION_KEY_PREFIX: &str = "config-version:";

/// Versions kept per tenant unless configured otherwise
pub const DEFAULT_MAX_VERSIONS: usize = 10;

/// A saved configuration snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigVersion {
    /// `v-<unix millis>`; two saves within one millisecond share an id
    pub id: String,
    pub tenant_id: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub config: TenantConfig,
}

/// Version id for a save at `at`
#[inline]
#[must_use]
pub fn version_id(at: DateTime<Utc>) -> String {
    format!("v-{}", at.timestamp_millis())
}

/// Storage key of a tenant's version list
#[inline]
#[must_use]
pub fn version_key(tenant_id: &str) -> String {
    format!("{VERSION_KEY_PREFIX}{tenant_id}")
}

/// Capped, newest-first version log per tenant
#[derive(Clone)]
pub struct VersionHistory {
    store: Arc<dyn KeyValueStore>,
    capacity: usize,
}

impl VersionHistory {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            capacity: DEFAULT_MAX_VERSIONS,
        }
    }

    /// With a different per-tenant cap; zero is raised to one
    #[inline]
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot `config` as the newest version
    ///
    /// # Errors
    /// Fails if the version list cannot be written.
    pub fn save_version(
        &self,
        tenant_id: &str,
        config: &TenantConfig,
        description: &str,
    ) -> HistoryResult<ConfigVersion> {
        self.save_version_at(tenant_id, config, description, Utc::now())
    }

    /// Snapshot `config` with an explicit timestamp
    ///
    /// # Errors
    /// Fails if the version list cannot be written.
    pub fn save_version_at(
        &self,
        tenant_id: &str,
        config: &TenantConfig,
        description: &str,
        at: DateTime<Utc>,
    ) -> HistoryResult<ConfigVersion> {
        let version = ConfigVersion {
            id: version_id(at),
            tenant_id: tenant_id.to_string(),
            timestamp: at,
            description: description.to_string(),
            config: config.clone(),
        };

        let mut versions = self.get_versions(tenant_id);
        versions.insert(0, version.clone());
        versions.truncate(self.capacity);

        self.store
            .set_item(&version_key(tenant_id), &serde_json::to_string(&versions)?)?;
        tracing::debug!(
            tenant_id,
            version_id = %version.id,
            kept = versions.len(),
            "saved configuration version"
        );
        Ok(version)
    }

    /// Versions of a tenant, newest first
    ///
    /// An unreadable or corrupt list reads as empty.
    #[must_use]
    pub fn get_versions(&self, tenant_id: &str) -> Vec<ConfigVersion> {
        let raw = match self.store.get_item(&version_key(tenant_id)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(tenant_id, error = %e, "version history unreadable");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(tenant_id, error = %e, "version history corrupt, ignoring");
            Vec::new()
        })
    }

    /// First version with `version_id`
    #[must_use]
    pub fn get_version(&self, tenant_id: &str, version_id: &str) -> Option<ConfigVersion> {
        self.get_versions(tenant_id)
            .into_iter()
            .find(|v| v.id == version_id)
    }

    /// Configuration stored under `version_id`, to be applied by the caller
    #[must_use]
    pub fn rollback(&self, tenant_id: &str, version_id: &str) -> Option<TenantConfig> {
        let version = self.get_version(tenant_id, version_id);
        if version.is_none() {
            tracing::warn!(tenant_id, version_id, "rollback target not found");
        }
        version.map(|v| v.config)
    }

    /// Drop every version of a tenant
    ///
    /// # Errors
    /// Fails if the store cannot remove the list.
    pub fn clear_history(&self, tenant_id: &str) -> HistoryResult<()> {
        self.store.remove_item(&version_key(tenant_id))?;
        Ok(())
    }
}

impl std::fmt::Debug for VersionHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionHistory")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

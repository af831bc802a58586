//! Editor session for one tenant
//!
//! Every change goes through [`EditorSession::update`], which records an
//! undo snapshot and reports the new value to autosave. Explicit saves
//! validate, persist immediately and snapshot into version history.

use std::sync::Arc;

use dash_history::{
    compare_configs, ConfigChange, ConfigVersion, UndoHistory, VersionHistory,
};
use dash_schema::{
    default_tenant_config, parse_with_defaults, validate_config, TenantConfig, ValidationIssue,
};
use dash_store::{
    tenant_key, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StorageAdapter, TenantStore,
};

use crate::autosave::{AutosaveController, AutosaveStats, TenantSaveTarget};
use crate::config::DashConfig;
use crate::error::SessionResult;
use crate::transfer::{self, ExportDocument, ImportedConfig};

/// In-progress editing of one tenant's configuration
pub struct EditorSession {
    store: Arc<dyn StorageAdapter>,
    versions: VersionHistory,
    undo: UndoHistory<TenantConfig>,
    autosave: AutosaveController<TenantConfig>,
    config: TenantConfig,
    is_new: bool,
}

impl EditorSession {
    /// Load a tenant, or start from the default configuration if absent
    ///
    /// Stored documents are default-filled, so the session never holds a
    /// partial configuration.
    pub async fn open(
        store: Arc<dyn StorageAdapter>,
        versions: VersionHistory,
        settings: &DashConfig,
        tenant_id: &str,
    ) -> Self {
        let (config, is_new) = match store.get(&tenant_key(tenant_id)).await {
            Some(document) => {
                let mut config = parse_with_defaults(&document);
                if config.id != tenant_id {
                    tracing::warn!(tenant_id, stored_id = %config.id, "stored id differs from key");
                    config.id = tenant_id.to_string();
                }
                (config, false)
            }
            None => {
                tracing::info!(tenant_id, "no stored configuration, starting from defaults");
                (default_tenant_config(tenant_id, tenant_id), true)
            }
        };

        let mut undo = UndoHistory::with_capacity(settings.undo_capacity);
        undo.initialize(config.clone());
        let autosave = AutosaveController::new(
            Arc::new(TenantSaveTarget::new(Arc::clone(&store))),
            settings.autosave_delay(),
        );
        autosave.observe(&config);

        Self {
            store,
            versions,
            undo,
            autosave,
            config,
            is_new,
        }
    }

    /// Open a tenant with stores built from `settings`
    ///
    /// Version history lives under `history_dir` when set, in memory otherwise.
    ///
    /// # Errors
    /// Fails if the backend client or the history directory cannot be set up.
    pub async fn from_settings(settings: &DashConfig, tenant_id: &str) -> SessionResult<Self> {
        let store: Arc<dyn StorageAdapter> = Arc::new(TenantStore::from_settings(&settings.backend)?);
        let kv: Arc<dyn KeyValueStore> = match &settings.history_dir {
            Some(dir) => Arc::new(FileKeyValueStore::open(dir.clone())?),
            None => Arc::new(MemoryKeyValueStore::new()),
        };
        let versions = VersionHistory::new(kv).with_capacity(settings.version_capacity);
        Ok(Self::open(store, versions, settings, tenant_id).await)
    }

    #[inline]
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.config.id
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &TenantConfig {
        &self.config
    }

    /// Whether the tenant had no stored configuration when opened
    #[inline]
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Apply a change; returns whether the configuration changed
    ///
    /// `id` and `name` are kept as they were.
    pub fn update(&mut self, change: impl FnOnce(&mut TenantConfig)) -> bool {
        let mut next = self.config.clone();
        change(&mut next);
        if next.id != self.config.id || next.name != self.config.name {
            tracing::warn!(tenant_id = %self.config.id, "ignoring change to tenant identity");
            next.id.clone_from(&self.config.id);
            next.name.clone_from(&self.config.name);
        }
        if !self.undo.push_state(next.clone()) {
            return false;
        }
        self.config = next;
        self.autosave.observe(&self.config);
        true
    }

    /// Step back one change
    pub fn undo(&mut self) -> bool {
        let Some(state) = self.undo.undo() else {
            return false;
        };
        self.config = state.clone();
        self.autosave.observe(&self.config);
        true
    }

    /// Re-apply the last undone change
    pub fn redo(&mut self) -> bool {
        let Some(state) = self.undo.redo() else {
            return false;
        };
        self.config = state.clone();
        self.autosave.observe(&self.config);
        true
    }

    #[inline]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    #[inline]
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    /// Validate, persist and snapshot the current configuration
    ///
    /// # Errors
    /// Fails on schema violations, a failed write, or a failed history write.
    /// A failed history write leaves the configuration persisted.
    pub async fn save(&mut self, description: &str) -> SessionResult<ConfigVersion> {
        validate_config(&self.config)?;
        self.autosave.cancel();

        let document = serde_json::to_value(&self.config)?;
        self.store.set(&tenant_key(&self.config.id), document).await?;
        self.autosave.rebase(&self.config);
        self.is_new = false;

        let version = self
            .versions
            .save_version(&self.config.id, &self.config, description)?;
        tracing::info!(tenant_id = %self.config.id, version_id = %version.id, "configuration saved");
        Ok(version)
    }

    /// Versions of this tenant, newest first
    #[must_use]
    pub fn versions(&self) -> Vec<ConfigVersion> {
        self.versions.get_versions(&self.config.id)
    }

    /// Make a stored version the current configuration
    ///
    /// Returns `false` if the version does not exist. The rollback is an
    /// ordinary change: it can be undone and is autosaved.
    pub fn rollback(&mut self, version_id: &str) -> bool {
        match self.versions.rollback(&self.config.id, version_id) {
            Some(restored) => {
                self.update(|config| *config = restored);
                true
            }
            None => false,
        }
    }

    /// Differences from a stored version to the current configuration
    ///
    /// # Errors
    /// Fails if either configuration cannot be serialized.
    pub fn changes_since(&self, version_id: &str) -> SessionResult<Option<Vec<ConfigChange>>> {
        let Some(version) = self.versions.get_version(&self.config.id, version_id) else {
            return Ok(None);
        };
        Ok(Some(compare_configs(&version.config, &self.config)?))
    }

    /// Export the current configuration
    ///
    /// # Errors
    /// Fails if the configuration cannot be serialized.
    pub fn export(&self) -> SessionResult<ExportDocument> {
        Ok(transfer::export_config(&self.config)?)
    }

    /// Export the current layouts
    ///
    /// # Errors
    /// Fails if the layouts cannot be serialized.
    pub fn export_layouts(&self) -> SessionResult<ExportDocument> {
        Ok(transfer::export_layouts(&self.config.layouts, &self.config.id)?)
    }

    /// Replace the configuration with an imported one, keeping this tenant's identity
    ///
    /// The returned `data` is the configuration as applied, and `warnings`
    /// lists schema violations found in the file.
    ///
    /// # Errors
    /// Fails if the file is rejected; the session is unchanged then.
    pub fn import(&mut self, text: &str) -> SessionResult<ImportedConfig> {
        let mut imported = transfer::import_config(text)?;
        if imported.data.id != self.config.id {
            tracing::info!(
                tenant_id = %self.config.id,
                source_id = %imported.data.id,
                "importing configuration of another tenant"
            );
        }
        let data = imported.data.clone();
        self.update(|config| *config = data);
        imported.data = self.config.clone();
        Ok(imported)
    }

    /// Replace the layouts with imported ones, returning the file's schema violations
    ///
    /// # Errors
    /// Fails if the file is rejected; the session is unchanged then.
    pub fn import_layouts(&mut self, text: &str) -> SessionResult<Vec<ValidationIssue>> {
        let imported = transfer::import_layouts(text)?;
        let layouts = imported.layouts;
        self.update(|config| config.layouts = layouts);
        Ok(imported.warnings)
    }

    /// Save any pending autosave now
    pub async fn flush(&self) -> bool {
        self.autosave.flush().await
    }

    #[must_use]
    pub fn autosave_stats(&self) -> AutosaveStats {
        self.autosave.stats()
    }

    /// Flush pending changes and end the session
    pub async fn close(self) -> TenantConfig {
        self.autosave.flush().await;
        self.config
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("tenant_id", &self.config.id)
            .field("is_new", &self.is_new)
            .field("undo_depth", &self.undo.undo_depth())
            .finish_non_exhaustive()
    }
}

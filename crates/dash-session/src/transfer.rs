//! Export and import of configurations and layouts
//!
//! Full export:
//!
//! ```json
//! { "version": "1.0", "exportedAt": "...", "tenant": {"id": "...", "name": "..."}, "data": { ... } }
//! ```
//!
//! Layout export replaces `tenant`/`data` with `"type": "layouts"`,
//! `tenantId` and `layouts`. Layout import also accepts a full export and
//! takes `data.layouts` from it.
//!
//! Imports never fail on schema violations: data that decodes as-is is kept
//! exactly, anything else is repaired with defaults, and the strict
//! validator's findings come back as warnings.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use dash_schema::{
    parse_layouts_with_defaults, parse_with_defaults, validate, validate_layouts, Layouts,
    TenantConfig, ValidationError, ValidationIssue,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Format version written into every export
pub const EXPORT_FORMAT_VERSION: &str = "1.0";

/// Reasons an import is rejected
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid export file: missing {0}")]
    MissingField(&'static str),

    #[error("file contains no layouts")]
    NoLayouts,

    #[error("cannot read file: {0}")]
    Io(#[from] std::io::Error),
}

/// Tenant identity recorded in a full export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRef {
    pub id: String,
    pub name: String,
}

/// Wrapper metadata of an imported file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMeta {
    pub version: String,
    pub exported_at: Option<String>,
    pub tenant: Option<TenantRef>,
}

/// A rendered export, ready to be written or offered for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub file_name: String,
    pub contents: String,
}

impl ExportDocument {
    /// Write the document into `dir` under its file name
    ///
    /// # Errors
    /// Fails if the file cannot be written.
    pub async fn write_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(&self.file_name);
        tokio::fs::write(&path, &self.contents).await?;
        tracing::info!(path = %path.display(), bytes = self.contents.len(), "export written");
        Ok(path)
    }
}

/// A successfully imported configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedConfig {
    pub data: TenantConfig,
    pub meta: ExportMeta,
    /// Schema violations found in the file; `data` is usable regardless
    pub warnings: Vec<ValidationIssue>,
}

/// Successfully imported layouts
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedLayouts {
    pub layouts: Layouts,
    pub warnings: Vec<ValidationIssue>,
}

fn advisory<T>(checked: Result<T, ValidationError>) -> Vec<ValidationIssue> {
    match checked {
        Ok(_) => Vec::new(),
        Err(e) => {
            tracing::warn!(issues = e.issues().len(), error = %e, "imported file does not satisfy the schema");
            e.issues().to_vec()
        }
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigExport<'a> {
    version: &'static str,
    exported_at: String,
    tenant: TenantRef,
    data: &'a TenantConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LayoutsExport<'a> {
    version: &'static str,
    exported_at: String,
    #[serde(rename = "type")]
    kind: &'static str,
    tenant_id: &'a str,
    layouts: &'a Layouts,
}

/// Wrap a configuration for export
///
/// # Errors
/// Fails if the configuration cannot be serialized.
pub fn export_config(config: &TenantConfig) -> Result<ExportDocument, serde_json::Error> {
    export_config_at(config, Utc::now())
}

/// Wrap a configuration for export with an explicit timestamp
///
/// # Errors
/// Fails if the configuration cannot be serialized.
pub fn export_config_at(config: &TenantConfig, at: DateTime<Utc>) -> Result<ExportDocument, serde_json::Error> {
    let wrapper = ConfigExport {
        version: EXPORT_FORMAT_VERSION,
        exported_at: timestamp(at),
        tenant: TenantRef {
            id: config.id.clone(),
            name: config.name.clone(),
        },
        data: config,
    };
    Ok(ExportDocument {
        file_name: format!("dashboard-config-{}-{}.json", config.id, at.format("%Y-%m-%d")),
        contents: serde_json::to_string_pretty(&wrapper)?,
    })
}

/// Wrap a tenant's layouts for export
///
/// # Errors
/// Fails if the layouts cannot be serialized.
pub fn export_layouts(layouts: &Layouts, tenant_id: &str) -> Result<ExportDocument, serde_json::Error> {
    export_layouts_at(layouts, tenant_id, Utc::now())
}

/// Wrap a tenant's layouts for export with an explicit timestamp
///
/// # Errors
/// Fails if the layouts cannot be serialized.
pub fn export_layouts_at(
    layouts: &Layouts,
    tenant_id: &str,
    at: DateTime<Utc>,
) -> Result<ExportDocument, serde_json::Error> {
    let wrapper = LayoutsExport {
        version: EXPORT_FORMAT_VERSION,
        exported_at: timestamp(at),
        kind: "layouts",
        tenant_id,
        layouts,
    };
    Ok(ExportDocument {
        file_name: format!("dashboard-layouts-{tenant_id}-{}.json", at.format("%Y-%m-%d")),
        contents: serde_json::to_string_pretty(&wrapper)?,
    })
}

/// Parse a full export
///
/// # Errors
/// Fails on malformed JSON or a missing `version` or `data`.
pub fn import_config(text: &str) -> Result<ImportedConfig, ImportError> {
    let wrapper: JsonValue = serde_json::from_str(text)?;
    let version = wrapper
        .get("version")
        .and_then(JsonValue::as_str)
        .ok_or(ImportError::MissingField("version"))?;
    let data = wrapper
        .get("data")
        .filter(|d| !d.is_null())
        .ok_or(ImportError::MissingField("data"))?;

    let meta = ExportMeta {
        version: version.to_string(),
        exported_at: wrapper
            .get("exportedAt")
            .and_then(JsonValue::as_str)
            .map(str::to_string),
        tenant: wrapper
            .get("tenant")
            .and_then(|t| serde_json::from_value(t.clone()).ok()),
    };
    if meta.version != EXPORT_FORMAT_VERSION {
        tracing::warn!(version = %meta.version, "importing export of a different format version");
    }

    let warnings = advisory(validate(data));
    let data = TenantConfig::deserialize(data).unwrap_or_else(|_| parse_with_defaults(data));
    Ok(ImportedConfig { data, meta, warnings })
}

/// Parse layouts from a layout export or a full export
///
/// # Errors
/// Fails on malformed JSON or a file with neither shape.
pub fn import_layouts(text: &str) -> Result<ImportedLayouts, ImportError> {
    let wrapper: JsonValue = serde_json::from_str(text)?;
    let layouts = wrapper
        .get("layouts")
        .or_else(|| wrapper.get("data").and_then(|d| d.get("layouts")))
        .filter(|l| l.is_object())
        .ok_or(ImportError::NoLayouts)?;
    let warnings = advisory(validate_layouts(layouts));
    let layouts = Layouts::deserialize(layouts).unwrap_or_else(|_| parse_layouts_with_defaults(layouts));
    Ok(ImportedLayouts { layouts, warnings })
}

/// Read and parse a full export from disk
///
/// # Errors
/// Fails if the file cannot be read or [`import_config`] rejects it.
pub async fn import_config_file(path: &Path) -> Result<ImportedConfig, ImportError> {
    let text = tokio::fs::read_to_string(path).await?;
    import_config(&text)
}

/// Read and parse layouts from disk
///
/// # Errors
/// Fails if the file cannot be read or [`import_layouts`] rejects it.
pub async fn import_layouts_file(path: &Path) -> Result<ImportedLayouts, ImportError> {
    let text = tokio::fs::read_to_string(path).await?;
    import_layouts(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dash_schema::default_tenant_config;
    use pretty_assertions::assert_eq;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap()
    }

    #[test]
    fn config_round_trip() {
        let config = default_tenant_config("acme", "Acme");
        let export = export_config_at(&config, at()).unwrap();
        assert_eq!(export.file_name, "dashboard-config-acme-2025-03-04.json");

        let imported = import_config(&export.contents).unwrap();
        assert_eq!(imported.data, config);
        assert!(imported.warnings.is_empty());
        assert_eq!(imported.meta.version, "1.0");
        assert_eq!(imported.meta.exported_at.as_deref(), Some("2025-03-04T05:06:07.000Z"));
        assert_eq!(imported.meta.tenant.unwrap().name, "Acme");
    }

    #[test]
    fn missing_wrapper_fields() {
        assert!(matches!(
            import_config(r#"{"data": {}}"#),
            Err(ImportError::MissingField("version"))
        ));
        assert!(matches!(
            import_config(r#"{"version": "1.0"}"#),
            Err(ImportError::MissingField("data"))
        ));
        assert!(matches!(import_config("{oops"), Err(ImportError::Parse(_))));
    }

    #[test]
    fn out_of_range_value_survives_round_trip() {
        let mut config = default_tenant_config("acme", "Acme");
        config.sidebar.width = 500;
        let export = export_config_at(&config, at()).unwrap();

        let imported = import_config(&export.contents).unwrap();
        assert_eq!(imported.data, config);
        assert_eq!(imported.warnings.len(), 1);
        assert_eq!(imported.warnings[0].path, "sidebar.width");
    }

    #[test]
    fn partial_data_is_filled_with_defaults() {
        let imported = import_config(r#"{"version": "1.0", "data": {"theme": {"mode": "dark"}}}"#).unwrap();
        assert_eq!(imported.data.theme.mode, dash_schema::ThemeMode::Dark);
        assert_eq!(imported.data.id, "default");
        let paths: Vec<_> = imported.warnings.iter().map(|w| w.path.as_str()).collect();
        assert_eq!(paths, ["id", "name"]);
    }

    #[test]
    fn layouts_from_either_shape() {
        let config = default_tenant_config("acme", "Acme");
        let layout_export = export_layouts_at(&config.layouts, "acme", at()).unwrap();
        assert_eq!(layout_export.file_name, "dashboard-layouts-acme-2025-03-04.json");
        assert_eq!(import_layouts(&layout_export.contents).unwrap().layouts, config.layouts);

        let full_export = export_config_at(&config, at()).unwrap();
        let imported = import_layouts(&full_export.contents).unwrap();
        assert_eq!(imported.layouts, config.layouts);
        assert!(imported.warnings.is_empty());
    }

    #[test]
    fn broken_layouts_are_repaired() {
        let imported = import_layouts(
            r#"{"layouts": {"home": [{"id": "a", "widgetId": "notes", "position": {"width": 20}}, {"id": 3}]}}"#,
        )
        .unwrap();
        assert_eq!(imported.layouts["home"].len(), 1);
        assert_eq!(imported.layouts["home"][0].position.width, 12);
        assert!(imported.warnings.iter().any(|w| w.path == "layouts.home.0.position.width"));
        assert!(imported.warnings.iter().any(|w| w.path == "layouts.home.1.id"));
    }

    #[test]
    fn layouts_missing() {
        assert!(matches!(
            import_layouts(r#"{"version": "1.0", "data": {}}"#),
            Err(ImportError::NoLayouts)
        ));
        assert!(matches!(
            import_layouts(r#"{"layouts": [1, 2]}"#),
            Err(ImportError::NoLayouts)
        ));
    }

    #[tokio::test]
    async fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = default_tenant_config("acme", "Acme");
        let path = export_config(&config).unwrap().write_to(dir.path()).await.unwrap();

        let imported = import_config_file(&path).await.unwrap();
        assert_eq!(imported.data, config);
        assert!(matches!(
            import_config_file(&dir.path().join("nope.json")).await,
            Err(ImportError::Io(_))
        ));
    }
}

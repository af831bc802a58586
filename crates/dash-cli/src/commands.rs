//! Subcommand implementations
//!
//! Each command returns the text to print; `main` owns stdout and the
//! exit status.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context, Result};
use dash_access::{get_flags_by_category, unknown_overrides, visible_page_widgets, Role};
use dash_history::compare_versions;
use dash_schema::{
    default_tenant_config, parse_with_defaults, validate, ValidationIssue, WidgetRegistry,
};
use dash_session::{
    export_config, export_layouts, import_config_file, import_layouts_file, DashConfig,
    ExportDocument,
};
use dash_store::{tenant_key, StorageAdapter, TenantStore};
use serde_json::Value as JsonValue;

/// Printable result and whether the command succeeded
#[derive(Debug)]
pub(crate) struct Outcome {
    pub(crate) output: String,
    pub(crate) success: bool,
}

impl Outcome {
    fn ok(output: String) -> Self {
        Self {
            output,
            success: true,
        }
    }
}

fn read_json(path: &Path) -> Result<JsonValue> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn pretty(value: &impl serde::Serialize) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Strictly validate a configuration file, listing every issue
pub(crate) fn validate_file(path: &Path) -> Result<Outcome> {
    let raw = read_json(path)?;
    match validate(&raw) {
        Ok(config) => Ok(Outcome::ok(format!("{}: valid configuration for '{}'", path.display(), config.id))),
        Err(err) => {
            let mut output = format!("{}: {} issue(s)\n", path.display(), err.issues().len());
            for issue in err.issues() {
                let _ = writeln!(output, "  {issue}");
            }
            Ok(Outcome {
                output,
                success: false,
            })
        }
    }
}

/// Fill defaults into a partial configuration
pub(crate) fn normalize_file(path: &Path) -> Result<String> {
    pretty(&parse_with_defaults(&read_json(path)?))
}

/// Field-level differences between two documents
pub(crate) fn diff_files(before: &Path, after: &Path) -> Result<String> {
    let changes = compare_versions(&read_json(before)?, &read_json(after)?);
    if changes.is_empty() {
        return Ok("no differences".to_string());
    }
    Ok(changes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Effective feature flags of a configuration, grouped by category
pub(crate) fn flags_report(path: &Path, as_json: bool) -> Result<String> {
    let config = parse_with_defaults(&read_json(path)?);
    let grouped = get_flags_by_category(&config.feature_flags);
    if as_json {
        return pretty(&grouped);
    }

    let mut output = String::new();
    for (category, flags) in &grouped {
        let _ = writeln!(output, "{}:", category.as_str());
        for flag in flags {
            let _ = writeln!(
                output,
                "  [{}] {:<20} {}{}",
                if flag.enabled { "x" } else { " " },
                flag.key,
                flag.name,
                if flag.is_overridden { " (override)" } else { "" },
            );
        }
    }
    for key in unknown_overrides(&config.feature_flags) {
        let _ = writeln!(output, "warning: '{key}' is not a known flag");
    }
    Ok(output.trim_end().to_string())
}

/// Widgets of a page that `role` may see
pub(crate) fn widgets_report(path: &Path, page: &str, role: &str) -> Result<String> {
    let role: Role = role.parse()?;
    let config = parse_with_defaults(&read_json(path)?);
    let registry = WidgetRegistry::with_defaults();
    let visible = visible_page_widgets(&config, page, &registry, role.as_str());
    let hidden = config.page(page).len() - visible.len();

    let mut output = String::new();
    for instance in &visible {
        let p = &instance.position;
        let _ = writeln!(
            output,
            "{:<16} {:<16} row {} col {} ({}x{})",
            instance.id, instance.widget_id, p.row, p.col, p.width, p.height
        );
    }
    let _ = write!(output, "{} visible, {hidden} hidden for role {role}", visible.len());
    Ok(output)
}

async fn emit(document: ExportDocument, out: Option<&Path>) -> Result<String> {
    match out {
        Some(dir) => {
            let path = document
                .write_to(dir)
                .await
                .with_context(|| format!("cannot write into {}", dir.display()))?;
            Ok(format!("wrote {}", path.display()))
        }
        None => Ok(document.contents),
    }
}

/// Wrap a strictly valid configuration as an export file
pub(crate) async fn export_file(path: &Path, layouts_only: bool, out: Option<&Path>) -> Result<String> {
    let config = validate(&read_json(path)?)
        .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;
    let document = if layouts_only {
        export_layouts(&config.layouts, &config.id)?
    } else {
        export_config(&config)?
    };
    emit(document, out).await
}

/// Read an export file and print what it carries
pub(crate) async fn import_file(path: &Path, layouts_only: bool) -> Result<String> {
    if layouts_only {
        let imported = import_layouts_file(path).await?;
        report_warnings(&imported.warnings);
        return pretty(&imported.layouts);
    }
    let imported = import_config_file(path).await?;
    if let Some(tenant) = &imported.meta.tenant {
        tracing::info!(tenant_id = %tenant.id, version = %imported.meta.version, "import accepted");
    }
    report_warnings(&imported.warnings);
    pretty(&imported.data)
}

fn report_warnings(warnings: &[ValidationIssue]) {
    for issue in warnings {
        tracing::warn!(path = %issue.path, "{}", issue.message);
    }
}

/// Default configuration for a new tenant
pub(crate) fn sample(id: &str, name: Option<&str>) -> Result<String> {
    pretty(&default_tenant_config(id, name.unwrap_or(id)))
}

fn connect(settings: &DashConfig) -> Result<TenantStore> {
    if !settings.backend.is_configured() {
        bail!("backend endpoint and access key are required");
    }
    Ok(TenantStore::from_settings(&settings.backend)?)
}

/// Fetch a tenant document from the backend, default-filled
pub(crate) async fn pull(settings: &DashConfig, tenant_id: &str) -> Result<String> {
    let store = connect(settings)?;
    let Some(document) = store.get(&tenant_key(tenant_id)).await else {
        bail!("tenant '{tenant_id}' not found");
    };
    pretty(&parse_with_defaults(&document))
}

/// Validate a configuration file and write it to the backend
pub(crate) async fn push(settings: &DashConfig, path: &Path) -> Result<String> {
    let config = validate(&read_json(path)?)
        .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;
    let store = connect(settings)?;
    store
        .set(&tenant_key(&config.id), serde_json::to_value(&config)?)
        .await?;
    Ok(format!("saved tenant '{}'", config.id))
}

/// Tenant ids known to the backend
pub(crate) async fn list(settings: &DashConfig) -> Result<String> {
    let store = connect(settings)?;
    Ok(store.keys(dash_store::TENANT_PREFIX).await.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_schema::{WidgetInstance, WidgetPosition};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn write(dir: &Path, name: &str, value: &JsonValue) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
        path
    }

    fn sample_value(id: &str) -> JsonValue {
        serde_json::to_value(default_tenant_config(id, "Acme")).unwrap()
    }

    #[test]
    fn validate_reports_every_issue() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(dir.path(), "good.json", &sample_value("acme"));
        let bad = write(
            dir.path(),
            "bad.json",
            &json!({"id": "acme", "name": "Acme", "sidebar": {"width": 5}, "theme": {"colors": {"primary": "red"}}}),
        );

        let outcome = validate_file(&good).unwrap();
        assert!(outcome.success);
        assert!(outcome.output.contains("'acme'"));

        let outcome = validate_file(&bad).unwrap();
        assert!(!outcome.success);
        assert!(outcome.output.contains("sidebar.width"));
        assert!(outcome.output.contains("theme.colors.primary"));
    }

    #[test]
    fn unreadable_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_file(&dir.path().join("missing.json")).is_err());

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{").unwrap();
        assert!(normalize_file(&path).is_err());
    }

    #[test]
    fn normalize_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "partial.json", &json!({"id": "acme", "sidebar": {"width": 900}}));

        let normalized: JsonValue = serde_json::from_str(&normalize_file(&path).unwrap()).unwrap();
        assert_eq!(normalized["sidebar"]["width"], 400);
        assert!(normalized["layouts"].is_object());
    }

    #[test]
    fn diff_lists_changed_paths() {
        let dir = tempfile::tempdir().unwrap();
        let before = write(dir.path(), "a.json", &json!({"sidebar": {"width": 240}, "name": "A"}));
        let after = write(dir.path(), "b.json", &json!({"sidebar": {"width": 300}, "name": "A"}));

        assert_eq!(diff_files(&before, &after).unwrap(), "sidebar.width: 240 -> 300");
        assert_eq!(diff_files(&before, &before).unwrap(), "no differences");
    }

    #[test]
    fn flags_show_overrides_and_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut value = sample_value("acme");
        value["featureFlags"] = json!({"darkMode": false, "darkmode": true});
        let path = write(dir.path(), "flags.json", &value);

        let text = flags_report(&path, false).unwrap();
        assert!(text.starts_with("dashboard:"));
        assert!(text.contains("[ ] darkMode"));
        assert!(text.contains("(override)"));
        assert!(text.contains("warning: 'darkmode' is not a known flag"));

        let grouped: JsonValue = serde_json::from_str(&flags_report(&path, true).unwrap()).unwrap();
        assert!(grouped["admin"].is_array());
    }

    #[test]
    fn widgets_respect_role() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = default_tenant_config("acme", "Acme");
        config.layouts.insert(
            "ops".into(),
            vec![
                WidgetInstance::new("health", "system-health", WidgetPosition::new(0, 0, 6, 2)),
                WidgetInstance::new("memo", "notes", WidgetPosition::new(2, 0, 4, 1)),
            ],
        );
        let path = write(dir.path(), "config.json", &serde_json::to_value(&config).unwrap());

        let guest = widgets_report(&path, "ops", "guest").unwrap();
        assert!(guest.ends_with("1 visible, 1 hidden for role guest"));
        let admin = widgets_report(&path, "ops", "admin").unwrap();
        assert!(admin.contains("health"));
        assert!(widgets_report(&path, "ops", "root").is_err());
    }

    #[tokio::test]
    async fn export_then_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "config.json", &sample_value("acme"));

        let message = export_file(&path, false, Some(dir.path())).await.unwrap();
        assert!(message.starts_with("wrote "));
        let exported = message.trim_start_matches("wrote ");

        let imported: JsonValue =
            serde_json::from_str(&import_file(Path::new(exported), false).await.unwrap()).unwrap();
        assert_eq!(imported["id"], "acme");

        let layouts = export_file(&path, true, None).await.unwrap();
        let layouts_path = dir.path().join("layouts.json");
        std::fs::write(&layouts_path, layouts).unwrap();
        let imported: JsonValue =
            serde_json::from_str(&import_file(&layouts_path, true).await.unwrap()).unwrap();
        assert_eq!(imported, sample_value("acme")["layouts"]);
    }

    #[tokio::test]
    async fn import_fills_partial_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "partial.json",
            &json!({"version": "1.0", "data": {"id": "acme", "sidebar": {"width": 5}}}),
        );

        let imported: JsonValue = serde_json::from_str(&import_file(&path, false).await.unwrap()).unwrap();
        assert_eq!(imported["id"], "acme");
        assert_eq!(imported["name"], "Default Tenant");
        assert_eq!(imported["sidebar"]["width"], 64);
    }

    #[tokio::test]
    async fn export_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bad.json", &json!({"id": "acme", "sidebar": {"width": 5}}));
        let err = export_file(&path, false, None).await.unwrap_err();
        assert!(err.to_string().contains("sidebar.width"));
    }

    #[test]
    fn sample_uses_id_as_default_name() {
        let value: JsonValue = serde_json::from_str(&sample("acme", None).unwrap()).unwrap();
        assert_eq!(value["name"], "acme");
        let value: JsonValue = serde_json::from_str(&sample("acme", Some("Acme Inc")).unwrap()).unwrap();
        assert_eq!(value["name"], "Acme Inc");
    }

    #[tokio::test]
    async fn backend_commands_need_settings() {
        let settings = DashConfig::new();
        let err = pull(&settings, "acme").await.unwrap_err();
        assert!(err.to_string().contains("access key"));
        assert!(list(&settings).await.is_err());
    }
}

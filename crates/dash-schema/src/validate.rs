//! Schema validation and default filling
//!
//! Both entry points share one reader. The reader walks a raw JSON document,
//! substitutes the documented default for anything missing or invalid and
//! records an issue for every invalid value it meets:
//!
//! - [`validate`] fails when any issue was recorded (strict)
//! - [`parse_with_defaults`] discards the issues (never fails): invalid enums
//!   fall back to their default, out-of-range numbers are clamped, malformed
//!   entries are dropped
//!
//! Missing fields are never an issue, except the tenant `id` and `name`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value as JsonValue};

use crate::defaults::{
    default_colors, default_languages, default_sidebar_items, DEFAULT_TENANT_ID,
    DEFAULT_TENANT_NAME, DEFAULT_WIDGET_WIDTH, GRID_COLUMNS, SIDEBAR_DEFAULT_WIDTH,
    SIDEBAR_MAX_WIDTH, SIDEBAR_MIN_WIDTH,
};
use crate::error::{ValidationError, ValidationIssue};
use crate::model::{
    BrandingConfig, DragConfig, FeatureFlags, I18nConfig, Language, Layouts, Radius,
    SidebarConfig, SidebarItem, SidebarMode, SidebarPosition, TenantConfig, ThemeColors,
    ThemeConfig, ThemeMode, WidgetInstance, WidgetPermissions, WidgetPosition,
};

static HSL_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+(?:\.\d+)?\s+\d+(?:\.\d+)?%\s+\d+(?:\.\d+)?%$").expect("static pattern")
});

/// Whether `value` is an `H S% L%` triple (no `hsl()` wrapper)
#[inline]
#[must_use]
pub fn is_hsl_color(value: &str) -> bool {
    HSL_COLOR.is_match(value.trim())
}

/// Strictly validate a raw document
///
/// Missing fields take their defaults; present but invalid values are
/// reported, all of them, as `path: message` issues.
///
/// # Errors
/// Returns every violation found in the document.
pub fn validate(raw: &JsonValue) -> Result<TenantConfig, ValidationError> {
    let (config, issues) = read_config(raw);
    if issues.is_empty() {
        Ok(config)
    } else {
        Err(ValidationError::new(issues))
    }
}

/// Produce a complete document from any input; never fails
#[must_use]
pub fn parse_with_defaults(raw: &JsonValue) -> TenantConfig {
    let (config, issues) = read_config(raw);
    if !issues.is_empty() {
        tracing::debug!(
            tenant_id = %config.id,
            replaced = issues.len(),
            "filled invalid fields with defaults"
        );
    }
    config
}

/// Re-check a typed document, e.g. before an explicit save
///
/// # Errors
/// Returns every violation found in the document.
pub fn validate_config(config: &TenantConfig) -> Result<(), ValidationError> {
    let raw = serde_json::to_value(config)
        .map_err(|e| ValidationError::new(vec![ValidationIssue::new("", e.to_string())]))?;
    validate(&raw).map(|_| ())
}

/// Strictly validate a standalone `layouts` map, e.g. from an import
///
/// # Errors
/// Returns every violation found, with paths rooted at `layouts`.
pub fn validate_layouts(raw: &JsonValue) -> Result<Layouts, ValidationError> {
    let mut reader = Reader::default();
    let layouts = reader.layouts(Some(raw), &FieldPath::default().join("layouts"));
    if reader.issues.is_empty() {
        Ok(layouts)
    } else {
        Err(ValidationError::new(reader.issues))
    }
}

/// Repair a standalone `layouts` map the way [`parse_with_defaults`] does
#[must_use]
pub fn parse_layouts_with_defaults(raw: &JsonValue) -> Layouts {
    let mut reader = Reader::default();
    reader.layouts(Some(raw), &FieldPath::default().join("layouts"))
}

fn read_config(raw: &JsonValue) -> (TenantConfig, Vec<ValidationIssue>) {
    let mut reader = Reader::default();
    let root = FieldPath::default();
    let obj = reader.object(Some(raw), &root);
    let now = Utc::now();

    let config = TenantConfig {
        id: reader.required_string(get(obj, "id"), &root.join("id"), DEFAULT_TENANT_ID),
        name: reader.required_string(get(obj, "name"), &root.join("name"), DEFAULT_TENANT_NAME),
        theme: reader.theme(get(obj, "theme"), &root.join("theme")),
        branding: reader.branding(get(obj, "branding"), &root.join("branding")),
        sidebar: reader.sidebar(get(obj, "sidebar"), &root.join("sidebar")),
        i18n: reader.i18n(get(obj, "i18n"), &root.join("i18n")),
        drag: reader.drag(get(obj, "drag"), &root.join("drag")),
        layouts: reader.layouts(get(obj, "layouts"), &root.join("layouts")),
        feature_flags: reader.bool_map(get(obj, "featureFlags"), &root.join("featureFlags")),
        widget_permissions: reader
            .permissions(get(obj, "widgetPermissions"), &root.join("widgetPermissions")),
        created_at: reader.timestamp(get(obj, "createdAt"), &root.join("createdAt"), now),
        updated_at: reader.timestamp(get(obj, "updatedAt"), &root.join("updatedAt"), now),
    };

    (config, reader.issues)
}

#[inline]
fn get<'a>(obj: Option<&'a Map<String, JsonValue>>, key: &str) -> Option<&'a JsonValue> {
    obj.and_then(|map| map.get(key))
}

fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn expected(kind: &str, value: &JsonValue) -> String {
    format!("Expected {kind} but received {}", type_name(value))
}

fn index_u32(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

/// Dotted location inside the document
#[derive(Debug, Clone, Default)]
struct FieldPath(Vec<String>);

impl FieldPath {
    fn join(&self, segment: impl fmt::Display) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Closed string enums of the schema
trait SchemaEnum: Sized + Copy + 'static {
    const VARIANTS: &'static [(&'static str, Self)];
}

impl SchemaEnum for ThemeMode {
    const VARIANTS: &'static [(&'static str, Self)] =
        &[("light", ThemeMode::Light), ("dark", ThemeMode::Dark)];
}

impl SchemaEnum for Radius {
    const VARIANTS: &'static [(&'static str, Self)] = &[
        ("none", Radius::None),
        ("sm", Radius::Small),
        ("md", Radius::Medium),
        ("lg", Radius::Large),
        ("full", Radius::Full),
    ];
}

impl SchemaEnum for SidebarMode {
    const VARIANTS: &'static [(&'static str, Self)] = &[
        ("icon-only", SidebarMode::IconOnly),
        ("icon-text", SidebarMode::IconText),
        ("collapsed", SidebarMode::Collapsed),
    ];
}

impl SchemaEnum for SidebarPosition {
    const VARIANTS: &'static [(&'static str, Self)] =
        &[("left", SidebarPosition::Left), ("right", SidebarPosition::Right)];
}

impl SchemaEnum for Language {
    const VARIANTS: &'static [(&'static str, Self)] = &[("tr", Language::Tr), ("en", Language::En)];
}

#[derive(Debug, Default)]
struct Reader {
    issues: Vec<ValidationIssue>,
}

impl Reader {
    fn report(&mut self, path: &FieldPath, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(path.to_string(), message));
    }

    fn object<'a>(
        &mut self,
        value: Option<&'a JsonValue>,
        path: &FieldPath,
    ) -> Option<&'a Map<String, JsonValue>> {
        match value? {
            JsonValue::Object(map) => Some(map),
            other => {
                self.report(path, expected("object", other));
                None
            }
        }
    }

    fn string(&mut self, value: Option<&JsonValue>, path: &FieldPath, default: &str) -> String {
        match value {
            None => default.to_string(),
            Some(JsonValue::String(s)) => s.clone(),
            Some(other) => {
                self.report(path, expected("string", other));
                default.to_string()
            }
        }
    }

    fn required_string(
        &mut self,
        value: Option<&JsonValue>,
        path: &FieldPath,
        fallback: &str,
    ) -> String {
        self.identifier(value, path)
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Non-empty string that must be present
    fn identifier(&mut self, value: Option<&JsonValue>, path: &FieldPath) -> Option<String> {
        match value {
            None => {
                self.report(path, "Required");
                None
            }
            Some(JsonValue::String(s)) if s.is_empty() => {
                self.report(path, "String must contain at least 1 character(s)");
                None
            }
            Some(JsonValue::String(s)) => Some(s.clone()),
            Some(other) => {
                self.report(path, expected("string", other));
                None
            }
        }
    }

    fn boolean(&mut self, value: Option<&JsonValue>, path: &FieldPath, default: bool) -> bool {
        match value {
            None => default,
            Some(JsonValue::Bool(b)) => *b,
            Some(other) => {
                self.report(path, expected("boolean", other));
                default
            }
        }
    }

    /// Integer in `[min, max]`; out-of-range values are reported and clamped
    fn integer(
        &mut self,
        value: Option<&JsonValue>,
        path: &FieldPath,
        (min, max): (u32, u32),
        default: u32,
    ) -> u32 {
        let Some(value) = value else {
            return default;
        };
        let number = value
            .as_i64()
            .or_else(|| value.as_u64().map(|n| i64::try_from(n).unwrap_or(i64::MAX)));
        let Some(number) = number else {
            let message = if value.is_number() {
                "Expected integer but received float".to_string()
            } else {
                expected("number", value)
            };
            self.report(path, message);
            return default;
        };

        if number < i64::from(min) {
            self.report(path, format!("Number must be greater than or equal to {min}"));
            return min;
        }
        if number > i64::from(max) {
            self.report(path, format!("Number must be less than or equal to {max}"));
            return max;
        }
        u32::try_from(number).unwrap_or(default)
    }

    fn enum_value<T: SchemaEnum>(&mut self, value: &JsonValue, path: &FieldPath) -> Option<T> {
        let Some(s) = value.as_str() else {
            self.report(path, expected("string", value));
            return None;
        };
        if let Some((_, variant)) = T::VARIANTS.iter().find(|(name, _)| *name == s) {
            return Some(*variant);
        }
        let allowed: Vec<_> = T::VARIANTS.iter().map(|(name, _)| format!("'{name}'")).collect();
        self.report(
            path,
            format!("Invalid enum value. Expected {} but received '{s}'", allowed.join(" | ")),
        );
        None
    }

    fn enumeration<T: SchemaEnum>(
        &mut self,
        value: Option<&JsonValue>,
        path: &FieldPath,
        default: T,
    ) -> T {
        value
            .and_then(|v| self.enum_value(v, path))
            .unwrap_or(default)
    }

    fn timestamp(
        &mut self,
        value: Option<&JsonValue>,
        path: &FieldPath,
        fallback: DateTime<Utc>,
    ) -> DateTime<Utc> {
        match value {
            None => fallback,
            Some(JsonValue::String(s)) => match DateTime::parse_from_rfc3339(s) {
                Ok(parsed) => parsed.with_timezone(&Utc),
                Err(_) => {
                    self.report(path, "Invalid datetime");
                    fallback
                }
            },
            Some(other) => {
                self.report(path, expected("string", other));
                fallback
            }
        }
    }

    fn theme(&mut self, value: Option<&JsonValue>, path: &FieldPath) -> ThemeConfig {
        let obj = self.object(value, path);
        let colors_path = path.join("colors");
        let colors_obj = self.object(get(obj, "colors"), &colors_path);

        let mut colors = default_colors();
        for name in ThemeColors::NAMES {
            let color_path = colors_path.join(name);
            match get(colors_obj, name) {
                None => {}
                Some(JsonValue::String(s)) if is_hsl_color(s) => {
                    if let Some(slot) = colors.get_mut(name) {
                        s.trim().clone_into(slot);
                    }
                }
                Some(JsonValue::String(s)) => self.report(
                    &color_path,
                    format!("Invalid color '{s}': expected format 'H S% L%'"),
                ),
                Some(other) => self.report(&color_path, expected("string", other)),
            }
        }

        ThemeConfig {
            mode: self.enumeration(get(obj, "mode"), &path.join("mode"), ThemeMode::default()),
            colors,
            radius: self.enumeration(get(obj, "radius"), &path.join("radius"), Radius::default()),
        }
    }

    fn branding(&mut self, value: Option<&JsonValue>, path: &FieldPath) -> BrandingConfig {
        let obj = self.object(value, path);
        let defaults = BrandingConfig::default();
        BrandingConfig {
            logo_url: self.string(get(obj, "logoUrl"), &path.join("logoUrl"), &defaults.logo_url),
            app_name: self.string(get(obj, "appName"), &path.join("appName"), &defaults.app_name),
            favicon: self.string(get(obj, "favicon"), &path.join("favicon"), &defaults.favicon),
        }
    }

    fn sidebar(&mut self, value: Option<&JsonValue>, path: &FieldPath) -> SidebarConfig {
        let obj = self.object(value, path);
        let items_path = path.join("items");

        let items = match get(obj, "items") {
            None => default_sidebar_items(),
            Some(JsonValue::Array(entries)) => entries
                .iter()
                .enumerate()
                .filter_map(|(i, entry)| self.sidebar_item(entry, &items_path.join(i), i))
                .collect(),
            Some(other) => {
                self.report(&items_path, expected("array", other));
                default_sidebar_items()
            }
        };

        SidebarConfig {
            mode: self.enumeration(get(obj, "mode"), &path.join("mode"), SidebarMode::default()),
            position: self.enumeration(
                get(obj, "position"),
                &path.join("position"),
                SidebarPosition::default(),
            ),
            width: self.integer(
                get(obj, "width"),
                &path.join("width"),
                (SIDEBAR_MIN_WIDTH, SIDEBAR_MAX_WIDTH),
                SIDEBAR_DEFAULT_WIDTH,
            ),
            items,
        }
    }

    fn sidebar_item(
        &mut self,
        value: &JsonValue,
        path: &FieldPath,
        index: usize,
    ) -> Option<SidebarItem> {
        let obj = self.object(Some(value), path)?;
        let id = self.identifier(obj.get("id"), &path.join("id"))?;
        Some(SidebarItem {
            id,
            visible: self.boolean(obj.get("visible"), &path.join("visible"), true),
            order: self.integer(obj.get("order"), &path.join("order"), (0, u32::MAX), index_u32(index)),
        })
    }

    fn i18n(&mut self, value: Option<&JsonValue>, path: &FieldPath) -> I18nConfig {
        let obj = self.object(value, path);
        let langs_path = path.join("supportedLanguages");

        let supported_languages = match get(obj, "supportedLanguages") {
            None => default_languages(),
            Some(JsonValue::Array(entries)) => {
                let parsed: BTreeSet<Language> = entries
                    .iter()
                    .enumerate()
                    .filter_map(|(i, entry)| self.enum_value(entry, &langs_path.join(i)))
                    .collect();
                if parsed.is_empty() && !entries.is_empty() {
                    default_languages()
                } else {
                    parsed
                }
            }
            Some(other) => {
                self.report(&langs_path, expected("array", other));
                default_languages()
            }
        };

        I18nConfig {
            enabled: self.boolean(get(obj, "enabled"), &path.join("enabled"), true),
            default_language: self.enumeration(
                get(obj, "defaultLanguage"),
                &path.join("defaultLanguage"),
                Language::Tr,
            ),
            supported_languages,
            overrides: self.overrides(get(obj, "overrides"), &path.join("overrides")),
        }
    }

    fn overrides(
        &mut self,
        value: Option<&JsonValue>,
        path: &FieldPath,
    ) -> BTreeMap<String, BTreeMap<String, String>> {
        let mut overrides = BTreeMap::new();
        let Some(obj) = self.object(value, path) else {
            return overrides;
        };

        for (code, table) in obj {
            let lang_path = path.join(code);
            let Some(language) = self.enum_value::<Language>(&JsonValue::String(code.clone()), &lang_path)
            else {
                continue;
            };
            let Some(table) = self.object(Some(table), &lang_path) else {
                continue;
            };
            let mut entries = BTreeMap::new();
            for (key, text) in table {
                match text {
                    JsonValue::String(s) => {
                        entries.insert(key.clone(), s.clone());
                    }
                    other => self.report(&lang_path.join(key), expected("string", other)),
                }
            }
            overrides.insert(language.code().to_string(), entries);
        }
        overrides
    }

    fn drag(&mut self, value: Option<&JsonValue>, path: &FieldPath) -> DragConfig {
        let obj = self.object(value, path);
        DragConfig {
            global_enabled: self.boolean(get(obj, "globalEnabled"), &path.join("globalEnabled"), true),
            page_overrides: self.bool_map(get(obj, "pageOverrides"), &path.join("pageOverrides")),
            widget_overrides: self
                .bool_map(get(obj, "widgetOverrides"), &path.join("widgetOverrides")),
        }
    }

    /// Sparse `key -> bool` overlay; non-boolean entries are dropped
    fn bool_map(&mut self, value: Option<&JsonValue>, path: &FieldPath) -> FeatureFlags {
        let mut map = BTreeMap::new();
        let Some(obj) = self.object(value, path) else {
            return map;
        };
        for (key, entry) in obj {
            match entry {
                JsonValue::Bool(b) => {
                    map.insert(key.clone(), *b);
                }
                other => self.report(&path.join(key), expected("boolean", other)),
            }
        }
        map
    }

    fn permissions(&mut self, value: Option<&JsonValue>, path: &FieldPath) -> WidgetPermissions {
        let mut map = BTreeMap::new();
        let Some(obj) = self.object(value, path) else {
            return map;
        };
        for (instance_id, roles) in obj {
            let entry_path = path.join(instance_id);
            let JsonValue::Array(roles) = roles else {
                self.report(&entry_path, expected("array", roles));
                continue;
            };
            let mut parsed = Vec::with_capacity(roles.len());
            for (i, role) in roles.iter().enumerate() {
                match role {
                    JsonValue::String(s) => parsed.push(s.clone()),
                    other => self.report(&entry_path.join(i), expected("string", other)),
                }
            }
            map.insert(instance_id.clone(), parsed);
        }
        map
    }

    fn layouts(&mut self, value: Option<&JsonValue>, path: &FieldPath) -> Layouts {
        let mut layouts = BTreeMap::new();
        let Some(obj) = self.object(value, path) else {
            return layouts;
        };

        // Instance ids are unique across every page
        let mut seen = BTreeSet::new();
        for (page_id, widgets) in obj {
            let page_path = path.join(page_id);
            let JsonValue::Array(widgets) = widgets else {
                self.report(&page_path, expected("array", widgets));
                continue;
            };
            let parsed = widgets
                .iter()
                .enumerate()
                .filter_map(|(i, widget)| self.widget(widget, &page_path.join(i), &mut seen))
                .collect();
            layouts.insert(page_id.clone(), parsed);
        }
        layouts
    }

    fn widget(
        &mut self,
        value: &JsonValue,
        path: &FieldPath,
        seen: &mut BTreeSet<String>,
    ) -> Option<WidgetInstance> {
        let obj = self.object(Some(value), path)?;
        let id_path = path.join("id");
        let id = self.identifier(obj.get("id"), &id_path)?;
        let widget_id = self.identifier(obj.get("widgetId"), &path.join("widgetId"))?;
        if !seen.insert(id.clone()) {
            self.report(&id_path, format!("Duplicate widget instance id '{id}'"));
            return None;
        }

        let pos_path = path.join("position");
        let pos = self.object(obj.get("position"), &pos_path);
        let position = WidgetPosition {
            row: self.integer(get(pos, "row"), &pos_path.join("row"), (0, u32::MAX), 0),
            col: self.integer(get(pos, "col"), &pos_path.join("col"), (0, GRID_COLUMNS - 1), 0),
            width: self.integer(
                get(pos, "width"),
                &pos_path.join("width"),
                (1, GRID_COLUMNS),
                DEFAULT_WIDGET_WIDTH,
            ),
            height: self.integer(get(pos, "height"), &pos_path.join("height"), (1, u32::MAX), 1),
        };

        let props = match obj.get("props") {
            None => BTreeMap::new(),
            Some(JsonValue::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            Some(other) => {
                self.report(&path.join("props"), expected("object", other));
                BTreeMap::new()
            }
        };

        Some(WidgetInstance {
            id,
            widget_id,
            position,
            props,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn minimal() -> JsonValue {
        json!({"id": "acme", "name": "Acme"})
    }

    #[test]
    fn hsl_pattern() {
        assert!(is_hsl_color("222.2 47.4% 11.2%"));
        assert!(is_hsl_color("0 0% 100%"));
        assert!(!is_hsl_color("blue"));
        assert!(!is_hsl_color("hsl(0 0% 100%)"));
        assert!(!is_hsl_color("0 0 100%"));
        assert!(!is_hsl_color("#ffffff"));
    }

    #[test]
    fn minimal_document_validates_with_defaults() {
        let config = validate(&minimal()).unwrap();
        assert_eq!(config.id, "acme");
        assert_eq!(config.sidebar.width, SIDEBAR_DEFAULT_WIDTH);
        assert_eq!(config.theme.colors, default_colors());
        assert!(config.layouts.is_empty());
        assert!(config.feature_flags.is_empty());
    }

    #[test]
    fn malformed_color_is_path_qualified() {
        let mut raw = minimal();
        raw["theme"] = json!({"colors": {"primary": "blue"}});

        let err = validate(&raw).unwrap_err();
        assert!(err.touches("theme.colors.primary"));
        assert!(err.to_string().starts_with("theme.colors.primary: "));
    }

    #[test]
    fn malformed_color_replaced_by_default() {
        let mut raw = minimal();
        raw["theme"] = json!({"colors": {"primary": "blue", "accent": "10 20% 30%"}});

        let config = parse_with_defaults(&raw);
        assert_eq!(config.theme.colors.primary, default_colors().primary);
        assert_eq!(config.theme.colors.accent, "10 20% 30%");
    }

    #[test]
    fn sidebar_width_strict_vs_lenient() {
        let mut raw = minimal();
        raw["sidebar"] = json!({"width": 500});
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.issues()[0].path, "sidebar.width");

        assert_eq!(parse_with_defaults(&raw).sidebar.width, SIDEBAR_MAX_WIDTH);

        raw["sidebar"] = json!({"width": 10});
        assert_eq!(parse_with_defaults(&raw).sidebar.width, SIDEBAR_MIN_WIDTH);
    }

    #[test]
    fn invalid_enum_coerced_to_default() {
        let mut raw = minimal();
        raw["theme"] = json!({"mode": "sepia", "radius": "lg"});
        raw["sidebar"] = json!({"mode": "floating", "position": "right"});

        let err = validate(&raw).unwrap_err();
        assert_eq!(err.issues().len(), 2);
        assert!(err.to_string().contains("received 'sepia'"));

        let config = parse_with_defaults(&raw);
        assert_eq!(config.theme.mode, ThemeMode::Light);
        assert_eq!(config.theme.radius, Radius::Large);
        assert_eq!(config.sidebar.mode, SidebarMode::IconText);
        assert_eq!(config.sidebar.position, SidebarPosition::Right);
    }

    #[test]
    fn default_language_outside_universe() {
        let mut raw = minimal();
        raw["i18n"] = json!({"defaultLanguage": "de", "supportedLanguages": ["en"]});

        let err = validate(&raw).unwrap_err();
        assert!(err.touches("i18n.defaultLanguage"));

        let config = parse_with_defaults(&raw);
        assert_eq!(config.i18n.default_language, Language::Tr);
        assert_eq!(config.i18n.supported_languages, BTreeSet::from([Language::En]));
    }

    #[test]
    fn all_violations_reported() {
        let raw = json!({
            "id": "acme",
            "theme": {"colors": {"primary": "red", "border": 3}},
            "sidebar": {"width": 9000},
        });

        let err = validate(&raw).unwrap_err();
        let paths: Vec<_> = err.issues().iter().map(|i| i.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["name", "theme.colors.primary", "theme.colors.border", "sidebar.width"]
        );
        assert_eq!(err.to_string().matches(", ").count(), 3);
        assert!(err.issues().iter().all(|i| !i.message.contains(", ")));
    }

    #[test]
    fn padded_color_is_stored_trimmed() {
        let mut raw = minimal();
        raw["theme"] = json!({"colors": {"primary": "  210 40% 50% "}});

        assert_eq!(validate(&raw).unwrap().theme.colors.primary, "210 40% 50%");
        assert_eq!(parse_with_defaults(&raw).theme.colors.primary, "210 40% 50%");
    }

    #[test]
    fn duplicate_instance_ids_across_pages() {
        let mut raw = minimal();
        raw["layouts"] = json!({
            "home": [{"id": "w1", "widgetId": "notes", "position": {"row": 0, "col": 0, "width": 4, "height": 1}}],
            "reports": [{"id": "w1", "widgetId": "notes", "position": {"row": 0, "col": 0, "width": 4, "height": 1}}],
        });

        let err = validate(&raw).unwrap_err();
        assert!(err.touches("layouts.reports.0.id"));

        let config = parse_with_defaults(&raw);
        assert_eq!(config.page("home").len(), 1);
        assert!(config.page("reports").is_empty());
    }

    #[test]
    fn widget_position_bounds() {
        let mut raw = minimal();
        raw["layouts"] = json!({
            "home": [{"id": "w1", "widgetId": "notes", "position": {"row": 0, "col": 0, "width": 13, "height": 0}}],
        });

        let err = validate(&raw).unwrap_err();
        assert!(err.touches("layouts.home.0.position.width"));
        assert!(err.touches("layouts.home.0.position.height"));

        let widget = &parse_with_defaults(&raw).layouts["home"][0];
        assert_eq!(widget.position, WidgetPosition::new(0, 0, 12, 1));
    }

    #[test]
    fn malformed_widgets_dropped() {
        let mut raw = minimal();
        raw["layouts"] = json!({"home": [42, {"widgetId": "notes"}, {"id": "ok", "widgetId": "notes"}]});

        let config = parse_with_defaults(&raw);
        let ids: Vec<_> = config.page("home").iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["ok"]);
    }

    #[test]
    fn sparse_overlays_keep_only_valid_entries() {
        let mut raw = minimal();
        raw["featureFlags"] = json!({"widgetDrag": false, "darkMode": "yes"});
        raw["widgetPermissions"] = json!({"w1": ["admin", 7], "w2": []});

        let config = parse_with_defaults(&raw);
        assert_eq!(config.feature_flags, BTreeMap::from([("widgetDrag".to_string(), false)]));
        assert_eq!(config.widget_permissions["w1"], vec!["admin".to_string()]);
        assert!(config.widget_permissions["w2"].is_empty());
    }

    #[test]
    fn translation_overrides() {
        let mut raw = minimal();
        raw["i18n"] = json!({"overrides": {"en": {"nav.home": "Start"}, "xx": {"a": "b"}}});

        let err = validate(&raw).unwrap_err();
        assert!(err.touches("i18n.overrides.xx"));

        let config = parse_with_defaults(&raw);
        assert_eq!(config.i18n.translate(Language::En, "nav.home"), Some("Start"));
        assert!(!config.i18n.overrides.contains_key("xx"));
    }

    #[test]
    fn non_object_input_yields_defaults() {
        let config = parse_with_defaults(&json!(42));
        assert_eq!(config.id, DEFAULT_TENANT_ID);
        assert_eq!(config.name, DEFAULT_TENANT_NAME);

        assert!(validate(&json!(42)).is_err());
    }

    #[test]
    fn standalone_layouts() {
        let ok = validate_layouts(&json!({"home": [{"id": "a", "widgetId": "notes"}]})).unwrap();
        assert_eq!(ok["home"][0].position.width, 4);

        let err = validate_layouts(&json!({"home": [{"id": "a", "widgetId": "notes", "position": {"width": 13}}]}))
            .unwrap_err();
        assert!(err.touches("layouts.home.0.position.width"));
        assert!(validate_layouts(&json!([1])).is_err());
    }

    #[test]
    fn standalone_layouts_repaired() {
        let raw = json!({
            "home": [
                {"id": "a", "widgetId": "notes", "position": {"width": 13}},
                {"id": "a", "widgetId": "notes"}
            ],
            "broken": 7
        });
        let layouts = parse_layouts_with_defaults(&raw);
        assert_eq!(layouts["home"].len(), 1);
        assert_eq!(layouts["home"][0].position.width, GRID_COLUMNS);
        assert!(!layouts.contains_key("broken"));
        assert!(parse_layouts_with_defaults(&json!([1])).is_empty());
    }

    #[test]
    fn timestamps_preserved() {
        let mut raw = minimal();
        raw["createdAt"] = json!("2024-03-01T10:00:00Z");
        raw["updatedAt"] = json!("not a date");

        let config = parse_with_defaults(&raw);
        assert_eq!(config.created_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");
        assert!(validate(&raw).unwrap_err().touches("updatedAt"));
    }
}

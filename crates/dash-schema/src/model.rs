//! Tenant configuration document
//!
//! One [`TenantConfig`] exists per tenant. Feature flags and widget
//! permissions are sparse overlays: only overrides are stored, effective
//! values are computed at read time.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Page id -> ordered widget instances
pub type Layouts = BTreeMap<String, Vec<WidgetInstance>>;

/// Sparse flag overrides (flag key -> enabled)
pub type FeatureFlags = BTreeMap<String, bool>;

/// Sparse instance-level permissions (widget instance id -> roles)
pub type WidgetPermissions = BTreeMap<String, Vec<String>>;

/// Root configuration document for a tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantConfig {
    /// Tenant id, immutable after the first save
    pub id: String,
    /// Display name, immutable after the first save
    pub name: String,
    pub theme: ThemeConfig,
    pub branding: BrandingConfig,
    pub sidebar: SidebarConfig,
    pub i18n: I18nConfig,
    pub drag: DragConfig,
    pub layouts: Layouts,
    pub feature_flags: FeatureFlags,
    pub widget_permissions: WidgetPermissions,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantConfig {
    /// Iterate every widget instance as `(page_id, instance)`
    pub fn widget_instances(&self) -> impl Iterator<Item = (&str, &WidgetInstance)> {
        self.layouts
            .iter()
            .flat_map(|(page, widgets)| widgets.iter().map(move |w| (page.as_str(), w)))
    }

    /// Find an instance anywhere in the layouts
    #[must_use]
    pub fn find_widget(&self, instance_id: &str) -> Option<&WidgetInstance> {
        self.widget_instances()
            .find(|(_, w)| w.id == instance_id)
            .map(|(_, w)| w)
    }

    /// Widgets of one page, empty if the page has no layout
    #[must_use]
    pub fn page(&self, page_id: &str) -> &[WidgetInstance] {
        self.layouts.get(page_id).map_or(&[], Vec::as_slice)
    }

    /// Instance ids that occur more than once across all pages
    #[must_use]
    pub fn duplicate_widget_ids(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut duplicates = BTreeSet::new();
        for (_, widget) in self.widget_instances() {
            if !seen.insert(widget.id.as_str()) {
                duplicates.insert(widget.id.clone());
            }
        }
        duplicates.into_iter().collect()
    }

    /// Bump `updated_at` to now
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Light/dark mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

/// Corner radius preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Radius {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "sm")]
    Small,
    #[default]
    #[serde(rename = "md")]
    Medium,
    #[serde(rename = "lg")]
    Large,
    #[serde(rename = "full")]
    Full,
}

/// Theme settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub mode: ThemeMode,
    pub colors: ThemeColors,
    pub radius: Radius,
}

/// The nine named theme colors, each an `H S% L%` triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColors {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub foreground: String,
    pub muted: String,
    pub border: String,
    pub card: String,
    pub destructive: String,
}

impl ThemeColors {
    /// Color names in document order
    pub const NAMES: [&'static str; 9] = [
        "primary",
        "secondary",
        "accent",
        "background",
        "foreground",
        "muted",
        "border",
        "card",
        "destructive",
    ];

    /// Look up a color by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        let value = match name {
            "primary" => &self.primary,
            "secondary" => &self.secondary,
            "accent" => &self.accent,
            "background" => &self.background,
            "foreground" => &self.foreground,
            "muted" => &self.muted,
            "border" => &self.border,
            "card" => &self.card,
            "destructive" => &self.destructive,
            _ => return None,
        };
        Some(value)
    }

    /// Mutable slot for a color by name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut String> {
        let value = match name {
            "primary" => &mut self.primary,
            "secondary" => &mut self.secondary,
            "accent" => &mut self.accent,
            "background" => &mut self.background,
            "foreground" => &mut self.foreground,
            "muted" => &mut self.muted,
            "border" => &mut self.border,
            "card" => &mut self.card,
            "destructive" => &mut self.destructive,
            _ => return None,
        };
        Some(value)
    }
}

/// Branding shown in the shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandingConfig {
    pub logo_url: String,
    pub app_name: String,
    pub favicon: String,
}

/// How the sidebar renders entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SidebarMode {
    IconOnly,
    #[default]
    IconText,
    Collapsed,
}

/// Sidebar side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SidebarPosition {
    #[default]
    Left,
    Right,
}

/// Sidebar settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarConfig {
    pub mode: SidebarMode,
    pub position: SidebarPosition,
    /// Pixel width, within `[64, 400]`
    pub width: u32,
    pub items: Vec<SidebarItem>,
}

impl SidebarConfig {
    /// Visible items sorted by `order`, stable on ties
    #[must_use]
    pub fn visible_items(&self) -> Vec<&SidebarItem> {
        let mut items: Vec<_> = self.items.iter().filter(|i| i.visible).collect();
        items.sort_by_key(|i| i.order);
        items
    }
}

/// One sidebar entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarItem {
    pub id: String,
    pub visible: bool,
    pub order: u32,
}

/// Languages supported by this deployment
///
/// This is a closed set, not arbitrary locale codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Tr,
    En,
}

impl Language {
    /// Every language in the universe
    pub const ALL: [Language; 2] = [Language::Tr, Language::En];

    /// ISO code
    #[inline]
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Language::Tr => "tr",
            Language::En => "en",
        }
    }

    /// Parse an ISO code
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code() == code)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Localization settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct I18nConfig {
    pub enabled: bool,
    pub default_language: Language,
    pub supported_languages: BTreeSet<Language>,
    /// Language code -> translation key -> text
    pub overrides: BTreeMap<String, BTreeMap<String, String>>,
}

impl I18nConfig {
    /// Tenant override for a translation key, if any
    #[must_use]
    pub fn translate(&self, language: Language, key: &str) -> Option<&str> {
        self.overrides
            .get(language.code())
            .and_then(|table| table.get(key))
            .map(String::as_str)
    }
}

/// Drag-and-drop switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragConfig {
    pub global_enabled: bool,
    pub page_overrides: BTreeMap<String, bool>,
    pub widget_overrides: BTreeMap<String, bool>,
}

impl DragConfig {
    /// Effective drag switch: widget override, then page override, then global
    #[must_use]
    pub fn is_drag_enabled(&self, page_id: &str, widget_id: Option<&str>) -> bool {
        if let Some(enabled) = widget_id.and_then(|id| self.widget_overrides.get(id)) {
            return *enabled;
        }
        self.page_overrides
            .get(page_id)
            .copied()
            .unwrap_or(self.global_enabled)
    }
}

/// A placed widget on one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetInstance {
    /// Unique across the tenant's whole layouts map
    pub id: String,
    /// Widget type id in the widget registry
    pub widget_id: String,
    pub position: WidgetPosition,
    #[serde(default)]
    pub props: BTreeMap<String, JsonValue>,
}

impl WidgetInstance {
    /// Create an instance with empty props
    #[must_use]
    pub fn new(id: impl Into<String>, widget_id: impl Into<String>, position: WidgetPosition) -> Self {
        Self {
            id: id.into(),
            widget_id: widget_id.into(),
            position,
            props: BTreeMap::new(),
        }
    }

    /// Set a prop
    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.props.insert(key.into(), value);
        self
    }
}

/// Grid placement on a 12-column grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WidgetPosition {
    pub row: u32,
    pub col: u32,
    /// Columns spanned, within `[1, 12]`
    pub width: u32,
    /// Rows spanned, at least 1
    pub height: u32,
}

impl WidgetPosition {
    #[inline]
    #[must_use]
    pub const fn new(row: u32, col: u32, width: u32, height: u32) -> Self {
        Self { row, col, width, height }
    }
}

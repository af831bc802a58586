//! Documented defaults and the default tenant constructor

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use serde_json::json;

use crate::model::{
    BrandingConfig, DragConfig, I18nConfig, Language, SidebarConfig, SidebarItem, SidebarMode,
    SidebarPosition, TenantConfig, ThemeColors, ThemeConfig, WidgetInstance, WidgetPosition,
};

/// Minimum sidebar width in pixels
pub const SIDEBAR_MIN_WIDTH: u32 = 64;
/// Maximum sidebar width in pixels
pub const SIDEBAR_MAX_WIDTH: u32 = 400;
/// Default sidebar width in pixels
pub const SIDEBAR_DEFAULT_WIDTH: u32 = 240;

/// Grid column count; also the maximum widget width
pub const GRID_COLUMNS: u32 = 12;
/// Width of a widget whose position omits it
pub const DEFAULT_WIDGET_WIDTH: u32 = 4;

/// Page seeded by [`default_tenant_config`]
pub const DEFAULT_PAGE: &str = "dashboard";

/// Id used when a document carries none
pub const DEFAULT_TENANT_ID: &str = "default";
/// Name used when a document carries none
pub const DEFAULT_TENANT_NAME: &str = "Default Tenant";

/// Default palette
#[must_use]
pub fn default_colors() -> ThemeColors {
    ThemeColors {
        primary: "222.2 47.4% 11.2%".into(),
        secondary: "210 40% 96.1%".into(),
        accent: "210 40% 96.1%".into(),
        background: "0 0% 100%".into(),
        foreground: "222.2 84% 4.9%".into(),
        muted: "210 40% 96.1%".into(),
        border: "214.3 31.8% 91.4%".into(),
        card: "0 0% 100%".into(),
        destructive: "0 84.2% 60.2%".into(),
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        default_colors()
    }
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            logo_url: String::new(),
            app_name: "Admin Dashboard".into(),
            favicon: String::new(),
        }
    }
}

/// Sidebar entries every tenant starts with
#[must_use]
pub fn default_sidebar_items() -> Vec<SidebarItem> {
    ["dashboard", "analytics", "users", "reports", "settings"]
        .into_iter()
        .zip(0u32..)
        .map(|(id, order)| SidebarItem {
            id: id.into(),
            visible: true,
            order,
        })
        .collect()
}

impl Default for SidebarConfig {
    fn default() -> Self {
        Self {
            mode: SidebarMode::default(),
            position: SidebarPosition::default(),
            width: SIDEBAR_DEFAULT_WIDTH,
            items: default_sidebar_items(),
        }
    }
}

/// Languages enabled by default
#[must_use]
pub fn default_languages() -> BTreeSet<Language> {
    Language::ALL.into_iter().collect()
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_language: Language::Tr,
            supported_languages: default_languages(),
            overrides: BTreeMap::new(),
        }
    }
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            global_enabled: true,
            page_overrides: BTreeMap::new(),
            widget_overrides: BTreeMap::new(),
        }
    }
}

/// The fixed sample layout for [`DEFAULT_PAGE`]
#[must_use]
pub fn sample_layout() -> Vec<WidgetInstance> {
    vec![
        WidgetInstance::new("stats-users", "stats-card", WidgetPosition::new(0, 0, 3, 1))
            .with_prop("title", json!("Total Users"))
            .with_prop("value", json!("1,284")),
        WidgetInstance::new("stats-revenue", "stats-card", WidgetPosition::new(0, 3, 3, 1))
            .with_prop("title", json!("Revenue"))
            .with_prop("value", json!("$48,210")),
        WidgetInstance::new("stats-orders", "stats-card", WidgetPosition::new(0, 6, 3, 1))
            .with_prop("title", json!("Orders"))
            .with_prop("value", json!("342")),
        WidgetInstance::new("stats-growth", "stats-card", WidgetPosition::new(0, 9, 3, 1))
            .with_prop("title", json!("Growth"))
            .with_prop("value", json!("12.5%"))
            .with_prop("trend", json!("up")),
        WidgetInstance::new("sales-chart", "line-chart", WidgetPosition::new(1, 0, 8, 2))
            .with_prop("title", json!("Sales")),
        WidgetInstance::new("recent-activity", "recent-activity", WidgetPosition::new(1, 8, 4, 2)),
        WidgetInstance::new("quick-actions", "quick-actions", WidgetPosition::new(3, 0, 12, 1)),
    ]
}

/// Build the configuration a new tenant starts from
///
/// Flags and permissions start empty: both are sparse overlays.
#[must_use]
pub fn default_tenant_config(id: impl Into<String>, name: impl Into<String>) -> TenantConfig {
    let now = Utc::now();
    TenantConfig {
        id: id.into(),
        name: name.into(),
        theme: ThemeConfig::default(),
        branding: BrandingConfig::default(),
        sidebar: SidebarConfig::default(),
        i18n: I18nConfig::default(),
        drag: DragConfig::default(),
        layouts: BTreeMap::from([(DEFAULT_PAGE.to_string(), sample_layout())]),
        feature_flags: BTreeMap::new(),
        widget_permissions: BTreeMap::new(),
        created_at: now,
        updated_at: now,
    }
}

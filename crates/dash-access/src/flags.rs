//! Feature flag resolution
//!
//! Tenants store only the flags they override. The effective value of a
//! flag is the tenant override if present, else the catalog default, else
//! `true` for a flag the catalog does not know.

use std::collections::BTreeMap;

use dash_schema::FeatureFlags;
use serde::Serialize;

/// Flag grouping shown in the admin UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagCategory {
    Dashboard,
    Admin,
    Advanced,
}

impl FlagCategory {
    pub const ALL: [FlagCategory; 3] = [Self::Dashboard, Self::Admin, Self::Advanced];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Admin => "admin",
            Self::Advanced => "advanced",
        }
    }
}

/// A flag known to the system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagDefinition {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: FlagCategory,
    pub default_enabled: bool,
}

const fn flag(
    key: &'static str,
    name: &'static str,
    description: &'static str,
    category: FlagCategory,
    default_enabled: bool,
) -> FlagDefinition {
    FlagDefinition {
        key,
        name,
        description,
        category,
        default_enabled,
    }
}

/// System flag catalog
pub const FLAG_CATALOG: &[FlagDefinition] = &[
    flag("widgetDrag", "Widget Drag & Drop", "Rearrange dashboard widgets by dragging", FlagCategory::Dashboard, true),
    flag("darkMode", "Dark Mode", "Allow switching to the dark theme", FlagCategory::Dashboard, true),
    flag("realtimeUpdates", "Realtime Updates", "Refresh widget data as it changes", FlagCategory::Dashboard, false),
    flag("exportData", "Data Export", "Export widget data and configuration", FlagCategory::Dashboard, true),
    flag("notifications", "Notifications", "Show the notification center", FlagCategory::Dashboard, true),
    flag("userManagement", "User Management", "Manage tenant users and their roles", FlagCategory::Admin, true),
    flag("auditLog", "Audit Log", "Record configuration changes", FlagCategory::Admin, false),
    flag("bulkActions", "Bulk Actions", "Apply actions to many records at once", FlagCategory::Admin, false),
    flag("advancedAnalytics", "Advanced Analytics", "Cohort and funnel analytics widgets", FlagCategory::Advanced, false),
    flag("apiAccess", "API Access", "Issue API keys for external integrations", FlagCategory::Advanced, false),
    flag("customWidgets", "Custom Widgets", "Register tenant-defined widget types", FlagCategory::Advanced, false),
    flag("betaFeatures", "Beta Features", "Opt in to features under evaluation", FlagCategory::Advanced, false),
];

/// Catalog entry for `key`
#[must_use]
pub fn flag_definition(key: &str) -> Option<&'static FlagDefinition> {
    FLAG_CATALOG.iter().find(|def| def.key == key)
}

/// Effective value of a flag for a tenant
///
/// Unknown flags are enabled.
#[must_use]
pub fn is_feature_enabled(tenant_flags: &FeatureFlags, flag_name: &str) -> bool {
    if let Some(&value) = tenant_flags.get(flag_name) {
        return value;
    }
    match flag_definition(flag_name) {
        Some(def) => def.default_enabled,
        None => {
            tracing::debug!(flag = flag_name, "unknown feature flag, enabling");
            true
        }
    }
}

/// A catalog flag with its effective value for one tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedFlag {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: FlagCategory,
    pub enabled: bool,
    /// Whether the tenant stores an override for this flag
    pub is_overridden: bool,
}

/// Every catalog flag resolved for a tenant, in catalog order
#[must_use]
pub fn get_all_flags(tenant_flags: &FeatureFlags) -> Vec<ResolvedFlag> {
    FLAG_CATALOG
        .iter()
        .map(|def| ResolvedFlag {
            key: def.key,
            name: def.name,
            description: def.description,
            category: def.category,
            enabled: tenant_flags.get(def.key).copied().unwrap_or(def.default_enabled),
            is_overridden: tenant_flags.contains_key(def.key),
        })
        .collect()
}

/// Resolved flags grouped by category; every category is present
#[must_use]
pub fn get_flags_by_category(tenant_flags: &FeatureFlags) -> BTreeMap<FlagCategory, Vec<ResolvedFlag>> {
    let mut grouped: BTreeMap<_, Vec<_>> =
        FlagCategory::ALL.iter().map(|c| (*c, Vec::new())).collect();
    for flag in get_all_flags(tenant_flags) {
        grouped.entry(flag.category).or_default().push(flag);
    }
    grouped
}

/// Tenant overrides for keys missing from the catalog
///
/// Such keys still resolve (to the stored value) but are likely typos.
#[must_use]
pub fn unknown_overrides(tenant_flags: &FeatureFlags) -> Vec<&str> {
    tenant_flags
        .keys()
        .filter(|key| flag_definition(key).is_none())
        .map(String::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(pairs: &[(&str, bool)]) -> FeatureFlags {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn override_beats_default() {
        assert!(is_feature_enabled(&FeatureFlags::new(), "widgetDrag"));
        assert!(!is_feature_enabled(&flags(&[("widgetDrag", false)]), "widgetDrag"));
        assert!(is_feature_enabled(&flags(&[("auditLog", true)]), "auditLog"));
    }

    #[test]
    fn unknown_flags_fail_open() {
        assert!(is_feature_enabled(&FeatureFlags::new(), "unknownFlag"));
        assert!(!is_feature_enabled(&flags(&[("unknownFlag", false)]), "unknownFlag"));
    }

    #[test]
    fn all_flags_mark_overrides() {
        let resolved = get_all_flags(&flags(&[("darkMode", false)]));
        assert_eq!(resolved.len(), FLAG_CATALOG.len());

        let dark = resolved.iter().find(|f| f.key == "darkMode").unwrap();
        assert!(!dark.enabled);
        assert!(dark.is_overridden);

        let drag = resolved.iter().find(|f| f.key == "widgetDrag").unwrap();
        assert!(drag.enabled);
        assert!(!drag.is_overridden);
    }

    #[test]
    fn grouping_covers_every_category() {
        let grouped = get_flags_by_category(&FeatureFlags::new());
        assert_eq!(grouped.len(), 3);
        assert!(grouped[&FlagCategory::Admin]
            .iter()
            .all(|f| f.category == FlagCategory::Admin));
        let total: usize = grouped.values().map(Vec::len).sum();
        assert_eq!(total, FLAG_CATALOG.len());
    }

    #[test]
    fn catalog_keys_unique() {
        let mut keys: Vec<_> = FLAG_CATALOG.iter().map(|f| f.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), FLAG_CATALOG.len());
    }

    #[test]
    fn reports_unknown_overrides() {
        let tenant = flags(&[("darkMode", true), ("darkMod", true)]);
        assert_eq!(unknown_overrides(&tenant), vec!["darkMod"]);
    }
}

//! Role-based widget visibility
//!
//! Two permission layers apply to a widget:
//!
//! - the widget *type* may list roles; a user sees it if their role ranks at
//!   or above any listed role
//! - the tenant may list roles per widget *instance*; a user sees it if their
//!   role is listed, an empty list hides it from everyone but admins, and no
//!   entry leaves it public
//!
//! Admins see every instance regardless of the instance layer.

use std::fmt;
use std::str::FromStr;

use dash_schema::{TenantConfig, WidgetInstance, WidgetPermissions, WidgetRegistry, WidgetTypeDef};
use serde::{Deserialize, Serialize};

/// Role hierarchy, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Guest,
    User,
    Manager,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Self::Guest, Self::User, Self::Manager, Self::Admin];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::User => "user",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    /// Whether this role ranks at or above `required`
    #[inline]
    #[must_use]
    pub fn includes(self, required: Role) -> bool {
        self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role name outside the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Whether `user_role` ranks at or above `required_role`
///
/// An unrecognized role on either side denies access.
#[must_use]
pub fn has_role_access(user_role: &str, required_role: &str) -> bool {
    match (user_role.parse::<Role>(), required_role.parse::<Role>()) {
        (Ok(user), Ok(required)) => user.includes(required),
        _ => false,
    }
}

/// Type-level check: public types are visible to all
#[must_use]
pub fn can_view_widget(def: &WidgetTypeDef, user_role: &str) -> bool {
    def.permissions.is_empty()
        || def
            .permissions
            .iter()
            .any(|required| has_role_access(user_role, required))
}

/// Instance-level check against the tenant's permission map
#[must_use]
pub fn can_view_widget_instance(
    instance: &WidgetInstance,
    permissions: &WidgetPermissions,
    user_role: &str,
) -> bool {
    if user_role == Role::Admin.as_str() {
        return true;
    }
    match permissions.get(&instance.id) {
        None => true,
        Some(roles) => roles.iter().any(|role| role == user_role),
    }
}

/// Instances visible to `user_role`, in input order
#[must_use]
pub fn filter_widgets_by_role<'a>(
    widgets: &'a [WidgetInstance],
    permissions: &WidgetPermissions,
    user_role: &str,
) -> Vec<&'a WidgetInstance> {
    widgets
        .iter()
        .filter(|instance| can_view_widget_instance(instance, permissions, user_role))
        .collect()
}

/// Instances of a page passing both the type and the instance layer
///
/// Instances whose type is not registered are kept when the instance layer
/// allows them.
#[must_use]
pub fn visible_page_widgets<'a>(
    config: &'a TenantConfig,
    page_id: &str,
    registry: &WidgetRegistry,
    user_role: &str,
) -> Vec<&'a WidgetInstance> {
    filter_widgets_by_role(config.page(page_id), &config.widget_permissions, user_role)
        .into_iter()
        .filter(|instance| {
            registry
                .get(&instance.widget_id)
                .map_or(true, |def| can_view_widget(def, user_role))
        })
        .collect()
}

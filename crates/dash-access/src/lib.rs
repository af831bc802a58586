//! Read-side access projections
//!
//! Feature flags fail open: an unknown flag is enabled. Role lookups fail
//! closed: any failure resolves to the guest role.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod flags;
pub mod rbac;
pub mod roles;

pub use flags::{
    flag_definition, get_all_flags, get_flags_by_category, is_feature_enabled, unknown_overrides,
    FlagCategory, FlagDefinition, ResolvedFlag, FLAG_CATALOG,
};
pub use rbac::{
    can_view_widget, can_view_widget_instance, filter_widgets_by_role, has_role_access,
    visible_page_widgets, Role, UnknownRole,
};
pub use roles::{get_user_role, BackendRoleDirectory, RoleDirectory, StaticRoleDirectory};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Tenant configuration schema
//!
//! Canonical shape of a tenant's dashboard configuration, the documented
//! defaults, and validation of partial input.
//!
//! # Core Concepts
//!
//! - [`TenantConfig`]: the per-tenant document
//! - [`validate`]: strict check reporting every violation
//! - [`parse_with_defaults`]: lenient, never-failing default filling
//! - [`WidgetRegistry`]: widget types with typed prop schemas
//!
//! # Example
//!
//! ```rust
//! use dash_schema::{parse_with_defaults, validate};
//! use serde_json::json;
//!
//! let raw = json!({"id": "acme", "name": "Acme", "sidebar": {"width": 900}});
//! assert!(validate(&raw).is_err());
//! assert_eq!(parse_with_defaults(&raw).sidebar.width, 400);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod defaults;
pub mod error;
pub mod model;
pub mod validate;
pub mod widget;

pub use defaults::{default_tenant_config, DEFAULT_PAGE};
pub use error::{PropError, ValidationError, ValidationIssue};
pub use model::{
    BrandingConfig, DragConfig, FeatureFlags, I18nConfig, Language, Layouts, Radius,
    SidebarConfig, SidebarItem, SidebarMode, SidebarPosition, TenantConfig, ThemeColors,
    ThemeConfig, ThemeMode, WidgetInstance, WidgetPermissions, WidgetPosition,
};
pub use validate::{
    is_hsl_color, parse_layouts_with_defaults, parse_with_defaults, validate, validate_config,
    validate_layouts,
};
pub use widget::{
    PropKind, PropSpec, PropValue, ResolvedProps, WidgetCategory, WidgetRegistry, WidgetTypeDef,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

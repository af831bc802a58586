//! Dashboard editor sessions
//!
//! Ties the schema, storage and history crates together for one tenant:
//! edits with undo, debounced autosave, explicit versioned saves, and
//! JSON export/import. [`DashConfig`] carries the runtime settings.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod autosave;
pub mod config;
pub mod error;
pub mod session;
pub mod transfer;

pub use autosave::{AutosaveController, AutosaveStats, SaveTarget, TenantSaveTarget};
pub use config::{DashConfig, AUTOSAVE_DELAY_VAR, DEFAULT_AUTOSAVE_DELAY_MS, HISTORY_DIR_VAR};
pub use error::{SessionError, SessionResult};
pub use session::EditorSession;
pub use transfer::{
    export_config, export_config_at, export_layouts, export_layouts_at, import_config,
    import_config_file, import_layouts, import_layouts_file, ExportDocument, ExportMeta,
    ImportError, ImportedConfig, ImportedLayouts, TenantRef, EXPORT_FORMAT_VERSION,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Configuration history
//!
//! - [`VersionHistory`]: capped per-tenant snapshots for rollback
//! - [`compare_versions`]: structural diff between two documents
//! - [`UndoHistory`]: in-session undo/redo over full snapshots

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod diff;
pub mod error;
pub mod undo;
pub mod version;

pub use diff::{compare_configs, compare_versions, ConfigChange};
pub use error::{HistoryError, HistoryResult};
pub use undo::{UndoHistory, DEFAULT_UNDO_CAPACITY};
pub use version::{
    version_id, version_key, ConfigVersion, VersionHistory, DEFAULT_MAX_VERSIONS,
    VERSION_KEY_PREFIX,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Runtime configuration
//!
//! Defaults, then an optional TOML file, then environment overrides.
//!
//! ```toml
//! autosave_delay_ms = 1500
//! history_dir = "/var/lib/dash/history"
//!
//! [backend]
//! endpoint = "https://project.example.com"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use dash_history::{DEFAULT_MAX_VERSIONS, DEFAULT_UNDO_CAPACITY};
use dash_store::BackendSettings;
use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult};

/// Autosave delay unless configured otherwise
pub const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 2000;

pub const AUTOSAVE_DELAY_VAR: &str = "DASH_AUTOSAVE_DELAY_MS";
pub const HISTORY_DIR_VAR: &str = "DASH_HISTORY_DIR";

/// Editor and persistence settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub backend: BackendSettings,
    /// Quiet period before an autosave, in milliseconds
    pub autosave_delay_ms: u64,
    /// Past states kept by undo
    pub undo_capacity: usize,
    /// Versions kept per tenant
    pub version_capacity: usize,
    /// Directory for client-side persistence; in memory when unset
    pub history_dir: Option<PathBuf>,
}

impl DashConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, then `path` if given, then the process environment
    ///
    /// # Errors
    /// Fails on an unreadable or malformed file or a malformed variable.
    pub fn load(path: Option<&Path>) -> SessionResult<Self> {
        let config = match path {
            Some(path) => Self::from_toml_str(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.with_env_overrides(|name| std::env::var(name).ok())
    }

    /// Parse a TOML document; absent keys keep their defaults
    ///
    /// # Errors
    /// Fails on malformed TOML or mistyped values.
    pub fn from_toml_str(text: &str) -> SessionResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply overrides from a variable lookup
    ///
    /// # Errors
    /// Fails if the autosave delay is not an integer.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> SessionResult<Self> {
        if let Some(raw) = lookup(AUTOSAVE_DELAY_VAR) {
            self.autosave_delay_ms = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                SessionError::InvalidSetting {
                    name: AUTOSAVE_DELAY_VAR,
                    message: e.to_string(),
                }
            })?;
        }
        if let Some(dir) = lookup(HISTORY_DIR_VAR).filter(|d| !d.is_empty()) {
            self.history_dir = Some(PathBuf::from(dir));
        }

        let env_backend = BackendSettings::from_lookup(&lookup);
        if env_backend.endpoint.is_some() {
            self.backend.endpoint = env_backend.endpoint;
        }
        if env_backend.access_key.is_some() {
            self.backend.access_key = env_backend.access_key;
        }
        Ok(self)
    }

    /// With backend settings
    #[inline]
    #[must_use]
    pub fn with_backend(mut self, backend: BackendSettings) -> Self {
        self.backend = backend;
        self
    }

    /// With autosave delay
    #[inline]
    #[must_use]
    pub fn with_autosave_delay(mut self, delay: Duration) -> Self {
        self.autosave_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With undo capacity
    #[inline]
    #[must_use]
    pub fn with_undo_capacity(mut self, capacity: usize) -> Self {
        self.undo_capacity = capacity;
        self
    }

    /// With version capacity
    #[inline]
    #[must_use]
    pub fn with_version_capacity(mut self, capacity: usize) -> Self {
        self.version_capacity = capacity;
        self
    }

    /// With history directory
    #[inline]
    #[must_use]
    pub fn with_history_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.history_dir = Some(dir.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            autosave_delay_ms: DEFAULT_AUTOSAVE_DELAY_MS,
            undo_capacity: DEFAULT_UNDO_CAPACITY,
            version_capacity: DEFAULT_MAX_VERSIONS,
            history_dir: None,
        }
    }
}

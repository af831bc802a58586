//! Backend connection settings

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::{DisabledBackend, TableBackend};
use crate::error::StoreResult;
use crate::rest::RestBackend;

/// Environment variable holding the backend endpoint URL
pub const ENDPOINT_VAR: &str = "DASH_BACKEND_URL";
/// Environment variable holding the backend access key
pub const ACCESS_KEY_VAR: &str = "DASH_BACKEND_KEY";

/// Where the tenant tables live and how to reach them
///
/// Persistence is enabled only when both the endpoint and the access key
/// are present.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    /// Database schema exposed by the REST layer
    pub schema: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl BackendSettings {
    /// Read settings from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through a variable lookup
    ///
    /// Blank values count as absent.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| lookup(name).filter(|v: &String| !v.trim().is_empty());
        Self {
            endpoint: read(ENDPOINT_VAR),
            access_key: read(ACCESS_KEY_VAR),
            ..Self::default()
        }
    }

    /// With endpoint URL
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// With access key
    #[inline]
    #[must_use]
    pub fn with_access_key(mut self, key: impl Into<String>) -> Self {
        self.access_key = Some(key.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.access_key.is_some()
    }

    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the table backend these settings describe
    ///
    /// Incomplete settings yield the disabled backend.
    ///
    /// # Errors
    /// Fails if the HTTP client cannot be constructed.
    pub fn connect(&self) -> StoreResult<Arc<dyn TableBackend>> {
        if !self.is_configured() {
            tracing::warn!(
                "backend endpoint or access key missing, persistence and role lookups disabled"
            );
            return Ok(Arc::new(DisabledBackend));
        }
        let backend = RestBackend::new(self)?;
        tracing::debug!(endpoint = ?self.endpoint, "connected to REST backend");
        Ok(Arc::new(backend))
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            access_key: None,
            schema: "public".into(),
            timeout_secs: 10,
        }
    }
}

impl fmt::Debug for BackendSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSettings")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key.as_ref().map(|_| "<redacted>"))
            .field("schema", &self.schema)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn both_values_required() {
        let only_url = BackendSettings::from_lookup(lookup(&[(ENDPOINT_VAR, "https://db")]));
        assert!(!only_url.is_configured());

        let blank_key = BackendSettings::from_lookup(lookup(&[
            (ENDPOINT_VAR, "https://db"),
            (ACCESS_KEY_VAR, "  "),
        ]));
        assert!(!blank_key.is_configured());

        let full = BackendSettings::from_lookup(lookup(&[
            (ENDPOINT_VAR, "https://db"),
            (ACCESS_KEY_VAR, "k"),
        ]));
        assert!(full.is_configured());
    }

    #[tokio::test]
    async fn unconfigured_connects_to_disabled_backend() {
        let backend = BackendSettings::default().connect().unwrap();
        assert!(backend.list_tenant_ids().await.unwrap().is_empty());
    }

    #[test]
    fn debug_redacts_key() {
        let settings = BackendSettings::default()
            .with_endpoint("https://db")
            .with_access_key("super-secret");
        let shown = format!("{settings:?}");
        assert!(!shown.contains("super-secret"));
        assert!(shown.contains("<redacted>"));
    }
}

//! Logical storage keys
//!
//! `tenant:<id>` is the only key family the backend adapter serves.

use std::fmt;

/// Key prefix for tenant documents
pub const TENANT_PREFIX: &str = "tenant:";

/// A parsed `tenant:<id>` key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantKey {
    id: String,
}

impl TenantKey {
    /// Key for a tenant id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Parse a logical key; `None` for other key families or an empty id
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        key.strip_prefix(TENANT_PREFIX)
            .filter(|id| !id.is_empty())
            .map(Self::new)
    }

    /// Tenant id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for TenantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TENANT_PREFIX}{}", self.id)
    }
}

/// Format the storage key of a tenant
#[inline]
#[must_use]
pub fn tenant_key(id: &str) -> String {
    TenantKey::new(id).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tenant_keys() {
        assert_eq!(TenantKey::parse("tenant:acme").unwrap().id(), "acme");
        assert_eq!(TenantKey::parse("tenant:a:b").unwrap().id(), "a:b");
        assert!(TenantKey::parse("tenant:").is_none());
        assert!(TenantKey::parse("user:acme").is_none());
        assert!(TenantKey::parse("acme").is_none());
    }

    #[test]
    fn display_round_trip() {
        assert_eq!(tenant_key("acme"), "tenant:acme");
        assert_eq!(TenantKey::parse(&tenant_key("x")).unwrap(), TenantKey::new("x"));
    }
}
